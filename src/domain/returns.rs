//! Daily returns and value-weighted portfolio returns.
//!
//! Weights are fixed once from quantity x first available price and never
//! rebalanced (buy-and-hold over the whole horizon).

use crate::domain::error::TrackerError;
use crate::domain::holding::Holdings;
use crate::domain::price_table::PriceTable;
use crate::domain::series::{Point, ReturnSeries, Series};
use chrono::NaiveDate;

pub const PORTFOLIO_SERIES_NAME: &str = "portfolio";

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnColumn {
    pub ticker: String,
    pub values: Vec<Option<f64>>,
}

/// Per-ticker simple returns, one row per retained price date.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnTable {
    pub base_date: NaiveDate,
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<ReturnColumn>,
}

impl ReturnTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, ticker: &str) -> Option<&ReturnColumn> {
        self.columns.iter().find(|c| c.ticker == ticker)
    }

    /// Observed returns for one ticker; undefined entries are skipped.
    pub fn ticker_returns(&self, ticker: &str) -> Option<ReturnSeries> {
        let col = self.column(ticker)?;
        let points = self
            .dates
            .iter()
            .zip(&col.values)
            .filter_map(|(&date, v)| v.map(|value| Point { date, value }))
            .collect();
        Some(ReturnSeries::new(self.base_date, Series::new(ticker, points)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Weight {
    pub ticker: String,
    pub weight: f64,
}

fn pct_change(prev: f64, curr: f64) -> Option<f64> {
    (prev > 0.0).then(|| curr / prev - 1.0)
}

/// Returns against the last observed price, one per row after the first.
///
/// A missing price is padded with the previous one, so only rows before the
/// column's first price (or after a zero price) are undefined.
fn padded_changes(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = values.first().copied().flatten();
    values[1..]
        .iter()
        .map(|&curr| {
            let prev = last;
            last = curr.or(last);
            prev.zip(last).and_then(|(p, c)| pct_change(p, c))
        })
        .collect()
}

/// Percentage change date-over-date for every ticker.
///
/// Gaps are padded with the last observed price. The leading row and rows
/// with no defined return for any ticker are dropped.
pub fn daily_returns(prices: &PriceTable) -> Result<ReturnTable, TrackerError> {
    let dates = prices.dates();
    if dates.len() < 2 {
        return Err(TrackerError::empty(format!(
            "need at least 2 price dates, have {}",
            dates.len()
        )));
    }
    if prices.columns().is_empty() {
        return Err(TrackerError::empty("price table has no tickers"));
    }

    let mut kept_rows = Vec::with_capacity(dates.len() - 1);
    let raw: Vec<Vec<Option<f64>>> = prices
        .columns()
        .iter()
        .map(|col| padded_changes(&col.values))
        .collect();

    for row in 0..dates.len() - 1 {
        if raw.iter().any(|col| col[row].is_some()) {
            kept_rows.push(row);
        }
    }

    let first = kept_rows
        .first()
        .copied()
        .ok_or_else(|| TrackerError::empty("no defined returns in price table"))?;

    let columns = prices
        .columns()
        .iter()
        .zip(&raw)
        .map(|(col, values)| ReturnColumn {
            ticker: col.ticker.clone(),
            values: kept_rows.iter().map(|&r| values[r]).collect(),
        })
        .collect();

    Ok(ReturnTable {
        base_date: dates[first],
        dates: kept_rows.iter().map(|&r| dates[r + 1]).collect(),
        columns,
    })
}

/// Initial value weights, one per price-table ticker in table order.
///
/// Holdings absent from the table carry no weight; table tickers absent
/// from the holdings get weight zero.
pub fn portfolio_weights(
    holdings: &Holdings,
    prices: &PriceTable,
) -> Result<Vec<Weight>, TrackerError> {
    let values: Vec<(String, f64)> = prices
        .columns()
        .iter()
        .map(|col| {
            let qty = holdings.quantity_of(&col.ticker).unwrap_or(0.0);
            let first = col.first_available().unwrap_or(0.0);
            (col.ticker.clone(), qty * first)
        })
        .collect();

    let total: f64 = values.iter().map(|(_, v)| v).sum();
    if !(total > 0.0) {
        return Err(TrackerError::ZeroPortfolioValue { total });
    }

    Ok(values
        .into_iter()
        .map(|(ticker, value)| Weight {
            ticker,
            weight: value / total,
        })
        .collect())
}

/// Value-weighted daily portfolio returns.
///
/// Prices are forward-filled first; a ticker return still undefined after
/// the fill counts as 0 for that date.
pub fn portfolio_returns(
    holdings: &Holdings,
    prices: &PriceTable,
) -> Result<ReturnSeries, TrackerError> {
    let weights = portfolio_weights(holdings, prices)?;
    let filled = prices.forward_filled();
    let rets = daily_returns(&filled)?;

    let points = rets
        .dates
        .iter()
        .enumerate()
        .map(|(row, &date)| {
            let value = rets
                .columns
                .iter()
                .zip(&weights)
                .map(|(col, w)| w.weight * col.values[row].unwrap_or(0.0))
                .sum();
            Point { date, value }
        })
        .collect();

    tracing::debug!(
        tickers = weights.len(),
        days = rets.len(),
        "computed portfolio returns"
    );

    Ok(ReturnSeries::new(
        rets.base_date,
        Series::new(PORTFOLIO_SERIES_NAME, points),
    ))
}
