#![allow(dead_code)]

use chrono::NaiveDate;
use portfolio_tracker::domain::error::TrackerError;
use portfolio_tracker::domain::holding::{Holding, Holdings};
use portfolio_tracker::domain::price_table::{PriceColumn, PriceTable};
use portfolio_tracker::ports::price_port::PricePort;
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

/// Price port returning a fixed table, or a fixed failure.
pub struct MockPricePort {
    pub table: Option<PriceTable>,
    pub error: Option<String>,
    pub calls: Cell<usize>,
}

impl MockPricePort {
    pub fn with_table(table: PriceTable) -> Self {
        Self {
            table: Some(table),
            error: None,
            calls: Cell::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            table: None,
            error: Some(reason.to_string()),
            calls: Cell::new(0),
        }
    }
}

impl PricePort for MockPricePort {
    fn fetch_prices(
        &self,
        _tickers: &[String],
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<PriceTable, TrackerError> {
        self.calls.set(self.calls.get() + 1);
        if let Some(reason) = &self.error {
            return Err(TrackerError::DataSource {
                reason: reason.clone(),
            });
        }
        match &self.table {
            Some(t) => Ok(t.clone()),
            None => PriceTable::new(Vec::new(), Vec::new()),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `n` consecutive weekdays starting Monday 2024-01-01.
pub fn business_dates(n: usize) -> Vec<NaiveDate> {
    use chrono::{Datelike, Weekday};
    date(2024, 1, 1)
        .iter_days()
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(n)
        .collect()
}

/// Gap-free table on business dates, one column per `(ticker, prices)`.
pub fn price_table(columns: &[(&str, &[f64])]) -> PriceTable {
    let n = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
    PriceTable::new(
        business_dates(n),
        columns
            .iter()
            .map(|(t, v)| PriceColumn::full(*t, v))
            .collect(),
    )
    .unwrap()
}

pub fn holdings(items: &[(&str, f64)]) -> Holdings {
    Holdings::new(
        items
            .iter()
            .map(|(t, q)| Holding::equity(t, *q, 100.0))
            .collect(),
    )
    .unwrap()
}

/// `date,close` CSV for one ticker.
pub fn write_price_csv(dir: &Path, ticker: &str, dates: &[NaiveDate], prices: &[f64]) {
    let mut content = String::from("date,close\n");
    for (d, p) in dates.iter().zip(prices) {
        content.push_str(&format!("{},{}\n", d, p));
    }
    fs::write(dir.join(format!("{}.csv", ticker)), content).unwrap();
}

pub fn write_holdings_csv(dir: &Path, rows: &[(&str, f64)]) -> PathBuf {
    let mut content = String::from("account_id,asset_type,ticker,currency,quantity,avg_cost\n");
    for (ticker, qty) in rows {
        content.push_str(&format!("acc1,Equity,{},USD,{},100\n", ticker, qty));
    }
    let path = dir.join("holdings.csv");
    fs::write(&path, content).unwrap();
    path
}

pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() < tol,
        "expected {expected}, got {actual}"
    );
}
