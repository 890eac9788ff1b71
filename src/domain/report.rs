//! Run summary handed to the presentation layer.

use super::error::TrackerError;
use super::forecast::MetricsTable;
use super::holding::Holdings;
use super::kpi::{drawdown, equity_curve, kpi_table, KpiRecord};
use super::price_table::{PriceData, Provenance};
use super::returns::{portfolio_returns, portfolio_weights, Weight};
use super::series::{ReturnSeries, Series};

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioReport {
    pub provenance: Provenance,
    pub weights: Vec<Weight>,
    pub returns: ReturnSeries,
    pub kpis: KpiRecord,
    pub equity: Series,
    pub drawdown: Series,
    pub model_metrics: Option<MetricsTable>,
}

/// Prices -> weights -> portfolio returns -> KPIs, equity and drawdown.
pub fn analyze_portfolio(
    holdings: &Holdings,
    prices: &PriceData,
    risk_free_daily: f64,
) -> Result<PortfolioReport, TrackerError> {
    let table = prices.table();
    let weights = portfolio_weights(holdings, table)?;
    let returns = portfolio_returns(holdings, table)?;
    let kpis = kpi_table(&returns, risk_free_daily)?;
    let equity = equity_curve(&returns);
    let drawdown = drawdown(&equity);

    Ok(PortfolioReport {
        provenance: prices.provenance(),
        weights,
        returns,
        kpis,
        equity,
        drawdown,
        model_metrics: None,
    })
}
