//! Performance and risk KPIs from a daily return series.

use super::error::TrackerError;
use super::series::{Point, ReturnSeries, Series};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Added to the Sharpe denominator so a zero-volatility series yields 0
/// instead of NaN. Numerical stabilisation only; it has no statistical meaning.
pub const SHARPE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiRecord {
    pub cumulative_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
}

impl KpiRecord {
    /// Named rows in reporting order.
    pub fn rows(&self) -> [(&'static str, f64); 4] {
        [
            ("Cumulative Return", self.cumulative_return),
            ("Annualized Volatility", self.annualized_volatility),
            ("Sharpe Ratio", self.sharpe_ratio),
            ("Max Drawdown", self.max_drawdown),
        ]
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divisor N).
pub(crate) fn population_std(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn require_returns(returns: &[f64]) -> Result<(), TrackerError> {
    if returns.is_empty() {
        return Err(TrackerError::empty("return series is empty"));
    }
    Ok(())
}

pub fn annualized_volatility(returns: &[f64]) -> Result<f64, TrackerError> {
    require_returns(returns)?;
    Ok(population_std(returns) * TRADING_DAYS_PER_YEAR.sqrt())
}

pub fn sharpe(returns: &[f64], risk_free_daily: f64) -> Result<f64, TrackerError> {
    require_returns(returns)?;
    let excess: Vec<f64> = returns.iter().map(|r| r - risk_free_daily).collect();
    let stddev = population_std(&excess);
    Ok(TRADING_DAYS_PER_YEAR.sqrt() * mean(&excess) / (stddev + SHARPE_EPSILON))
}

/// Growth of 1: 1.0 on the base date, then the running product of (1 + r).
pub fn equity_curve(returns: &ReturnSeries) -> Series {
    let mut points = Vec::with_capacity(returns.len() + 1);
    points.push(Point {
        date: returns.base_date,
        value: 1.0,
    });
    let mut equity = 1.0;
    for p in returns.points() {
        equity *= 1.0 + p.value;
        points.push(Point {
            date: p.date,
            value: equity,
        });
    }
    Series::new("equity", points)
}

/// (value - running max) / running max at every date; always <= 0.
pub fn drawdown(equity: &Series) -> Series {
    let mut peak = f64::NEG_INFINITY;
    let points = equity
        .points
        .iter()
        .map(|p| {
            if p.value > peak {
                peak = p.value;
            }
            let value = if peak > 0.0 {
                ((p.value - peak) / peak).min(0.0)
            } else {
                0.0
            };
            Point {
                date: p.date,
                value,
            }
        })
        .collect();
    Series::new("drawdown", points)
}

pub fn kpi_table(returns: &ReturnSeries, risk_free_daily: f64) -> Result<KpiRecord, TrackerError> {
    let values = returns.values();
    require_returns(&values)?;

    let equity = equity_curve(returns);
    let final_equity = equity.last().map(|p| p.value).unwrap_or(1.0);
    let max_drawdown = drawdown(&equity).min_value().unwrap_or(0.0);

    Ok(KpiRecord {
        cumulative_return: final_equity - 1.0,
        annualized_volatility: annualized_volatility(&values)?,
        sharpe_ratio: sharpe(&values, risk_free_daily)?,
        max_drawdown,
    })
}
