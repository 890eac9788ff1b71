//! Rolling realized volatility and the supervised forecasting dataset.
//!
//! Realized vol over a window is the population standard deviation of the
//! trailing `window` returns, ending at (and including) the row's date.
//! Warmup: the first (window - 1) returns produce no value.

use super::error::TrackerError;
use super::kpi::{population_std, TRADING_DAYS_PER_YEAR};
use super::series::{Point, ReturnSeries, Series};
use chrono::NaiveDate;

/// Feature matrix: one row per date, one column per named feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, TrackerError> {
        if dates.len() != rows.len() {
            return Err(TrackerError::mismatch(format!(
                "{} dates for {} feature rows",
                dates.len(),
                rows.len()
            )));
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != columns.len()) {
            return Err(TrackerError::mismatch(format!(
                "feature row {} has {} values, expected {}",
                bad,
                rows[bad].len(),
                columns.len()
            )));
        }
        Ok(Self {
            dates,
            columns,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Series> {
        let idx = self.column_index(name)?;
        let values: Vec<f64> = self.rows.iter().map(|r| r[idx]).collect();
        Some(Series::from_parts(name, &self.dates, &values))
    }

    /// Positional split: rows `[0, at)` and `[at, len)`.
    pub fn split_at(&self, at: usize) -> (FeatureTable, FeatureTable) {
        let at = at.min(self.len());
        let head = FeatureTable {
            dates: self.dates[..at].to_vec(),
            columns: self.columns.clone(),
            rows: self.rows[..at].to_vec(),
        };
        let tail = FeatureTable {
            dates: self.dates[at..].to_vec(),
            columns: self.columns.clone(),
            rows: self.rows[at..].to_vec(),
        };
        (head, tail)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolDatasetConfig {
    /// One `rv_{w}d` feature column per window.
    pub feature_windows: Vec<usize>,
    /// Target: realized vol over the next `target_window` returns.
    pub target_window: usize,
    pub annualize: bool,
}

impl Default for VolDatasetConfig {
    fn default() -> Self {
        Self {
            feature_windows: vec![5],
            target_window: 5,
            annualize: true,
        }
    }
}

pub fn feature_name(window: usize) -> String {
    format!("rv_{}d", window)
}

fn check_window(name: &str, window: usize) -> Result<(), TrackerError> {
    if window == 0 {
        return Err(TrackerError::invalid_parameter(name, "window must be at least 1"));
    }
    Ok(())
}

/// Trailing realized vol aligned to the returns; `None` during warmup.
fn rolling_vol(values: &[f64], window: usize, annualize: bool) -> Vec<Option<f64>> {
    let scale = if annualize {
        TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        1.0
    };
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                Some(population_std(&values[i + 1 - window..=i]) * scale)
            }
        })
        .collect()
}

/// Rolling realized volatility; warmup dates are excluded from the output.
pub fn realized_vol(
    returns: &ReturnSeries,
    window: usize,
    annualize: bool,
) -> Result<Series, TrackerError> {
    check_window("window", window)?;
    let values = returns.values();
    let points = returns
        .points()
        .iter()
        .zip(rolling_vol(&values, window, annualize))
        .filter_map(|(p, v)| {
            v.map(|value| Point {
                date: p.date,
                value,
            })
        })
        .collect();
    Ok(Series::new(feature_name(window), points))
}

/// Build `(X, y)` where X holds trailing realized-vol features at date t and
/// y is the realized vol of returns t+1 ..= t+target_window.
///
/// Rows missing any feature or the target are dropped, so X and y share
/// their dates one-to-one.
pub fn build_vol_dataset(
    returns: &ReturnSeries,
    config: &VolDatasetConfig,
) -> Result<(FeatureTable, Series), TrackerError> {
    if config.feature_windows.is_empty() {
        return Err(TrackerError::invalid_parameter(
            "feature_windows",
            "at least one window is required",
        ));
    }
    for &w in &config.feature_windows {
        check_window("feature_windows", w)?;
    }
    check_window("target_window", config.target_window)?;

    let values = returns.values();
    let dates = returns.dates();
    let features: Vec<Vec<Option<f64>>> = config
        .feature_windows
        .iter()
        .map(|&w| rolling_vol(&values, w, config.annualize))
        .collect();
    let trailing_target = rolling_vol(&values, config.target_window, config.annualize);

    let mut x_dates = Vec::new();
    let mut rows = Vec::new();
    let mut targets = Vec::new();
    for t in 0..values.len() {
        let Some(Some(target)) = trailing_target.get(t + config.target_window).copied() else {
            continue;
        };
        let row: Option<Vec<f64>> = features.iter().map(|f| f[t]).collect();
        if let Some(row) = row {
            x_dates.push(dates[t]);
            rows.push(row);
            targets.push(target);
        }
    }

    let columns = config
        .feature_windows
        .iter()
        .map(|&w| feature_name(w))
        .collect();
    let target_name = format!("target_rv_{}d", config.target_window);
    let y = Series::from_parts(target_name, &x_dates, &targets);
    let x = FeatureTable::new(x_dates, columns, rows)?;
    Ok((x, y))
}
