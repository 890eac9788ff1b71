//! Wide, date-indexed table of adjusted prices.

use crate::domain::error::TrackerError;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceColumn {
    pub ticker: String,
    pub values: Vec<Option<f64>>,
}

impl PriceColumn {
    pub fn new(ticker: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            ticker: ticker.into(),
            values,
        }
    }

    /// Column without gaps.
    pub fn full(ticker: impl Into<String>, values: &[f64]) -> Self {
        Self::new(ticker, values.iter().map(|&v| Some(v)).collect())
    }

    pub fn first_available(&self) -> Option<f64> {
        self.values.iter().flatten().next().copied()
    }

    /// Carry the last observed price forward over gaps.
    pub fn forward_filled(&self) -> PriceColumn {
        let mut last = None;
        let values = self
            .values
            .iter()
            .map(|v| {
                if v.is_some() {
                    last = *v;
                }
                last
            })
            .collect();
        PriceColumn::new(self.ticker.clone(), values)
    }
}

/// Invariants: dates strictly increasing, every column has one value per
/// date, every column has at least one observed price, prices are finite and
/// non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    columns: Vec<PriceColumn>,
}

impl PriceTable {
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<PriceColumn>) -> Result<Self, TrackerError> {
        for col in &columns {
            if col.values.len() != dates.len() {
                return Err(TrackerError::mismatch(format!(
                    "column {} has {} values for {} dates",
                    col.ticker,
                    col.values.len(),
                    dates.len()
                )));
            }
        }

        let mut order: Vec<usize> = (0..dates.len()).collect();
        order.sort_by_key(|&i| dates[i]);
        for pair in order.windows(2) {
            if dates[pair[0]] == dates[pair[1]] {
                return Err(TrackerError::DuplicateDate {
                    date: dates[pair[0]],
                });
            }
        }

        let sorted_dates: Vec<NaiveDate> = order.iter().map(|&i| dates[i]).collect();
        let mut kept = Vec::with_capacity(columns.len());
        for col in columns {
            let mut values = Vec::with_capacity(order.len());
            for &i in &order {
                let value = match col.values[i] {
                    Some(v) if v.is_nan() => None,
                    Some(v) if v.is_infinite() || v < 0.0 => {
                        return Err(TrackerError::InvalidPrice {
                            ticker: col.ticker.clone(),
                            date: dates[i],
                            value: v,
                        });
                    }
                    other => other,
                };
                values.push(value);
            }
            if values.iter().any(Option::is_some) {
                kept.push(PriceColumn::new(col.ticker, values));
            }
        }

        Ok(Self {
            dates: sorted_dates,
            columns: kept,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[PriceColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.columns.is_empty()
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.ticker.as_str()).collect()
    }

    pub fn column(&self, ticker: &str) -> Option<&PriceColumn> {
        self.columns.iter().find(|c| c.ticker == ticker)
    }

    pub fn forward_filled(&self) -> PriceTable {
        PriceTable {
            dates: self.dates.clone(),
            columns: self.columns.iter().map(PriceColumn::forward_filled).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Real,
    Synthetic,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Real => write!(f, "real"),
            Provenance::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Price table tagged with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceData {
    Real(PriceTable),
    Synthetic(PriceTable),
}

impl PriceData {
    pub fn table(&self) -> &PriceTable {
        match self {
            PriceData::Real(t) | PriceData::Synthetic(t) => t,
        }
    }

    pub fn provenance(&self) -> Provenance {
        match self {
            PriceData::Real(_) => Provenance::Real,
            PriceData::Synthetic(_) => Provenance::Synthetic,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, PriceData::Synthetic(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn new_sorts_rows_by_date() {
        let table = PriceTable::new(
            vec![d(3), d(1), d(2)],
            vec![PriceColumn::full("AAPL", &[103.0, 101.0, 102.0])],
        )
        .unwrap();
        assert_eq!(table.dates(), &[d(1), d(2), d(3)]);
        assert_eq!(
            table.column("AAPL").unwrap().values,
            vec![Some(101.0), Some(102.0), Some(103.0)]
        );
    }

    #[test]
    fn new_rejects_duplicate_dates() {
        let err = PriceTable::new(
            vec![d(1), d(1)],
            vec![PriceColumn::full("AAPL", &[1.0, 2.0])],
        )
        .unwrap_err();
        assert!(matches!(err, TrackerError::DuplicateDate { .. }));
    }

    #[test]
    fn new_drops_all_missing_columns_and_maps_nan() {
        let table = PriceTable::new(
            vec![d(1), d(2)],
            vec![
                PriceColumn::new("GOOD", vec![Some(1.0), Some(f64::NAN)]),
                PriceColumn::new("BAD", vec![None, Some(f64::NAN)]),
            ],
        )
        .unwrap();
        assert_eq!(table.tickers(), vec!["GOOD"]);
        assert_eq!(table.column("GOOD").unwrap().values, vec![Some(1.0), None]);
    }

    #[test]
    fn new_rejects_negative_price() {
        let err = PriceTable::new(vec![d(1)], vec![PriceColumn::full("X", &[-1.0])]).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidPrice { .. }));
    }

    #[test]
    fn new_rejects_ragged_columns() {
        let err = PriceTable::new(vec![d(1), d(2)], vec![PriceColumn::full("X", &[1.0])])
            .unwrap_err();
        assert!(matches!(err, TrackerError::IndexMismatch { .. }));
    }

    #[test]
    fn forward_fill_carries_last_price() {
        let col = PriceColumn::new("X", vec![None, Some(2.0), None, Some(4.0), None]);
        assert_eq!(
            col.forward_filled().values,
            vec![None, Some(2.0), Some(2.0), Some(4.0), Some(4.0)]
        );
        assert_eq!(col.first_available(), Some(2.0));
    }

    #[test]
    fn price_data_reports_provenance() {
        let table = PriceTable::new(vec![d(1)], vec![PriceColumn::full("X", &[1.0])]).unwrap();
        let data = PriceData::Synthetic(table.clone());
        assert!(data.is_synthetic());
        assert_eq!(data.provenance().to_string(), "synthetic");
        assert_eq!(PriceData::Real(table).provenance(), Provenance::Real);
    }
}
