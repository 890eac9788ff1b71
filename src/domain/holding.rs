//! Portfolio holdings.

use crate::domain::error::TrackerError;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetType {
    Equity,
    Etf,
    Crypto,
    Bond,
    Fund,
    Cash,
    Other(String),
}

impl AssetType {
    /// Case-insensitive; unknown labels are kept verbatim as `Other`.
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_lowercase().as_str() {
            "equity" | "stock" => AssetType::Equity,
            "etf" => AssetType::Etf,
            "crypto" => AssetType::Crypto,
            "bond" => AssetType::Bond,
            "fund" => AssetType::Fund,
            "cash" => AssetType::Cash,
            _ => AssetType::Other(trimmed.to_string()),
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetType::Equity => write!(f, "Equity"),
            AssetType::Etf => write!(f, "ETF"),
            AssetType::Crypto => write!(f, "Crypto"),
            AssetType::Bond => write!(f, "Bond"),
            AssetType::Fund => write!(f, "Fund"),
            AssetType::Cash => write!(f, "Cash"),
            AssetType::Other(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub account_id: String,
    pub asset_type: AssetType,
    pub ticker: String,
    pub currency: String,
    pub quantity: f64,
    pub avg_cost: f64,
}

impl Holding {
    /// Convenience constructor for a single-account USD equity position.
    pub fn equity(ticker: &str, quantity: f64, avg_cost: f64) -> Self {
        Self {
            account_id: "acc1".to_string(),
            asset_type: AssetType::Equity,
            ticker: ticker.to_string(),
            currency: "USD".to_string(),
            quantity,
            avg_cost,
        }
    }

    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.avg_cost
    }
}

/// Ordered, validated set of holdings with unique tickers.
///
/// Tickers are stored trimmed so lookups match the trimmed symbols used to
/// fetch prices.
#[derive(Debug, Clone, PartialEq)]
pub struct Holdings {
    items: Vec<Holding>,
}

impl Holdings {
    pub fn new(mut items: Vec<Holding>) -> Result<Self, TrackerError> {
        let mut seen = HashSet::new();
        for (i, h) in items.iter_mut().enumerate() {
            let row = i + 1;
            h.ticker = h.ticker.trim().to_string();
            if h.ticker.is_empty() {
                return Err(TrackerError::InvalidHolding {
                    row,
                    reason: "ticker must not be empty".into(),
                });
            }
            check_amount(row, "quantity", h.quantity)?;
            check_amount(row, "avg_cost", h.avg_cost)?;
            if !seen.insert(h.ticker.clone()) {
                return Err(TrackerError::DuplicateTicker {
                    ticker: h.ticker.clone(),
                });
            }
        }
        Ok(Self { items })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Holding> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn tickers(&self) -> Vec<String> {
        self.items.iter().map(|h| h.ticker.clone()).collect()
    }

    pub fn quantity_of(&self, ticker: &str) -> Option<f64> {
        self.items
            .iter()
            .find(|h| h.ticker == ticker)
            .map(|h| h.quantity)
    }

    pub fn total_cost_basis(&self) -> f64 {
        self.items.iter().map(Holding::cost_basis).sum()
    }
}

fn check_amount(row: usize, field: &str, value: f64) -> Result<(), TrackerError> {
    if !value.is_finite() {
        return Err(TrackerError::InvalidHolding {
            row,
            reason: format!("{} must be a finite number", field),
        });
    }
    if value < 0.0 {
        return Err(TrackerError::InvalidHolding {
            row,
            reason: format!("{} must be non-negative", field),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_type_parse_is_case_insensitive() {
        assert_eq!(AssetType::parse("ETF"), AssetType::Etf);
        assert_eq!(AssetType::parse(" crypto "), AssetType::Crypto);
        assert_eq!(
            AssetType::parse("Warrant"),
            AssetType::Other("Warrant".into())
        );
    }

    #[test]
    fn holdings_preserve_input_order() {
        let holdings = Holdings::new(vec![
            Holding::equity("SPY", 5.0, 400.0),
            Holding::equity("AAPL", 10.0, 150.0),
        ])
        .unwrap();
        assert_eq!(holdings.tickers(), vec!["SPY", "AAPL"]);
        assert_eq!(holdings.quantity_of("AAPL"), Some(10.0));
        assert_eq!(holdings.quantity_of("MSFT"), None);
    }

    #[test]
    fn holdings_reject_duplicate_ticker() {
        let err = Holdings::new(vec![
            Holding::equity("AAPL", 1.0, 1.0),
            Holding::equity("AAPL", 2.0, 1.0),
        ])
        .unwrap_err();
        assert!(matches!(err, TrackerError::DuplicateTicker { ticker } if ticker == "AAPL"));
    }

    #[test]
    fn holdings_trim_tickers() {
        let holdings = Holdings::new(vec![Holding::equity(" AAPL ", 10.0, 150.0)]).unwrap();
        assert_eq!(holdings.tickers(), vec!["AAPL"]);
        assert_eq!(holdings.quantity_of("AAPL"), Some(10.0));

        let err = Holdings::new(vec![
            Holding::equity("AAPL", 1.0, 1.0),
            Holding::equity("AAPL ", 2.0, 1.0),
        ])
        .unwrap_err();
        assert!(matches!(err, TrackerError::DuplicateTicker { ticker } if ticker == "AAPL"));
    }

    #[test]
    fn holdings_reject_empty_ticker() {
        let err = Holdings::new(vec![Holding::equity("  ", 1.0, 1.0)]).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidHolding { row: 1, .. }));
    }

    #[test]
    fn holdings_reject_negative_and_non_finite_amounts() {
        let err = Holdings::new(vec![Holding::equity("AAPL", -1.0, 1.0)]).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidHolding { .. }));

        let err = Holdings::new(vec![
            Holding::equity("AAPL", 1.0, 1.0),
            Holding::equity("MSFT", 1.0, f64::NAN),
        ])
        .unwrap_err();
        assert!(matches!(err, TrackerError::InvalidHolding { row: 2, .. }));
    }

    #[test]
    fn total_cost_basis_sums_positions() {
        let holdings = Holdings::new(vec![
            Holding::equity("AAPL", 10.0, 150.0),
            Holding::equity("SPY", 5.0, 400.0),
        ])
        .unwrap();
        assert!((holdings.total_cost_basis() - 3500.0).abs() < 1e-9);
    }
}
