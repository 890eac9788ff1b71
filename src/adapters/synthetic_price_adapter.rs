//! Seeded geometric random walk prices, used when real data is unavailable.

use crate::domain::error::TrackerError;
use crate::domain::price_table::{PriceColumn, PriceTable};
use crate::ports::price_port::PricePort;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticPriceGenerator {
    pub seed: u64,
    /// Mean daily log step.
    pub drift: f64,
    /// Standard deviation of the daily log step.
    pub volatility: f64,
    pub initial_price: f64,
}

impl Default for SyntheticPriceGenerator {
    fn default() -> Self {
        Self {
            seed: 0,
            drift: 0.0005,
            volatility: 0.02,
            initial_price: 100.0,
        }
    }
}

/// Mon-Fri dates in [start, end].
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

impl PricePort for SyntheticPriceGenerator {
    fn fetch_prices(
        &self,
        tickers: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceTable, TrackerError> {
        if !(self.initial_price.is_finite() && self.initial_price > 0.0) {
            return Err(TrackerError::InvalidParameter {
                name: "initial_price".into(),
                reason: format!("must be positive, got {}", self.initial_price),
            });
        }
        let normal = Normal::new(self.drift, self.volatility).map_err(|e| {
            TrackerError::InvalidParameter {
                name: "volatility".into(),
                reason: e.to_string(),
            }
        })?;

        let dates = business_days(start_date, end_date);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let columns = tickers
            .iter()
            .map(|ticker| {
                let mut log_level = 0.0;
                let values = dates
                    .iter()
                    .map(|_| {
                        log_level += normal.sample(&mut rng);
                        Some(self.initial_price * log_level.exp())
                    })
                    .collect();
                PriceColumn::new(ticker.clone(), values)
            })
            .collect();

        tracing::debug!(
            tickers = tickers.len(),
            dates = dates.len(),
            seed = self.seed,
            "generated synthetic prices"
        );
        PriceTable::new(dates, columns)
    }
}
