//! Price retrieval port trait.

use crate::domain::error::TrackerError;
use crate::domain::price_table::PriceTable;
use chrono::NaiveDate;

/// Source of adjusted prices: one column per ticker, one row per trading date.
pub trait PricePort {
    fn fetch_prices(
        &self,
        tickers: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceTable, TrackerError>;
}
