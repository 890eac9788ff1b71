//! Price retrieval with a disclosed synthetic fallback.

use crate::domain::error::TrackerError;
use crate::domain::price_table::{PriceData, PriceTable};
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;

/// Trim tickers and drop blanks, keeping first occurrence order.
pub fn normalize_tickers<S: AsRef<str>>(tickers: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tickers.len());
    for t in tickers {
        let t = t.as_ref().trim();
        if !t.is_empty() && !out.iter().any(|o| o == t) {
            out.push(t.to_string());
        }
    }
    out
}

/// Fetch real prices; when retrieval fails outright, fall back to `synthetic`
/// and tag the result so reports can disclose it.
///
/// Without a fallback the `DataSource` failure propagates.
pub fn fetch_with_fallback(
    port: &dyn PricePort,
    synthetic: Option<&dyn PricePort>,
    tickers: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<PriceData, TrackerError> {
    let tickers = normalize_tickers(tickers);
    if tickers.is_empty() {
        return Err(TrackerError::empty("no tickers provided"));
    }
    if start_date > end_date {
        return Err(TrackerError::invalid_parameter(
            "start_date",
            format!("{} is after end date {}", start_date, end_date),
        ));
    }

    let failure = match port.fetch_prices(&tickers, start_date, end_date) {
        Ok(table) if !table.is_empty() => {
            tracing::info!(
                tickers = table.columns().len(),
                dates = table.len(),
                "fetched real prices"
            );
            return Ok(PriceData::Real(table));
        }
        Ok(_) => TrackerError::DataSource {
            reason: "price source returned no data".into(),
        },
        Err(TrackerError::DataSource { reason }) => TrackerError::DataSource { reason },
        Err(e) => TrackerError::DataSource {
            reason: e.to_string(),
        },
    };

    let Some(fallback) = synthetic else {
        return Err(failure);
    };

    tracing::warn!(
        error = %failure,
        tickers = %tickers.join(","),
        "price download failed; generating synthetic prices for offline use"
    );
    let table: PriceTable = fallback.fetch_prices(&tickers, start_date, end_date)?;
    Ok(PriceData::Synthetic(table))
}
