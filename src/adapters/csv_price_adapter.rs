//! CSV directory price adapter: one `<TICKER>.csv` file per ticker.

use crate::domain::error::TrackerError;
use crate::domain::price_table::{PriceColumn, PriceTable};
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    /// Read `date,close` rows within [start, end]. The price column is the
    /// first of `adj_close`, `close`, `price`; otherwise the second column.
    fn read_ticker(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, f64>, TrackerError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| TrackerError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| TrackerError::DataSource {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();
        let price_idx = ["adj_close", "close", "price"]
            .iter()
            .find_map(|name| headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
            .unwrap_or(1);

        let mut prices = BTreeMap::new();
        for result in rdr.records() {
            let record = result.map_err(|e| TrackerError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(0).ok_or_else(|| TrackerError::DataSource {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                TrackerError::DataSource {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            let raw = record.get(price_idx).unwrap_or("");
            if raw.is_empty() {
                continue;
            }
            let price: f64 = raw.parse().map_err(|e| TrackerError::DataSource {
                reason: format!("invalid price value {:?} for {}: {}", raw, ticker, e),
            })?;
            if prices.insert(date, price).is_some() {
                return Err(TrackerError::DuplicateDate { date });
            }
        }

        Ok(prices)
    }
}

impl PricePort for CsvPriceAdapter {
    fn fetch_prices(
        &self,
        tickers: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceTable, TrackerError> {
        let mut series = Vec::new();
        for ticker in tickers {
            match self.read_ticker(ticker, start_date, end_date) {
                Ok(prices) if !prices.is_empty() => series.push((ticker.clone(), prices)),
                Ok(_) => tracing::warn!(%ticker, "no prices in range; dropping ticker"),
                Err(e) => tracing::warn!(%ticker, error = %e, "skipping ticker"),
            }
        }

        if series.is_empty() {
            return Err(TrackerError::DataSource {
                reason: format!(
                    "no price data for {} between {} and {}",
                    tickers.join(","),
                    start_date,
                    end_date
                ),
            });
        }

        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|(_, p)| p.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let columns = series
            .into_iter()
            .map(|(ticker, prices)| {
                let values = dates.iter().map(|d| prices.get(d).copied()).collect();
                PriceColumn::new(ticker, values)
            })
            .collect();

        PriceTable::new(dates, columns)
    }
}
