//! Holdings CSV loader.

use crate::domain::error::TrackerError;
use crate::domain::holding::{AssetType, Holding, Holdings};
use std::fs;
use std::io::Read;
use std::path::Path;

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "account_id",
    "asset_type",
    "ticker",
    "currency",
    "quantity",
    "avg_cost",
];

pub fn load_holdings<P: AsRef<Path>>(path: P) -> Result<Holdings, TrackerError> {
    let path = path.as_ref();
    let file = fs::File::open(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("failed to read holdings {}: {}", path.display(), e),
        )
    })?;
    parse_holdings(file)
}

/// Parse a holdings table. Column order is free; extra columns are ignored.
pub fn parse_holdings<R: Read>(reader: R) -> Result<Holdings, TrackerError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| TrackerError::Io(std::io::Error::other(e)))?
        .clone();
    let index_of = |name: &str| headers.iter().position(|h| h == name);

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| index_of(**c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(TrackerError::Schema { missing });
    }

    let [account, asset, ticker, currency, quantity, avg_cost] =
        REQUIRED_COLUMNS.map(|c| index_of(c).unwrap_or_default());

    let mut items = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| TrackerError::InvalidHolding {
            row,
            reason: format!("CSV parse error: {}", e),
        })?;
        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();

        items.push(Holding {
            account_id: field(account),
            asset_type: AssetType::parse(&field(asset)),
            ticker: field(ticker),
            currency: field(currency).to_uppercase(),
            quantity: parse_number(row, "quantity", &field(quantity))?,
            avg_cost: parse_number(row, "avg_cost", &field(avg_cost))?,
        });
    }

    Holdings::new(items)
}

fn parse_number(row: usize, field: &str, raw: &str) -> Result<f64, TrackerError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(TrackerError::TypeValidation {
            row,
            field: field.to_string(),
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "account_id,asset_type,ticker,currency,quantity,avg_cost\n\
        acc1,Equity,AAPL,USD,10,150\n\
        acc1,ETF,SPY,usd,5,400\n\
        acc1,Crypto,BTC-USD,USD,0.02,35000\n";

    #[test]
    fn parses_sample_holdings() {
        let holdings = parse_holdings(SAMPLE.as_bytes()).unwrap();
        assert_eq!(holdings.len(), 3);
        assert_eq!(holdings.tickers(), vec!["AAPL", "SPY", "BTC-USD"]);
        let spy = holdings.iter().nth(1).unwrap();
        assert_eq!(spy.asset_type, AssetType::Etf);
        assert_eq!(spy.currency, "USD");
        assert_eq!(holdings.quantity_of("BTC-USD"), Some(0.02));
    }

    #[test]
    fn column_order_is_free_and_extras_ignored() {
        let csv = "ticker,quantity,note,avg_cost,currency,asset_type,account_id\n\
            MSFT, 3 ,long term,300,USD,Equity,acc2\n";
        let holdings = parse_holdings(csv.as_bytes()).unwrap();
        let h = holdings.iter().next().unwrap();
        assert_eq!(h.ticker, "MSFT");
        assert_eq!(h.quantity, 3.0);
        assert_eq!(h.account_id, "acc2");
    }

    #[test]
    fn missing_columns_are_listed() {
        let csv = "account_id,ticker,currency,quantity\nacc1,AAPL,USD,1\n";
        match parse_holdings(csv.as_bytes()) {
            Err(TrackerError::Schema { missing }) => {
                assert_eq!(missing, vec!["asset_type", "avg_cost"]);
            }
            other => panic!("expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn non_numeric_quantity_is_fatal() {
        let csv = "account_id,asset_type,ticker,currency,quantity,avg_cost\n\
            acc1,Equity,AAPL,USD,10,150\n\
            acc1,Equity,SPY,USD,ten,400\n";
        match parse_holdings(csv.as_bytes()) {
            Err(TrackerError::TypeValidation { row, field, value }) => {
                assert_eq!(row, 2);
                assert_eq!(field, "quantity");
                assert_eq!(value, "ten");
            }
            other => panic!("expected TypeValidation, got {:?}", other),
        }
    }

    #[test]
    fn empty_avg_cost_is_fatal() {
        let csv = "account_id,asset_type,ticker,currency,quantity,avg_cost\n\
            acc1,Equity,AAPL,USD,10,\n";
        assert!(matches!(
            parse_holdings(csv.as_bytes()),
            Err(TrackerError::TypeValidation { field, .. }) if field == "avg_cost"
        ));
    }

    #[test]
    fn duplicate_ticker_is_rejected() {
        let csv = "account_id,asset_type,ticker,currency,quantity,avg_cost\n\
            acc1,Equity,AAPL,USD,10,150\n\
            acc2,Equity,AAPL,USD,1,150\n";
        assert!(matches!(
            parse_holdings(csv.as_bytes()),
            Err(TrackerError::DuplicateTicker { .. })
        ));
    }

    #[test]
    fn load_holdings_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let holdings = load_holdings(file.path()).unwrap();
        assert_eq!(holdings.len(), 3);
    }

    #[test]
    fn load_holdings_missing_file_is_io_error() {
        assert!(matches!(
            load_holdings("/nonexistent/holdings.csv"),
            Err(TrackerError::Io(_))
        ));
    }
}
