//! Domain error types.

/// Top-level error type for portfolio-tracker.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("missing columns in holdings: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("non-numeric {field} in holdings row {row}: {value:?}")]
    TypeValidation {
        row: usize,
        field: String,
        value: String,
    },

    #[error("invalid holding in row {row}: {reason}")]
    InvalidHolding { row: usize, reason: String },

    #[error("duplicate ticker in holdings: {ticker}")]
    DuplicateTicker { ticker: String },

    #[error("insufficient input: {reason}")]
    EmptyInput { reason: String },

    #[error("initial portfolio value is {total}; check quantities and tickers")]
    ZeroPortfolioValue { total: f64 },

    #[error("feature column '{column}' not found")]
    MissingColumn { column: String },

    #[error("duplicate price date {date}")]
    DuplicateDate { date: chrono::NaiveDate },

    #[error("invalid price for {ticker} on {date}: {value}")]
    InvalidPrice {
        ticker: String,
        date: chrono::NaiveDate,
        value: f64,
    },

    #[error("price retrieval failed: {reason}")]
    DataSource { reason: String },

    #[error("index mismatch: {reason}")]
    IndexMismatch { reason: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("model error: {reason}")]
    Model { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrackerError {
    pub(crate) fn empty(reason: impl Into<String>) -> Self {
        TrackerError::EmptyInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        TrackerError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(reason: impl Into<String>) -> Self {
        TrackerError::IndexMismatch {
            reason: reason.into(),
        }
    }
}

impl From<&TrackerError> for std::process::ExitCode {
    fn from(err: &TrackerError) -> Self {
        let code: u8 = match err {
            TrackerError::Io(_) => 1,
            TrackerError::ConfigParse { .. }
            | TrackerError::ConfigMissing { .. }
            | TrackerError::ConfigInvalid { .. } => 2,
            TrackerError::Schema { .. }
            | TrackerError::TypeValidation { .. }
            | TrackerError::InvalidHolding { .. }
            | TrackerError::DuplicateTicker { .. } => 3,
            TrackerError::DataSource { .. }
            | TrackerError::DuplicateDate { .. }
            | TrackerError::InvalidPrice { .. } => 4,
            TrackerError::EmptyInput { .. }
            | TrackerError::ZeroPortfolioValue { .. }
            | TrackerError::MissingColumn { .. }
            | TrackerError::IndexMismatch { .. }
            | TrackerError::InvalidParameter { .. }
            | TrackerError::Model { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_lists_every_missing_column() {
        let err = TrackerError::Schema {
            missing: vec!["quantity".into(), "avg_cost".into()],
        };
        assert_eq!(
            err.to_string(),
            "missing columns in holdings: quantity, avg_cost"
        );
    }

    #[test]
    fn type_validation_names_field_and_value() {
        let err = TrackerError::TypeValidation {
            row: 2,
            field: "quantity".into(),
            value: "ten".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("quantity"));
        assert!(msg.contains("row 2"));
        assert!(msg.contains("\"ten\""));
    }

    #[test]
    fn exit_codes_group_by_kind() {
        use std::process::ExitCode;
        let config = TrackerError::ConfigMissing {
            section: "prices".into(),
            key: "start_date".into(),
        };
        let zero = TrackerError::ZeroPortfolioValue { total: 0.0 };
        // ExitCode has no PartialEq; compare the Debug form.
        let code = |c: ExitCode| format!("{c:?}");
        assert_eq!(code(ExitCode::from(&config)), code(ExitCode::from(2)));
        assert_eq!(code(ExitCode::from(&zero)), code(ExitCode::from(5)));
        assert_ne!(code(ExitCode::from(&zero)), code(ExitCode::SUCCESS));
    }
}
