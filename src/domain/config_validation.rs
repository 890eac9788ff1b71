//! Configuration validation.
//!
//! Validates all config fields before a run.

use crate::domain::error::TrackerError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), TrackerError> {
    validate_holdings_path(config)?;
    validate_dates(config)?;
    validate_synthetic(config)?;
    validate_risk_free(config)?;
    Ok(())
}

pub fn validate_forecast_config(config: &dyn ConfigPort) -> Result<(), TrackerError> {
    validate_windows(config)?;
    validate_train_frac(config)?;
    validate_forest(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TrackerError {
    TrackerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_holdings_path(config: &dyn ConfigPort) -> Result<(), TrackerError> {
    match config.get_string("portfolio", "holdings") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        Some(_) => Err(invalid("portfolio", "holdings", "holdings path must not be empty")),
        None => Err(TrackerError::ConfigMissing {
            section: "portfolio".to_string(),
            key: "holdings".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TrackerError> {
    let start_str = config.get_string("prices", "start_date");
    let end_str = config.get_string("prices", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "prices",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, TrackerError> {
    match value {
        None => Err(TrackerError::ConfigMissing {
            section: "prices".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "prices",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_synthetic(config: &dyn ConfigPort) -> Result<(), TrackerError> {
    config.get_bool("synthetic", "enabled", true)?;
    config.get_double("synthetic", "drift", 0.0005)?;
    if config.get_double("synthetic", "volatility", 0.02)? < 0.0 {
        return Err(invalid(
            "synthetic",
            "volatility",
            "volatility must be non-negative",
        ));
    }
    if config.get_double("synthetic", "initial_price", 100.0)? <= 0.0 {
        return Err(invalid(
            "synthetic",
            "initial_price",
            "initial_price must be positive",
        ));
    }
    if config.get_int("synthetic", "seed", 0)? < 0 {
        return Err(invalid("synthetic", "seed", "seed must be non-negative"));
    }
    Ok(())
}

fn validate_risk_free(config: &dyn ConfigPort) -> Result<(), TrackerError> {
    let value = config.get_double("kpi", "risk_free_daily", 0.0)?;
    if !(-0.01..0.01).contains(&value) {
        return Err(invalid(
            "kpi",
            "risk_free_daily",
            "risk_free_daily is a daily rate and must be between -0.01 and 0.01",
        ));
    }
    Ok(())
}

/// Parse a comma separated list of positive window sizes.
pub fn parse_windows(value: &str) -> Result<Vec<usize>, TrackerError> {
    let mut windows = Vec::new();
    for part in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match part.parse::<usize>() {
            Ok(w) if w > 0 => windows.push(w),
            _ => {
                return Err(invalid(
                    "forecast",
                    "feature_windows",
                    format!("invalid window {:?}", part),
                ));
            }
        }
    }
    if windows.is_empty() {
        return Err(invalid(
            "forecast",
            "feature_windows",
            "at least one window is required",
        ));
    }
    Ok(windows)
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), TrackerError> {
    if let Some(s) = config.get_string("forecast", "feature_windows") {
        parse_windows(&s)?;
    }
    config.get_bool("forecast", "annualize", true)?;
    if config.get_int("forecast", "target_window", 5)? < 1 {
        return Err(invalid(
            "forecast",
            "target_window",
            "target_window must be at least 1",
        ));
    }
    Ok(())
}

fn validate_train_frac(config: &dyn ConfigPort) -> Result<(), TrackerError> {
    let value = config.get_double("forecast", "train_frac", 0.8)?;
    if value <= 0.0 || value >= 1.0 {
        return Err(invalid(
            "forecast",
            "train_frac",
            "train_frac must be between 0 and 1 (exclusive)",
        ));
    }
    Ok(())
}

fn validate_forest(config: &dyn ConfigPort) -> Result<(), TrackerError> {
    if config.get_int("forecast", "n_trees", 300)? < 1 {
        return Err(invalid("forecast", "n_trees", "n_trees must be at least 1"));
    }
    if config.get_int("forecast", "max_depth", 5)? < 0 {
        return Err(invalid(
            "forecast",
            "max_depth",
            "max_depth must be non-negative",
        ));
    }
    if config.get_int("forecast", "min_samples_split", 2)? < 2 {
        return Err(invalid(
            "forecast",
            "min_samples_split",
            "min_samples_split must be at least 2",
        ));
    }
    if config.get_int("forecast", "min_samples_leaf", 1)? < 1 {
        return Err(invalid(
            "forecast",
            "min_samples_leaf",
            "min_samples_leaf must be at least 1",
        ));
    }
    if config.get_int("forecast", "seed", 42)? < 0 {
        return Err(invalid("forecast", "seed", "seed must be non-negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockConfig {
        values: HashMap<(String, String), String>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                values: HashMap::new(),
            }
        }

        fn set(mut self, section: &str, key: &str, value: &str) -> Self {
            self.values
                .insert((section.to_string(), key.to_string()), value.to_string());
            self
        }

        fn valid() -> Self {
            Self::new()
                .set("portfolio", "holdings", "holdings.csv")
                .set("prices", "start_date", "2023-01-01")
                .set("prices", "end_date", "2023-12-31")
        }
    }

    impl ConfigPort for MockConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.values
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }
    }

    fn assert_invalid(result: Result<(), TrackerError>, expected_key: &str) {
        match result {
            Err(TrackerError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected ConfigInvalid for {}, got {:?}", expected_key, other),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_run_config(&MockConfig::valid()).is_ok());
        assert!(validate_forecast_config(&MockConfig::valid()).is_ok());
    }

    #[test]
    fn missing_holdings_path() {
        let config = MockConfig::new()
            .set("prices", "start_date", "2023-01-01")
            .set("prices", "end_date", "2023-12-31");
        match validate_run_config(&config) {
            Err(TrackerError::ConfigMissing { section, key }) => {
                assert_eq!(section, "portfolio");
                assert_eq!(key, "holdings");
            }
            other => panic!("expected ConfigMissing, got {:?}", other),
        }
    }

    #[test]
    fn missing_start_date() {
        let config = MockConfig::new()
            .set("portfolio", "holdings", "h.csv")
            .set("prices", "end_date", "2023-12-31");
        assert!(matches!(
            validate_run_config(&config),
            Err(TrackerError::ConfigMissing { key, .. }) if key == "start_date"
        ));
    }

    #[test]
    fn bad_date_format() {
        let config = MockConfig::valid().set("prices", "end_date", "31/12/2023");
        assert_invalid(validate_run_config(&config), "end_date");
    }

    #[test]
    fn start_after_end() {
        let config = MockConfig::valid().set("prices", "start_date", "2024-06-01");
        assert_invalid(validate_run_config(&config), "start_date");
    }

    #[test]
    fn negative_synthetic_volatility() {
        let config = MockConfig::valid().set("synthetic", "volatility", "-0.1");
        assert_invalid(validate_run_config(&config), "volatility");
    }

    #[test]
    fn annual_rate_given_as_daily() {
        let config = MockConfig::valid().set("kpi", "risk_free_daily", "0.05");
        assert_invalid(validate_run_config(&config), "risk_free_daily");
    }

    #[test]
    fn train_frac_out_of_range() {
        let config = MockConfig::valid().set("forecast", "train_frac", "1.0");
        assert_invalid(validate_forecast_config(&config), "train_frac");
    }

    #[test]
    fn zero_trees() {
        let config = MockConfig::valid().set("forecast", "n_trees", "0");
        assert_invalid(validate_forecast_config(&config), "n_trees");
    }

    #[test]
    fn unparsable_train_frac() {
        let config = MockConfig::valid().set("forecast", "train_frac", "abc");
        assert_invalid(validate_forecast_config(&config), "train_frac");
    }

    #[test]
    fn unrecognised_bool_is_not_treated_as_default() {
        let config = MockConfig::valid().set("synthetic", "enabled", "off");
        assert_invalid(validate_run_config(&config), "enabled");
    }

    #[test]
    fn unparsable_numbers_name_their_key() {
        let config = MockConfig::valid().set("kpi", "risk_free_daily", "2%");
        assert_invalid(validate_run_config(&config), "risk_free_daily");
        let config = MockConfig::valid().set("forecast", "n_trees", "3OO");
        assert_invalid(validate_forecast_config(&config), "n_trees");
    }

    #[test]
    fn parse_windows_accepts_list() {
        assert_eq!(parse_windows("5, 10,21").unwrap(), vec![5, 10, 21]);
        assert!(parse_windows("5,0").is_err());
        assert!(parse_windows("five").is_err());
        assert!(parse_windows(" , ").is_err());
    }

    #[test]
    fn invalid_feature_windows_in_config() {
        let config = MockConfig::valid().set("forecast", "feature_windows", "5,x");
        assert_invalid(validate_forecast_config(&config), "feature_windows");
    }
}
