//! Configuration access port trait.
//!
//! Implementors only supply raw string lookup. The typed getters return the
//! default when a key is absent and `ConfigInvalid` when it is present but
//! does not parse, so a typo never silently becomes the default.

use std::str::FromStr;

use crate::domain::error::TrackerError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, TrackerError> {
        typed(self.get_string(section, key), section, key, "an integer")
            .map(|v| v.unwrap_or(default))
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, TrackerError> {
        match typed::<f64>(self.get_string(section, key), section, key, "a number")? {
            Some(v) if !v.is_finite() => Err(invalid_value(section, key, "a finite number", v)),
            Some(v) => Ok(v),
            None => Ok(default),
        }
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, TrackerError> {
        let Some(raw) = self.get_string(section, key) else {
            return Ok(default);
        };
        match raw.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(invalid_value(section, key, "true/false, yes/no or 1/0", raw)),
        }
    }
}

fn typed<T: FromStr>(
    raw: Option<String>,
    section: &str,
    key: &str,
    expected: &str,
) -> Result<Option<T>, TrackerError> {
    raw.map(|s| {
        s.trim()
            .parse::<T>()
            .map_err(|_| invalid_value(section, key, expected, &s))
    })
    .transpose()
}

fn invalid_value(
    section: &str,
    key: &str,
    expected: &str,
    value: impl std::fmt::Display,
) -> TrackerError {
    TrackerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("expected {expected}, got '{value}'"),
    }
}
