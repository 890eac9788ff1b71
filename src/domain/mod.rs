//! Core domain types and the analysis pipeline.

pub mod holding;
pub mod price_table;
pub mod series;
pub mod returns;
pub mod kpi;
pub mod volatility;
pub mod forecast;
pub mod price_source;
pub mod report;
pub mod config_validation;
pub mod error;
