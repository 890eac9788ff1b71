//! Concrete adapter implementations for ports.

pub mod csv_price_adapter;
pub mod csv_report_adapter;
pub mod file_config_adapter;
pub mod holdings_csv_adapter;
pub mod synthetic_price_adapter;
