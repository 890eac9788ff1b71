//! Report output port trait.

use crate::domain::error::TrackerError;
use crate::domain::report::PortfolioReport;

/// Sink for the derived series and tables of one run.
pub trait ReportPort {
    fn write_report(&self, report: &PortfolioReport) -> Result<(), TrackerError>;
}
