//! CSV report adapter implementing ReportPort.
//!
//! Writes one file per derived table into an output directory:
//! `kpis.csv`, `equity.csv`, `drawdown.csv`, `weights.csv`,
//! `model_metrics.csv` (only when models were evaluated) and `provenance.txt`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::error::TrackerError;
use crate::domain::report::PortfolioReport;
use crate::domain::series::Series;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn writer(&self, file: &str) -> Result<csv::Writer<fs::File>, TrackerError> {
        let path = self.output_dir.join(file);
        csv::Writer::from_path(&path).map_err(|e| csv_error(&path, e))
    }

    fn write_series(&self, file: &str, series: &Series) -> Result<(), TrackerError> {
        let path = self.output_dir.join(file);
        let mut wtr = self.writer(file)?;
        wtr.write_record(["date", "value"])
            .map_err(|e| csv_error(&path, e))?;
        for p in &series.points {
            wtr.write_record([p.date.to_string(), p.value.to_string()])
                .map_err(|e| csv_error(&path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn csv_error(path: &Path, e: csv::Error) -> TrackerError {
    TrackerError::Io(std::io::Error::other(format!(
        "failed to write {}: {}",
        path.display(),
        e
    )))
}

impl ReportPort for CsvReportAdapter {
    fn write_report(&self, report: &PortfolioReport) -> Result<(), TrackerError> {
        fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("kpis.csv");
        let mut wtr = self.writer("kpis.csv")?;
        wtr.write_record(["metric", "value"])
            .map_err(|e| csv_error(&path, e))?;
        for (name, value) in report.kpis.rows() {
            wtr.write_record([name.to_string(), value.to_string()])
                .map_err(|e| csv_error(&path, e))?;
        }
        wtr.flush()?;

        self.write_series("equity.csv", &report.equity)?;
        self.write_series("drawdown.csv", &report.drawdown)?;

        let path = self.output_dir.join("weights.csv");
        let mut wtr = self.writer("weights.csv")?;
        wtr.write_record(["ticker", "weight"])
            .map_err(|e| csv_error(&path, e))?;
        for w in &report.weights {
            wtr.write_record([w.ticker.clone(), w.weight.to_string()])
                .map_err(|e| csv_error(&path, e))?;
        }
        wtr.flush()?;

        if let Some(metrics) = &report.model_metrics {
            let path = self.output_dir.join("model_metrics.csv");
            let mut wtr = self.writer("model_metrics.csv")?;
            wtr.write_record(["model", "mae", "mse", "rmse"])
                .map_err(|e| csv_error(&path, e))?;
            for (kind, m) in &metrics.rows {
                wtr.write_record([
                    kind.label().to_string(),
                    m.mae.to_string(),
                    m.mse.to_string(),
                    m.rmse.to_string(),
                ])
                .map_err(|e| csv_error(&path, e))?;
            }
            wtr.flush()?;
        }

        fs::write(
            self.output_dir.join("provenance.txt"),
            format!("{}\n", report.provenance),
        )?;

        tracing::info!(dir = %self.output_dir.display(), "report written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecast::{MetricsTable, ModelKind, RegressionMetrics};
    use crate::domain::kpi::KpiRecord;
    use crate::domain::price_table::Provenance;
    use crate::domain::returns::Weight;
    use crate::domain::series::ReturnSeries;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_report() -> PortfolioReport {
        let dates: Vec<NaiveDate> = (2..=4)
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        PortfolioReport {
            provenance: Provenance::Real,
            weights: vec![
                Weight {
                    ticker: "AAPL".into(),
                    weight: 0.25,
                },
                Weight {
                    ticker: "SPY".into(),
                    weight: 0.75,
                },
            ],
            returns: ReturnSeries::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                Series::from_parts("portfolio", &dates[1..], &[0.1, -0.5]),
            ),
            kpis: KpiRecord {
                cumulative_return: -0.45,
                annualized_volatility: 4.76,
                sharpe_ratio: -4.76,
                max_drawdown: -0.5,
            },
            equity: Series::from_parts("equity", &dates, &[1.0, 1.1, 0.55]),
            drawdown: Series::from_parts("drawdown", &dates, &[0.0, 0.0, -0.5]),
            model_metrics: None,
        }
    }

    #[test]
    fn writes_core_tables() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let adapter = CsvReportAdapter::new(out.clone());
        adapter.write_report(&sample_report()).unwrap();

        let kpis = fs::read_to_string(out.join("kpis.csv")).unwrap();
        let lines: Vec<&str> = kpis.lines().collect();
        assert_eq!(lines[0], "metric,value");
        assert_eq!(lines[1], "Cumulative Return,-0.45");
        assert_eq!(lines[4], "Max Drawdown,-0.5");

        let equity = fs::read_to_string(out.join("equity.csv")).unwrap();
        assert_eq!(equity.lines().count(), 4);
        assert!(equity.contains("2024-01-02,1"));

        let weights = fs::read_to_string(out.join("weights.csv")).unwrap();
        assert!(weights.contains("SPY,0.75"));

        assert_eq!(
            fs::read_to_string(out.join("provenance.txt")).unwrap().trim(),
            "real"
        );
        assert!(!out.join("model_metrics.csv").exists());
    }

    #[test]
    fn writes_model_metrics_when_present() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvReportAdapter::new(dir.path().to_path_buf());
        let mut report = sample_report();
        report.model_metrics = Some(MetricsTable {
            rows: vec![(
                ModelKind::Naive,
                RegressionMetrics {
                    mae: 0.5,
                    mse: 0.25,
                    rmse: 0.5,
                },
            )],
        });
        adapter.write_report(&report).unwrap();

        let metrics = fs::read_to_string(dir.path().join("model_metrics.csv")).unwrap();
        let lines: Vec<&str> = metrics.lines().collect();
        assert_eq!(lines, vec!["model,mae,mse,rmse", "Naive,0.5,0.25,0.5"]);
    }
}
