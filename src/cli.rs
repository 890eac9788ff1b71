//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_price_adapter::CsvPriceAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::holdings_csv_adapter::load_holdings;
use crate::adapters::synthetic_price_adapter::SyntheticPriceGenerator;
use crate::domain::config_validation::{
    parse_date, parse_windows, validate_forecast_config, validate_run_config,
};
use crate::domain::error::TrackerError;
use crate::domain::forecast::forest::RandomForestConfig;
use crate::domain::forecast::{train_and_evaluate_all, FittedModels, ForecastConfig};
use crate::domain::holding::Holdings;
use crate::domain::price_source::fetch_with_fallback;
use crate::domain::price_table::{PriceData, PriceTable, Provenance};
use crate::domain::report::{analyze_portfolio, PortfolioReport};
use crate::domain::volatility::{build_vol_dataset, feature_name, VolDatasetConfig};
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PricePort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "portfolio-tracker",
    about = "Portfolio performance, risk KPIs and volatility forecasting"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute portfolio returns and risk KPIs
    Report {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory for CSV outputs (overrides [report] output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare volatility forecasting models on the portfolio returns
    Forecast {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate configuration and holdings without fetching prices
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Report { config, output } => run_report(&config, output.as_deref()),
        Command::Forecast { config, output } => run_forecast(&config, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

/// Everything one report run needs, resolved from config.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub holdings_path: PathBuf,
    pub source_dir: Option<PathBuf>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `None` when `[synthetic] enabled = false`.
    pub synthetic: Option<SyntheticPriceGenerator>,
    pub risk_free_daily: f64,
    pub output_dir: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Install the stderr subscriber. `RUST_LOG` wins over `level`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        level
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn build_run_config(config: &dyn ConfigPort) -> Result<RunConfig, TrackerError> {
    let holdings_path = config
        .get_string("portfolio", "holdings")
        .map(PathBuf::from)
        .ok_or_else(|| TrackerError::ConfigMissing {
            section: "portfolio".into(),
            key: "holdings".into(),
        })?;
    let start_date = parse_date(
        config.get_string("prices", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(config.get_string("prices", "end_date").as_deref(), "end_date")?;

    let defaults = SyntheticPriceGenerator::default();
    let synthetic = if config.get_bool("synthetic", "enabled", true)? {
        Some(SyntheticPriceGenerator {
            seed: config.get_int("synthetic", "seed", defaults.seed as i64)?.max(0) as u64,
            drift: config.get_double("synthetic", "drift", defaults.drift)?,
            volatility: config.get_double("synthetic", "volatility", defaults.volatility)?,
            initial_price: config.get_double(
                "synthetic",
                "initial_price",
                defaults.initial_price,
            )?,
        })
    } else {
        None
    };

    Ok(RunConfig {
        holdings_path,
        source_dir: non_blank(config.get_string("prices", "source_dir")).map(PathBuf::from),
        start_date,
        end_date,
        synthetic,
        risk_free_daily: config.get_double("kpi", "risk_free_daily", 0.0)?,
        output_dir: non_blank(config.get_string("report", "output_dir")).map(PathBuf::from),
    })
}

pub fn build_forecast_config(
    config: &dyn ConfigPort,
) -> Result<(VolDatasetConfig, ForecastConfig), TrackerError> {
    let dataset_defaults = VolDatasetConfig::default();
    let feature_windows = match config.get_string("forecast", "feature_windows") {
        Some(s) => parse_windows(&s)?,
        None => dataset_defaults.feature_windows,
    };
    let target_window = config
        .get_int("forecast", "target_window", dataset_defaults.target_window as i64)?
        .max(1) as usize;
    let dataset = VolDatasetConfig {
        feature_windows,
        target_window,
        annualize: config.get_bool("forecast", "annualize", dataset_defaults.annualize)?,
    };

    let forest_defaults = RandomForestConfig::default();
    let forest = RandomForestConfig {
        n_trees: config
            .get_int("forecast", "n_trees", forest_defaults.n_trees as i64)?
            .max(1) as usize,
        max_depth: config
            .get_int("forecast", "max_depth", forest_defaults.max_depth as i64)?
            .max(0) as usize,
        min_samples_split: config
            .get_int(
                "forecast",
                "min_samples_split",
                forest_defaults.min_samples_split as i64,
            )?
            .max(2) as usize,
        min_samples_leaf: config
            .get_int(
                "forecast",
                "min_samples_leaf",
                forest_defaults.min_samples_leaf as i64,
            )?
            .max(1) as usize,
        seed: config
            .get_int("forecast", "seed", forest_defaults.seed as i64)?
            .max(0) as u64,
    };

    let naive_column = non_blank(config.get_string("forecast", "naive_column"))
        .unwrap_or_else(|| feature_name(dataset.feature_windows[0]));
    let forecast = ForecastConfig {
        train_frac: config.get_double("forecast", "train_frac", 0.8)?,
        naive_column,
        forest,
    };
    Ok((dataset, forecast))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Stand-in primary source when no price directory is configured.
struct NoPriceSource;

impl PricePort for NoPriceSource {
    fn fetch_prices(
        &self,
        _tickers: &[String],
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<PriceTable, TrackerError> {
        Err(TrackerError::DataSource {
            reason: "no [prices] source_dir configured".into(),
        })
    }
}

pub fn load_prices(run: &RunConfig, holdings: &Holdings) -> Result<PriceData, TrackerError> {
    let tickers: Vec<String> = holdings.tickers().iter().map(|t| t.to_string()).collect();
    let fallback = run.synthetic.as_ref().map(|g| g as &dyn PricePort);
    match &run.source_dir {
        Some(dir) => fetch_with_fallback(
            &CsvPriceAdapter::new(dir.clone()),
            fallback,
            &tickers,
            run.start_date,
            run.end_date,
        ),
        None => fetch_with_fallback(
            &NoPriceSource,
            fallback,
            &tickers,
            run.start_date,
            run.end_date,
        ),
    }
}

/// Holdings -> prices -> returns -> KPIs.
pub fn run_report_pipeline(run: &RunConfig) -> Result<PortfolioReport, TrackerError> {
    let holdings = load_holdings(&run.holdings_path)?;
    eprintln!(
        "Loaded {} holdings from {}",
        holdings.len(),
        run.holdings_path.display()
    );

    let prices = load_prices(run, &holdings)?;
    eprintln!(
        "Prices: {} tickers, {} dates ({})",
        prices.table().columns().len(),
        prices.table().len(),
        prices.provenance()
    );

    analyze_portfolio(&holdings, &prices, run.risk_free_daily)
}

/// Report pipeline followed by the volatility model comparison on the
/// portfolio returns.
pub fn run_forecast_pipeline(
    run: &RunConfig,
    dataset: &VolDatasetConfig,
    forecast: &ForecastConfig,
) -> Result<(PortfolioReport, FittedModels), TrackerError> {
    let mut report = run_report_pipeline(run)?;
    let (x, y) = build_vol_dataset(&report.returns, dataset)?;
    eprintln!(
        "Volatility dataset: {} rows, features [{}]",
        x.len(),
        x.columns.join(", ")
    );
    let (metrics, models) = train_and_evaluate_all(&x, &y, forecast)?;
    report.model_metrics = Some(metrics);
    Ok((report, models))
}

fn print_report(report: &PortfolioReport) {
    println!("\n=== Portfolio KPIs ===");
    for (name, value) in report.kpis.rows() {
        println!("{:<24}{:>12.6}", name, value);
    }
    println!("\n=== Weights ===");
    for w in &report.weights {
        println!("{:<24}{:>12.6}", w.ticker, w.weight);
    }
    println!("\nPrice data: {}", report.provenance);
    if report.provenance == Provenance::Synthetic {
        eprintln!("warning: KPIs are computed on SYNTHETIC prices, not market data");
    }
}

fn print_model_metrics(report: &PortfolioReport) {
    let Some(metrics) = &report.model_metrics else {
        return;
    };
    println!("\n=== Volatility Models (test set) ===");
    println!("{:<16}{:>12}{:>12}{:>12}", "model", "MAE", "MSE", "RMSE");
    for (kind, m) in &metrics.rows {
        println!(
            "{:<16}{:>12.6}{:>12.6}{:>12.6}",
            kind.label(),
            m.mae,
            m.mse,
            m.rmse
        );
    }
    if let Some(best) = metrics.best() {
        println!("\nBest model by RMSE: {}", best);
    }
}

fn write_outputs(
    report: &PortfolioReport,
    output: Option<&Path>,
    run: &RunConfig,
) -> Result<(), TrackerError> {
    let dir = output.map(Path::to_path_buf).or_else(|| run.output_dir.clone());
    if let Some(dir) = dir {
        CsvReportAdapter::new(dir.clone()).write_report(report)?;
        eprintln!("\nReport written to: {}", dir.display());
    }
    Ok(())
}

/// Load config, start logging, validate. Shared front half of every command.
fn prepare(config_path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    let level = adapter
        .get_string("logging", "level")
        .unwrap_or_else(|| "info".to_string());
    init_logging(&level);

    validate_run_config(&adapter).map_err(|e| fail(&e))?;
    Ok(adapter)
}

fn fail(err: &TrackerError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

fn run_report(config_path: &Path, output: Option<&Path>) -> ExitCode {
    let adapter = match prepare(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let result = build_run_config(&adapter).and_then(|run| {
        let report = run_report_pipeline(&run)?;
        print_report(&report);
        write_outputs(&report, output, &run)
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_forecast(config_path: &Path, output: Option<&Path>) -> ExitCode {
    let adapter = match prepare(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_forecast_config(&adapter) {
        return fail(&e);
    }

    let result = build_run_config(&adapter).and_then(|run| {
        let (dataset, forecast) = build_forecast_config(&adapter)?;
        let (report, models) = run_forecast_pipeline(&run, &dataset, &forecast)?;
        for kind in models.kinds() {
            if let Some(model) = models.get(kind) {
                tracing::info!(
                    model = model.name(),
                    features = model.n_features(),
                    "fitted forecast model"
                );
            }
        }
        print_report(&report);
        print_model_metrics(&report);
        write_outputs(&report, output, &run)
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match prepare(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_forecast_config(&adapter) {
        return fail(&e);
    }

    let result = build_run_config(&adapter).and_then(|run| {
        let holdings = load_holdings(&run.holdings_path)?;
        eprintln!("Config validated successfully");
        eprintln!("\nHoldings ({}):", holdings.len());
        for h in holdings.iter() {
            eprintln!(
                "  {:<10} {:<8} {:>14.4} @ {:.4} {}  cost {:.2}",
                h.ticker,
                h.asset_type,
                h.quantity,
                h.avg_cost,
                h.currency,
                h.cost_basis()
            );
        }
        eprintln!("Total cost basis: {:.2}", holdings.total_cost_basis());
        eprintln!("\nPrice window: {} to {}", run.start_date, run.end_date);
        match &run.source_dir {
            Some(dir) => eprintln!("Price source: {}", dir.display()),
            None => eprintln!("Price source: none configured"),
        }
        if run.synthetic.is_none() {
            eprintln!("Synthetic fallback: disabled");
        }
        Ok(())
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}
