//! Volatility forecasting harness: chronological split, naive baseline,
//! linear regression and random forest, compared on one test set.

pub mod forest;
pub mod linear;

use crate::domain::error::TrackerError;
use crate::domain::series::Series;
use crate::domain::volatility::{feature_name, FeatureTable};
use std::fmt;

pub use forest::{RandomForest, RandomForestConfig};
pub use linear::LinearRegression;

/// A fitted model that maps one feature row to a point forecast.
pub trait Regressor {
    fn name(&self) -> &str;

    fn n_features(&self) -> usize;

    fn predict_row(&self, row: &[f64]) -> f64;

    /// Predict every row of `x`, keeping its dates.
    fn predict(&self, x: &FeatureTable) -> Result<Series, TrackerError> {
        if x.width() != self.n_features() {
            return Err(TrackerError::mismatch(format!(
                "{} expects {} features, got {}",
                self.name(),
                self.n_features(),
                x.width()
            )));
        }
        let values: Vec<f64> = x.rows.iter().map(|r| self.predict_row(r)).collect();
        Ok(Series::from_parts(self.name(), &x.dates, &values))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub x_train: FeatureTable,
    pub x_test: FeatureTable,
    pub y_train: Series,
    pub y_test: Series,
}

/// First `floor(n * train_frac)` rows train, the rest test. Never shuffles.
pub fn time_series_split(
    x: &FeatureTable,
    y: &Series,
    train_frac: f64,
) -> Result<TrainTestSplit, TrackerError> {
    if !(train_frac > 0.0 && train_frac < 1.0) {
        return Err(TrackerError::invalid_parameter(
            "train_frac",
            format!("must be in (0, 1), got {}", train_frac),
        ));
    }
    if x.dates != y.dates() {
        return Err(TrackerError::mismatch(
            "feature and target indices differ",
        ));
    }

    let split = (x.len() as f64 * train_frac).floor() as usize;
    let (x_train, x_test) = x.split_at(split);
    let y_train = Series::new(y.name.clone(), y.points[..split].to_vec());
    let y_test = Series::new(y.name.clone(), y.points[split..].to_vec());

    Ok(TrainTestSplit {
        x_train,
        x_test,
        y_train,
        y_test,
    })
}

/// "Tomorrow's vol = today's realized vol": the named feature, verbatim.
pub fn naive_predict(x_test: &FeatureTable, column: &str) -> Result<Series, TrackerError> {
    x_test
        .column(column)
        .ok_or_else(|| TrackerError::MissingColumn {
            column: column.to_string(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
}

pub fn regression_metrics(
    y_true: &Series,
    y_pred: &Series,
) -> Result<RegressionMetrics, TrackerError> {
    if y_true.len() != y_pred.len() {
        return Err(TrackerError::mismatch(format!(
            "{} targets for {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(TrackerError::empty("no observations to score"));
    }
    if y_true.dates() != y_pred.dates() {
        return Err(TrackerError::mismatch(
            "target and prediction dates differ",
        ));
    }

    let n = y_true.len() as f64;
    let errors: Vec<f64> = y_true
        .points
        .iter()
        .zip(&y_pred.points)
        .map(|(t, p)| t.value - p.value)
        .collect();
    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let mse = errors.iter().map(|e| e * e).sum::<f64>() / n;

    Ok(RegressionMetrics {
        mae,
        mse,
        rmse: mse.sqrt(),
    })
}

pub fn train_linear_regression(
    x_train: &FeatureTable,
    y_train: &Series,
) -> Result<LinearRegression, TrackerError> {
    LinearRegression::fit(x_train, &y_train.values())
}

pub fn train_random_forest(
    x_train: &FeatureTable,
    y_train: &Series,
    config: &RandomForestConfig,
) -> Result<RandomForest, TrackerError> {
    RandomForest::fit(x_train, &y_train.values(), config)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Naive,
    Linear,
    RandomForest,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::Naive, ModelKind::Linear, ModelKind::RandomForest];

    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::Naive => "Naive",
            ModelKind::Linear => "LinearReg",
            ModelKind::RandomForest => "RandomForest",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    pub train_frac: f64,
    /// Feature column repeated by the naive baseline.
    pub naive_column: String,
    pub forest: RandomForestConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            train_frac: 0.8,
            naive_column: feature_name(5),
            forest: RandomForestConfig::default(),
        }
    }
}

/// Model comparison keyed by model, in evaluation order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsTable {
    pub rows: Vec<(ModelKind, RegressionMetrics)>,
}

impl MetricsTable {
    pub fn get(&self, kind: ModelKind) -> Option<&RegressionMetrics> {
        self.rows.iter().find(|(k, _)| *k == kind).map(|(_, m)| m)
    }

    /// Model with the lowest RMSE.
    pub fn best(&self) -> Option<ModelKind> {
        self.rows
            .iter()
            .min_by(|a, b| a.1.rmse.total_cmp(&b.1.rmse))
            .map(|(k, _)| *k)
    }
}

/// Fitted models by kind; the naive baseline has no fitted object.
pub struct FittedModels {
    entries: Vec<(ModelKind, Option<Box<dyn Regressor>>)>,
}

impl FittedModels {
    pub fn get(&self, kind: ModelKind) -> Option<&dyn Regressor> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .and_then(|(_, m)| m.as_deref())
    }

    pub fn kinds(&self) -> Vec<ModelKind> {
        self.entries.iter().map(|(k, _)| *k).collect()
    }
}

impl fmt::Debug for FittedModels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (kind, model) in &self.entries {
            map.entry(&kind.label(), &model.as_ref().map(|m| m.name()));
        }
        map.finish()
    }
}

/// Split once, then score every model on the identical test set.
pub fn train_and_evaluate_all(
    x: &FeatureTable,
    y: &Series,
    config: &ForecastConfig,
) -> Result<(MetricsTable, FittedModels), TrackerError> {
    let split = time_series_split(x, y, config.train_frac)?;
    if split.x_train.is_empty() || split.x_test.is_empty() {
        return Err(TrackerError::empty(format!(
            "{} rows give {} train / {} test at train_frac {}",
            x.len(),
            split.x_train.len(),
            split.x_test.len(),
            config.train_frac
        )));
    }

    tracing::info!(
        train = split.x_train.len(),
        test = split.x_test.len(),
        features = x.width(),
        "evaluating forecast models"
    );

    let naive_pred = naive_predict(&split.x_test, &config.naive_column)?;
    let naive_metrics = regression_metrics(&split.y_test, &naive_pred)?;

    let linear = train_linear_regression(&split.x_train, &split.y_train)?;
    let linear_metrics = regression_metrics(&split.y_test, &linear.predict(&split.x_test)?)?;

    let forest = train_random_forest(&split.x_train, &split.y_train, &config.forest)?;
    let forest_metrics = regression_metrics(&split.y_test, &forest.predict(&split.x_test)?)?;

    let table = MetricsTable {
        rows: vec![
            (ModelKind::Naive, naive_metrics),
            (ModelKind::Linear, linear_metrics),
            (ModelKind::RandomForest, forest_metrics),
        ],
    };
    let models = FittedModels {
        entries: vec![
            (ModelKind::Naive, None),
            (ModelKind::Linear, Some(Box::new(linear) as Box<dyn Regressor>)),
            (ModelKind::RandomForest, Some(Box::new(forest) as Box<dyn Regressor>)),
        ],
    };
    Ok((table, models))
}
