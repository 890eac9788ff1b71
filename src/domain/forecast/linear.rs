//! Ordinary least squares with intercept.

use super::Regressor;
use crate::domain::error::TrackerError;
use crate::domain::volatility::FeatureTable;
use nalgebra::{DMatrix, DVector};

const SVD_EPS: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegression {
    /// Fit on centred data with an SVD least-squares solve, so constant or
    /// collinear features get the minimum-norm solution.
    pub fn fit(x: &FeatureTable, y: &[f64]) -> Result<Self, TrackerError> {
        let n = x.len();
        let p = x.width();
        if n == 0 {
            return Err(TrackerError::empty("no training rows for linear regression"));
        }
        if y.len() != n {
            return Err(TrackerError::mismatch(format!(
                "{} feature rows for {} targets",
                n,
                y.len()
            )));
        }

        let x_mean: Vec<f64> = (0..p)
            .map(|j| x.rows.iter().map(|r| r[j]).sum::<f64>() / n as f64)
            .collect();
        let y_mean = y.iter().sum::<f64>() / n as f64;

        let a = DMatrix::from_fn(n, p, |i, j| x.rows[i][j] - x_mean[j]);
        let b = DVector::from_fn(n, |i, _| y[i] - y_mean);

        let beta = a
            .svd(true, true)
            .solve(&b, SVD_EPS)
            .map_err(|e| TrackerError::Model {
                reason: format!("least squares solve failed: {}", e),
            })?;

        let coefficients: Vec<f64> = beta.iter().copied().collect();
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(c, m)| c * m)
                .sum::<f64>();

        Ok(Self {
            coefficients,
            intercept,
        })
    }
}

impl Regressor for LinearRegression {
    fn name(&self) -> &str {
        "LinearReg"
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }
}
