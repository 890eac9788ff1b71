//! Random forest regression: bagged CART trees with variance-reduction splits.
//!
//! Every split considers all features; randomness comes only from the
//! bootstrap samples, drawn from per-tree seeds derived from one master seed.

use super::Regressor;
use crate::domain::error::TrackerError;
use crate::domain::volatility::FeatureTable;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 300,
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

impl RandomForestConfig {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.n_trees == 0 {
            return Err(TrackerError::invalid_parameter("n_trees", "must be at least 1"));
        }
        if self.min_samples_split < 2 {
            return Err(TrackerError::invalid_parameter(
                "min_samples_split",
                "must be at least 2",
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(TrackerError::invalid_parameter(
                "min_samples_leaf",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    sse: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    fn fit(rows: &[Vec<f64>], y: &[f64], sample: Vec<usize>, config: &RandomForestConfig) -> Self {
        let mut tree = RegressionTree { nodes: Vec::new() };
        tree.grow(rows, y, sample, 0, config);
        tree
    }

    fn grow(
        &mut self,
        rows: &[Vec<f64>],
        y: &[f64],
        sample: Vec<usize>,
        depth: usize,
        config: &RandomForestConfig,
    ) -> usize {
        let n = sample.len() as f64;
        let sum: f64 = sample.iter().map(|&i| y[i]).sum();
        let mean = sum / n;
        let sse: f64 = sample.iter().map(|&i| (y[i] - mean).powi(2)).sum();

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        if depth >= config.max_depth || sample.len() < config.min_samples_split || sse <= 0.0 {
            return id;
        }

        let Some(best) = best_split(rows, y, &sample, config.min_samples_leaf) else {
            return id;
        };
        if best.sse >= sse {
            return id;
        }

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| rows[i][best.feature] <= best.threshold);

        let left = self.grow(rows, y, left_idx, depth + 1, config);
        let right = self.grow(rows, y, right_idx, depth + 1, config);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Lowest total squared error over all features and boundaries between
/// distinct feature values, honouring the minimum leaf size.
fn best_split(
    rows: &[Vec<f64>],
    y: &[f64],
    sample: &[usize],
    min_leaf: usize,
) -> Option<SplitCandidate> {
    let n = sample.len();
    if n < 2 * min_leaf {
        return None;
    }
    let width = rows[sample[0]].len();
    let mut best: Option<SplitCandidate> = None;
    let mut order = sample.to_vec();

    for feature in 0..width {
        order.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));

        let total_sum: f64 = order.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = order.iter().map(|&i| y[i] * y[i]).sum();
        let mut left_sum = 0.0;
        let mut left_sq = 0.0;

        for k in 1..n {
            let prev = order[k - 1];
            left_sum += y[prev];
            left_sq += y[prev] * y[prev];

            if k < min_leaf || n - k < min_leaf {
                continue;
            }
            let lo = rows[prev][feature];
            let hi = rows[order[k]][feature];
            if lo >= hi {
                continue;
            }

            let left_n = k as f64;
            let right_n = (n - k) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / left_n)
                + (right_sq - right_sum * right_sum / right_n);

            if best.as_ref().is_none_or(|b| sse < b.sse) {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    sse,
                });
            }
        }
    }
    best
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    pub fn fit(
        x: &FeatureTable,
        y: &[f64],
        config: &RandomForestConfig,
    ) -> Result<Self, TrackerError> {
        config.validate()?;
        let n = x.len();
        if n == 0 {
            return Err(TrackerError::empty("no training rows for random forest"));
        }
        if y.len() != n {
            return Err(TrackerError::mismatch(format!(
                "{} feature rows for {} targets",
                n,
                y.len()
            )));
        }

        let mut master = ChaCha8Rng::seed_from_u64(config.seed);
        let trees = (0..config.n_trees)
            .map(|_| {
                let mut rng = ChaCha8Rng::seed_from_u64(master.r#gen::<u64>());
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(&x.rows, y, sample, config)
            })
            .collect();

        let forest = Self {
            trees,
            n_features: x.width(),
        };
        tracing::debug!(
            trees = forest.n_trees(),
            max_depth = config.max_depth,
            rows = n,
            "fitted random forest"
        );
        Ok(forest)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForest {
    fn name(&self) -> &str {
        "RandomForest"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        total / self.trees.len() as f64
    }
}
