//! XGBoost-style gradient boosted trees for squared-error regression
//!
//! - Gradient and hessian of the loss drive every tree (hessian is 1 for squared error)
//! - Regularized leaf weights: w* = -G / (H + lambda), with L1 soft-thresholding
//! - Gain-based split scoring: Gain = 0.5 * [GL²/(HL+λ) + GR²/(HR+λ) - (GL+GR)²/(HL+HR+λ)]
//! - Per-round row subsampling and per-tree column subsampling from a seeded RNG

use crate::error::{Result, WindError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{r2_score, Hyperparameters};

/// A single node of a boosted tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TreeNode {
    Leaf { weight: f64 },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, sample: ArrayView1<'_, f64>) -> f64 {
        match self {
            TreeNode::Leaf { weight } => *weight,
            TreeNode::Split { feature, threshold, left, right } => {
                if sample[*feature] <= *threshold {
                    left.predict(sample)
                } else {
                    right.predict(sample)
                }
            }
        }
    }

    fn count_splits(&self, counts: &mut [f64]) {
        if let TreeNode::Split { feature, left, right, .. } = self {
            if *feature < counts.len() {
                counts[*feature] += 1.0;
            }
            left.count_splits(counts);
            right.count_splits(counts);
        }
    }
}

/// Best split found for one feature
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Gradient statistics shared by every node of one tree
struct GradientStats<'a> {
    x: &'a Array2<f64>,
    grad: &'a Array1<f64>,
    hess: &'a Array1<f64>,
}

/// Build one tree using exact greedy split finding
fn build_tree(
    stats: &GradientStats<'_>,
    indices: &[usize],
    feature_indices: &[usize],
    depth: usize,
    params: &Hyperparameters,
) -> TreeNode {
    let g_sum: f64 = indices.iter().map(|&i| stats.grad[i]).sum();
    let h_sum: f64 = indices.iter().map(|&i| stats.hess[i]).sum();
    let leaf = TreeNode::Leaf {
        weight: leaf_weight(g_sum, h_sum, params.reg_lambda, params.reg_alpha),
    };

    if depth >= params.max_depth || indices.len() < 2 || h_sum < params.min_child_weight {
        return leaf;
    }

    let best = feature_indices
        .par_iter()
        .filter_map(|&f| best_split_for_feature(stats, indices, f, params))
        .max_by(|a, b| {
            // Equal gains prefer the lower feature index
            a.gain
                .partial_cmp(&b.gain)
                .unwrap_or(Ordering::Equal)
                .then(b.feature.cmp(&a.feature))
        });

    let split = match best {
        Some(split) if split.gain > params.gamma => split,
        _ => return leaf,
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| stats.x[[i, split.feature]] <= split.threshold);

    if left_idx.is_empty() || right_idx.is_empty() {
        return leaf;
    }

    TreeNode::Split {
        feature: split.feature,
        threshold: split.threshold,
        left: Box::new(build_tree(stats, &left_idx, feature_indices, depth + 1, params)),
        right: Box::new(build_tree(stats, &right_idx, feature_indices, depth + 1, params)),
    }
}

/// Optimal leaf weight with L1 (alpha) and L2 (lambda) regularization
fn leaf_weight(g_sum: f64, h_sum: f64, lambda: f64, alpha: f64) -> f64 {
    let g_adj = if alpha > 0.0 {
        if g_sum > alpha {
            g_sum - alpha
        } else if g_sum < -alpha {
            g_sum + alpha
        } else {
            return 0.0;
        }
    } else {
        g_sum
    };
    -g_adj / (h_sum + lambda)
}

fn best_split_for_feature(
    stats: &GradientStats<'_>,
    indices: &[usize],
    feature: usize,
    params: &Hyperparameters,
) -> Option<SplitCandidate> {
    let x = stats.x;
    let mut sorted: Vec<usize> = indices.to_vec();
    sorted.sort_by(|&a, &b| {
        x[[a, feature]]
            .partial_cmp(&x[[b, feature]])
            .unwrap_or(Ordering::Equal)
    });

    let g_total: f64 = sorted.iter().map(|&i| stats.grad[i]).sum();
    let h_total: f64 = sorted.iter().map(|&i| stats.hess[i]).sum();
    let lambda = params.reg_lambda;
    let parent_score = g_total * g_total / (h_total + lambda);

    let mut g_left = 0.0;
    let mut h_left = 0.0;
    let mut best: Option<SplitCandidate> = None;

    // The last position would leave the right side empty
    for pos in 0..sorted.len().saturating_sub(1) {
        let idx = sorted[pos];
        g_left += stats.grad[idx];
        h_left += stats.hess[idx];

        let value = x[[idx, feature]];
        let next_value = x[[sorted[pos + 1], feature]];
        if (next_value - value).abs() < 1e-12 {
            continue;
        }

        let g_right = g_total - g_left;
        let h_right = h_total - h_left;
        if h_left < params.min_child_weight || h_right < params.min_child_weight {
            continue;
        }

        let gain = 0.5
            * (g_left * g_left / (h_left + lambda) + g_right * g_right / (h_right + lambda)
                - parent_score);

        if best.as_ref().map_or(true, |b| gain > b.gain) {
            best = Some(SplitCandidate {
                feature,
                threshold: (value + next_value) / 2.0,
                gain,
            });
        }
    }

    best
}

/// Gradient boosted regression trees (squared error loss)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedTreeRegressor {
    params: Hyperparameters,
    trees: Vec<TreeNode>,
    base_score: f64,
    n_features: usize,
}

impl BoostedTreeRegressor {
    pub fn new(params: Hyperparameters) -> Self {
        Self {
            params,
            trees: Vec::new(),
            base_score: 0.0,
            n_features: 0,
        }
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn is_fitted(&self) -> bool {
        self.n_features > 0
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.params.validate()?;

        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples == 0 || n_features == 0 {
            return Err(WindError::ShapeError {
                expected: "non-empty feature matrix".to_string(),
                actual: format!("{}x{}", n_samples, n_features),
            });
        }
        if y.len() != n_samples {
            return Err(WindError::ShapeError {
                expected: format!("{} targets", n_samples),
                actual: format!("{} targets", y.len()),
            });
        }

        self.n_features = n_features;
        self.base_score = y.mean().unwrap_or(0.0);
        self.trees.clear();

        let mut rng = match self.params.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let mut preds = Array1::from_elem(n_samples, self.base_score);
        let hess = Array1::from_elem(n_samples, 1.0);

        for _ in 0..self.params.n_estimators {
            // Squared error: grad = pred - y, hess = 1
            let grad: Array1<f64> = &preds - y;

            let row_indices = subsample(&mut rng, n_samples, self.params.subsample);
            let col_indices = subsample(&mut rng, n_features, self.params.colsample_bytree);

            let stats = GradientStats { x, grad: &grad, hess: &hess };
            let tree = build_tree(&stats, &row_indices, &col_indices, 0, &self.params);

            for (i, row) in x.outer_iter().enumerate() {
                preds[i] += self.params.learning_rate * tree.predict(row);
            }

            self.trees.push(tree);
        }

        Ok(())
    }

    /// Predict a single sample
    pub fn predict_one(&self, sample: ArrayView1<'_, f64>) -> Result<f64> {
        self.check_width(sample.len())?;
        Ok(self.raw_predict(sample))
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_width(x.ncols())?;
        Ok(x.outer_iter().map(|row| self.raw_predict(row)).collect())
    }

    /// R² on the given data
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let p = self.predict(x)?;
        Ok(r2_score(y, &p))
    }

    /// Split-count feature importances, normalized to sum to 1
    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        if !self.is_fitted() {
            return None;
        }
        let mut counts = vec![0.0f64; self.n_features];
        for tree in &self.trees {
            tree.count_splits(&mut counts);
        }
        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            counts.iter_mut().for_each(|c| *c /= total);
        }
        Some(Array1::from_vec(counts))
    }

    fn raw_predict(&self, sample: ArrayView1<'_, f64>) -> f64 {
        self.trees
            .iter()
            .fold(self.base_score, |acc, tree| {
                acc + self.params.learning_rate * tree.predict(sample)
            })
    }

    fn check_width(&self, width: usize) -> Result<()> {
        if !self.is_fitted() {
            return Err(WindError::ModelNotFitted);
        }
        if width != self.n_features {
            return Err(WindError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", width),
            });
        }
        Ok(())
    }
}

fn subsample(rng: &mut Xoshiro256PlusPlus, n: usize, ratio: f64) -> Vec<usize> {
    if ratio >= 1.0 {
        return (0..n).collect();
    }
    let k = (((n as f64) * ratio).ceil() as usize).max(1);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(k);
    indices.sort_unstable();
    indices
}
