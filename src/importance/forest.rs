//! Random-forest regressor used to score axis sensitivity.
//!
//! The forest is fitted on a cell's `(point, value)` samples. Two importance
//! measures are read off the fitted trees:
//!
//! - **impurity decrease** (mean decrease in squared error per feature,
//!   normalized per tree and then across the forest), and
//! - **fANOVA main effects** (variance of the marginal prediction when only
//!   one feature is known).
//!
//! # Reference
//!
//! Breiman, L. (2001). "Random Forests." Machine Learning 45.
//! Hutter, F., Hoos, H. & Leyton-Brown, K. (2014). "An Efficient
//! Approach for Assessing Hyperparameter Importance." ICML 2014.

/// Configuration for the random forest.
///
/// Use [`Default::default()`] for settings that work for the small sample
/// batches a single cell holds.
#[derive(Debug, Clone)]
pub struct ForestConfig {
    /// Number of trees in the forest (default: 32).
    pub n_trees: usize,
    /// Maximum depth of each tree. `None` for unlimited (default: `None`).
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node (default: 2).
    pub min_samples_split: usize,
    /// Minimum samples required in a leaf node (default: 1).
    pub min_samples_leaf: usize,
    /// Features considered per split. `None` uses every feature (default: `None`).
    pub max_features: Option<usize>,
    /// Draw a bootstrap resample per tree (default: `true`).
    pub bootstrap: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 32,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
        }
    }
}

// --- Decision Tree ---

/// A node in the regression tree (arena-allocated).
#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        n_samples: usize,
    },
}

/// Best split found for one node.
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// A regression tree grown on squared-error reduction.
#[derive(Debug, Clone)]
struct DecisionTree {
    nodes: Vec<TreeNode>,
    /// Summed squared-error reduction per feature.
    gains: Vec<f64>,
}

impl DecisionTree {
    fn build(
        data: &[Vec<f64>],
        targets: &[f64],
        indices: &[usize],
        config: &ForestConfig,
        rng: &mut fastrand::Rng,
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            gains: vec![0.0; data[0].len()],
        };
        tree.build_node(data, targets, indices, 0, config, rng);
        tree
    }

    fn push_leaf(&mut self, value: f64, n_samples: usize) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(TreeNode::Leaf { value, n_samples });
        idx
    }

    #[allow(clippy::cast_precision_loss)]
    fn build_node(
        &mut self,
        data: &[Vec<f64>],
        targets: &[f64],
        indices: &[usize],
        depth: usize,
        config: &ForestConfig,
        rng: &mut fastrand::Rng,
    ) -> usize {
        let n = indices.len();
        let mean = indices.iter().map(|&i| targets[i]).sum::<f64>() / n as f64;

        if n < config.min_samples_split.max(2) || config.max_depth.is_some_and(|d| depth >= d) {
            return self.push_leaf(mean, n);
        }

        let sse: f64 = indices.iter().map(|&i| (targets[i] - mean).powi(2)).sum();
        if sse <= 0.0 {
            return self.push_leaf(mean, n);
        }

        let n_features = data[0].len();
        let max_features = config.max_features.unwrap_or(n_features).clamp(1, n_features);
        let candidates = partial_shuffle(n_features, max_features, rng);

        let Some(best) = best_split(data, targets, indices, &candidates, sse, config) else {
            return self.push_leaf(mean, n);
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| data[i][best.feature] <= best.threshold);

        if left_indices.is_empty() || right_indices.is_empty() {
            return self.push_leaf(mean, n);
        }

        self.gains[best.feature] += best.gain;

        // Reserve slot for this split node (placeholder replaced below)
        let node_idx = self.push_leaf(0.0, 0);
        let left = self.build_node(data, targets, &left_indices, depth + 1, config, rng);
        let right = self.build_node(data, targets, &right_indices, depth + 1, config, rng);

        self.nodes[node_idx] = TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
            n_samples: n,
        };

        node_idx
    }

    /// Marginal prediction where only the features in `subset` are known.
    ///
    /// Unknown features are integrated out by weighting both branches with
    /// their training-sample fractions.
    fn marginal_predict(&self, subset: &[usize], vals: &[f64]) -> f64 {
        self.marginal_predict_at(0, subset, vals)
    }

    #[allow(clippy::cast_precision_loss)]
    fn marginal_predict_at(&self, idx: usize, subset: &[usize], vals: &[f64]) -> f64 {
        match self.nodes[idx] {
            TreeNode::Leaf { value, .. } => value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
                n_samples,
            } => {
                if subset.contains(&feature) {
                    if vals[feature] <= threshold {
                        self.marginal_predict_at(left, subset, vals)
                    } else {
                        self.marginal_predict_at(right, subset, vals)
                    }
                } else {
                    let total = n_samples as f64;
                    let l_w = self.n_samples(left) as f64 / total;
                    let r_w = self.n_samples(right) as f64 / total;
                    l_w * self.marginal_predict_at(left, subset, vals)
                        + r_w * self.marginal_predict_at(right, subset, vals)
                }
            }
        }
    }

    fn n_samples(&self, idx: usize) -> usize {
        match self.nodes[idx] {
            TreeNode::Leaf { n_samples, .. } | TreeNode::Split { n_samples, .. } => n_samples,
        }
    }
}

// --- Helper Functions ---

/// Select `k` random indices from `0..n` using partial Fisher-Yates shuffle.
fn partial_shuffle(n: usize, k: usize, rng: &mut fastrand::Rng) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    let k = k.min(n);
    for i in 0..k {
        let j = rng.usize(i..n);
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}

/// Sweep every candidate feature in sorted order and return the threshold with
/// the largest squared-error reduction.
#[allow(clippy::cast_precision_loss)]
fn best_split(
    data: &[Vec<f64>],
    targets: &[f64],
    indices: &[usize],
    candidates: &[usize],
    sse: f64,
    config: &ForestConfig,
) -> Option<SplitCandidate> {
    let n = indices.len();
    let total_sum: f64 = indices.iter().map(|&i| targets[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| targets[i] * targets[i]).sum();
    let min_leaf = config.min_samples_leaf.max(1);

    let mut best: Option<SplitCandidate> = None;
    let mut order: Vec<usize> = indices.to_vec();

    for &feat in candidates {
        order.sort_by(|&a, &b| data[a][feat].total_cmp(&data[b][feat]));

        let (mut l_sum, mut l_sq) = (0.0, 0.0);
        for pos in 0..n - 1 {
            let y = targets[order[pos]];
            l_sum += y;
            l_sq += y * y;

            let here = data[order[pos]][feat];
            let next = data[order[pos + 1]][feat];
            #[allow(clippy::float_cmp)]
            if here == next {
                continue;
            }

            let l_n = pos + 1;
            let r_n = n - l_n;
            if l_n < min_leaf || r_n < min_leaf {
                continue;
            }

            let r_sum = total_sum - l_sum;
            let r_sq = total_sq - l_sq;
            let l_sse = l_sq - l_sum * l_sum / l_n as f64;
            let r_sse = r_sq - r_sum * r_sum / r_n as f64;
            let gain = sse - l_sse - r_sse;

            if gain > best.as_ref().map_or(0.0, |b| b.gain) {
                best = Some(SplitCandidate {
                    feature: feat,
                    threshold: f64::midpoint(here, next),
                    gain,
                });
            }
        }
    }

    best
}

/// Population variance of a slice.
#[allow(clippy::cast_precision_loss)]
fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Scale `values` to sum to one; all-zero input stays zero.
fn normalize(values: &mut [f64]) {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        for v in values.iter_mut() {
            *v /= total;
        }
    }
}

// --- Forest ---

/// A fitted random forest.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Fit a forest on `data` (`n_samples` rows of `n_features` columns).
    ///
    /// Returns `None` when `data` is empty, has zero columns, or its length
    /// differs from `targets`.
    #[must_use]
    pub fn fit(
        data: &[Vec<f64>],
        targets: &[f64],
        config: &ForestConfig,
        rng: &mut fastrand::Rng,
    ) -> Option<Self> {
        let n_samples = data.len();
        if n_samples == 0 || n_samples != targets.len() {
            return None;
        }
        let n_features = data[0].len();
        if n_features == 0 || data.iter().any(|row| row.len() != n_features) {
            return None;
        }

        let trees = (0..config.n_trees.max(1))
            .map(|_| {
                let rows: Vec<usize> = if config.bootstrap {
                    (0..n_samples).map(|_| rng.usize(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                DecisionTree::build(data, targets, &rows, config, rng)
            })
            .collect();

        Some(Self { trees, n_features })
    }

    /// Number of features the forest was fitted on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Mean decrease in impurity per feature, summing to one (or all zero
    /// when no tree found a useful split).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn impurity_importances(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            let mut gains = tree.gains.clone();
            normalize(&mut gains);
            for (t, g) in total.iter_mut().zip(&gains) {
                *t += g;
            }
        }
        normalize(&mut total);
        total
    }

    /// fANOVA main effects `Var[E[f | x_j]]` evaluated over `data`,
    /// normalized to sum to one.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn main_effects(&self, data: &[Vec<f64>]) -> Vec<f64> {
        let n_trees = self.trees.len() as f64;
        let mut effects: Vec<f64> = (0..self.n_features)
            .map(|j| {
                let subset = [j];
                let preds: Vec<f64> = data
                    .iter()
                    .map(|row| {
                        self.trees
                            .iter()
                            .map(|t| t.marginal_predict(&subset, row))
                            .sum::<f64>()
                            / n_trees
                    })
                    .collect();
                variance(&preds)
            })
            .collect();
        normalize(&mut effects);
        effects
    }
}
