//! Random forest classifier with Gini splits.
//!
//! Each tree is grown on a bootstrap sample and considers
//! `max(1, floor(sqrt(n_features)))` randomly chosen features at every split.
//! Predictions average the leaf class distributions of all trees.

use crate::config::ModelPipelineConfig;
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// A single classification tree over class indices `0..n_classes`.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: TreeNode,
    n_classes: usize,
}

struct TreeParams {
    n_classes: usize,
    max_features: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
}

impl DecisionTree {
    fn fit(
        x: &Array2<f64>,
        y: &[usize],
        indices: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let root = grow(x, y, indices, 0, params, rng);
        Self {
            root,
            n_classes: params.n_classes,
        }
    }

    /// Class distribution of the leaf `row` falls into.
    pub fn predict_proba_row(&self, row: ArrayView1<f64>) -> &[f64] {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { distribution } => return distribution,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

fn class_counts(y: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &i in indices {
        counts[y[i]] += 1;
    }
    counts
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

fn leaf(counts: &[usize], total: usize) -> TreeNode {
    let distribution = counts
        .iter()
        .map(|&c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
        .collect();
    TreeNode::Leaf { distribution }
}

fn grow(
    x: &Array2<f64>,
    y: &[usize],
    indices: Vec<usize>,
    depth: usize,
    params: &TreeParams,
    rng: &mut StdRng,
) -> TreeNode {
    let total = indices.len();
    let counts = class_counts(y, &indices, params.n_classes);
    let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
    let depth_reached = params.max_depth.is_some_and(|max| depth >= max);

    if pure || depth_reached || total < params.min_samples_split {
        return leaf(&counts, total);
    }

    let Some((feature, threshold)) = best_split(x, y, &indices, &counts, params, rng) else {
        return leaf(&counts, total);
    };

    let (left, right): (Vec<usize>, Vec<usize>) =
        indices.into_iter().partition(|&i| x[[i, feature]] <= threshold);

    TreeNode::Split {
        feature,
        threshold,
        left: Box::new(grow(x, y, left, depth + 1, params, rng)),
        right: Box::new(grow(x, y, right, depth + 1, params, rng)),
    }
}

/// Lowest weighted Gini impurity split among a random feature subset.
/// `None` when no candidate improves on the parent node.
fn best_split(
    x: &Array2<f64>,
    y: &[usize],
    indices: &[usize],
    parent_counts: &[usize],
    params: &TreeParams,
    rng: &mut StdRng,
) -> Option<(usize, f64)> {
    let total = indices.len();
    let parent_impurity = gini(parent_counts, total);
    let features = sample(rng, x.ncols(), params.max_features.min(x.ncols()));

    let mut best: Option<(usize, f64, f64)> = None;
    for feature in features.iter() {
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        let mut left_counts = vec![0; params.n_classes];
        let mut right_counts = parent_counts.to_vec();

        for pos in 1..total {
            let prev = sorted[pos - 1];
            left_counts[y[prev]] += 1;
            right_counts[y[prev]] -= 1;

            let lo = x[[prev, feature]];
            let hi = x[[sorted[pos], feature]];
            if lo == hi {
                continue;
            }

            let impurity = (pos as f64 * gini(&left_counts, pos)
                + (total - pos) as f64 * gini(&right_counts, total - pos))
                / total as f64;
            if impurity < parent_impurity && best.is_none_or(|(_, _, b)| impurity < b) {
                best = Some((feature, (lo + hi) / 2.0, impurity));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

/// Bagged ensemble of [`DecisionTree`]s.
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTree>,
    n_classes: usize,
}

impl RandomForestClassifier {
    /// Fit on `x` with class indices `y` in `0..n_classes`.
    ///
    /// `x` must have at least one row and one column.
    pub fn fit(x: &Array2<f64>, y: &[usize], n_classes: usize, config: &ModelPipelineConfig) -> Self {
        let n_rows = x.nrows();
        let n_features = x.ncols();
        let params = TreeParams {
            n_classes,
            max_features: ((n_features as f64).sqrt().floor() as usize).max(1),
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
        };
        let mut rng = StdRng::seed_from_u64(config.random_seed);

        let trees = (0..config.n_estimators)
            .map(|_| {
                let indices: Vec<usize> = if config.bootstrap {
                    (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
                } else {
                    (0..n_rows).collect()
                };
                DecisionTree::fit(x, y, indices, &params, &mut rng)
            })
            .collect();

        Self { trees, n_classes }
    }

    /// Averaged class probabilities, one row per sample.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        if self.trees.is_empty() {
            return proba;
        }
        for (i, row) in x.rows().into_iter().enumerate() {
            for tree in &self.trees {
                for (k, p) in tree.predict_proba_row(row).iter().enumerate() {
                    proba[[i, k]] += p;
                }
            }
        }
        proba /= self.trees.len() as f64;
        proba
    }

    /// Most probable class index per sample. Ties go to the lower index.
    pub fn predict(&self, x: &Array2<f64>) -> Vec<usize> {
        self.predict_proba(x)
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |(best_k, best_p), (k, &p)| {
                        if p > best_p { (k, p) } else { (best_k, best_p) }
                    })
                    .0
            })
            .collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Array2<f64>, Vec<usize>) {
        let mut values = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let x0 = i as f64;
            let x1 = (i % 3) as f64;
            values.extend_from_slice(&[x0, x1]);
            labels.push(if i < 20 { 0 } else { 1 });
        }
        (Array2::from_shape_vec((40, 2), values).unwrap(), labels)
    }

    #[test]
    fn test_forest_learns_threshold() {
        let (x, y) = separable();
        let config = ModelPipelineConfig::builder().n_estimators(25).build().unwrap();
        let forest = RandomForestClassifier::fit(&x, &y, 2, &config);

        assert_eq!(forest.n_trees(), 25);
        let predictions = forest.predict(&x);
        let correct = predictions.iter().zip(&y).filter(|(p, t)| p == t).count();
        assert!(correct >= 38, "only {} of 40 correct", correct);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, y) = separable();
        let config = ModelPipelineConfig::builder().n_estimators(10).build().unwrap();
        let proba = RandomForestClassifier::fit(&x, &y, 2, &config).predict_proba(&x);
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_seed_makes_fit_deterministic() {
        let (x, y) = separable();
        let config = ModelPipelineConfig::builder().n_estimators(5).build().unwrap();
        let a = RandomForestClassifier::fit(&x, &y, 2, &config).predict_proba(&x);
        let b = RandomForestClassifier::fit(&x, &y, 2, &config).predict_proba(&x);
        assert_eq!(a, b);
    }

    #[test]
    fn test_max_depth_one_is_a_stump() {
        let x = Array2::from_shape_vec((6, 1), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let y = vec![0, 0, 1, 1, 0, 1];
        let config = ModelPipelineConfig::builder()
            .n_estimators(1)
            .max_depth(1)
            .bootstrap(false)
            .build()
            .unwrap();
        let forest = RandomForestClassifier::fit(&x, &y, 2, &config);
        assert!(matches!(
            &forest.trees[0].root,
            TreeNode::Split { left, right, .. }
                if matches!(**left, TreeNode::Leaf { .. }) && matches!(**right, TreeNode::Leaf { .. })
        ));
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(&[5, 5], 10), 0.5);
        assert_eq!(gini(&[10, 0], 10), 0.0);
    }
}
