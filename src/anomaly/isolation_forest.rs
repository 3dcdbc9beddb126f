//! Isolation forest over the scaled evidence matrix
//!
//! Each tree partitions a random subsample with random axis-aligned cuts.
//! Records that are isolated after few cuts sit far from the bulk of the
//! evidence and receive scores close to 1.

use crate::anomaly::AnomalyDetector;
use crate::error::{EvidentiaError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand::seq::index;
use serde::{Deserialize, Serialize};
use tracing::debug;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Expected depth of an unsuccessful binary-search-tree lookup among `n`
/// points: c(n) = 2 H(n-1) - 2(n-1)/n, with H(i) ~ ln(i) + γ
pub(crate) fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// One randomly partitioned tree, nodes stored flat with the root first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    /// Grow a tree over `rows` of `x`, cutting at most `height_limit` times
    /// along any branch
    pub fn grow(x: &Array2<f64>, rows: &[usize], height_limit: usize, rng: &mut impl Rng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow_node(x, rows, 0, height_limit, rng);
        tree
    }

    fn grow_node(
        &mut self,
        x: &Array2<f64>,
        rows: &[usize],
        depth: usize,
        height_limit: usize,
        rng: &mut impl Rng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });

        if depth >= height_limit || rows.len() <= 1 || x.ncols() == 0 {
            return id;
        }

        let feature = rng.gen_range(0..x.ncols());
        let column = x.column(feature);
        let (lo, hi) = rows
            .iter()
            .map(|&r| column[r])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

        // constant on the drawn feature
        if hi - lo < 1e-10 {
            return id;
        }

        let threshold = rng.gen_range(lo..hi);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.iter().partition(|&&r| column[r] < threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            return id;
        }

        let left = self.grow_node(x, &left_rows, depth + 1, height_limit, rng);
        let right = self.grow_node(x, &right_rows, depth + 1, height_limit, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    /// Cuts needed to reach the leaf holding `sample`, plus the expected
    /// remaining depth among the rows that share that leaf
    pub fn path_length(&self, sample: ArrayView1<f64>) -> f64 {
        let mut id = 0;
        let mut depth = 0usize;
        while let Some(node) = self.nodes.get(id) {
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if sample[feature] < threshold { left } else { right };
                    depth += 1;
                }
                Node::Leaf { size } => return depth as f64 + average_path_length(size),
            }
        }
        depth as f64
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Trees plus the cut derived from the fitting rows
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FittedForest {
    trees: Vec<IsolationTree>,
    subsample: usize,
    threshold: f64,
}

impl FittedForest {
    /// s(x) = 2^(-E[h(x)] / c(ψ)), 0.5 when no tree can discriminate
    fn scores(&self, x: &Array2<f64>) -> Array1<f64> {
        let norm = average_path_length(self.subsample);
        x.rows()
            .into_iter()
            .map(|row| {
                if self.trees.is_empty() || norm <= 0.0 {
                    return 0.5;
                }
                let mean_depth = self.trees.iter().map(|t| t.path_length(row)).sum::<f64>()
                    / self.trees.len() as f64;
                2.0_f64.powf(-mean_depth / norm)
            })
            .collect()
    }
}

/// Seeded isolation forest; the same seed and rows always give the same labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    n_estimators: usize,
    max_samples: usize,
    contamination: f64,
    seed: u64,
    fitted: Option<FittedForest>,
}

impl IsolationForest {
    pub fn new() -> Self {
        Self {
            n_estimators: 200,
            max_samples: 256,
            contamination: 0.1,
            seed: 42,
            fitted: None,
        }
    }

    /// Set number of trees
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n.max(1);
        self
    }

    /// Set rows drawn per tree
    pub fn with_max_samples(mut self, n: usize) -> Self {
        self.max_samples = n.max(1);
        self
    }

    /// Set expected outlier proportion, clamped to [0, 0.5]
    pub fn with_contamination(mut self, c: f64) -> Self {
        self.contamination = if c.is_nan() { 0.0 } else { c.clamp(0.0, 0.5) };
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn contamination(&self) -> f64 {
        self.contamination
    }

    /// Fitted trees, empty before `fit` or after fitting zero rows
    pub fn trees(&self) -> &[IsolationTree] {
        self.fitted.as_ref().map(|f| f.trees.as_slice()).unwrap_or(&[])
    }
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::new()
    }
}

impl AnomalyDetector for IsolationForest {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() == 0 {
            return Err(EvidentiaError::EmptyFeatureSpace);
        }

        let n_rows = x.nrows();
        let subsample = self.max_samples.min(n_rows);
        let height_limit = (subsample.max(2) as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let trees: Vec<IsolationTree> = if n_rows == 0 {
            Vec::new()
        } else {
            (0..self.n_estimators)
                .map(|_| {
                    let rows = index::sample(&mut rng, n_rows, subsample).into_vec();
                    IsolationTree::grow(x, &rows, height_limit, &mut rng)
                })
                .collect()
        };

        let mut fitted = FittedForest {
            trees,
            subsample,
            threshold: f64::INFINITY,
        };

        // Rows scoring strictly above the (k+1)-th highest score are outliers,
        // k = round(contamination * rows). A tie group straddling rank k stays
        // inlier, so identical records never flip together.
        let n_outliers = ((self.contamination * n_rows as f64).round() as usize).min(n_rows);
        if n_outliers > 0 {
            let mut ranked = fitted.scores(x).to_vec();
            ranked.sort_by(|a, b| b.total_cmp(a));
            fitted.threshold = ranked[n_outliers.min(n_rows - 1)];
        }

        debug!(
            trees = fitted.trees.len(),
            subsample,
            height_limit,
            expected_outliers = n_outliers,
            threshold = fitted.threshold,
            "Fitted isolation forest"
        );
        self.fitted = Some(fitted);
        Ok(())
    }

    fn score_samples(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let fitted = self.fitted.as_ref().ok_or(EvidentiaError::ModelNotFitted)?;
        Ok(fitted.scores(x))
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>> {
        let threshold = self.threshold();
        Ok(self
            .score_samples(x)?
            .mapv(|s| if s > threshold { -1 } else { 1 }))
    }

    fn threshold(&self) -> f64 {
        self.fitted.as_ref().map_or(f64::INFINITY, |f| f.threshold)
    }
}
