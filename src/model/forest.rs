//! Random forest: bagged decision trees over random feature subspaces
//!
//! Every tree draws its rows (a bootstrap resample, or all rows) and a
//! subset of `ceil(sqrt(n_features))` columns from its own generator seeded
//! with `base_seed + tree_index`. A fixed `random_state` therefore fixes the
//! samples and subspaces regardless of rayon scheduling. The fitted trees
//! are only approximately stable: linfa-trees settles a tied leaf vote by
//! hash map iteration order, which varies between runs.

use crate::core::{ClassifyError, FittedModel, Result};
use crate::utils::validation;
use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_trees::DecisionTree;
use log::debug;
use ndarray::{Array1, Array2, Axis};
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::BinaryTarget;

/// How many worker threads build the trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Parallelism {
    /// Rayon's global pool, one worker per processing unit
    #[default]
    AllCores,
    /// A dedicated pool with this many workers
    Threads(usize),
}

impl fmt::Display for Parallelism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parallelism::AllCores => write!(f, "all cores"),
            Parallelism::Threads(n) => write!(f, "{n} thread(s)"),
        }
    }
}

/// Random forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    /// Train each tree on a resample drawn with replacement
    pub bootstrap: bool,
    pub parallelism: Parallelism,
    /// Base seed; drawn from entropy when absent
    pub random_state: Option<u64>,
}

impl ForestConfig {
    pub const N_ESTIMATORS_MIN: usize = 100;
    pub const N_ESTIMATORS_MAX: usize = 5000;
    pub const MAX_DEPTH_MIN: usize = 1;
    pub const MAX_DEPTH_MAX: usize = 20;

    pub fn new(n_estimators: usize, max_depth: usize, bootstrap: bool) -> Self {
        Self {
            n_estimators,
            max_depth,
            bootstrap,
            ..Self::default()
        }
    }

    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validation::check_range(
            "n_estimators",
            self.n_estimators,
            Self::N_ESTIMATORS_MIN,
            Self::N_ESTIMATORS_MAX,
        )?;
        validation::check_range(
            "max_depth",
            self.max_depth,
            Self::MAX_DEPTH_MIN,
            Self::MAX_DEPTH_MAX,
        )?;
        if self.parallelism == Parallelism::Threads(0) {
            return Err(ClassifyError::InvalidParameter(
                "thread count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of columns each tree sees
    pub fn subspace_size(n_features: usize) -> usize {
        ((n_features as f64).sqrt().ceil() as usize).clamp(1, n_features.max(1))
    }

    pub(crate) fn fit(
        &self,
        x: &Array2<f64>,
        y: &Array1<usize>,
        target: BinaryTarget,
    ) -> Result<FittedForest> {
        let base_seed = self.random_state.unwrap_or_else(rand::random);
        let labels = target.encode(y);
        debug!(
            "Growing {} trees (max_depth {}, bootstrap {}, seed {}, {})",
            self.n_estimators, self.max_depth, self.bootstrap, base_seed, self.parallelism
        );

        let grow = || {
            (0..self.n_estimators)
                .into_par_iter()
                .map(|i| self.grow_tree(x, &labels, base_seed.wrapping_add(i as u64)))
                .collect::<Result<Vec<_>>>()
        };

        let trees = match self.parallelism {
            Parallelism::AllCores => grow()?,
            Parallelism::Threads(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ClassifyError::Fit(format!("thread pool: {e}")))?;
                pool.install(grow)?
            }
        };

        Ok(FittedForest { trees, target })
    }

    fn grow_tree(&self, x: &Array2<f64>, labels: &Array1<bool>, seed: u64) -> Result<ForestTree> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let n_rows = x.nrows();
        let n_features = x.ncols();

        let rows: Vec<usize> = if self.bootstrap {
            (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
        } else {
            (0..n_rows).collect()
        };

        let mut features = sample(&mut rng, n_features, Self::subspace_size(n_features)).into_vec();
        features.sort_unstable();

        let records = x.select(Axis(0), &rows).select(Axis(1), &features);
        let targets = labels.select(Axis(0), &rows);
        let tree = DecisionTree::params()
            .max_depth(Some(self.max_depth))
            .fit(&Dataset::new(records, targets))
            .map_err(|e| ClassifyError::Fit(format!("decision tree: {e}")))?;

        Ok(ForestTree { tree, features })
    }
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 1,
            bootstrap: true,
            parallelism: Parallelism::AllCores,
            random_state: None,
        }
    }
}

impl fmt::Display for ForestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n_estimators={}, max_depth={}, bootstrap={}, jobs={}",
            self.n_estimators, self.max_depth, self.bootstrap, self.parallelism
        )?;
        if let Some(seed) = self.random_state {
            write!(f, ", random_state={seed}")?;
        }
        Ok(())
    }
}

/// One ensemble member and the columns it was trained on
struct ForestTree {
    tree: DecisionTree<f64, bool>,
    features: Vec<usize>,
}

impl ForestTree {
    fn votes(&self, x: &Array2<f64>) -> Array1<bool> {
        self.tree.predict(&x.select(Axis(1), &self.features))
    }
}

/// Fitted forest; decision scores are positive vote shares
pub struct FittedForest {
    trees: Vec<ForestTree>,
    target: BinaryTarget,
}

impl FittedForest {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Column subsets used by each tree, in tree order
    pub fn feature_subsets(&self) -> Vec<&[usize]> {
        self.trees.iter().map(|t| t.features.as_slice()).collect()
    }
}

impl FittedModel for FittedForest {
    fn predict(&self, x: &Array2<f64>) -> Array1<usize> {
        self.decision_scores(x)
            .mapv(|share| self.target.decode(share > 0.5))
    }

    fn decision_scores(&self, x: &Array2<f64>) -> Array1<f64> {
        if self.trees.is_empty() {
            return Array1::zeros(x.nrows());
        }
        let positive_votes = self
            .trees
            .par_iter()
            .map(|member| member.votes(x).mapv(|v| if v { 1.0 } else { 0.0 }))
            .reduce(|| Array1::zeros(x.nrows()), |a, b| a + b);
        positive_votes / self.trees.len() as f64
    }
}
