//! Bagged regression trees, fitted into node tables.
//!
//! Each tree is grown on a bootstrap sample with variance-reduction splits at
//! the midpoint between adjacent distinct feature values. All features are
//! candidates at every split. This is a stand-in for a full training
//! library, not a tuned learner.

use anyhow::{ensure, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::config::TrainerConfig;
use crate::forest::{NodeTable, TrainedEnsemble};

/// Fits a tree ensemble from feature rows and regression labels.
pub trait EnsembleTrainer: Send + Sync {
    fn fit(&self, samples: &[Vec<f64>], labels: &[f64]) -> Result<Box<dyn TrainedEnsemble + Send + Sync>>;
}

#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    tables: Vec<NodeTable>,
}

impl TrainedEnsemble for RandomForestRegressor {
    fn node_tables(&self) -> &[NodeTable] {
        &self.tables
    }
}

#[derive(Debug, Clone)]
pub struct RandomForestTrainer {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub seed: u64,
    pub min_samples_split: usize,
}

impl Default for RandomForestTrainer {
    fn default() -> Self {
        Self::from_config(&TrainerConfig::default())
    }
}

impl RandomForestTrainer {
    pub fn from_config(config: &TrainerConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            max_depth: config.max_depth,
            seed: config.seed,
            min_samples_split: 2,
        }
    }

    pub fn fit_forest(&self, samples: &[Vec<f64>], labels: &[f64]) -> Result<RandomForestRegressor> {
        ensure!(!samples.is_empty(), "cannot fit on zero samples");
        ensure!(
            samples.len() == labels.len(),
            "{} samples but {} labels",
            samples.len(),
            labels.len()
        );
        let n_features = samples[0].len();
        ensure!(
            samples.iter().all(|row| row.len() == n_features),
            "samples have inconsistent feature counts"
        );

        let mut rng = StdRng::seed_from_u64(self.seed);
        let n = samples.len();

        let tables = (0..self.n_estimators)
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let mut table = NodeTable::new();
                self.grow(&mut table, samples, labels, bootstrap, 0);
                table
            })
            .collect();

        Ok(RandomForestRegressor { tables })
    }

    fn grow(
        &self,
        table: &mut NodeTable,
        samples: &[Vec<f64>],
        labels: &[f64],
        indices: Vec<usize>,
        depth: usize,
    ) -> usize {
        let mean = indices.iter().map(|&i| labels[i]).sum::<f64>() / indices.len() as f64;

        let pure = indices.iter().all(|&i| labels[i] == labels[indices[0]]);
        if depth >= self.max_depth || indices.len() < self.min_samples_split || pure {
            return table.push_leaf(mean);
        }

        let Some(split) = best_split(samples, labels, &indices) else {
            return table.push_leaf(mean);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| samples[i][split.feature] <= split.threshold);

        let node = table.push_split(split.feature, split.threshold, mean);
        let left_id = self.grow(table, samples, labels, left, depth + 1);
        let right_id = self.grow(table, samples, labels, right, depth + 1);
        table.set_children(node, left_id, right_id);
        node
    }
}

impl EnsembleTrainer for RandomForestTrainer {
    fn fit(&self, samples: &[Vec<f64>], labels: &[f64]) -> Result<Box<dyn TrainedEnsemble + Send + Sync>> {
        Ok(Box::new(self.fit_forest(samples, labels)?))
    }
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
}

/// Split maximising `sum_l^2 / n_l + sum_r^2 / n_r`, which is the same as
/// minimising the children's summed squared error. Returns `None` when no
/// split improves on the parent.
fn best_split(samples: &[Vec<f64>], labels: &[f64], indices: &[usize]) -> Option<Split> {
    let n = indices.len() as f64;
    let total: f64 = indices.iter().map(|&i| labels[i]).sum();
    let mut best_score = total * total / n + 1e-12;
    let mut best = None;

    for feature in 0..samples[indices[0]].len() {
        let mut column: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (samples[i][feature], labels[i]))
            .collect();
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_sum = 0.0;
        for k in 0..column.len() - 1 {
            left_sum += column[k].1;
            let (here, next) = (column[k].0, column[k + 1].0);
            if here >= next {
                continue;
            }

            let n_left = (k + 1) as f64;
            let n_right = n - n_left;
            let right_sum = total - left_sum;
            let score = left_sum * left_sum / n_left + right_sum * right_sum / n_right;

            if score > best_score {
                let mut threshold = here + (next - here) / 2.0;
                if threshold >= next {
                    threshold = here;
                }
                best_score = score;
                best = Some(Split { feature, threshold });
            }
        }
    }

    best
}
