//! Least-squares gradient boosting over depth-limited regression trees.
//!
//! Stage `m` fits a tree to the residuals of stages `0..m` and is added with
//! shrinkage `learning_rate`. Stage 0 is the target mean. Fitting is fully
//! deterministic: splits are chosen by exhaustive search with stable ordering.

use serde::{Deserialize, Serialize};

use super::domain::FeatureVector;

const N: usize = FeatureVector::LEN;

/// Boosting hyper-parameters.
#[derive(Clone, Debug)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Flat regression tree; node 0 is the root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, x: &[f64; N]) -> f64 {
        let mut at = 0;
        loop {
            match self.nodes.get(at) {
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    at = if x[*feature] <= *threshold { *left } else { *right };
                }
                Some(Node::Leaf { value }) => return *value,
                None => return 0.0,
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoostedTrees {
    pub init: f64,
    pub learning_rate: f64,
    pub trees: Vec<Tree>,
}

impl BoostedTrees {
    pub fn fit(x: &[FeatureVector], y: &[f64], params: &BoostingParams) -> Self {
        let rows: Vec<[f64; N]> = x.iter().map(FeatureVector::to_array).collect();
        let init = y.iter().sum::<f64>() / y.len().max(1) as f64;
        let mut current = vec![init; y.len()];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let residual: Vec<f64> = y.iter().zip(&current).map(|(t, p)| t - p).collect();
            let mut builder = TreeBuilder {
                rows: &rows,
                residual: &residual,
                params,
                nodes: Vec::new(),
            };
            builder.grow((0..rows.len()).collect(), 0);
            let tree = Tree {
                nodes: builder.nodes,
            };

            for (pred, row) in current.iter_mut().zip(&rows) {
                *pred += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        Self {
            init,
            learning_rate: params.learning_rate,
            trees,
        }
    }

    pub fn predict(&self, features: &FeatureVector) -> f64 {
        let row = features.to_array();
        self.init
            + self.learning_rate * self.trees.iter().map(|t| t.predict(&row)).sum::<f64>()
    }
}

struct TreeBuilder<'a> {
    rows: &'a [[f64; N]],
    residual: &'a [f64],
    params: &'a BoostingParams,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl TreeBuilder<'_> {
    /// Grow the subtree for `idx`, returning its node index.
    fn grow(&mut self, idx: Vec<usize>, depth: usize) -> usize {
        let sum: f64 = idx.iter().map(|&i| self.residual[i]).sum();
        let mean = if idx.is_empty() { 0.0 } else { sum / idx.len() as f64 };

        let min_leaf = self.params.min_samples_leaf.max(1);
        let split = if depth < self.params.max_depth && idx.len() >= 2 * min_leaf {
            self.best_split(&idx, sum, min_leaf)
        } else {
            None
        };

        let Some(split) = split else {
            self.nodes.push(Node::Leaf { value: mean });
            return self.nodes.len() - 1;
        };

        let at = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });
        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = idx
            .into_iter()
            .partition(|&i| self.rows[i][split.feature] <= split.threshold);
        let left = self.grow(left_idx, depth + 1);
        let right = self.grow(right_idx, depth + 1);
        self.nodes[at] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        at
    }

    /// Split maximising `sum_l^2 / n_l + sum_r^2 / n_r`, if it beats no split.
    fn best_split(&self, idx: &[usize], total: f64, min_leaf: usize) -> Option<BestSplit> {
        let n = idx.len();
        let parent_score = total * total / n as f64;
        let mut best: Option<BestSplit> = None;
        let mut order = idx.to_vec();

        for feature in 0..N {
            order.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));
            let mut left_sum = 0.0;
            for pos in 0..n - 1 {
                left_sum += self.residual[order[pos]];
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let here = self.rows[order[pos]][feature];
                let next = self.rows[order[pos + 1]][feature];
                if here >= next {
                    continue;
                }
                let right_sum = total - left_sum;
                let score = left_sum * left_sum / n_left as f64
                    + right_sum * right_sum / n_right as f64;
                if score > parent_score + 1e-12 && best.as_ref().map_or(true, |b| score > b.score) {
                    best = Some(BestSplit {
                        feature,
                        threshold: here + (next - here) / 2.0,
                        score,
                    });
                }
            }
        }
        best
    }
}
