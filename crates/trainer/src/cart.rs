//! CART (Classification and Regression Tree) builder
//!
//! Implements exact-greedy regression tree construction with squared-error
//! impurity. Thresholds are midpoints between consecutive distinct feature
//! values; samples with `feature <= threshold` go left.

use rand::rngs::StdRng;
use rand::seq::index;
use turnout_core::{Node, Tree};

use crate::deterministic::SplitTieBreaker;

/// Growth limits for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    /// `None` grows until leaves are pure or too small to split
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` considers all of them
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

/// Tree plus the impurity decrease credited to each feature while growing it
#[derive(Clone, Debug)]
pub struct BuiltTree {
    pub tree: Tree,
    pub importances: Vec<f64>,
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn new(feature_idx: usize, threshold: f64, gain: f64) -> Self {
        Self {
            feature_idx,
            threshold,
            gain,
            tie_breaker: SplitTieBreaker::new(feature_idx, threshold),
        }
    }

    fn beats(&self, other: &SplitCandidate) -> bool {
        self.gain > other.gain || (self.gain == other.gain && self.tie_breaker < other.tie_breaker)
    }
}

/// Running sums for squared-error impurity
#[derive(Debug, Clone, Copy, Default)]
struct Moments {
    count: usize,
    sum: f64,
    sum_sq: f64,
}

impl Moments {
    fn add(&mut self, y: f64) {
        self.count += 1;
        self.sum += y;
        self.sum_sq += y * y;
    }

    fn remove(&mut self, y: f64) {
        self.count -= 1;
        self.sum -= y;
        self.sum_sq -= y * y;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// Sum of squared deviations from the mean
    fn sse(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.sum_sq - self.sum * self.sum / self.count as f64).max(0.0)
    }
}

/// Builds regression trees over a shared feature matrix
pub struct CartBuilder<'a> {
    features: &'a [Vec<f64>],
    targets: &'a [f64],
    config: TreeConfig,
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    /// `features` and `targets` must be row-aligned
    pub fn new(features: &'a [Vec<f64>], targets: &'a [f64], config: TreeConfig) -> Self {
        debug_assert_eq!(features.len(), targets.len());
        let feature_count = features.first().map(Vec::len).unwrap_or(0);

        Self {
            features,
            targets,
            config,
            feature_count,
        }
    }

    /// Grow a tree on the given sample indices (repeats allowed, as in a
    /// bootstrap sample)
    pub fn build(&self, samples: &[usize], rng: &mut StdRng) -> BuiltTree {
        let mut nodes = Vec::new();
        let mut importances = vec![0.0; self.feature_count];

        self.build_node(samples.to_vec(), 0, &mut nodes, &mut importances, rng);

        BuiltTree {
            tree: Tree::new(nodes),
            importances,
        }
    }

    /// Recursively build tree nodes, returning the index of the new node
    fn build_node(
        &self,
        indices: Vec<usize>,
        depth: usize,
        nodes: &mut Vec<Node>,
        importances: &mut [f64],
        rng: &mut StdRng,
    ) -> i32 {
        let current_idx = nodes.len() as i32;

        let mut moments = Moments::default();
        for &idx in &indices {
            moments.add(self.targets[idx]);
        }
        let leaf_value = moments.mean();

        let depth_exhausted = self.config.max_depth.is_some_and(|max| depth >= max);
        if depth_exhausted
            || indices.len() < self.config.min_samples_split
            || indices.len() < 2 * self.config.min_samples_leaf
            || self.is_pure(&indices)
        {
            nodes.push(Node::leaf(current_idx, leaf_value));
            return current_idx;
        }

        let split = match self.find_best_split(&indices, &moments, rng) {
            Some(s) if s.gain > 0.0 => s,
            _ => {
                nodes.push(Node::leaf(current_idx, leaf_value));
                return current_idx;
            }
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&idx| self.features[idx][split.feature_idx] <= split.threshold);

        importances[split.feature_idx] += split.gain;

        // Reserve the slot; children are patched in once built
        nodes.push(Node::internal(
            current_idx,
            split.feature_idx as i32,
            split.threshold,
            -1,
            -1,
        ));

        let left_idx = self.build_node(left_indices, depth + 1, nodes, importances, rng);
        let right_idx = self.build_node(right_indices, depth + 1, nodes, importances, rng);

        let node = &mut nodes[current_idx as usize];
        node.left = left_idx;
        node.right = right_idx;

        current_idx
    }

    fn is_pure(&self, indices: &[usize]) -> bool {
        match indices.first() {
            Some(&first) => indices.iter().all(|&i| self.targets[i] == self.targets[first]),
            None => true,
        }
    }

    /// Features examined at one node
    fn candidate_features(&self, rng: &mut StdRng) -> Vec<usize> {
        match self.config.max_features {
            Some(k) if k < self.feature_count => {
                let mut chosen = index::sample(rng, self.feature_count, k).into_vec();
                chosen.sort_unstable();
                chosen
            }
            _ => (0..self.feature_count).collect(),
        }
    }

    /// Find the best split using a sorted sweep per feature
    fn find_best_split(
        &self,
        indices: &[usize],
        parent: &Moments,
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let min_leaf = self.config.min_samples_leaf;
        let parent_sse = parent.sse();
        let mut best: Option<SplitCandidate> = None;

        for feature_idx in self.candidate_features(rng) {
            let mut order = indices.to_vec();
            order.sort_by(|&a, &b| {
                self.features[a][feature_idx].total_cmp(&self.features[b][feature_idx])
            });

            let mut left = Moments::default();
            let mut right = *parent;

            for pos in 1..order.len() {
                let prev = order[pos - 1];
                left.add(self.targets[prev]);
                right.remove(self.targets[prev]);

                let lo = self.features[prev][feature_idx];
                let hi = self.features[order[pos]][feature_idx];
                if lo == hi || left.count < min_leaf || right.count < min_leaf {
                    continue;
                }

                let gain = parent_sse - left.sse() - right.sse();
                let candidate = SplitCandidate::new(feature_idx, midpoint(lo, hi), gain);

                best = match best {
                    Some(current) if !candidate.beats(&current) => Some(current),
                    _ => Some(candidate),
                };
            }
        }

        best
    }
}

/// Threshold between two adjacent distinct values that keeps `lo` on the left
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid >= hi {
        lo
    } else {
        mid
    }
}
