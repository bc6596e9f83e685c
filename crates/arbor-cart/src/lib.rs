//! CART split exploration: stratified sampling, Gini impurity, threshold
//! search, and stepwise tree growth.
//!
//! The core is a set of pure functions over sample slices. [`Workbench`]
//! wraps them into a session holding one sampled subset and the tree grown
//! on it so far.

mod error;
mod impurity;
mod node;
mod sample;
mod sampler;
mod session;
mod split;
mod threshold;
mod tree;

pub use error::CartError;
pub use impurity::{ClassCounts, gini};
pub use node::{FeatureIndex, Impurity, NodeId, NodeStats, TreeNode};
pub use sample::{Dataset, Sample};
pub use sampler::{allocate, lcg_next, stratified_subset};
pub use session::{Workbench, WorkbenchConfig};
pub use split::{
    BestSplit, SideSummary, SplitCandidate, ThresholdImpurity, best_split, best_split_for_feature,
    evaluate_split,
};
pub use threshold::{candidate_thresholds, snap_to_threshold};
pub use tree::{TreeBuilder, TreeConfig, any_splittable, depth, n_leaves, n_nodes, render_tree};
