use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    CartError,
    impurity::ClassCounts,
    node::{NodeId, NodeStats, TreeNode},
    sample::{Dataset, Sample},
    split::best_split,
};

/// Configuration for stepwise tree growth.
///
/// Construct via [`TreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default |
/// |---------------------|---------|
/// | `min_samples_split` | 2       |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeConfig {
    pub(crate) min_samples_split: usize,
}

impl TreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self { min_samples_split: 2 }
    }

    /// Set the minimum number of samples a leaf needs before a split is attempted.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Return the minimum samples required to split a leaf.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Create a [`TreeBuilder`] for trees over `dataset`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidMinSamplesSplit`] when `min_samples_split < 2`.
    pub fn builder(&self, dataset: &Dataset) -> Result<TreeBuilder, CartError> {
        if self.min_samples_split < 2 {
            return Err(CartError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        Ok(TreeBuilder {
            feature_names: dataset.feature_names().to_vec(),
            n_classes: dataset.n_classes(),
            min_samples_split: self.min_samples_split,
            next_id: 0,
        })
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Grows a binary decision tree one split at a time.
///
/// Owns the node-id counter: every leaf it creates gets the next id, and a
/// split node keeps the id of the leaf it replaces.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    feature_names: Vec<String>,
    n_classes: usize,
    min_samples_split: usize,
    next_id: u64,
}

impl TreeBuilder {
    fn issue_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create a leaf over `samples`, computing its counts and impurity.
    pub fn make_leaf(&mut self, samples: Vec<Arc<Sample>>) -> TreeNode {
        let counts = ClassCounts::of_samples(&samples, self.n_classes);
        TreeNode::Leaf {
            stats: NodeStats {
                id: self.issue_id(),
                size: samples.len(),
                impurity: counts.gini(),
                counts,
            },
            samples,
        }
    }

    /// Create the root leaf holding every sample of `dataset`.
    pub fn root(&mut self, dataset: &Dataset) -> Arc<TreeNode> {
        Arc::new(self.make_leaf(dataset.samples().to_vec()))
    }

    /// Return `true` when `node` is a leaf that passes the size and purity guards.
    fn passes_guards(&self, node: &TreeNode) -> bool {
        match node {
            TreeNode::Leaf { stats, .. } => {
                stats.size >= self.min_samples_split && !stats.counts.is_pure()
            }
            TreeNode::Internal { .. } => false,
        }
    }

    /// Split a leaf at its best (feature, threshold).
    ///
    /// Returns `None`, leaving the leaf as it is, when `node` is already
    /// internal, has fewer than `min_samples_split` samples, holds a single
    /// class, or has no candidate split (every feature constant). Otherwise
    /// returns an internal node with the leaf's id and two fresh leaves.
    pub fn try_split(&mut self, node: &TreeNode) -> Option<TreeNode> {
        if !self.passes_guards(node) {
            return None;
        }
        let TreeNode::Leaf { stats, samples } = node else {
            return None;
        };

        let split = best_split(samples, self.n_classes, &self.feature_names)?;
        let (left, right): (Vec<_>, Vec<_>) = samples
            .iter()
            .cloned()
            .partition(|s| s.value(split.feature) <= split.threshold());

        let left = Arc::new(self.make_leaf(left));
        let right = Arc::new(self.make_leaf(right));
        debug!(
            node = stats.id.value(),
            feature = split.feature.index(),
            threshold = split.threshold(),
            n_left = left.size(),
            n_right = right.size(),
            "leaf split"
        );

        Some(TreeNode::Internal {
            stats: stats.clone(),
            split,
            left,
            right,
        })
    }

    /// Split the first splittable leaf in depth-first, left-before-right order.
    ///
    /// Only the path from the root to that leaf is rebuilt; all other
    /// subtrees are shared with `root`. Returns `root` itself when no leaf
    /// can be split.
    pub fn expand_one(&mut self, root: &Arc<TreeNode>) -> Arc<TreeNode> {
        self.expand(root).unwrap_or_else(|| Arc::clone(root))
    }

    fn expand(&mut self, node: &Arc<TreeNode>) -> Option<Arc<TreeNode>> {
        match node.as_ref() {
            TreeNode::Leaf { .. } => self.try_split(node).map(Arc::new),
            TreeNode::Internal {
                stats,
                split,
                left,
                right,
            } => {
                if let Some(new_left) = self.expand(left) {
                    return Some(Arc::new(TreeNode::Internal {
                        stats: stats.clone(),
                        split: split.clone(),
                        left: new_left,
                        right: Arc::clone(right),
                    }));
                }
                let new_right = self.expand(right)?;
                Some(Arc::new(TreeNode::Internal {
                    stats: stats.clone(),
                    split: split.clone(),
                    left: Arc::clone(left),
                    right: new_right,
                }))
            }
        }
    }

    /// Return `true` when no leaf of `node` can be split any further.
    ///
    /// Unlike [`any_splittable`], this also treats an impure leaf whose
    /// samples share one feature vector as finished.
    #[must_use]
    pub fn is_fully_grown(&self, node: &TreeNode) -> bool {
        match node {
            TreeNode::Leaf { samples, .. } => {
                !self.passes_guards(node)
                    || best_split(samples, self.n_classes, &self.feature_names).is_none()
            }
            TreeNode::Internal { left, right, .. } => {
                self.is_fully_grown(left) && self.is_fully_grown(right)
            }
        }
    }

    /// Expand `root` until it is fully grown or `max_steps` splits were made.
    ///
    /// Returns the grown tree and the number of splits performed.
    #[instrument(skip(self, root), fields(root_size = root.size()))]
    pub fn grow(&mut self, root: &Arc<TreeNode>, max_steps: Option<usize>) -> (Arc<TreeNode>, usize) {
        let mut tree = Arc::clone(root);
        let mut steps = 0;
        while max_steps.is_none_or(|max| steps < max) {
            match self.expand(&tree) {
                Some(next) => {
                    tree = next;
                    steps += 1;
                }
                None => break,
            }
        }
        debug!(steps, n_leaves = n_leaves(&tree), depth = depth(&tree), "tree grown");
        (tree, steps)
    }
}

/// Return `true` if any leaf below `node` has at least two samples and more
/// than one class.
#[must_use]
pub fn any_splittable(node: &TreeNode) -> bool {
    match node {
        TreeNode::Leaf { stats, .. } => stats.size >= 2 && !stats.counts.is_pure(),
        TreeNode::Internal { left, right, .. } => any_splittable(left) || any_splittable(right),
    }
}

/// Return the number of leaves.
#[must_use]
pub fn n_leaves(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Internal { left, right, .. } => n_leaves(left) + n_leaves(right),
    }
}

/// Return the total number of nodes (internal and leaves).
#[must_use]
pub fn n_nodes(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Internal { left, right, .. } => 1 + n_nodes(left) + n_nodes(right),
    }
}

/// Return the depth of the tree; a lone root leaf has depth 0.
#[must_use]
pub fn depth(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 0,
        TreeNode::Internal { left, right, .. } => 1 + depth(left).max(depth(right)),
    }
}

/// Render the tree as an indented outline, one node per line.
#[must_use]
pub fn render_tree(node: &TreeNode) -> String {
    let mut output = String::new();
    output.push_str(&describe(node));
    output.push('\n');
    if let TreeNode::Internal { left, right, .. } = node {
        render_children(left, right, "", &mut output);
    }
    output
}

fn render_children(left: &TreeNode, right: &TreeNode, prefix: &str, output: &mut String) {
    for (child, is_last) in [(left, false), (right, true)] {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", describe(child)));
        if let TreeNode::Internal { left, right, .. } = child {
            let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
            render_children(left, right, &child_prefix, output);
        }
    }
}

fn describe(node: &TreeNode) -> String {
    let stats = node.stats();
    let summary = format!(
        "n={} counts={:?} gini={}",
        stats.size,
        stats.counts.as_slice(),
        stats.impurity
    );
    match node {
        TreeNode::Leaf { .. } => format!("{} leaf {summary}", stats.id),
        TreeNode::Internal { split, .. } => format!(
            "{} {} <= {:.3} {summary}",
            stats.id,
            split.feature_name,
            split.threshold()
        ),
    }
}
