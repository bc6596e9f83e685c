use std::fmt;
use std::sync::Arc;

use crate::impurity::ClassCounts;
use crate::sample::Sample;
use crate::split::BestSplit;

/// Zero-based feature column index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize,
)]
#[serde(transparent)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    /// Create a new feature index from a zero-based column position.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for FeatureIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier of a tree node.
///
/// Issued by a [`TreeBuilder`](crate::TreeBuilder) in increasing order. A leaf
/// keeps its id when it is replaced by an internal node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize,
)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Return the raw id.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Gini impurity value.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize)]
#[serde(transparent)]
pub struct Impurity(f64);

impl Impurity {
    /// Impurity of a pure or empty node.
    pub const ZERO: Impurity = Impurity(0.0);

    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw impurity value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Impurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Fields shared by leaves and internal nodes.
///
/// `size` always equals `counts.total()`. For an internal node, `impurity` is
/// the impurity of the node before it was split.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NodeStats {
    /// Stable node id.
    pub id: NodeId,
    /// Number of samples that reached this node.
    pub size: usize,
    /// Per-class sample counts.
    pub counts: ClassCounts,
    /// Gini impurity of the node's samples.
    pub impurity: Impurity,
}

/// A node of a binary decision tree under construction.
///
/// Nodes are immutable. Growing the tree replaces a `Leaf` by an `Internal`
/// node with two fresh leaves and rebuilds only the path from the root to it;
/// every other subtree is shared through `Arc`.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// A terminal node holding the samples that reached it.
    Leaf {
        /// Shared node fields.
        stats: NodeStats,
        /// The samples in this leaf, in the order of the parent partition.
        samples: Vec<Arc<Sample>>,
    },
    /// A split node with exactly two children.
    Internal {
        /// Shared node fields.
        stats: NodeStats,
        /// The winning split: feature, threshold, and per-side detail.
        split: BestSplit,
        /// Samples with `features[feature] <= threshold`.
        left: Arc<TreeNode>,
        /// Samples with `features[feature] > threshold`.
        right: Arc<TreeNode>,
    },
}

impl TreeNode {
    /// Return the fields shared by both variants.
    #[must_use]
    pub fn stats(&self) -> &NodeStats {
        match self {
            TreeNode::Leaf { stats, .. } | TreeNode::Internal { stats, .. } => stats,
        }
    }

    /// Return the stable node id.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.stats().id
    }

    /// Return the number of samples that reached this node.
    #[must_use]
    pub fn size(&self) -> usize {
        self.stats().size
    }

    /// Return the per-class sample counts.
    #[must_use]
    pub fn counts(&self) -> &ClassCounts {
        &self.stats().counts
    }

    /// Return the impurity at this node (before splitting for internal nodes).
    #[must_use]
    pub fn impurity(&self) -> Impurity {
        self.stats().impurity
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }

    /// Return the split feature of an internal node.
    #[must_use]
    pub fn feature(&self) -> Option<FeatureIndex> {
        match self {
            TreeNode::Internal { split, .. } => Some(split.feature),
            TreeNode::Leaf { .. } => None,
        }
    }

    /// Return the split threshold of an internal node.
    #[must_use]
    pub fn threshold(&self) -> Option<f64> {
        match self {
            TreeNode::Internal { split, .. } => Some(split.candidate.threshold),
            TreeNode::Leaf { .. } => None,
        }
    }

    /// Return the samples of a leaf, or `None` for an internal node.
    #[must_use]
    pub fn samples(&self) -> Option<&[Arc<Sample>]> {
        match self {
            TreeNode::Leaf { samples, .. } => Some(samples),
            TreeNode::Internal { .. } => None,
        }
    }
}
