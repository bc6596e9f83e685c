//! The interactive session: one sampled dataset generation and everything
//! derived from it.

use std::cell::OnceCell;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    CartError,
    node::{FeatureIndex, TreeNode},
    sample::Dataset,
    split::{BestSplit, ThresholdImpurity, best_split, evaluate_split},
    threshold::{candidate_thresholds, snap_to_threshold},
    tree::{TreeBuilder, TreeConfig},
};

/// Configuration for a [`Workbench`].
///
/// Construct via [`WorkbenchConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter     | Default              |
/// |---------------|----------------------|
/// | `subset_size` | 20                   |
/// | `seed`        | 42                   |
/// | `tree`        | [`TreeConfig::new`]  |
#[derive(Debug, Clone)]
pub struct WorkbenchConfig {
    pub(crate) subset_size: usize,
    pub(crate) seed: u32,
    pub(crate) tree: TreeConfig,
}

impl WorkbenchConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subset_size: 20,
            seed: 42,
            tree: TreeConfig::new(),
        }
    }

    /// Set the number of samples in the stratified subset.
    #[must_use]
    pub fn with_subset_size(mut self, subset_size: usize) -> Self {
        self.subset_size = subset_size;
        self
    }

    /// Set the seed of the first generation.
    #[must_use]
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Set the tree growth configuration.
    #[must_use]
    pub fn with_tree(mut self, tree: TreeConfig) -> Self {
        self.tree = tree;
        self
    }

    /// Return the subset size.
    #[must_use]
    pub fn subset_size(&self) -> usize {
        self.subset_size
    }

    /// Return the seed of the first generation.
    #[must_use]
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Return the tree growth configuration.
    #[must_use]
    pub fn tree(&self) -> &TreeConfig {
        &self.tree
    }

    /// Sample the first generation from `source` and open a session on it.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`CartError::ZeroSubsetSize`] | `subset_size` is zero |
    /// | [`CartError::InsufficientSamples`] | a class of `source` is smaller than its allocation |
    /// | [`CartError::InvalidMinSamplesSplit`] | the tree config is invalid |
    pub fn open(&self, source: Dataset) -> Result<Workbench, CartError> {
        let generation = Generation::sample(&source, self, self.seed)?;
        Ok(Workbench {
            config: self.clone(),
            source,
            current: generation,
            generation: 0,
        })
    }
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// State derived from one sampled subset. Replaced as a whole on regeneration.
#[derive(Debug)]
struct Generation {
    seed: u32,
    dataset: Dataset,
    thresholds: Vec<Vec<f64>>,
    best: OnceCell<Option<BestSplit>>,
    builder: TreeBuilder,
    tree: Arc<TreeNode>,
}

impl Generation {
    fn sample(source: &Dataset, config: &WorkbenchConfig, seed: u32) -> Result<Self, CartError> {
        let dataset = source.stratified_subset(config.subset_size, seed)?;
        let mut builder = config.tree.builder(&dataset)?;
        let tree = builder.root(&dataset);
        let thresholds = (0..dataset.n_features())
            .map(|f| candidate_thresholds(&dataset.column(FeatureIndex::new(f))))
            .collect();
        Ok(Self {
            seed,
            dataset,
            thresholds,
            best: OnceCell::new(),
            builder,
            tree,
        })
    }
}

/// An interactive split-exploration session.
///
/// Holds the full source dataset and exactly one sampled generation. All
/// queries answer against the current generation; [`Workbench::regenerate`]
/// swaps in a new one and drops every cached threshold, best split, and tree
/// of the old one.
#[derive(Debug)]
pub struct Workbench {
    config: WorkbenchConfig,
    source: Dataset,
    current: Generation,
    generation: u64,
}

impl Workbench {
    /// Replace the working subset with one drawn using `seed`.
    ///
    /// The new subset is built before anything is replaced, so on error the
    /// session keeps its current generation.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`CartError::ZeroSubsetSize`] | `subset_size` is zero |
    /// | [`CartError::InsufficientSamples`] | a class of the source is smaller than its allocation |
    /// | [`CartError::InvalidMinSamplesSplit`] | the tree config is invalid |
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn regenerate(&mut self, seed: u32) -> Result<&Dataset, CartError> {
        let next = Generation::sample(&self.source, &self.config, seed)?;
        self.current = next;
        self.generation += 1;
        debug!(generation = self.generation, seed, "subset regenerated");
        Ok(&self.current.dataset)
    }

    /// Return the current sampled subset.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.current.dataset
    }

    /// Return the full source dataset.
    #[must_use]
    pub fn source(&self) -> &Dataset {
        &self.source
    }

    /// Return the seed of the current generation.
    #[must_use]
    pub fn seed(&self) -> u32 {
        self.current.seed
    }

    /// Return how many times the subset was regenerated.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Return the session configuration.
    #[must_use]
    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    /// Score an arbitrary threshold on one feature over the current subset.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`CartError::FeatureOutOfRange`] | `feature` does not exist |
    /// | [`CartError::NonFiniteThreshold`] | `threshold` is NaN or infinite |
    pub fn impurity_of_threshold(
        &self,
        feature: FeatureIndex,
        threshold: f64,
    ) -> Result<ThresholdImpurity, CartError> {
        self.dataset().check_feature(feature)?;
        if !threshold.is_finite() {
            return Err(CartError::NonFiniteThreshold { threshold });
        }
        let candidate = evaluate_split(
            self.dataset().samples(),
            feature,
            threshold,
            self.dataset().n_classes(),
        );
        Ok(ThresholdImpurity::from(&candidate))
    }

    /// Return the lowest-impurity split of the whole current subset.
    ///
    /// Computed on first use and cached until the next regeneration.
    pub fn best_global_split(&self) -> Option<&BestSplit> {
        self.current
            .best
            .get_or_init(|| {
                let dataset = self.dataset();
                let best = best_split(dataset.samples(), dataset.n_classes(), dataset.feature_names());
                debug!(
                    feature = best.as_ref().map(|b| b.feature.index()),
                    threshold = best.as_ref().map(BestSplit::threshold),
                    "best global split computed"
                );
                best
            })
            .as_ref()
    }

    /// Return the candidate thresholds of one feature over the current subset.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::FeatureOutOfRange`] when `feature` does not exist.
    pub fn candidate_thresholds(&self, feature: FeatureIndex) -> Result<&[f64], CartError> {
        self.dataset().check_feature(feature)?;
        Ok(&self.current.thresholds[feature.index()])
    }

    /// Snap a raw marker position to the nearest candidate threshold.
    ///
    /// Falls back to `raw` when the feature has no candidates.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`CartError::FeatureOutOfRange`] | `feature` does not exist |
    /// | [`CartError::NonFiniteThreshold`] | `raw` is NaN or infinite |
    pub fn snap_threshold(&self, feature: FeatureIndex, raw: f64) -> Result<f64, CartError> {
        let candidates = self.candidate_thresholds(feature)?;
        if !raw.is_finite() {
            return Err(CartError::NonFiniteThreshold { threshold: raw });
        }
        Ok(snap_to_threshold(candidates, raw))
    }

    /// Return the starting position of a feature's threshold marker.
    ///
    /// The middle candidate (index `len / 2`) when candidates exist, otherwise
    /// the midpoint of the observed value range.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::FeatureOutOfRange`] when `feature` does not exist.
    pub fn initial_threshold(&self, feature: FeatureIndex) -> Result<f64, CartError> {
        let candidates = self.candidate_thresholds(feature)?;
        if let Some(&middle) = candidates.get(candidates.len() / 2) {
            return Ok(middle);
        }
        let (min, max) = self.dataset().feature_range(feature)?;
        Ok((min + max) / 2.0)
    }

    /// Return the tree grown so far in this generation.
    #[must_use]
    pub fn tree(&self) -> &Arc<TreeNode> {
        &self.current.tree
    }

    /// Split the next leaf of the tree, depth first and left before right.
    ///
    /// Returns `false` when no leaf could be split.
    pub fn build_tree_step(&mut self) -> bool {
        let generation = &mut self.current;
        let next = generation.builder.expand_one(&generation.tree);
        let changed = !Arc::ptr_eq(&next, &generation.tree);
        generation.tree = next;
        changed
    }

    /// Return `true` when no leaf of the current tree can be split.
    #[must_use]
    pub fn is_fully_grown(&self) -> bool {
        self.current.builder.is_fully_grown(&self.current.tree)
    }

    /// Grow the current tree until it is fully grown.
    ///
    /// Returns the number of splits performed.
    pub fn grow_fully(&mut self) -> usize {
        self.grow(None)
    }

    /// Grow the current tree by at most `max_steps` splits (unbounded for `None`).
    ///
    /// Returns the number of splits performed.
    pub fn grow(&mut self, max_steps: Option<usize>) -> usize {
        let generation = &mut self.current;
        let (tree, steps) = generation.builder.grow(&generation.tree, max_steps);
        generation.tree = tree;
        steps
    }
}
