//! Labeled samples and the validated dataset container.

use std::sync::Arc;

use crate::error::CartError;
use crate::impurity::ClassCounts;
use crate::node::FeatureIndex;

/// An immutable labeled feature vector.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Sample {
    /// Stable position of the sample in the dataset it was loaded from.
    pub index: usize,
    /// Feature values, one per feature column.
    pub features: Vec<f64>,
    /// Class label in `[0, n_classes)`.
    pub target: usize,
}

impl Sample {
    /// Create a new sample.
    #[must_use]
    pub fn new(index: usize, features: Vec<f64>, target: usize) -> Self {
        Self { index, features, target }
    }

    /// Return the value of one feature.
    ///
    /// # Panics
    ///
    /// Panics if `feature` is not below the sample's arity.
    #[must_use]
    pub fn value(&self, feature: FeatureIndex) -> f64 {
        self.features[feature.index()]
    }
}

impl AsRef<Sample> for Sample {
    fn as_ref(&self) -> &Sample {
        self
    }
}

/// Feature names, class names, and the samples they describe.
///
/// Every sample has exactly `feature_names.len()` finite features and a
/// target below `target_names.len()`. Samples are reference counted so that
/// subsets and tree leaves share them instead of copying.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Dataset {
    feature_names: Vec<String>,
    target_names: Vec<String>,
    samples: Vec<Arc<Sample>>,
}

impl Dataset {
    /// Build a dataset from fully specified samples.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`CartError::EmptyDataset`] | `samples` is empty |
    /// | [`CartError::ZeroFeatures`] | `feature_names` is empty |
    /// | [`CartError::FeatureCountMismatch`] | a sample's arity differs from `feature_names.len()` |
    /// | [`CartError::TargetOutOfRange`] | a target is not below `target_names.len()` |
    /// | [`CartError::NonFiniteValue`] | a feature value is NaN or infinite |
    pub fn new(
        feature_names: Vec<String>,
        target_names: Vec<String>,
        samples: Vec<Sample>,
    ) -> Result<Self, CartError> {
        if samples.is_empty() {
            return Err(CartError::EmptyDataset);
        }
        if feature_names.is_empty() {
            return Err(CartError::ZeroFeatures);
        }

        let n_features = feature_names.len();
        let n_classes = target_names.len();
        for (sample_index, sample) in samples.iter().enumerate() {
            if sample.features.len() != n_features {
                return Err(CartError::FeatureCountMismatch {
                    expected: n_features,
                    got: sample.features.len(),
                    sample_index,
                });
            }
            if sample.target >= n_classes {
                return Err(CartError::TargetOutOfRange {
                    target: sample.target,
                    n_classes,
                    sample_index,
                });
            }
            if let Some(feature_index) = sample.features.iter().position(|v| !v.is_finite()) {
                return Err(CartError::NonFiniteValue {
                    sample_index,
                    feature_index,
                });
            }
        }

        Ok(Self {
            feature_names,
            target_names,
            samples: samples.into_iter().map(Arc::new).collect(),
        })
    }

    /// Build a dataset from `(features, target)` rows, using the row position as
    /// each sample's index.
    ///
    /// # Errors
    ///
    /// Same as [`Dataset::new`].
    pub fn from_rows(
        feature_names: Vec<String>,
        target_names: Vec<String>,
        rows: impl IntoIterator<Item = (Vec<f64>, usize)>,
    ) -> Result<Self, CartError> {
        let samples = rows
            .into_iter()
            .enumerate()
            .map(|(index, (features, target))| Sample::new(index, features, target))
            .collect();
        Self::new(feature_names, target_names, samples)
    }

    /// Derive a dataset with the same names over a different sample list.
    ///
    /// The samples must come from a dataset with the same names.
    pub(crate) fn with_samples(&self, samples: Vec<Arc<Sample>>) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            target_names: self.target_names.clone(),
            samples,
        }
    }

    /// Return the feature column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the class names, indexed by class label.
    #[must_use]
    pub fn target_names(&self) -> &[String] {
        &self.target_names
    }

    /// Return the samples in dataset order.
    #[must_use]
    pub fn samples(&self) -> &[Arc<Sample>] {
        &self.samples
    }

    /// Return the number of samples.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Return the number of declared classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.target_names.len()
    }

    /// Return per-class sample counts over the whole dataset.
    #[must_use]
    pub fn class_counts(&self) -> ClassCounts {
        ClassCounts::of_samples(&self.samples, self.n_classes())
    }

    /// Check that `feature` names an existing column.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::FeatureOutOfRange`] otherwise.
    pub fn check_feature(&self, feature: FeatureIndex) -> Result<(), CartError> {
        if feature.index() < self.n_features() {
            Ok(())
        } else {
            Err(CartError::FeatureOutOfRange {
                feature_index: feature.index(),
                n_features: self.n_features(),
            })
        }
    }

    /// Return one feature column in sample order.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::FeatureOutOfRange`] when `feature` does not exist.
    pub fn feature_values(&self, feature: FeatureIndex) -> Result<Vec<f64>, CartError> {
        self.check_feature(feature)?;
        Ok(self.column(feature))
    }

    /// One feature column in sample order; `feature` must already be checked.
    pub(crate) fn column(&self, feature: FeatureIndex) -> Vec<f64> {
        self.samples.iter().map(|s| s.value(feature)).collect()
    }

    /// Return the smallest and largest observed value of one feature.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::FeatureOutOfRange`] when `feature` does not exist.
    pub fn feature_range(&self, feature: FeatureIndex) -> Result<(f64, f64), CartError> {
        let values = self.feature_values(feature)?;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok((min, max))
    }
}
