/// Errors from dataset validation, stratified sampling, and split queries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CartError {
    /// Returned when a class holds fewer samples than its stratified allocation.
    #[error("class {class} has only {available} samples, but {requested} were requested")]
    InsufficientSamples {
        /// The class label that cannot be filled.
        class: usize,
        /// Number of samples of that class in the source.
        available: usize,
        /// Allocation requested for that class.
        requested: usize,
    },

    /// Returned when a dataset or sampling source has zero samples.
    #[error("dataset has zero samples")]
    EmptyDataset,

    /// Returned when a dataset declares zero feature columns.
    #[error("dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when a stratified subset of size zero is requested.
    #[error("subset size must be at least 1")]
    ZeroSubsetSize,

    /// Returned when a sample has a different number of features than declared.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The declared number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based position of the offending sample.
        sample_index: usize,
    },

    /// Returned when a sample's class label is not below the number of target names.
    #[error("sample {sample_index} has target {target}, but only {n_classes} classes are declared")]
    TargetOutOfRange {
        /// The offending class label.
        target: usize,
        /// The number of declared classes.
        n_classes: usize,
        /// The zero-based position of the offending sample.
        sample_index: usize,
    },

    /// Returned when a feature value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based position of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when a query names a feature column that does not exist.
    #[error("feature index {feature_index} is out of range for {n_features} features")]
    FeatureOutOfRange {
        /// The requested feature index.
        feature_index: usize,
        /// The number of features in the dataset.
        n_features: usize,
    },

    /// Returned when a threshold query is NaN or infinite.
    #[error("threshold {threshold} is not finite")]
    NonFiniteThreshold {
        /// The rejected threshold.
        threshold: f64,
    },

    /// Returned when min_samples_split is less than 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },
}
