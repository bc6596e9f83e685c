//! Class counting and Gini impurity.

use crate::node::Impurity;
use crate::sample::Sample;

/// Number of samples per class label within one sample set.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ClassCounts(Vec<usize>);

impl ClassCounts {
    /// Wrap an explicit count vector, indexed by class label.
    #[must_use]
    pub fn new(counts: Vec<usize>) -> Self {
        Self(counts)
    }

    /// All-zero counts for `n_classes` classes.
    #[must_use]
    pub fn zeros(n_classes: usize) -> Self {
        Self(vec![0; n_classes])
    }

    /// Count a sequence of class labels.
    ///
    /// # Panics
    ///
    /// Panics if a label is not below `n_classes`.
    #[must_use]
    pub fn from_targets(targets: impl IntoIterator<Item = usize>, n_classes: usize) -> Self {
        let mut counts = Self::zeros(n_classes);
        for target in targets {
            counts.add(target);
        }
        counts
    }

    /// Count the labels of a sample set.
    ///
    /// # Panics
    ///
    /// Panics if a sample's target is not below `n_classes`.
    #[must_use]
    pub fn of_samples<S: AsRef<Sample>>(samples: &[S], n_classes: usize) -> Self {
        Self::from_targets(samples.iter().map(|s| s.as_ref().target), n_classes)
    }

    pub(crate) fn add(&mut self, target: usize) {
        self.0[target] += 1;
    }

    pub(crate) fn remove(&mut self, target: usize) {
        self.0[target] -= 1;
    }

    /// Return the total number of samples counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Return the number of classes with a nonzero count.
    #[must_use]
    pub fn n_present(&self) -> usize {
        self.0.iter().filter(|&&c| c > 0).count()
    }

    /// Return `true` when at most one class is present.
    #[must_use]
    pub fn is_pure(&self) -> bool {
        self.n_present() <= 1
    }

    /// Return the number of classes (length of the count vector).
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.0.len()
    }

    /// Return the counts indexed by class label.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Return the Gini impurity of these counts.
    #[must_use]
    pub fn gini(&self) -> Impurity {
        gini(&self.0)
    }
}

/// Compute the Gini impurity `1 - Σ(p_i²)` of a class count vector.
///
/// Returns [`Impurity::ZERO`] for an empty partition (all counts zero). For
/// `k` classes present the result lies in `[0, 1 - 1/k]`.
#[must_use]
pub fn gini(counts: &[usize]) -> Impurity {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return Impurity::ZERO;
    }
    let n = total as f64;
    let sum_sq: f64 = counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum();
    Impurity::new(1.0 - sum_sq)
}
