use tracing::trace;

use crate::impurity::ClassCounts;
use crate::node::{FeatureIndex, Impurity};
use crate::sample::Sample;

/// One side of a binary split.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SideSummary {
    /// Number of samples on this side.
    pub size: usize,
    /// Per-class counts on this side.
    pub counts: ClassCounts,
    /// Gini impurity of this side.
    pub impurity: Impurity,
}

impl SideSummary {
    fn from_counts(counts: ClassCounts) -> Self {
        Self {
            size: counts.total(),
            impurity: counts.gini(),
            counts,
        }
    }
}

/// A threshold on one feature together with the partition it induces.
///
/// Samples with `value <= threshold` go left, the rest go right.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SplitCandidate {
    /// The split boundary.
    pub threshold: f64,
    /// Samples at or below the threshold.
    pub left: SideSummary,
    /// Samples above the threshold.
    pub right: SideSummary,
    /// Size-weighted mean of the two side impurities.
    pub weighted_impurity: Impurity,
}

impl SplitCandidate {
    fn from_counts(threshold: f64, left: ClassCounts, right: ClassCounts) -> Self {
        let left = SideSummary::from_counts(left);
        let right = SideSummary::from_counts(right);
        let weighted_impurity = weighted_impurity(&left, &right);
        Self {
            threshold,
            left,
            right,
            weighted_impurity,
        }
    }
}

/// The best split of a sample set across all features.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BestSplit {
    /// Winning feature column.
    pub feature: FeatureIndex,
    /// Name of the winning feature column.
    pub feature_name: String,
    /// Threshold and partition detail.
    #[serde(flatten)]
    pub candidate: SplitCandidate,
    /// Impurity of the unsplit sample set.
    pub parent_impurity: Impurity,
    /// `parent_impurity - weighted_impurity`.
    pub gain: f64,
}

impl BestSplit {
    fn new(
        feature: FeatureIndex,
        feature_name: String,
        candidate: SplitCandidate,
        parent_impurity: Impurity,
    ) -> Self {
        let gain = parent_impurity.value() - candidate.weighted_impurity.value();
        Self {
            feature,
            feature_name,
            candidate,
            parent_impurity,
            gain,
        }
    }

    /// Return the split threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.candidate.threshold
    }

    /// Return the weighted impurity of the two children.
    #[must_use]
    pub fn weighted_impurity(&self) -> Impurity {
        self.candidate.weighted_impurity
    }
}

/// Live feedback for an arbitrary threshold on one feature.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ThresholdImpurity {
    /// The evaluated threshold.
    pub threshold: f64,
    /// Size-weighted impurity of the induced split.
    pub weighted_impurity: f64,
    /// Number of samples at or below the threshold.
    pub left_count: usize,
    /// Number of samples above the threshold.
    pub right_count: usize,
    /// Gini impurity of the left side.
    pub left_gini: f64,
    /// Gini impurity of the right side.
    pub right_gini: f64,
}

impl From<&SplitCandidate> for ThresholdImpurity {
    fn from(candidate: &SplitCandidate) -> Self {
        Self {
            threshold: candidate.threshold,
            weighted_impurity: candidate.weighted_impurity.value(),
            left_count: candidate.left.size,
            right_count: candidate.right.size,
            left_gini: candidate.left.impurity.value(),
            right_gini: candidate.right.impurity.value(),
        }
    }
}

/// Size-weighted impurity of two sides; zero when both are empty.
fn weighted_impurity(left: &SideSummary, right: &SideSummary) -> Impurity {
    let total = left.size + right.size;
    if total == 0 {
        return Impurity::ZERO;
    }
    let n = total as f64;
    Impurity::new(
        (left.size as f64 / n) * left.impurity.value()
            + (right.size as f64 / n) * right.impurity.value(),
    )
}

/// Partition `samples` at `threshold` on one feature and score the result.
///
/// A side may be empty; it then contributes nothing to the weighted impurity.
///
/// # Panics
///
/// Panics if a sample has no value for `feature` or a target not below
/// `n_classes`.
#[must_use]
pub fn evaluate_split<S: AsRef<Sample>>(
    samples: &[S],
    feature: FeatureIndex,
    threshold: f64,
    n_classes: usize,
) -> SplitCandidate {
    let mut left = ClassCounts::zeros(n_classes);
    let mut right = ClassCounts::zeros(n_classes);
    for sample in samples {
        let sample = sample.as_ref();
        if sample.value(feature) <= threshold {
            left.add(sample.target);
        } else {
            right.add(sample.target);
        }
    }
    SplitCandidate::from_counts(threshold, left, right)
}

/// Find the lowest-impurity threshold on one feature.
///
/// Sorts the `(value, target)` pairs and scans left to right, moving one
/// sample at a time from the right counts to the left counts. Every boundary
/// between two distinct values is scored at its midpoint, so the thresholds
/// visited are exactly [`candidate_thresholds`](crate::candidate_thresholds)
/// of the feature column, in increasing order. Ties keep the smallest
/// threshold.
///
/// Returns `None` when the feature has fewer than two distinct values.
///
/// # Panics
///
/// Panics if a sample has no value for `feature` or a target not below
/// `n_classes`.
#[must_use]
pub fn best_split_for_feature<S: AsRef<Sample>>(
    samples: &[S],
    feature: FeatureIndex,
    n_classes: usize,
) -> Option<SplitCandidate> {
    let mut sorted: Vec<(f64, usize)> = samples
        .iter()
        .map(|s| {
            let s = s.as_ref();
            (s.value(feature), s.target)
        })
        .collect();
    sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

    let mut left_counts = ClassCounts::zeros(n_classes);
    let mut right_counts = ClassCounts::of_samples(samples, n_classes);
    let mut best: Option<SplitCandidate> = None;

    for i in 0..sorted.len().saturating_sub(1) {
        let (value, target) = sorted[i];
        left_counts.add(target);
        right_counts.remove(target);

        // No boundary between equal values.
        let next = sorted[i + 1].0;
        if value == next {
            continue;
        }

        let candidate =
            SplitCandidate::from_counts((value + next) / 2.0, left_counts.clone(), right_counts.clone());
        if best
            .as_ref()
            .is_none_or(|b| candidate.weighted_impurity < b.weighted_impurity)
        {
            best = Some(candidate);
        }
    }

    best
}

/// Find the lowest-impurity split across all features.
///
/// Features are scanned in ascending index order and a later feature only
/// wins with strictly lower weighted impurity, so ties keep the smallest
/// feature index.
///
/// Returns `None` when no feature has two distinct values.
///
/// # Panics
///
/// Panics if a sample has fewer features than `feature_names` or a target not
/// below `n_classes`.
#[must_use]
pub fn best_split<S: AsRef<Sample>>(
    samples: &[S],
    n_classes: usize,
    feature_names: &[String],
) -> Option<BestSplit> {
    let parent_impurity = ClassCounts::of_samples(samples, n_classes).gini();

    let mut best: Option<(FeatureIndex, SplitCandidate)> = None;
    for feature in (0..feature_names.len()).map(FeatureIndex::new) {
        let Some(candidate) = best_split_for_feature(samples, feature, n_classes) else {
            continue;
        };
        trace!(
            feature = feature.index(),
            threshold = candidate.threshold,
            weighted_impurity = candidate.weighted_impurity.value(),
            "best threshold for feature"
        );
        if best
            .as_ref()
            .is_none_or(|(_, b)| candidate.weighted_impurity < b.weighted_impurity)
        {
            best = Some((feature, candidate));
        }
    }

    let (feature, candidate) = best?;
    Some(BestSplit::new(
        feature,
        feature_names[feature.index()].clone(),
        candidate,
        parent_impurity,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impurity::gini;

    fn samples(rows: &[(&[f64], usize)]) -> Vec<Sample> {
        rows.iter()
            .enumerate()
            .map(|(i, (features, target))| Sample::new(i, features.to_vec(), *target))
            .collect()
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    // --- evaluate_split ---

    #[test]
    fn evaluate_split_counts_and_weights() {
        let data = samples(&[
            (&[1.0], 0),
            (&[2.0], 0),
            (&[3.0], 1),
            (&[4.0], 1),
            (&[5.0], 0),
        ]);
        let c = evaluate_split(&data, FeatureIndex::new(0), 2.5, 2);
        assert_eq!(c.left.size, 2);
        assert_eq!(c.right.size, 3);
        assert_eq!(c.left.counts.as_slice(), &[2, 0]);
        assert_eq!(c.right.counts.as_slice(), &[1, 2]);
        assert_eq!(c.left.impurity.value(), 0.0);
        let expected = 0.6 * (4.0 / 9.0);
        assert!((c.weighted_impurity.value() - expected).abs() < 1e-12);
    }

    #[test]
    fn value_equal_to_threshold_goes_left() {
        let data = samples(&[(&[1.0], 0), (&[2.0], 1)]);
        let c = evaluate_split(&data, FeatureIndex::new(0), 1.0, 2);
        assert_eq!(c.left.size, 1);
        assert_eq!(c.right.size, 1);
        assert_eq!(c.weighted_impurity.value(), 0.0);
    }

    #[test]
    fn empty_side_contributes_nothing() {
        let data = samples(&[(&[1.0], 0), (&[2.0], 1)]);
        let c = evaluate_split(&data, FeatureIndex::new(0), 0.0, 2);
        assert_eq!(c.left.size, 0);
        assert_eq!(c.left.impurity.value(), 0.0);
        assert!((c.weighted_impurity.value() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_sample_set_scores_zero() {
        let data: Vec<Sample> = Vec::new();
        let c = evaluate_split(&data, FeatureIndex::new(0), 1.0, 3);
        assert_eq!(c.left.size + c.right.size, 0);
        assert_eq!(c.weighted_impurity.value(), 0.0);
    }

    // --- best_split_for_feature ---

    #[test]
    fn separable_data_finds_correct_split() {
        let data = samples(&[
            (&[1.0], 0),
            (&[2.0], 0),
            (&[3.0], 0),
            (&[10.0], 1),
            (&[11.0], 1),
            (&[12.0], 1),
        ]);
        let split = best_split_for_feature(&data, FeatureIndex::new(0), 2).expect("should split");
        assert!((split.threshold - 6.5).abs() < f64::EPSILON);
        assert_eq!(split.left.size, 3);
        assert_eq!(split.right.size, 3);
        assert_eq!(split.weighted_impurity.value(), 0.0);
    }

    #[test]
    fn constant_feature_returns_none() {
        let data = samples(&[(&[5.0], 0), (&[5.0], 0), (&[5.0], 1), (&[5.0], 1)]);
        assert!(best_split_for_feature(&data, FeatureIndex::new(0), 2).is_none());
    }

    #[test]
    fn tied_thresholds_keep_smallest() {
        // 1.5 and 3.5 both leave a [1, 2] side of weight 3/4 and a pure side.
        let data = samples(&[(&[1.0], 0), (&[2.0], 1), (&[3.0], 1), (&[4.0], 0)]);
        let split = best_split_for_feature(&data, FeatureIndex::new(0), 2).unwrap();
        let mirror = evaluate_split(&data, FeatureIndex::new(0), 3.5, 2);
        assert_eq!(split.weighted_impurity, mirror.weighted_impurity);
        assert!((split.threshold - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn sweep_matches_direct_evaluation() {
        let data = samples(&[
            (&[4.9], 0),
            (&[5.1], 1),
            (&[4.9], 1),
            (&[6.3], 2),
            (&[5.8], 2),
            (&[5.1], 0),
            (&[6.0], 1),
        ]);
        let swept = best_split_for_feature(&data, FeatureIndex::new(0), 3).unwrap();
        let direct = evaluate_split(&data, FeatureIndex::new(0), swept.threshold, 3);
        assert_eq!(swept, direct);
    }

    // --- best_split ---

    #[test]
    fn identical_columns_pick_lowest_feature_index() {
        let data = samples(&[
            (&[1.0, 1.0], 0),
            (&[2.0, 2.0], 0),
            (&[3.0, 3.0], 1),
            (&[4.0, 4.0], 1),
        ]);
        let best = best_split(&data, 2, &names(2)).unwrap();
        assert_eq!(best.feature, FeatureIndex::new(0));
        assert_eq!(best.feature_name, "f0");
    }

    #[test]
    fn strictly_better_later_feature_wins() {
        // Feature 0 alternates classes; feature 1 separates them perfectly.
        let data = samples(&[
            (&[1.0, 0.0], 0),
            (&[2.0, 9.0], 1),
            (&[3.0, 0.0], 0),
            (&[4.0, 9.0], 1),
        ]);
        let best = best_split(&data, 2, &names(2)).unwrap();
        assert_eq!(best.feature, FeatureIndex::new(1));
        assert!((best.threshold() - 4.5).abs() < f64::EPSILON);
        assert!((best.gain - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn gain_is_parent_minus_weighted() {
        let data = samples(&[
            (&[1.0], 0),
            (&[2.0], 0),
            (&[3.0], 1),
            (&[4.0], 2),
            (&[5.0], 2),
        ]);
        let best = best_split(&data, 3, &names(1)).unwrap();
        let parent = gini(&[2, 1, 2]).value();
        assert!((best.parent_impurity.value() - parent).abs() < 1e-12);
        assert!((best.gain - (parent - best.weighted_impurity().value())).abs() < 1e-12);
    }

    #[test]
    fn no_distinct_values_anywhere_is_none() {
        let data = samples(&[(&[1.0, 7.0], 0), (&[1.0, 7.0], 1)]);
        assert!(best_split(&data, 2, &names(2)).is_none());
    }

    #[test]
    fn pure_set_with_distinct_values_still_has_a_candidate() {
        let data = samples(&[(&[1.0], 1), (&[2.0], 1)]);
        let best = best_split(&data, 2, &names(1)).unwrap();
        assert_eq!(best.weighted_impurity().value(), 0.0);
        assert_eq!(best.gain, 0.0);
    }

    #[test]
    fn threshold_impurity_from_candidate() {
        let data = samples(&[(&[1.0], 0), (&[2.0], 1), (&[3.0], 1)]);
        let c = evaluate_split(&data, FeatureIndex::new(0), 1.5, 2);
        let t = ThresholdImpurity::from(&c);
        assert_eq!(t.left_count, 1);
        assert_eq!(t.right_count, 2);
        assert_eq!(t.left_gini, 0.0);
        assert_eq!(t.right_gini, 0.0);
        assert_eq!(t.weighted_impurity, 0.0);
    }

}
