//! Candidate split thresholds and snapping to them.

/// Midpoints between consecutive distinct values, in increasing order.
///
/// Returns an empty vector when fewer than two distinct values exist.
#[must_use]
pub fn candidate_thresholds(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    sorted.dedup();
    sorted.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
}

/// Snap a raw value to the nearest candidate threshold.
///
/// `candidates` must be sorted ascending, as returned by
/// [`candidate_thresholds`]. Values outside the candidate range clamp to the
/// first or last candidate, an exact tie between two neighbors resolves to
/// the lower one, and the raw value is returned unchanged when there are no
/// candidates or when it is NaN.
#[must_use]
pub fn snap_to_threshold(candidates: &[f64], raw: f64) -> f64 {
    let (Some(&first), Some(&last)) = (candidates.first(), candidates.last()) else {
        return raw;
    };
    if raw.is_nan() {
        return raw;
    }
    if raw <= first {
        return first;
    }
    if raw >= last {
        return last;
    }
    // first < raw < last, so 1 <= upper_idx < len.
    let upper_idx = candidates.partition_point(|&c| c < raw);
    let lower = candidates[upper_idx - 1];
    let upper = candidates[upper_idx];
    if raw - lower <= upper - raw { lower } else { upper }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- candidate_thresholds ---

    #[test]
    fn midpoints_of_distinct_sorted_values() {
        let t = candidate_thresholds(&[3.0, 1.0, 2.0, 1.0, 5.0]);
        assert_eq!(t, vec![1.5, 2.5, 4.0]);
    }

    #[test]
    fn fewer_than_two_distinct_values_yields_nothing() {
        assert!(candidate_thresholds(&[]).is_empty());
        assert!(candidate_thresholds(&[4.2]).is_empty());
        assert!(candidate_thresholds(&[4.2, 4.2, 4.2]).is_empty());
    }

    #[test]
    fn one_fewer_than_distinct_and_strictly_between() {
        let values = [5.1, 4.9, 4.7, 4.6, 5.0, 5.4, 4.6, 5.0, 4.4, 4.9];
        let t = candidate_thresholds(&values);

        let mut distinct = values.to_vec();
        distinct.sort_unstable_by(f64::total_cmp);
        distinct.dedup();

        assert_eq!(t.len(), distinct.len() - 1);
        for (i, &th) in t.iter().enumerate() {
            assert!(distinct[i] < th && th < distinct[i + 1]);
        }
        assert!(t.windows(2).all(|w| w[0] < w[1]));
    }

    // --- snap_to_threshold ---

    #[test]
    fn snap_without_candidates_returns_raw() {
        assert_eq!(snap_to_threshold(&[], 3.7), 3.7);
    }

    #[test]
    fn snap_nan_returns_raw() {
        let c = [1.5, 2.5, 4.0];
        assert!(snap_to_threshold(&c, f64::NAN).is_nan());
        assert_eq!(snap_to_threshold(&c, f64::INFINITY), 4.0);
        assert_eq!(snap_to_threshold(&c, f64::NEG_INFINITY), 1.5);
    }

    #[test]
    fn snap_clamps_outside_range() {
        let c = [1.5, 2.5, 4.0];
        assert_eq!(snap_to_threshold(&c, -10.0), 1.5);
        assert_eq!(snap_to_threshold(&c, 1.5), 1.5);
        assert_eq!(snap_to_threshold(&c, 99.0), 4.0);
    }

    #[test]
    fn snap_picks_nearest() {
        let c = [1.5, 2.5, 4.0];
        assert_eq!(snap_to_threshold(&c, 2.4), 2.5);
        assert_eq!(snap_to_threshold(&c, 1.9), 1.5);
        assert_eq!(snap_to_threshold(&c, 3.5), 4.0);
        assert_eq!(snap_to_threshold(&c, 2.5), 2.5);
    }

    #[test]
    fn snap_tie_goes_to_lower() {
        let c = [1.0, 2.0, 4.0];
        assert_eq!(snap_to_threshold(&c, 1.5), 1.0);
        assert_eq!(snap_to_threshold(&c, 3.0), 2.0);
    }
}
