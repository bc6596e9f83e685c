//! Seeded stratified subsampling.
//!
//! The generator is a 32-bit linear congruential generator
//! `state = state * 1664525 + 1013904223 (mod 2^32)`, each draw returning
//! `state / 2^32`. Given the same seed and the same input order the subset
//! is bit-for-bit reproducible.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::error::CartError;
use crate::sample::{Dataset, Sample};

const LCG_MULTIPLIER: u32 = 1_664_525;
const LCG_INCREMENT: u32 = 1_013_904_223;
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Advance the generator one step.
///
/// Returns the next state and the draw it produces, a value in `[0, 1)`.
#[must_use]
pub fn lcg_next(state: u32) -> (u32, f64) {
    let next = state
        .wrapping_mul(LCG_MULTIPLIER)
        .wrapping_add(LCG_INCREMENT);
    (next, f64::from(next) / TWO_POW_32)
}

/// Split `total` across `n_classes` classes as evenly as possible.
///
/// Every class gets `total / n_classes`; the first `total % n_classes`
/// classes (ascending label order) get one more.
#[must_use]
pub fn allocate(total: usize, n_classes: usize) -> Vec<usize> {
    if n_classes == 0 {
        return Vec::new();
    }
    let base = total / n_classes;
    let remainder = total % n_classes;
    (0..n_classes)
        .map(|c| base + usize::from(c < remainder))
        .collect()
}

/// Shuffle in place with Fisher-Yates, threading the generator state through.
fn shuffle<T>(items: &mut [T], mut state: u32) -> u32 {
    for i in (1..items.len()).rev() {
        let (next, draw) = lcg_next(state);
        state = next;
        let j = (draw * (i + 1) as f64) as usize;
        items.swap(i, j);
    }
    state
}

/// Draw a stratified subset of `total` samples.
///
/// Samples are grouped by target. Classes are visited in ascending label
/// order, each group is shuffled with the generator (one generator shared
/// across all classes, seeded with `seed`), and the first allocated members
/// are kept. See [`allocate`] for the per-class allocation. The result is
/// sorted by sample index.
///
/// # Errors
///
/// | Variant | When |
/// |---|---|
/// | [`CartError::ZeroSubsetSize`] | `total` is zero |
/// | [`CartError::EmptyDataset`] | `full` is empty |
/// | [`CartError::InsufficientSamples`] | a class has fewer members than its allocation |
pub fn stratified_subset<S>(full: &[S], total: usize, seed: u32) -> Result<Vec<S>, CartError>
where
    S: AsRef<Sample> + Clone,
{
    if total == 0 {
        return Err(CartError::ZeroSubsetSize);
    }
    if full.is_empty() {
        return Err(CartError::EmptyDataset);
    }

    let mut by_class: BTreeMap<usize, Vec<S>> = BTreeMap::new();
    for sample in full {
        by_class
            .entry(sample.as_ref().target)
            .or_default()
            .push(sample.clone());
    }

    let allocation = allocate(total, by_class.len());
    for ((&class, members), &requested) in by_class.iter().zip(&allocation) {
        if members.len() < requested {
            return Err(CartError::InsufficientSamples {
                class,
                available: members.len(),
                requested,
            });
        }
    }

    let mut state = seed;
    let mut subset = Vec::with_capacity(total);
    for (mut members, take) in by_class.into_values().zip(allocation) {
        state = shuffle(&mut members, state);
        members.truncate(take);
        subset.extend(members);
    }

    subset.sort_by_key(|s| s.as_ref().index);
    Ok(subset)
}

impl Dataset {
    /// Draw a stratified subset of this dataset, keeping its names.
    ///
    /// # Errors
    ///
    /// Same as [`stratified_subset`].
    #[instrument(skip(self), fields(n_source = self.n_samples()))]
    pub fn stratified_subset(&self, total: usize, seed: u32) -> Result<Dataset, CartError> {
        let samples = stratified_subset(self.samples(), total, seed)?;
        debug!(n_subset = samples.len(), "stratified subset drawn");
        Ok(self.with_samples(samples))
    }
}
