//! End-to-end integration tests: bundled Iris -> subset -> split -> tree -> JSON.

use std::fs;

use arbor_cart::{FeatureIndex, WorkbenchConfig, depth, n_leaves, render_tree};
use arbor_io::{DatasetReader, ExperimentName, ResultWriter, iris};
use tempfile::TempDir;

const SEED_42_INDICES: [usize; 20] = [
    2, 11, 23, 25, 26, 30, 32, 68, 70, 74, 92, 95, 96, 98, 101, 102, 112, 114, 131, 137,
];

#[test]
fn iris_seed_42_subset_is_reproducible() {
    let wb = WorkbenchConfig::new().open(iris().unwrap()).unwrap();
    let indices: Vec<usize> = wb.dataset().samples().iter().map(|s| s.index).collect();
    assert_eq!(indices, SEED_42_INDICES);
    assert_eq!(wb.dataset().class_counts().as_slice(), &[7, 7, 6]);
    assert!((wb.tree().impurity().value() - 0.665).abs() < 1e-12);
}

#[test]
fn iris_seed_42_best_split_on_petal_length() {
    let wb = WorkbenchConfig::new().open(iris().unwrap()).unwrap();

    let counts: Vec<usize> = (0..4)
        .map(|f| wb.candidate_thresholds(FeatureIndex::new(f)).unwrap().len())
        .collect();
    assert_eq!(counts, vec![12, 12, 13, 12]);

    // Petal length and petal width tie at 0.3231; the lower feature index wins.
    let best = wb.best_global_split().unwrap();
    assert_eq!(best.feature, FeatureIndex::new(2));
    assert_eq!(best.feature_name, "petal length (cm)");
    assert!((best.threshold() - 2.35).abs() < 1e-9);
    assert!((best.weighted_impurity().value() - 0.323_076_923_076_923_1).abs() < 1e-12);
    assert_eq!(best.candidate.left.counts.as_slice(), &[7, 0, 0]);
    assert_eq!(best.candidate.right.counts.as_slice(), &[0, 7, 6]);
    assert!((best.gain - (0.665 - 0.323_076_923_076_923_1)).abs() < 1e-12);

    let width = wb.impurity_of_threshold(FeatureIndex::new(3), 0.8).unwrap();
    assert!((width.weighted_impurity - best.weighted_impurity().value()).abs() < 1e-12);
}

#[test]
fn iris_seed_42_tree_grows_in_two_steps() {
    let mut wb = WorkbenchConfig::new().open(iris().unwrap()).unwrap();
    assert_eq!(wb.grow_fully(), 2);
    assert!(wb.is_fully_grown());
    assert_eq!(n_leaves(wb.tree()), 3);
    assert_eq!(depth(wb.tree()), 2);
    assert!(render_tree(wb.tree()).starts_with("#0 petal length (cm) <= 2.350"));
}

#[test]
fn regenerate_with_seed_7_changes_subset() {
    let mut wb = WorkbenchConfig::new().open(iris().unwrap()).unwrap();
    wb.regenerate(7).unwrap();
    let indices: Vec<usize> = wb.dataset().samples().iter().map(|s| s.index).collect();
    assert_eq!(
        indices,
        vec![0, 5, 7, 14, 16, 19, 28, 60, 65, 67, 82, 84, 86, 90, 103, 117, 131, 134, 141, 146]
    );
    let best = wb.best_global_split().unwrap();
    assert_eq!(best.feature.index(), 2);
    assert!((best.threshold() - 2.6).abs() < 1e-9);
}

#[test]
fn full_iris_best_split_on_petal_length() {
    let wb = WorkbenchConfig::new()
        .with_subset_size(150)
        .open(iris().unwrap())
        .unwrap();
    let best = wb.best_global_split().unwrap();
    assert_eq!(best.feature.index(), 2);
    assert!((best.threshold() - 2.45).abs() < 1e-9);
    assert!((best.weighted_impurity().value() - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn artifacts_round_trip() {
    let mut wb = WorkbenchConfig::new().open(iris().unwrap()).unwrap();
    let dir = TempDir::new().unwrap();
    let writer = ResultWriter::new(dir.path(), ExperimentName::new("iris42".into()).unwrap()).unwrap();

    writer.write_subset(wb.seed(), wb.dataset()).unwrap();
    writer.write_best_split(wb.seed(), wb.best_global_split()).unwrap();
    wb.grow_fully();
    writer.write_tree(wb.seed(), wb.tree(), wb.is_fully_grown()).unwrap();

    let subset: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("iris42_subset.json")).unwrap()).unwrap();
    let indices: Vec<u64> = subset["samples"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["index"].as_u64().unwrap())
        .collect();
    assert_eq!(indices, SEED_42_INDICES.map(|i| i as u64));

    let best: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("iris42_best_split.json")).unwrap()).unwrap();
    assert_eq!(best["best"]["feature_name"], "petal length (cm)");

    let tree: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("iris42_tree.json")).unwrap()).unwrap();
    assert_eq!(tree["n_leaves"], 3);
    assert_eq!(tree["tree"]["left"]["stats"]["counts"], serde_json::json!([7, 0, 0]));
}

#[test]
fn csv_file_matches_bundled_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("iris.csv");
    fs::write(&path, include_str!("../data/iris.csv")).unwrap();
    let from_file = DatasetReader::new(&path).read().unwrap();
    let bundled = iris().unwrap();
    assert_eq!(from_file.n_samples(), bundled.n_samples());
    assert_eq!(from_file.samples()[149].features, bundled.samples()[149].features);
}
