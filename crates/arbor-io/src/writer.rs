//! JSON artifact writer for subsets, best splits and grown trees.

use std::fs;
use std::path::{Path, PathBuf};

use arbor_cart::{BestSplit, Dataset, TreeNode, depth, n_leaves, n_nodes};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Writes exploration results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_subset.json`,
/// `{experiment}_best_split.json` and `{experiment}_tree.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Return the path of the artifact of the given kind.
    #[must_use]
    pub fn artifact_path(&self, kind: &str) -> PathBuf {
        self.output_dir.join(self.experiment.artifact_file(kind))
    }

    /// Write a sampled subset to `{experiment}_subset.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all, fields(n_samples = subset.n_samples()))]
    pub fn write_subset(&self, seed: u32, subset: &Dataset) -> Result<PathBuf, IoError> {
        let samples = subset
            .samples()
            .iter()
            .map(|s| SubsetEntry {
                index: s.index,
                target: s.target,
                target_name: subset.target_names()[s.target].as_str(),
                features: &s.features,
            })
            .collect();
        let artifact = SubsetArtifact {
            experiment: self.experiment.as_str(),
            seed,
            n_samples: subset.n_samples(),
            feature_names: subset.feature_names(),
            target_names: subset.target_names(),
            class_counts: subset.class_counts().as_slice().to_vec(),
            samples,
        };
        self.write_artifact("subset", &artifact)
    }

    /// Write the best split of a subset (or `null`) to `{experiment}_best_split.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_best_split(&self, seed: u32, best: Option<&BestSplit>) -> Result<PathBuf, IoError> {
        let artifact = BestSplitArtifact {
            experiment: self.experiment.as_str(),
            seed,
            best,
        };
        self.write_artifact("best_split", &artifact)
    }

    /// Write a grown tree to `{experiment}_tree.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all, fields(root_size = tree.size()))]
    pub fn write_tree(&self, seed: u32, tree: &TreeNode, fully_grown: bool) -> Result<PathBuf, IoError> {
        let artifact = TreeArtifact {
            experiment: self.experiment.as_str(),
            seed,
            n_leaves: n_leaves(tree),
            n_nodes: n_nodes(tree),
            depth: depth(tree),
            fully_grown,
            tree,
        };
        self.write_artifact("tree", &artifact)
    }

    fn write_artifact<T: Serialize>(&self, kind: &str, artifact: &T) -> Result<PathBuf, IoError> {
        let path = self.artifact_path(kind);
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        info!(path = %path.display(), kind, "artifact written");
        Ok(path)
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct SubsetArtifact<'a> {
    experiment: &'a str,
    seed: u32,
    n_samples: usize,
    feature_names: &'a [String],
    target_names: &'a [String],
    class_counts: Vec<usize>,
    samples: Vec<SubsetEntry<'a>>,
}

#[derive(Serialize)]
struct SubsetEntry<'a> {
    index: usize,
    target: usize,
    target_name: &'a str,
    features: &'a [f64],
}

#[derive(Serialize)]
struct BestSplitArtifact<'a> {
    experiment: &'a str,
    seed: u32,
    best: Option<&'a BestSplit>,
}

#[derive(Serialize)]
struct TreeArtifact<'a> {
    experiment: &'a str,
    seed: u32,
    n_leaves: usize,
    n_nodes: usize,
    depth: usize,
    fully_grown: bool,
    tree: &'a TreeNode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_cart::{TreeConfig, best_split};
    use tempfile::TempDir;

    fn small_dataset() -> Dataset {
        Dataset::from_rows(
            vec!["x".into()],
            vec!["lo".into(), "hi".into()],
            vec![(vec![1.0], 0), (vec![2.0], 0), (vec![8.0], 1), (vec![9.0], 1)],
        )
        .unwrap()
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn writer(dir: &TempDir, name: &str) -> ResultWriter {
        ResultWriter::new(dir.path(), ExperimentName::new(name.into()).unwrap()).unwrap()
    }

    #[test]
    fn creates_nested_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let w = ResultWriter::new(&nested, ExperimentName::new("run".into()).unwrap()).unwrap();
        assert!(nested.is_dir());
        assert_eq!(w.artifact_path("tree"), nested.join("run_tree.json"));
    }

    #[test]
    fn write_subset_json_structure() {
        let dir = TempDir::new().unwrap();
        let path = writer(&dir, "sub").write_subset(42, &small_dataset()).unwrap();
        assert_eq!(path, dir.path().join("sub_subset.json"));

        let content = read_json(&path);
        assert_eq!(content["experiment"], "sub");
        assert_eq!(content["seed"], 42);
        assert_eq!(content["n_samples"], 4);
        assert_eq!(content["class_counts"], serde_json::json!([2, 2]));
        assert_eq!(content["samples"][2]["target_name"], "hi");
        assert_eq!(content["samples"][2]["features"], serde_json::json!([8.0]));
    }

    #[test]
    fn write_best_split_json_structure() {
        let dir = TempDir::new().unwrap();
        let ds = small_dataset();
        let best = best_split(ds.samples(), ds.n_classes(), ds.feature_names());
        let path = writer(&dir, "best").write_best_split(1, best.as_ref()).unwrap();

        let content = read_json(&path);
        assert_eq!(content["best"]["feature"], 0);
        assert_eq!(content["best"]["feature_name"], "x");
        assert_eq!(content["best"]["threshold"], 5.0);
        assert_eq!(content["best"]["left"]["counts"], serde_json::json!([2, 0]));
        assert_eq!(content["best"]["weighted_impurity"], 0.0);
    }

    #[test]
    fn write_best_split_none_is_null() {
        let dir = TempDir::new().unwrap();
        let path = writer(&dir, "none").write_best_split(1, None).unwrap();
        assert!(read_json(&path)["best"].is_null());
    }

    #[test]
    fn write_tree_json_structure() {
        let dir = TempDir::new().unwrap();
        let ds = small_dataset();
        let mut builder = TreeConfig::new().builder(&ds).unwrap();
        let root = builder.root(&ds);
        let (tree, steps) = builder.grow(&root, None);
        assert_eq!(steps, 1);

        let path = writer(&dir, "grown").write_tree(7, &tree, true).unwrap();
        let content = read_json(&path);
        assert_eq!(content["n_leaves"], 2);
        assert_eq!(content["n_nodes"], 3);
        assert_eq!(content["depth"], 1);
        assert_eq!(content["fully_grown"], true);
        assert_eq!(content["tree"]["type"], "internal");
        assert_eq!(content["tree"]["left"]["type"], "leaf");
        assert_eq!(content["tree"]["right"]["stats"]["counts"], serde_json::json!([0, 2]));
    }
}
