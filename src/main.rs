use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use arbor_cart::{
    Dataset, FeatureIndex, ThresholdImpurity, TreeConfig, TreeNode, Workbench, WorkbenchConfig,
    depth, n_leaves, n_nodes, render_tree,
};
use arbor_io::{DatasetReader, ExperimentName, ResultWriter, iris};

#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Explore Gini-impurity splits on a small stratified sample")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Seed of the stratified subset
    #[arg(long, default_value_t = 42, global = true)]
    seed: u32,

    /// Number of samples in the stratified subset
    #[arg(long, default_value_t = 20, global = true)]
    subset_size: usize,

    /// Path to a CSV dataset (last column is the class label); defaults to the bundled Iris data
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Minimum number of samples a leaf needs before it may be split
    #[arg(long, default_value_t = 2, global = true)]
    min_samples_split: usize,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,
}

/// Optional JSON artifact destination.
#[derive(Args, Debug, Clone)]
struct ArtifactArgs {
    /// Experiment name for output files (must match [a-zA-Z0-9_-]+); no files are written without it
    #[arg(long)]
    experiment: Option<String>,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

impl ArtifactArgs {
    fn writer(&self) -> Result<Option<ResultWriter>> {
        let Some(experiment) = &self.experiment else {
            return Ok(None);
        };
        let name = ExperimentName::new(experiment.clone())?;
        let writer = ResultWriter::new(&self.output_dir, name)
            .context("failed to prepare output directory")?;
        Ok(Some(writer))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the stratified subset and its class counts
    Subset {
        #[command(flatten)]
        artifacts: ArtifactArgs,
    },

    /// List the candidate thresholds of one feature
    Thresholds {
        /// Zero-based feature index
        #[arg(long)]
        feature: usize,
    },

    /// Score a threshold on one feature
    Impurity {
        /// Zero-based feature index
        #[arg(long)]
        feature: usize,

        /// Threshold to score (samples with value <= threshold go left)
        #[arg(long, allow_negative_numbers = true)]
        threshold: f64,

        /// Snap the threshold to the nearest candidate first
        #[arg(long, default_value_t = false)]
        snap: bool,
    },

    /// Reveal the best split of the subset
    BestSplit {
        #[command(flatten)]
        artifacts: ArtifactArgs,
    },

    /// Grow a decision tree on the subset one split at a time
    Grow {
        /// Maximum number of splits (grow until fully grown if not set)
        #[arg(long)]
        steps: Option<usize>,

        #[command(flatten)]
        artifacts: ArtifactArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct SubsetOutput<'a> {
    seed: u32,
    n_samples: usize,
    class_counts: Vec<ClassCountOutput<'a>>,
    samples: Vec<SampleOutput<'a>>,
}

#[derive(Serialize)]
struct ClassCountOutput<'a> {
    class: &'a str,
    count: usize,
}

#[derive(Serialize)]
struct SampleOutput<'a> {
    index: usize,
    target: &'a str,
    features: &'a [f64],
}

#[derive(Serialize)]
struct ThresholdsOutput<'a> {
    feature: usize,
    feature_name: &'a str,
    initial_threshold: f64,
    candidates: &'a [f64],
}

#[derive(Serialize)]
struct ImpurityOutput<'a> {
    feature: usize,
    feature_name: &'a str,
    requested_threshold: f64,
    snapped: bool,
    result: ThresholdImpurity,
}

#[derive(Serialize)]
struct GrowOutput<'a> {
    seed: u32,
    steps: usize,
    n_leaves: usize,
    n_nodes: usize,
    depth: usize,
    fully_grown: bool,
    tree: &'a TreeNode,
}

fn load_dataset(data: Option<&PathBuf>) -> Result<Dataset> {
    match data {
        Some(path) => DatasetReader::new(path)
            .read()
            .with_context(|| format!("failed to read dataset {}", path.display())),
        None => iris().context("failed to load bundled Iris data"),
    }
}

fn feature_name(workbench: &Workbench, feature: FeatureIndex) -> Result<&str> {
    workbench.dataset().check_feature(feature)?;
    Ok(workbench.dataset().feature_names()[feature.index()].as_str())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let source = load_dataset(cli.data.as_ref())?;
    let config = WorkbenchConfig::new()
        .with_seed(cli.seed)
        .with_subset_size(cli.subset_size)
        .with_tree(TreeConfig::new().with_min_samples_split(cli.min_samples_split));
    let mut workbench = config
        .open(source)
        .context("failed to open the workbench")?;
    info!(
        seed = workbench.seed(),
        n_samples = workbench.dataset().n_samples(),
        "subset ready"
    );

    match cli.command {
        Command::Subset { artifacts } => {
            let subset = workbench.dataset();
            if let Some(writer) = artifacts.writer()? {
                writer.write_subset(workbench.seed(), subset)?;
            }

            let counts = subset.class_counts();
            let output = SubsetOutput {
                seed: workbench.seed(),
                n_samples: subset.n_samples(),
                class_counts: subset
                    .target_names()
                    .iter()
                    .zip(counts.as_slice())
                    .map(|(name, &count)| ClassCountOutput { class: name, count })
                    .collect(),
                samples: subset
                    .samples()
                    .iter()
                    .map(|s| SampleOutput {
                        index: s.index,
                        target: &subset.target_names()[s.target],
                        features: &s.features,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Thresholds { feature } => {
            let feature = FeatureIndex::new(feature);
            let output = ThresholdsOutput {
                feature: feature.index(),
                feature_name: feature_name(&workbench, feature)?,
                initial_threshold: workbench.initial_threshold(feature)?,
                candidates: workbench.candidate_thresholds(feature)?,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Impurity {
            feature,
            threshold,
            snap,
        } => {
            let feature = FeatureIndex::new(feature);
            let effective = if snap {
                workbench
                    .snap_threshold(feature, threshold)
                    .context("failed to snap threshold")?
            } else {
                threshold
            };
            let result = workbench
                .impurity_of_threshold(feature, effective)
                .context("failed to score threshold")?;
            let output = ImpurityOutput {
                feature: feature.index(),
                feature_name: feature_name(&workbench, feature)?,
                requested_threshold: threshold,
                snapped: snap,
                result,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::BestSplit { artifacts } => {
            let best = workbench.best_global_split();
            match best {
                Some(b) => info!(feature = %b.feature_name, threshold = b.threshold(), gain = b.gain, "best split"),
                None => info!("no candidate split: every feature is constant"),
            }
            if let Some(writer) = artifacts.writer()? {
                writer.write_best_split(workbench.seed(), best)?;
            }
            println!("{}", serde_json::to_string_pretty(&best)?);
        }

        Command::Grow { steps, artifacts } => {
            let taken = workbench.grow(steps);
            let tree = workbench.tree();
            for line in render_tree(tree).lines() {
                info!("{line}");
            }
            let fully_grown = workbench.is_fully_grown();
            if let Some(writer) = artifacts.writer()? {
                writer.write_tree(workbench.seed(), tree, fully_grown)?;
            }

            let output = GrowOutput {
                seed: workbench.seed(),
                steps: taken,
                n_leaves: n_leaves(tree),
                n_nodes: n_nodes(tree),
                depth: depth(tree),
                fully_grown,
                tree,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
