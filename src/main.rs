//! provflow - command line entry point

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};

use provflow_core::config::{ClassifierConfig, Config};
use provflow_core::constants::{APP_NAME, APP_VERSION, DEFAULT_FEATURES_FILE, DEFAULT_PRIVILEGED_FILE};
use provflow_core::logic::batch::{read_list_file, run_features, run_privileged};
use provflow_core::logic::dataset::{export_rows, stamped_path, ExportFormat};
use provflow_core::logic::reorder::reorder_file;
use provflow_core::logic::threat::ContainerEngine;
use provflow_core::logic::transform::{
    drop_keys, merge_vertices, read_records, write_records_file, DropKeysConfig,
};

#[derive(Parser)]
#[command(name = "provflow")]
#[command(about = "Cross-namespace flow analysis for CamFlow/SPADE provenance logs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reorder a log: vertices first, then edges by relation_id
    Reorder {
        input: PathBuf,
        /// Appended to if it exists
        output: PathBuf,
    },

    /// Extract context features for each snapshot
    Features {
        #[command(flatten)]
        batch: BatchArgs,

        #[arg(long, default_value = DEFAULT_FEATURES_FILE)]
        out: PathBuf,
    },

    /// Label each snapshot with its privileged-flow flag
    Privileged {
        #[command(subcommand)]
        engine: EngineCommand,
    },

    /// Drop annotation keys from vertices and edges
    DropKeys {
        input: PathBuf,
        output: PathBuf,

        #[arg(long, value_delimiter = ',', required = true)]
        vertex_keys: Vec<String>,

        #[arg(long, value_delimiter = ',', required = true)]
        edge_keys: Vec<String>,

        /// Keep ids instead of deriving them from content
        #[arg(long, action = clap::ArgAction::Set, required = true)]
        keep_original_id: bool,
    },

    /// Merge vertices that share the given annotation values
    MergeVertices {
        input: PathBuf,
        output: PathBuf,

        #[arg(long, value_delimiter = ',', required = true)]
        keys: Vec<String>,
    },
}

#[derive(Subcommand)]
enum EngineCommand {
    /// Host vs container
    Docker {
        /// Host IPC namespace (PROVFLOW_HOST_IPCNS)
        #[arg(long)]
        host_ipcns: Option<String>,

        #[command(flatten)]
        batch: BatchArgs,

        #[arg(long, default_value = DEFAULT_PRIVILEGED_FILE)]
        out: PathBuf,
    },

    /// Host vs cluster vs pod
    Kube {
        /// Host IPC namespace (PROVFLOW_HOST_IPCNS)
        #[arg(long)]
        host_ipcns: Option<String>,

        /// Cluster IPC namespace (PROVFLOW_CLUSTER_IPCNS)
        #[arg(long)]
        cluster_ipcns: Option<String>,

        /// 1 = boundaries only, 2 = also inter-pod flows (PROVFLOW_POLICY)
        #[arg(long)]
        policy: Option<String>,

        #[command(flatten)]
        batch: BatchArgs,

        #[arg(long, default_value = DEFAULT_PRIVILEGED_FILE)]
        out: PathBuf,
    },
}

#[derive(Args)]
struct BatchArgs {
    /// File with one snapshot path per line
    #[arg(long, conflicts_with = "snapshots")]
    list: Option<PathBuf>,

    /// Snapshot files (<boot>_<machine>_<object>_<suffix>.json)
    snapshots: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    format: ExportFormat,

    /// Worker threads (PROVFLOW_JOBS)
    #[arg(long)]
    jobs: Option<usize>,

    /// Add a UTC timestamp to the output file name
    #[arg(long)]
    stamp: bool,
}

impl BatchArgs {
    fn paths(&self) -> Result<Vec<PathBuf>> {
        let paths = match &self.list {
            Some(list) => read_list_file(list)
                .with_context(|| format!("Failed to read list file {}", list.display()))?,
            None => self.snapshots.clone(),
        };
        if paths.is_empty() {
            bail!("No snapshots given (use --list or pass snapshot paths)");
        }
        Ok(paths)
    }

    fn jobs(&self, config: &Config) -> usize {
        self.jobs.filter(|n| *n > 0).unwrap_or(config.jobs)
    }

    fn destination(&self, out: &Path) -> PathBuf {
        if self.stamp {
            stamped_path(out, self.format)
        } else {
            out.to_path_buf()
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli, &Config::from_env()) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: &Config) -> Result<()> {
    info!("{} v{}", APP_NAME, APP_VERSION);

    match cli.command {
        Commands::Reorder { input, output } => {
            let report = reorder_file(&input, &output)
                .with_context(|| format!("Failed to reorder {}", input.display()))?;
            info!(
                "Reordered {} vertices and {} edges into {} ({} rejected)",
                report.vertices,
                report.edges,
                output.display(),
                report.rejected.len()
            );
        }

        Commands::Features { batch, out } => {
            let paths = batch.paths()?;
            let out = batch.destination(&out);
            let output = run_features(&paths, batch.jobs(config));
            let rows = output.into_records();
            let count = export_rows(&out, &rows, batch.format)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            info!("Wrote {} row(s) to {}", count, out.display());
        }

        Commands::Privileged { engine } => {
            let (classifier, batch, out) = match engine {
                EngineCommand::Docker { host_ipcns, batch, out } => (
                    ClassifierConfig {
                        engine: ContainerEngine::Docker,
                        host_ipcns,
                        ..Default::default()
                    },
                    batch,
                    out,
                ),
                EngineCommand::Kube {
                    host_ipcns,
                    cluster_ipcns,
                    policy,
                    batch,
                    out,
                } => (
                    ClassifierConfig {
                        engine: ContainerEngine::Kube,
                        host_ipcns,
                        cluster_ipcns,
                        policy,
                    },
                    batch,
                    out,
                ),
            };

            // Misconfiguration is fatal before any snapshot is touched
            let policy = classifier.with_env_fallback(config).validate()?;
            let paths = batch.paths()?;
            let out = batch.destination(&out);
            info!("Classifying {} snapshot(s) under {}", paths.len(), policy);

            let rows = run_privileged(&paths, &policy, batch.jobs(config)).into_records();
            let flagged = rows.iter().filter(|r| r.privileged_flow == 1).count();
            let count = export_rows(&out, &rows, batch.format)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            info!("Wrote {} row(s) to {} ({} privileged)", count, out.display(), flagged);
        }

        Commands::DropKeys {
            input,
            output,
            vertex_keys,
            edge_keys,
            keep_original_id,
        } => {
            let drop_config = DropKeysConfig::new(&vertex_keys, &edge_keys, keep_original_id)?;
            let records = load_records(&input)?;
            let (records, report) = drop_keys(records, &drop_config);
            write_records_file(&output, &records)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!(
                "Kept {} vertices and {} edges ({} collapsed, {} edges dropped)",
                report.vertices, report.edges, report.collapsed, report.dropped_edges
            );
        }

        Commands::MergeVertices { input, output, keys } => {
            let records = load_records(&input)?;
            let (records, report) = merge_vertices(records, &keys)?;
            write_records_file(&output, &records)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!(
                "Merged {} vertices into {} ({} dropped), kept {} edges ({} dropped)",
                report.input_vertices,
                report.merged_vertices,
                report.dropped_vertices,
                report.edges,
                report.dropped_edges
            );
        }
    }

    Ok(())
}

fn load_records(path: &Path) -> Result<Vec<provflow_core::logic::graph::Record>> {
    let parsed = read_records(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if !parsed.rejected.is_empty() {
        warn!("{}: skipped {} malformed line(s)", path.display(), parsed.rejected.len());
    }
    Ok(parsed.records)
}
