//! Snapshot Batch Driver
//!
//! Runs one analysis over many graph snapshots. Every snapshot gets its own
//! store; a bad snapshot yields an empty row and never aborts the batch.
//! With `jobs > 1` snapshots are spread over scoped worker threads and
//! results still come back in input order.

use chrono::{DateTime, Utc};
use log::{info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::ProvResult;
use crate::logic::features::{ContextExtractor, FeatureRecord};
use crate::logic::graph::{parse_reader, CenterResolution, ProvenanceStore, SnapshotId};
use crate::logic::threat::{classify, FlowPolicy, PrivilegedFlowRecord, PrivilegedFlowResult};

// ============================================================================
// ANALYSES
// ============================================================================

/// Per-snapshot computation run by the batch driver
pub trait SnapshotAnalysis: Sync {
    type Output: Send;

    fn analyze(&self, id: &SnapshotId, store: &ProvenanceStore) -> Self::Output;

    /// Row for a snapshot that could not be analyzed
    fn empty(&self, path: &Path, id: Option<&SnapshotId>) -> Self::Output;
}

/// Context features (features.csv)
pub struct FeatureAnalysis;

impl SnapshotAnalysis for FeatureAnalysis {
    type Output = FeatureRecord;

    fn analyze(&self, _id: &SnapshotId, store: &ProvenanceStore) -> FeatureRecord {
        ContextExtractor::new(store).extract()
    }

    fn empty(&self, _path: &Path, _id: Option<&SnapshotId>) -> FeatureRecord {
        FeatureRecord::empty()
    }
}

/// Privileged-flow labels under one policy
pub struct PrivilegedAnalysis {
    pub policy: FlowPolicy,
}

impl SnapshotAnalysis for PrivilegedAnalysis {
    type Output = PrivilegedFlowRecord;

    fn analyze(&self, id: &SnapshotId, store: &ProvenanceStore) -> PrivilegedFlowRecord {
        let result = classify(store, &self.policy);
        if result.privileged {
            info!("{}: privileged flow ({})", id, result.reasons.join("; "));
        }
        PrivilegedFlowRecord::new(id, &result)
    }

    fn empty(&self, path: &Path, id: Option<&SnapshotId>) -> PrivilegedFlowRecord {
        match id {
            Some(id) => PrivilegedFlowRecord::new(id, &PrivilegedFlowResult::default()),
            None => PrivilegedFlowRecord {
                identifier: path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                privileged_flow: 0,
            },
        }
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SnapshotOutcome<T> {
    Processed(T),
    Skipped { reason: String, record: T },
}

impl<T> SnapshotOutcome<T> {
    pub fn record(&self) -> &T {
        match self {
            SnapshotOutcome::Processed(record) => record,
            SnapshotOutcome::Skipped { record, .. } => record,
        }
    }

    pub fn into_record(self) -> T {
        match self {
            SnapshotOutcome::Processed(record) => record,
            SnapshotOutcome::Skipped { record, .. } => record,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, SnapshotOutcome::Skipped { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotResult<T> {
    pub path: PathBuf,
    pub outcome: SnapshotOutcome<T>,
    /// Malformed lines skipped while parsing
    pub rejected_lines: usize,
    /// Edges dropped at ingest for a missing endpoint
    pub dangling_edges: usize,
    pub duplicate_vertices: usize,
    pub center_found: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub missing_center: usize,
    pub rejected_lines: usize,
    pub dangling_edges: usize,
    pub duplicate_vertices: usize,
}

#[derive(Debug, Clone)]
pub struct BatchOutput<T> {
    pub results: Vec<SnapshotResult<T>>,
    pub summary: BatchSummary,
}

impl<T> BatchOutput<T> {
    /// Output rows in input order, skipped snapshots included
    pub fn into_records(self) -> Vec<T> {
        self.results.into_iter().map(|r| r.outcome.into_record()).collect()
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Snapshot paths from a list file (one per line, blanks ignored)
pub fn read_list_file(path: &Path) -> ProvResult<Vec<PathBuf>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// A parsed snapshot with its center entity resolved
pub struct LoadedSnapshot {
    pub id: SnapshotId,
    pub store: ProvenanceStore,
    pub rejected_lines: usize,
}

pub fn load_snapshot(path: &Path) -> ProvResult<LoadedSnapshot> {
    let id = SnapshotId::from_path(path)?;
    let parsed = parse_reader(BufReader::new(File::open(path)?))?;
    let rejected_lines = parsed.rejected.len();

    let mut store = ProvenanceStore::ingest(parsed.records);
    if let CenterResolution::NotFound = store.set_center_entity(&id) {
        warn!("{}: center entity {} not found", path.display(), id);
    }

    Ok(LoadedSnapshot {
        id,
        store,
        rejected_lines,
    })
}

fn process_one<A: SnapshotAnalysis>(path: &Path, analysis: &A) -> SnapshotResult<A::Output> {
    match load_snapshot(path) {
        Ok(snapshot) => {
            let ingest = snapshot.store.report();
            SnapshotResult {
                path: path.to_path_buf(),
                outcome: SnapshotOutcome::Processed(analysis.analyze(&snapshot.id, &snapshot.store)),
                rejected_lines: snapshot.rejected_lines,
                dangling_edges: ingest.dangling_edges,
                duplicate_vertices: ingest.duplicate_vertices,
                center_found: snapshot.store.center_entity().is_some(),
            }
        }
        Err(e) => {
            warn!("Skipping snapshot {}: {}", path.display(), e);
            let id = SnapshotId::from_path(path).ok();
            SnapshotResult {
                path: path.to_path_buf(),
                outcome: SnapshotOutcome::Skipped {
                    reason: e.to_string(),
                    record: analysis.empty(path, id.as_ref()),
                },
                rejected_lines: 0,
                dangling_edges: 0,
                duplicate_vertices: 0,
                center_found: false,
            }
        }
    }
}

// ============================================================================
// DRIVER
// ============================================================================

/// Run `analysis` over every snapshot
pub fn run_batch<A: SnapshotAnalysis>(paths: &[PathBuf], analysis: &A, jobs: usize) -> BatchOutput<A::Output> {
    let started_at = Utc::now();
    let total = paths.len();
    let workers = jobs.clamp(1, total.max(1));

    let results: Vec<SnapshotResult<A::Output>> = if workers == 1 {
        paths
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let result = process_one(path, analysis);
                info!("[{}/{}] {}", i + 1, total, path.display());
                result
            })
            .collect()
    } else {
        let next = AtomicUsize::new(0);
        let slots: Vec<Mutex<Option<SnapshotResult<A::Output>>>> = (0..total).map(|_| Mutex::new(None)).collect();

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    if i >= total {
                        break;
                    }
                    let result = process_one(&paths[i], analysis);
                    info!("[{}/{}] {}", i + 1, total, paths[i].display());
                    *slots[i].lock() = Some(result);
                });
            }
        });

        slots.into_iter().filter_map(|slot| slot.into_inner()).collect()
    };

    let skipped = results.iter().filter(|r| r.outcome.is_skipped()).count();
    let summary = BatchSummary {
        started_at,
        finished_at: Utc::now(),
        total,
        processed: total - skipped,
        skipped,
        missing_center: results
            .iter()
            .filter(|r| !r.outcome.is_skipped() && !r.center_found)
            .count(),
        rejected_lines: results.iter().map(|r| r.rejected_lines).sum(),
        dangling_edges: results.iter().map(|r| r.dangling_edges).sum(),
        duplicate_vertices: results.iter().map(|r| r.duplicate_vertices).sum(),
    };

    info!(
        "{} snapshot(s) processed, {} skipped, {} without center entity ({} ms)",
        summary.processed,
        summary.skipped,
        summary.missing_center,
        (summary.finished_at - summary.started_at).num_milliseconds()
    );
    if summary.rejected_lines + summary.dangling_edges + summary.duplicate_vertices > 0 {
        warn!(
            "Dropped {} malformed line(s), {} dangling edge(s), {} duplicate vertex record(s)",
            summary.rejected_lines, summary.dangling_edges, summary.duplicate_vertices
        );
    }

    BatchOutput { results, summary }
}

pub fn run_features(paths: &[PathBuf], jobs: usize) -> BatchOutput<FeatureRecord> {
    run_batch(paths, &FeatureAnalysis, jobs)
}

pub fn run_privileged(paths: &[PathBuf], policy: &FlowPolicy, jobs: usize) -> BatchOutput<PrivilegedFlowRecord> {
    let analysis = PrivilegedAnalysis {
        policy: policy.clone(),
    };
    run_batch(paths, &analysis, jobs)
}
