//! Logic Module - Provenance Analysis Engines
//!
//! ## Pipeline
//! raw log -> `reorder` -> `graph` (ingest) -> {`features`, `threat`} -> `dataset`
//!
//! - `graph/` - record model, validating parser, indexed store, traversals
//! - `reorder/` - causal log reorderer
//! - `features/` - context extraction around the center entity
//! - `threat/` - privileged-flow classification (Docker / Kubernetes)
//! - `transform/` - annotation dropping and vertex merging
//! - `dataset/` - CSV / JSONL export
//! - `batch` - per-snapshot driver

pub mod graph;
pub mod reorder;
pub mod features;
pub mod threat;
pub mod transform;
pub mod dataset;
pub mod batch;

#[cfg(test)]
pub(crate) mod testutil;
