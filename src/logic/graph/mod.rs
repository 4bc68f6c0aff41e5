//! Provenance Graph Module
//!
//! In-memory store for one CamFlow/SPADE graph snapshot.
//!
//! ## Structure
//! - `types`: Vertex, Edge, Record, ObjectType, EdgeType
//! - `parse`: validating line parser (array framing tolerated)
//! - `snapshot`: `(boot_id, machine_id, object_id)` triple from file names
//! - `store`: indexed store + typed edge filter
//! - `traverse`: reader/writer hop patterns around the center entity
//!
//! ## Usage
//! ```ignore
//! use crate::logic::graph::{parse_log, ProvenanceStore, SnapshotId, EdgeFilter, EdgeType};
//!
//! let parsed = parse_log(&text);
//! let mut store = ProvenanceStore::ingest(parsed.records);
//! store.set_center_entity(&SnapshotId::from_path(path)?);
//! let readers = store.edges_matching(EdgeFilter::new().to(center).edge_type(EdgeType::Used));
//! ```

pub mod types;
pub mod parse;
pub mod snapshot;
pub mod store;
pub mod traverse;

pub use types::{is_vertex_tag, Annotations, Edge, EdgeType, ObjectType, Record, Vertex};
pub use parse::{log_lines, normalize_line, parse_log, parse_reader, parse_record, LogLines, ParsedLog, RawLine, RejectedLine};
pub use snapshot::SnapshotId;
pub use store::{CenterResolution, EdgeFilter, IngestReport, ProvenanceStore};
pub use traverse::FlowSide;
