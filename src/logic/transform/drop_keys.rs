//! Annotation Dropping
//!
//! Removes dispensable annotations from vertices and edges. Without
//! `keep_original_id`, ids are recomputed from the remaining content, so
//! records that differed only in dropped keys collapse into one.

use log::warn;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap, HashSet};

use super::validate_keys;
use crate::constants::{KEY_FROM_TYPE, RESERVED_TYPE_KEY};
use crate::error::{ProvError, ProvResult};
use crate::logic::graph::{Annotations, Edge, Record, Vertex};

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropKeysConfig {
    pub vertex_keys: BTreeSet<String>,
    pub edge_keys: BTreeSet<String>,
    pub keep_original_id: bool,
}

impl DropKeysConfig {
    /// Validated config; both key lists are required
    pub fn new(vertex_keys: &[String], edge_keys: &[String], keep_original_id: bool) -> ProvResult<Self> {
        let vertex_keys = validate_keys("vertex", vertex_keys)?;
        let edge_keys = validate_keys("edge", edge_keys)?;

        for key in vertex_keys.iter().chain(edge_keys.iter()) {
            if key == RESERVED_TYPE_KEY {
                return Err(ProvError::Config("cannot drop the 'type' key".to_string()));
            }
        }
        if edge_keys.contains(KEY_FROM_TYPE) {
            return Err(ProvError::Config(format!(
                "cannot drop '{}' from edges",
                KEY_FROM_TYPE
            )));
        }

        Ok(Self {
            vertex_keys,
            edge_keys,
            keep_original_id,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DropKeysReport {
    pub vertices: usize,
    pub edges: usize,
    /// Vertices or edges whose recomputed id was already emitted
    pub collapsed: usize,
    /// Edges whose endpoint vertex is not in the log
    pub dropped_edges: usize,
}

// ============================================================================
// CONTENT IDS
// ============================================================================

fn digest(parts: &[&str], annotations: &Annotations) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(b"|");
    }
    // BTreeMap iteration is sorted by key
    for (key, value) in annotations {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"|");
    }
    hex::encode(hasher.finalize())
}

/// Id derived from a vertex's tag and annotations
pub fn vertex_content_id(kind: &str, annotations: &Annotations) -> String {
    digest(&[kind], annotations)
}

/// Id derived from an edge's type, endpoints and annotations
pub fn edge_content_id(edge_type: &str, from: &str, to: &str, annotations: &Annotations) -> String {
    digest(&[edge_type, from, to], annotations)
}

fn without(annotations: Annotations, keys: &BTreeSet<String>) -> Annotations {
    annotations
        .into_iter()
        .filter(|(key, _)| !keys.contains(key))
        .collect()
}

// ============================================================================
// TRANSFORM
// ============================================================================

/// Drop the configured keys from every record
pub fn drop_keys(records: Vec<Record>, config: &DropKeysConfig) -> (Vec<Record>, DropKeysReport) {
    let mut report = DropKeysReport::default();
    let mut output = Vec::with_capacity(records.len());

    // Edges may precede their endpoints, so map every vertex first
    let mut new_ids: HashMap<String, String> = HashMap::new();
    if !config.keep_original_id {
        for record in &records {
            if let Record::Vertex(v) = record {
                let kept = without(v.annotations.clone(), &config.vertex_keys);
                new_ids.insert(v.id.clone(), vertex_content_id(&v.kind, &kept));
            }
        }
    }

    let mut emitted: HashSet<String> = HashSet::new();

    for record in records {
        match record {
            Record::Vertex(vertex) => {
                let annotations = without(vertex.annotations, &config.vertex_keys);
                let id = new_ids.get(&vertex.id).cloned().unwrap_or(vertex.id);

                if !config.keep_original_id && !emitted.insert(id.clone()) {
                    report.collapsed += 1;
                    continue;
                }
                report.vertices += 1;
                output.push(Record::Vertex(Vertex::new(id, vertex.kind, annotations)));
            }
            Record::Edge(edge) => {
                let annotations = without(edge.annotations, &config.edge_keys);

                let (id, from, to) = if config.keep_original_id {
                    (edge.id, edge.from, edge.to)
                } else {
                    let (Some(from), Some(to)) = (new_ids.get(&edge.from), new_ids.get(&edge.to)) else {
                        warn!("Dropping edge {} -> {}: endpoint vertex not found", edge.from, edge.to);
                        report.dropped_edges += 1;
                        continue;
                    };
                    let id = edge_content_id(edge.edge_type.as_str(), from, to, &annotations);
                    if !emitted.insert(id.clone()) {
                        report.collapsed += 1;
                        continue;
                    }
                    (Some(id), from.clone(), to.clone())
                };

                match Edge::new(id, edge.edge_type, from, to, annotations) {
                    Some(edge) => {
                        report.edges += 1;
                        output.push(Record::Edge(edge));
                    }
                    None => report.dropped_edges += 1,
                }
            }
        }
    }

    (output, report)
}
