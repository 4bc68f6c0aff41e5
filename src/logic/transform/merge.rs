//! Vertex Merging
//!
//! Collapses vertices that agree on a set of key annotations into one vertex
//! and re-points the edges. Annotations the members disagree on are dropped.

use log::debug;
use serde::Serialize;
use std::collections::HashMap;

use super::validate_keys;
use crate::error::ProvResult;
use crate::logic::graph::{Edge, Record, Vertex};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub input_vertices: usize,
    pub merged_vertices: usize,
    /// Vertices with none of the merge keys
    pub dropped_vertices: usize,
    pub edges: usize,
    /// Self-loops after merging, or edges that lost an endpoint
    pub dropped_edges: usize,
}

/// Merge key: every non-empty key value followed by `,`
pub fn merge_hash(vertex: &Vertex, keys: &[String]) -> String {
    keys.iter()
        .filter_map(|key| vertex.annotation(key))
        .filter(|value| !value.is_empty())
        .fold(String::new(), |mut hash, value| {
            hash.push_str(value);
            hash.push(',');
            hash
        })
}

/// Merge vertices sharing the same values for `keys`
///
/// Merged vertices keep the id of the first member and appear in
/// first-member order, followed by the surviving edges in input order.
pub fn merge_vertices(records: Vec<Record>, keys: &[String]) -> ProvResult<(Vec<Record>, MergeReport)> {
    validate_keys("merge", keys)?;
    let keys: Vec<String> = keys.iter().map(|k| k.trim().to_string()).collect();
    let mut report = MergeReport::default();

    let mut merged: Vec<Vertex> = Vec::new();
    let mut slot_by_hash: HashMap<String, usize> = HashMap::new();
    // original vertex id -> merged vertex id
    let mut redirect: HashMap<String, String> = HashMap::new();
    let mut edges: Vec<Edge> = Vec::new();

    for record in records {
        let vertex = match record {
            Record::Vertex(v) => v,
            Record::Edge(e) => {
                edges.push(e);
                continue;
            }
        };
        report.input_vertices += 1;

        let hash = merge_hash(&vertex, &keys);
        if hash.is_empty() {
            debug!("Vertex {} has no merge key values, dropping", vertex.id);
            report.dropped_vertices += 1;
            continue;
        }

        match slot_by_hash.get(&hash) {
            Some(&slot) => {
                let target = &mut merged[slot];
                target.annotations.retain(|key, value| {
                    vertex.annotation(key).map_or(true, |other| other == value.as_str())
                });
                redirect.insert(vertex.id, target.id.clone());
            }
            None => {
                slot_by_hash.insert(hash, merged.len());
                redirect.insert(vertex.id.clone(), vertex.id.clone());
                merged.push(vertex);
            }
        }
    }

    report.merged_vertices = merged.len();
    let mut output: Vec<Record> = merged
        .into_iter()
        .map(|v| Record::Vertex(Vertex::new(v.id, v.kind, v.annotations)))
        .collect();

    for edge in edges {
        let (Some(from), Some(to)) = (redirect.get(&edge.from), redirect.get(&edge.to)) else {
            report.dropped_edges += 1;
            continue;
        };
        if from == to {
            report.dropped_edges += 1;
            continue;
        }

        let rebuilt = Edge::new(edge.id, edge.edge_type, from.clone(), to.clone(), edge.annotations);
        if let Some(edge) = rebuilt {
            report.edges += 1;
            output.push(Record::Edge(edge));
        }
    }

    Ok((output, report))
}
