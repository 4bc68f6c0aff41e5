//! Provenance Store
//!
//! Holds every vertex and edge of one graph snapshot, indexed once at ingest:
//! - `by_id`: vertex id -> vertex
//! - `by_from` / `by_to`: vertex id -> incident edges
//! - `by_type`: edge type -> edges
//!
//! The store is read-only after ingest. All traversals elsewhere in the crate are
//! built from [`ProvenanceStore::edges_matching`] plus [`ProvenanceStore::vertex`].

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::snapshot::SnapshotId;
use super::types::{Edge, EdgeType, ObjectType, Record, Vertex};

// ============================================================================
// EDGE FILTER
// ============================================================================

/// Typed edge predicate. Unset fields match anything.
#[derive(Debug, Clone, Default)]
pub struct EdgeFilter<'a> {
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
    pub edge_type: Option<EdgeType>,
    pub from_type: Option<ObjectType>,
    pub to_type: Option<ObjectType>,
    pub from_any: Option<&'a BTreeSet<String>>,
    pub to_any: Option<&'a BTreeSet<String>>,
}

impl<'a> EdgeFilter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, id: &'a str) -> Self {
        self.from = Some(id);
        self
    }

    pub fn to(mut self, id: &'a str) -> Self {
        self.to = Some(id);
        self
    }

    pub fn edge_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = Some(edge_type);
        self
    }

    pub fn from_type(mut self, object_type: ObjectType) -> Self {
        self.from_type = Some(object_type);
        self
    }

    pub fn to_type(mut self, object_type: ObjectType) -> Self {
        self.to_type = Some(object_type);
        self
    }

    pub fn from_any(mut self, ids: &'a BTreeSet<String>) -> Self {
        self.from_any = Some(ids);
        self
    }

    pub fn to_any(mut self, ids: &'a BTreeSet<String>) -> Self {
        self.to_any = Some(ids);
        self
    }

    pub fn matches(&self, edge: &Edge) -> bool {
        self.from.map_or(true, |id| edge.from == id)
            && self.to.map_or(true, |id| edge.to == id)
            && self.edge_type.as_ref().map_or(true, |t| &edge.edge_type == t)
            && self.from_type.as_ref().map_or(true, |t| &edge.from_type == t)
            && self.to_type.as_ref().map_or(true, |t| edge.to_type.as_ref() == Some(t))
            && self.from_any.map_or(true, |ids| ids.contains(&edge.from))
            && self.to_any.map_or(true, |ids| ids.contains(&edge.to))
    }
}

// ============================================================================
// INGEST REPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub vertices: usize,
    pub edges: usize,
    /// Edges dropped because an endpoint is not in the snapshot
    pub dangling_edges: usize,
    /// Vertices dropped because their id was already taken
    pub duplicate_vertices: usize,
}

/// How the center entity was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CenterResolution {
    NotFound,
    Unique,
    /// More than one vertex matched; the first in ingest order was taken
    Ambiguous(usize),
}

// ============================================================================
// STORE
// ============================================================================

#[derive(Debug, Default)]
pub struct ProvenanceStore {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    by_id: HashMap<String, usize>,
    by_from: HashMap<String, Vec<usize>>,
    by_to: HashMap<String, Vec<usize>>,
    by_type: HashMap<EdgeType, Vec<usize>>,
    center: Option<usize>,
    report: IngestReport,
}

impl ProvenanceStore {
    /// Build a store from the records of one snapshot
    pub fn ingest<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let mut store = Self::default();
        let mut pending_edges = Vec::new();

        // First pass: vertices (edges may precede their vertices in an unsorted log)
        for record in records {
            match record {
                Record::Vertex(vertex) => {
                    if store.by_id.contains_key(&vertex.id) {
                        log::warn!("Duplicate vertex id {} - keeping first occurrence", vertex.id);
                        store.report.duplicate_vertices += 1;
                        continue;
                    }
                    store.by_id.insert(vertex.id.clone(), store.vertices.len());
                    store.vertices.push(vertex);
                }
                Record::Edge(edge) => pending_edges.push(edge),
            }
        }

        // Second pass: keep edges whose endpoints exist, in relation_id order
        pending_edges.retain(|edge| {
            let ok = store.by_id.contains_key(&edge.from) && store.by_id.contains_key(&edge.to);
            if !ok {
                log::warn!(
                    "Dropping dangling edge {} -> {} ({})",
                    edge.from,
                    edge.to,
                    edge.edge_type.as_str()
                );
                store.report.dangling_edges += 1;
            }
            ok
        });
        pending_edges.sort_by_key(|edge| (edge.relation_id.is_none(), edge.relation_id));

        for (idx, edge) in pending_edges.iter().enumerate() {
            store.by_from.entry(edge.from.clone()).or_default().push(idx);
            store.by_to.entry(edge.to.clone()).or_default().push(idx);
            store.by_type.entry(edge.edge_type.clone()).or_default().push(idx);
        }
        store.edges = pending_edges;

        store.report.vertices = store.vertices.len();
        store.report.edges = store.edges.len();
        log::debug!(
            "Ingested {} vertices, {} edges ({} dangling dropped)",
            store.report.vertices,
            store.report.edges,
            store.report.dangling_edges
        );

        store
    }

    // ------------------------------------------------------------------------
    // Center entity
    // ------------------------------------------------------------------------

    /// Select the vertex whose identifier triple matches the snapshot
    pub fn set_center_entity(&mut self, id: &SnapshotId) -> CenterResolution {
        let mut matches = self
            .vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| id.matches(v))
            .map(|(idx, _)| idx);

        self.center = matches.next();
        let extra = matches.count();

        match (self.center, extra) {
            (None, _) => {
                log::info!("No center entity matches {}", id);
                CenterResolution::NotFound
            }
            (Some(_), 0) => CenterResolution::Unique,
            (Some(idx), extra) => {
                log::warn!(
                    "{} vertices match {} - using first ({})",
                    extra + 1,
                    id,
                    self.vertices[idx].id
                );
                CenterResolution::Ambiguous(extra + 1)
            }
        }
    }

    pub fn center_entity(&self) -> Option<&Vertex> {
        self.center.map(|idx| &self.vertices[idx])
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    pub fn vertex(&self, id: &str) -> Option<&Vertex> {
        self.by_id.get(id).map(|&idx| &self.vertices[idx])
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// All edges, ascending by relation_id
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn report(&self) -> &IngestReport {
        &self.report
    }

    /// Lazily yield the edges satisfying `filter`, in relation_id order.
    ///
    /// Candidates come from the narrowest index the filter allows; the full
    /// predicate is still applied to each candidate.
    pub fn edges_matching<'s>(&'s self, filter: EdgeFilter<'s>) -> impl Iterator<Item = &'s Edge> + 's {
        let candidates: Box<dyn Iterator<Item = usize> + 's> = if let Some(from) = filter.from {
            Box::new(self.by_from.get(from).into_iter().flatten().copied())
        } else if let Some(to) = filter.to {
            Box::new(self.by_to.get(to).into_iter().flatten().copied())
        } else if let Some(ids) = filter.from_any {
            Box::new(Self::union(&self.by_from, ids).into_iter())
        } else if let Some(ids) = filter.to_any {
            Box::new(Self::union(&self.by_to, ids).into_iter())
        } else if let Some(edge_type) = &filter.edge_type {
            Box::new(self.by_type.get(edge_type).into_iter().flatten().copied())
        } else {
            Box::new(0..self.edges.len())
        };

        candidates
            .map(move |idx| &self.edges[idx])
            .filter(move |edge| filter.matches(edge))
    }

    /// Sorted, deduplicated edge indices for a set of keys
    fn union(index: &HashMap<String, Vec<usize>>, ids: &BTreeSet<String>) -> Vec<usize> {
        let mut merged: Vec<usize> = ids
            .iter()
            .filter_map(|id| index.get(id))
            .flatten()
            .copied()
            .collect();
        merged.sort_unstable();
        merged.dedup();
        merged
    }
}

// ============================================================================
// TESTS
// ============================================================================
