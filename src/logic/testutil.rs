//! Graph fixtures shared by unit tests

use std::collections::HashMap;

use crate::logic::graph::{Annotations, Edge, EdgeType, ProvenanceStore, Record, SnapshotId, Vertex};

/// Identifier triple used for the center entity in fixtures
pub fn center_id() -> SnapshotId {
    SnapshotId::new("6", "1851734740", "22675")
}

/// Snapshot file name matching [`center_id`]
pub const CENTER_FILE: &str = "6_1851734740_22675_graph.json";

fn ann(pairs: &[(&str, &str)]) -> Annotations {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// Small builder for provenance graphs; edges get increasing relation ids
#[derive(Default)]
pub struct GraphBuilder {
    records: Vec<Record>,
    types: HashMap<String, String>,
    next_relation_id: u64,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex(mut self, id: &str, object_type: &str, extra: &[(&str, &str)]) -> Self {
        let mut annotations = ann(extra);
        annotations.insert("object_type".to_string(), object_type.to_string());
        let kind = if object_type == "task" { "Activity" } else { "Entity" };

        self.types.insert(id.to_string(), object_type.to_string());
        self.records.push(Record::Vertex(Vertex::new(id, kind, annotations)));
        self
    }

    /// Vertex carrying the [`center_id`] triple
    pub fn center(self, id: &str, object_type: &str) -> Self {
        self.vertex(
            id,
            object_type,
            &[("boot_id", "6"), ("cf:machine_id", "cf:1851734740"), ("object_id", "22675")],
        )
    }

    /// Task vertex with the five namespace annotations
    pub fn task(self, id: &str, ipcns: &str, pidns: &str) -> Self {
        self.vertex(
            id,
            "task",
            &[("ipcns", ipcns), ("mntns", "mnt0"), ("netns", "net0"), ("pidns", pidns), ("utsns", "uts0")],
        )
    }

    pub fn edge(self, edge_type: EdgeType, from: &str, to: &str) -> Self {
        let relation_type = match &edge_type {
            EdgeType::Used => "read",
            EdgeType::WasGeneratedBy => "write",
            _ => "named",
        };
        self.edge_with(edge_type, from, to, &[("relation_type", relation_type)])
    }

    pub fn edge_with(mut self, edge_type: EdgeType, from: &str, to: &str, extra: &[(&str, &str)]) -> Self {
        self.next_relation_id += 1;
        let mut annotations = ann(extra);
        let unknown = "unknown".to_string();
        annotations.insert("from_type".to_string(), self.types.get(from).unwrap_or(&unknown).clone());
        annotations.insert("to_type".to_string(), self.types.get(to).unwrap_or(&unknown).clone());
        annotations.insert("relation_id".to_string(), self.next_relation_id.to_string());

        let edge = Edge::new(None, edge_type, from, to, annotations).expect("from_type is set");
        self.records.push(Record::Edge(edge));
        self
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.clone()
    }

    /// NDJSON log of the graph
    pub fn to_log(&self) -> String {
        self.records
            .iter()
            .map(|r| r.to_json().to_string() + "\n")
            .collect()
    }

    /// Ingested store with the center entity resolved
    pub fn store(&self) -> ProvenanceStore {
        let mut store = ProvenanceStore::ingest(self.records());
        store.set_center_entity(&center_id());
        store
    }
}
