//! Flow Context
//!
//! Namespace identities observed on both sides of the center entity.
//! Readers and writers are the hop-1 processes; their IPC / PID namespace
//! annotations are read straight off those vertices.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::constants::{KEY_IPCNS, KEY_PIDNS};
use crate::logic::graph::traverse::flow_processes;
use crate::logic::graph::{FlowSide, ProvenanceStore};

/// (ipcns, pidns) identity of a process
pub type NamespacePair = (String, String);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowContext {
    pub reader_ipcns: BTreeSet<String>,
    pub writer_ipcns: BTreeSet<String>,
    pub reader_pairs: BTreeSet<NamespacePair>,
    pub writer_pairs: BTreeSet<NamespacePair>,
}

impl FlowContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the context around the store's center entity (None without one)
    pub fn collect(store: &ProvenanceStore) -> Option<Self> {
        let center = store.center_entity()?;
        let mut ctx = Self::new();

        for side in [FlowSide::Reader, FlowSide::Writer] {
            for id in flow_processes(store, &center.id, side) {
                let Some(vertex) = store.vertex(&id) else {
                    continue;
                };
                let ipcns = vertex.annotation(KEY_IPCNS);
                let pidns = vertex.annotation(KEY_PIDNS);
                ctx.add(side, ipcns, pidns);
            }
        }

        Some(ctx)
    }

    fn add(&mut self, side: FlowSide, ipcns: Option<&str>, pidns: Option<&str>) {
        let (namespaces, pairs) = match side {
            FlowSide::Reader => (&mut self.reader_ipcns, &mut self.reader_pairs),
            FlowSide::Writer => (&mut self.writer_ipcns, &mut self.writer_pairs),
        };

        if let Some(ipc) = ipcns {
            namespaces.insert(ipc.to_string());
            if let Some(pid) = pidns {
                pairs.insert((ipc.to_string(), pid.to_string()));
            }
        }
    }

    /// Add a reading process
    pub fn with_reader(mut self, ipcns: &str, pidns: &str) -> Self {
        self.add(FlowSide::Reader, Some(ipcns), Some(pidns));
        self
    }

    /// Add a writing process
    pub fn with_writer(mut self, ipcns: &str, pidns: &str) -> Self {
        self.add(FlowSide::Writer, Some(ipcns), Some(pidns));
        self
    }

    /// Writes only ever came from the given namespace
    pub fn written_only_by(&self, ipcns: &str) -> bool {
        self.writer_ipcns.len() == 1 && self.writer_ipcns.contains(ipcns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::graph::EdgeType;
    use crate::logic::testutil::GraphBuilder;

    #[test]
    fn test_context_builder() {
        let ctx = FlowContext::new()
            .with_reader("host", "p0")
            .with_writer("pod1", "p1")
            .with_writer("pod1", "p2");

        assert_eq!(ctx.reader_ipcns.len(), 1);
        assert_eq!(ctx.writer_ipcns.len(), 1);
        assert_eq!(ctx.writer_pairs.len(), 2);
        assert!(ctx.written_only_by("pod1"));
        assert!(!ctx.written_only_by("host"));
    }

    #[test]
    fn test_collect_from_store() {
        let store = GraphBuilder::new()
            .center("F", "file")
            .task("A", "host", "p1")
            .task("B", "cluster", "p2")
            .edge(EdgeType::WasGeneratedBy, "F", "A")
            .edge(EdgeType::Used, "B", "F")
            .store();

        let ctx = FlowContext::collect(&store).unwrap();
        assert!(ctx.written_only_by("host"));
        assert!(ctx.reader_ipcns.contains("cluster"));
        assert!(ctx.reader_pairs.contains(&("cluster".to_string(), "p2".to_string())));
    }

    #[test]
    fn test_collect_without_center() {
        let store = ProvenanceStore::ingest(GraphBuilder::new().task("A", "host", "p1").records());
        assert!(FlowContext::collect(&store).is_none());
    }
}
