//! Context Extractor
//!
//! Derives the features of the center entity from fixed 1-3 hop walks
//! (see `graph::traverse`). Without a center entity every feature is empty.

use std::collections::BTreeSet;

use super::namespaces::{namespace_difference, NamespaceSets};
use super::record::{FeatureRecord, NamespaceVector};
use crate::constants::{KEY_ARGV_VALUE, KEY_OBJECT_TYPE, KEY_PATHNAME};
use crate::logic::graph::traverse::{flow_edges, flow_processes, memory_attributes, process_memories, vertex_attributes};
use crate::logic::graph::{EdgeFilter, FlowSide, ObjectType, ProvenanceStore, Vertex};

pub struct ContextExtractor<'a> {
    store: &'a ProvenanceStore,
    center: Option<&'a Vertex>,
}

impl<'a> ContextExtractor<'a> {
    pub fn new(store: &'a ProvenanceStore) -> Self {
        Self {
            store,
            center: store.center_entity(),
        }
    }

    fn center_id(&self) -> Option<&'a str> {
        self.center.map(|v| v.id.as_str())
    }

    /// Object type annotation of the center entity
    pub fn object_type(&self) -> String {
        self.center
            .and_then(|v| v.annotation(KEY_OBJECT_TYPE))
            .unwrap_or_default()
            .to_string()
    }

    /// Paths the center entity itself points at
    pub fn entity_paths(&self) -> BTreeSet<String> {
        let Some(center) = self.center_id() else {
            return BTreeSet::new();
        };

        let targets = self
            .store
            .edges_matching(EdgeFilter::new().from(center).to_type(ObjectType::Path))
            .map(|edge| edge.to.as_str());

        vertex_attributes(self.store, targets, KEY_PATHNAME)
    }

    pub fn reader_paths(&self) -> BTreeSet<String> {
        self.side_paths(FlowSide::Reader)
    }

    pub fn writer_paths(&self) -> BTreeSet<String> {
        self.side_paths(FlowSide::Writer)
    }

    pub fn reader_argvs(&self) -> BTreeSet<String> {
        self.memory_walk(FlowSide::Reader, ObjectType::Argv, KEY_ARGV_VALUE)
    }

    pub fn writer_argvs(&self) -> BTreeSet<String> {
        self.memory_walk(FlowSide::Writer, ObjectType::Argv, KEY_ARGV_VALUE)
    }

    pub fn reader_relation_types(&self) -> BTreeSet<String> {
        self.relation_types(FlowSide::Reader)
    }

    pub fn writer_relation_types(&self) -> BTreeSet<String> {
        self.relation_types(FlowSide::Writer)
    }

    /// [ipc, mnt, net, pid, uts] indicators of reader/writer namespace disagreement
    pub fn namespace_difference(&self) -> NamespaceVector {
        let Some(center) = self.center_id() else {
            return [0; 5];
        };

        let readers = flow_processes(self.store, center, FlowSide::Reader);
        let writers = flow_processes(self.store, center, FlowSide::Writer);

        namespace_difference(
            &NamespaceSets::collect(self.store, readers.iter().map(String::as_str)),
            &NamespaceSets::collect(self.store, writers.iter().map(String::as_str)),
        )
    }

    /// All features in one record
    pub fn extract(&self) -> FeatureRecord {
        if self.center.is_none() {
            return FeatureRecord::empty();
        }

        FeatureRecord {
            object_type: self.object_type(),
            entity_path: self.entity_paths(),
            reader_path: self.reader_paths(),
            writer_path: self.writer_paths(),
            namespaces: self.namespace_difference(),
            reader_relation_types: self.reader_relation_types(),
            writer_relation_types: self.writer_relation_types(),
            writer_argvs: self.writer_argvs(),
            reader_argvs: self.reader_argvs(),
        }
    }

    // ------------------------------------------------------------------------
    // Walks
    // ------------------------------------------------------------------------

    /// Memory paths of readers/writers; when there are none (e.g. the center is
    /// itself a process memory) the center's own paths stand in.
    fn side_paths(&self, side: FlowSide) -> BTreeSet<String> {
        let paths = self.memory_walk(side, ObjectType::Path, KEY_PATHNAME);
        if paths.is_empty() {
            self.entity_paths()
        } else {
            paths
        }
    }

    fn memory_walk(&self, side: FlowSide, target: ObjectType, key: &str) -> BTreeSet<String> {
        let Some(center) = self.center_id() else {
            return BTreeSet::new();
        };

        let processes = flow_processes(self.store, center, side);
        let memories = process_memories(self.store, &processes, side);
        memory_attributes(self.store, &memories, target, key)
    }

    fn relation_types(&self, side: FlowSide) -> BTreeSet<String> {
        let Some(center) = self.center_id() else {
            return BTreeSet::new();
        };

        flow_edges(self.store, center, side)
            .filter_map(|edge| edge.relation_type())
            .map(str::to_string)
            .collect()
    }
}
