//! Bounded-hop traversals around a center entity
//!
//! ```text
//!  hop 1                      hop 2                         hop 3
//!  reader --Used--> center    memory --*--> reader          memory --*--> path | argv
//!  center --WasGeneratedBy--> writer --*--> memory
//! ```
//!
//! Every hop is one indexed [`ProvenanceStore::edges_matching`] call.

use std::collections::BTreeSet;

use super::store::{EdgeFilter, ProvenanceStore};
use super::types::{Edge, EdgeType, ObjectType};

/// Which side of the information flow a process sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowSide {
    /// Processes that `Used` (read) the center
    Reader,
    /// Processes the center `WasGeneratedBy` (writers)
    Writer,
}

impl FlowSide {
    pub fn edge_type(self) -> EdgeType {
        match self {
            FlowSide::Reader => EdgeType::Used,
            FlowSide::Writer => EdgeType::WasGeneratedBy,
        }
    }
}

/// Hop 1: edges tying the center to its readers or writers
pub fn flow_edges<'s>(
    store: &'s ProvenanceStore,
    center: &'s str,
    side: FlowSide,
) -> impl Iterator<Item = &'s Edge> + 's {
    let filter = match side {
        FlowSide::Reader => EdgeFilter::new().to(center),
        FlowSide::Writer => EdgeFilter::new().from(center),
    };
    store.edges_matching(filter.edge_type(side.edge_type()))
}

/// Hop 1: ids of the reading / writing processes
pub fn flow_processes(store: &ProvenanceStore, center: &str, side: FlowSide) -> BTreeSet<String> {
    flow_edges(store, center, side)
        .map(|edge| match side {
            FlowSide::Reader => edge.from.clone(),
            FlowSide::Writer => edge.to.clone(),
        })
        .collect()
}

/// Hop 2: process_memory vertices linked to the given processes
pub fn process_memories(
    store: &ProvenanceStore,
    processes: &BTreeSet<String>,
    side: FlowSide,
) -> BTreeSet<String> {
    match side {
        FlowSide::Reader => store
            .edges_matching(
                EdgeFilter::new()
                    .from_type(ObjectType::ProcessMemory)
                    .to_any(processes),
            )
            .map(|edge| edge.from.clone())
            .collect(),
        FlowSide::Writer => store
            .edges_matching(
                EdgeFilter::new()
                    .to_type(ObjectType::ProcessMemory)
                    .from_any(processes),
            )
            .map(|edge| edge.to.clone())
            .collect(),
    }
}

/// Hop 3: `key` annotation of `target`-typed vertices reached from the memories
pub fn memory_attributes(
    store: &ProvenanceStore,
    memories: &BTreeSet<String>,
    target: ObjectType,
    key: &str,
) -> BTreeSet<String> {
    let targets: BTreeSet<&str> = store
        .edges_matching(EdgeFilter::new().from_any(memories).to_type(target))
        .map(|edge| edge.to.as_str())
        .collect();

    vertex_attributes(store, targets, key)
}

/// `key` annotation of each listed vertex; missing vertices or annotations are skipped
pub fn vertex_attributes<'s, I>(store: &'s ProvenanceStore, ids: I, key: &str) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'s str>,
{
    ids.into_iter()
        .filter_map(|id| store.vertex(id))
        .filter_map(|vertex| vertex.annotation(key))
        .map(str::to_string)
        .collect()
}
