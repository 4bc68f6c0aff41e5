//! Integration Tests for the Context Extractor
//!
//! Builds small CamFlow-shaped graphs and checks every extractor end to end.

use std::collections::BTreeSet;

use super::{ContextExtractor, FeatureRecord};
use crate::logic::graph::{EdgeType, ProvenanceStore, SnapshotId};
use crate::logic::testutil::GraphBuilder;

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// file F (center) written by W, read by R; both tasks have memories with path + argv
fn shared_file_graph() -> GraphBuilder {
    GraphBuilder::new()
        .center("F", "file")
        .vertex("PF", "path", &[("pathname", "/var/lib/shared.db")])
        .task("R", "ipc-host", "pid-host")
        .task("W", "ipc-pod", "pid-pod")
        .vertex("MR", "process_memory", &[])
        .vertex("MW", "process_memory", &[])
        .vertex("PR", "path", &[("pathname", "/usr/bin/cat")])
        .vertex("PW", "path", &[("pathname", "/usr/bin/tee")])
        .vertex("AR", "argv", &[("value", "cat")])
        .vertex("AW", "argv", &[("value", "tee")])
        .edge(EdgeType::Other("named".into()), "F", "PF")
        .edge(EdgeType::Used, "R", "F")
        .edge(EdgeType::WasGeneratedBy, "F", "W")
        .edge(EdgeType::Other("memory".into()), "MR", "R")
        .edge(EdgeType::Other("memory".into()), "W", "MW")
        .edge(EdgeType::Other("named".into()), "MR", "PR")
        .edge(EdgeType::Other("named".into()), "MW", "PW")
        .edge(EdgeType::Other("named".into()), "MR", "AR")
        .edge(EdgeType::Other("named".into()), "MW", "AW")
}

#[test]
fn test_full_feature_record() {
    let store = shared_file_graph().store();
    let record = ContextExtractor::new(&store).extract();

    assert_eq!(record.object_type, "file");
    assert_eq!(record.entity_path, set(&["/var/lib/shared.db"]));
    assert_eq!(record.reader_path, set(&["/usr/bin/cat"]));
    assert_eq!(record.writer_path, set(&["/usr/bin/tee"]));
    assert_eq!(record.reader_argvs, set(&["cat"]));
    assert_eq!(record.writer_argvs, set(&["tee"]));
    assert_eq!(record.reader_relation_types, set(&["read"]));
    assert_eq!(record.writer_relation_types, set(&["write"]));
    // ipc and pid differ, mnt/net/uts shared
    assert_eq!(record.namespaces, [1, 0, 0, 1, 0]);
}

#[test]
fn test_reader_path_falls_back_to_entity_paths() {
    // The center is a process memory: readers have no memory -> path walk
    let store = GraphBuilder::new()
        .center("M", "process_memory")
        .vertex("P", "path", &[("pathname", "/proc/self/mem")])
        .task("R", "ipc1", "pid1")
        .edge(EdgeType::Other("named".into()), "M", "P")
        .edge(EdgeType::Used, "R", "M")
        .store();
    let extractor = ContextExtractor::new(&store);

    assert_eq!(extractor.reader_paths(), extractor.entity_paths());
    assert_eq!(extractor.writer_paths(), set(&["/proc/self/mem"]));
    // argv walk has no fallback
    assert!(extractor.reader_argvs().is_empty());
}

#[test]
fn test_duplicate_paths_are_collapsed() {
    let store = GraphBuilder::new()
        .center("F", "file")
        .vertex("P1", "path", &[("pathname", "/tmp/x")])
        .vertex("P2", "path", &[("pathname", "/tmp/x")])
        .edge(EdgeType::Other("named".into()), "F", "P1")
        .edge(EdgeType::Other("named".into()), "F", "P2")
        .store();

    assert_eq!(ContextExtractor::new(&store).entity_paths(), set(&["/tmp/x"]));
}

#[test]
fn test_missing_center_yields_empty_record() {
    let graph = shared_file_graph();
    let mut store = ProvenanceStore::ingest(graph.records());
    store.set_center_entity(&SnapshotId::new("1", "2", "3"));

    let record = ContextExtractor::new(&store).extract();
    assert_eq!(record, FeatureRecord::empty());
    assert!(record.is_empty());
    assert_eq!(record.namespaces, [0, 0, 0, 0, 0]);
}

#[test]
fn test_namespace_vector_is_symmetric_under_role_swap() {
    // Swapping who reads and who writes must not change the vector
    let forward = GraphBuilder::new()
        .center("F", "file")
        .task("A", "ipc1", "pid1")
        .task("B", "ipc2", "pid1")
        .edge(EdgeType::Used, "A", "F")
        .edge(EdgeType::WasGeneratedBy, "F", "B")
        .store();
    let backward = GraphBuilder::new()
        .center("F", "file")
        .task("A", "ipc1", "pid1")
        .task("B", "ipc2", "pid1")
        .edge(EdgeType::Used, "B", "F")
        .edge(EdgeType::WasGeneratedBy, "F", "A")
        .store();

    let fwd = ContextExtractor::new(&forward).namespace_difference();
    let bwd = ContextExtractor::new(&backward).namespace_difference();
    assert_eq!(fwd, bwd);
    assert_eq!(fwd, [1, 0, 0, 0, 0]);
}

#[test]
fn test_vertex_without_namespaces_contributes_nothing() {
    let store = GraphBuilder::new()
        .center("F", "file")
        .task("W", "ipc1", "pid1")
        .vertex("R", "task", &[])
        .edge(EdgeType::Used, "R", "F")
        .edge(EdgeType::WasGeneratedBy, "F", "W")
        .store();

    // Writer side has values, reader side has none -> every position differs
    assert_eq!(ContextExtractor::new(&store).namespace_difference(), [1, 1, 1, 1, 1]);
}
