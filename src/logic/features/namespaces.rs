//! Namespace Difference
//!
//! Compares the namespace identifiers seen on the reader side with those seen
//! on the writer side of the center entity, one position per namespace kind.

use std::collections::BTreeSet;

use super::record::NamespaceVector;
use crate::constants::NAMESPACE_KEYS;
use crate::logic::graph::ProvenanceStore;

/// Distinct namespace ids per kind, in [ipc, mnt, net, pid, uts] order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamespaceSets(pub [BTreeSet<String>; 5]);

impl NamespaceSets {
    /// Collect the namespace annotations of the given process vertices.
    ///
    /// A vertex lacking a namespace annotation contributes nothing at that position.
    pub fn collect<'s, I>(store: &'s ProvenanceStore, ids: I) -> Self
    where
        I: IntoIterator<Item = &'s str>,
    {
        let mut sets = Self::default();
        for vertex in ids.into_iter().filter_map(|id| store.vertex(id)) {
            for (slot, key) in NAMESPACE_KEYS.iter().enumerate() {
                if let Some(ns) = vertex.annotation(key) {
                    sets.0[slot].insert(ns.to_string());
                }
            }
        }
        sets
    }

    pub fn insert(&mut self, values: [&str; 5]) {
        for (slot, value) in values.iter().enumerate() {
            self.0[slot].insert(value.to_string());
        }
    }
}

/// Position i is 1 iff the symmetric difference at i is non-empty
pub fn namespace_difference(readers: &NamespaceSets, writers: &NamespaceSets) -> NamespaceVector {
    let mut one_hot = [0u8; 5];
    for (slot, flag) in one_hot.iter_mut().enumerate() {
        if readers.0[slot].symmetric_difference(&writers.0[slot]).next().is_some() {
            *flag = 1;
        }
    }
    one_hot
}
