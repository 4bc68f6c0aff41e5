use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One indicator per namespace: [ipc, mnt, net, pid, uts], 1 = readers and writers differ
pub type NamespaceVector = [u8; 5];

/// Context features of one snapshot's center entity (one features.csv row)
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FeatureRecord {
    /// Object type of the center entity ("" when unresolved)
    pub object_type: String,
    /// Paths attached to the center entity
    pub entity_path: BTreeSet<String>,
    pub reader_path: BTreeSet<String>,
    pub writer_path: BTreeSet<String>,
    pub namespaces: NamespaceVector,
    pub reader_relation_types: BTreeSet<String>,
    pub writer_relation_types: BTreeSet<String>,
    pub writer_argvs: BTreeSet<String>,
    pub reader_argvs: BTreeSet<String>,
}

impl FeatureRecord {
    /// Row emitted when the center entity is missing or the snapshot is unusable
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
