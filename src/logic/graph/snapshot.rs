//! Snapshot Identifier
//!
//! Every graph file is named after the entity it was exported for:
//! `<boot_id>_<machine_id>_<object_id>[_<counter>]_graph.json`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::types::Vertex;
use crate::constants::{KEY_BOOT_ID, KEY_MACHINE_ID, KEY_OBJECT_ID, MACHINE_ID_PREFIX};
use crate::error::{ProvError, ProvResult};

/// `(boot_id, machine_id, object_id)` triple naming an entity system-wide
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId {
    pub boot_id: String,
    /// Machine id without the `cf:` prefix
    pub machine_id: String,
    pub object_id: String,
}

impl SnapshotId {
    pub fn new(boot_id: impl Into<String>, machine_id: impl Into<String>, object_id: impl Into<String>) -> Self {
        let machine_id: String = machine_id.into();
        let machine_id = machine_id
            .strip_prefix(MACHINE_ID_PREFIX)
            .map(str::to_string)
            .unwrap_or(machine_id);

        Self {
            boot_id: boot_id.into(),
            machine_id,
            object_id: object_id.into(),
        }
    }

    /// Parse the triple out of a snapshot file path.
    ///
    /// The stem up to the first `.` is split on `_` and the trailing tag
    /// (`graph`) dropped; the first three fields are the triple.
    pub fn from_path(path: &Path) -> ProvResult<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ProvError::InvalidSnapshotName(path.display().to_string()))?;

        let stem = name.split('.').next().unwrap_or_default();
        let mut fields: Vec<&str> = stem.split('_').collect();
        fields.pop();

        match fields.as_slice() {
            [boot, machine, object, ..] if !boot.is_empty() && !machine.is_empty() && !object.is_empty() => {
                Ok(Self::new(*boot, *machine, *object))
            }
            _ => Err(ProvError::InvalidSnapshotName(name.to_string())),
        }
    }

    /// Machine id as CamFlow writes it in vertex annotations
    pub fn machine_annotation(&self) -> String {
        format!("{}{}", MACHINE_ID_PREFIX, self.machine_id)
    }

    /// Does this vertex carry the same triple?
    pub fn matches(&self, vertex: &Vertex) -> bool {
        vertex.annotation(KEY_BOOT_ID) == Some(self.boot_id.as_str())
            && vertex.annotation(KEY_MACHINE_ID) == Some(self.machine_annotation().as_str())
            && vertex.annotation(KEY_OBJECT_ID) == Some(self.object_id.as_str())
    }
}

/// Rendered as `boot_machine_object` (the `bID_mID_oID` column)
impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}_{}", self.boot_id, self.machine_id, self.object_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::graph::types::Annotations;

    #[test]
    fn test_parse_plain_name() {
        let id = SnapshotId::from_path(Path::new("/data/graphs/6_1851734740_22675_graph.json")).unwrap();
        assert_eq!(id, SnapshotId::new("6", "1851734740", "22675"));
        assert_eq!(id.machine_annotation(), "cf:1851734740");
        assert_eq!(id.to_string(), "6_1851734740_22675");
    }

    #[test]
    fn test_parse_name_with_counter() {
        let id = SnapshotId::from_path(Path::new("6_1851734740_22675_4_graph.json")).unwrap();
        assert_eq!(id.object_id, "22675");
    }

    #[test]
    fn test_invalid_names() {
        assert!(SnapshotId::from_path(Path::new("graph.json")).is_err());
        assert!(SnapshotId::from_path(Path::new("6_17_graph.json")).is_err());
    }

    #[test]
    fn test_matches_vertex() {
        let annotations: Annotations = [
            ("boot_id", "6"),
            ("cf:machine_id", "cf:1851734740"),
            ("object_id", "22675"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let vertex = Vertex::new("v", "Entity", annotations);

        let id = SnapshotId::new("6", "cf:1851734740", "22675");
        assert_eq!(id.machine_id, "1851734740");
        assert!(id.matches(&vertex));
    }
}
