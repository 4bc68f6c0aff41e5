//! Provenance Graph Types
//!
//! Vertex/edge model shared by the store, the reorderer and the transforms.
//! No traversal logic here - only data structures.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{
    KEY_FROM_TYPE, KEY_OBJECT_TYPE, KEY_RELATION_ID, KEY_RELATION_TYPE, KEY_TO_TYPE,
    TYPE_ACTIVITY, TYPE_ENTITY,
};

/// Annotation map (sorted so that serialized output is stable)
pub type Annotations = BTreeMap<String, String>;

// ============================================================================
// OBJECT TYPES
// ============================================================================

/// CamFlow object type of a vertex (also used for the from_type/to_type edge tags)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObjectType {
    Task,
    ProcessMemory,
    Path,
    Argv,
    File,
    Directory,
    Socket,
    /// Any other artifact subtype, kept verbatim (link, pipe, envp, ...)
    Other(String),
}

impl ObjectType {
    pub fn parse(value: &str) -> Self {
        match value {
            "task" => ObjectType::Task,
            "process_memory" => ObjectType::ProcessMemory,
            "path" => ObjectType::Path,
            "argv" => ObjectType::Argv,
            "file" => ObjectType::File,
            "directory" => ObjectType::Directory,
            "socket" => ObjectType::Socket,
            other => ObjectType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ObjectType::Task => "task",
            ObjectType::ProcessMemory => "process_memory",
            ObjectType::Path => "path",
            ObjectType::Argv => "argv",
            ObjectType::File => "file",
            ObjectType::Directory => "directory",
            ObjectType::Socket => "socket",
            ObjectType::Other(other) => other.as_str(),
        }
    }
}

impl From<String> for ObjectType {
    fn from(value: String) -> Self {
        ObjectType::parse(&value)
    }
}

impl From<ObjectType> for String {
    fn from(value: ObjectType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// EDGE TYPES
// ============================================================================

/// W3C PROV relation carried in the record's `type` field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EdgeType {
    /// A process read an entity (edge: process -> entity)
    Used,
    /// A process wrote an entity (edge: entity -> process)
    WasGeneratedBy,
    WasInformedBy,
    WasDerivedFrom,
    WasAssociatedWith,
    /// Unlabeled or structural relation
    Other(String),
}

impl EdgeType {
    pub fn parse(value: &str) -> Self {
        match value {
            "Used" => EdgeType::Used,
            "WasGeneratedBy" => EdgeType::WasGeneratedBy,
            "WasInformedBy" => EdgeType::WasInformedBy,
            "WasDerivedFrom" => EdgeType::WasDerivedFrom,
            "WasAssociatedWith" => EdgeType::WasAssociatedWith,
            other => EdgeType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EdgeType::Used => "Used",
            EdgeType::WasGeneratedBy => "WasGeneratedBy",
            EdgeType::WasInformedBy => "WasInformedBy",
            EdgeType::WasDerivedFrom => "WasDerivedFrom",
            EdgeType::WasAssociatedWith => "WasAssociatedWith",
            EdgeType::Other(other) => other.as_str(),
        }
    }
}

impl From<String> for EdgeType {
    fn from(value: String) -> Self {
        EdgeType::parse(&value)
    }
}

impl From<EdgeType> for String {
    fn from(value: EdgeType) -> Self {
        value.as_str().to_string()
    }
}

/// True for the record tags that denote a vertex in the raw log
pub fn is_vertex_tag(tag: &str) -> bool {
    tag == TYPE_ENTITY || tag == TYPE_ACTIVITY
}

// ============================================================================
// VERTEX
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub id: String,
    /// Raw record tag (Entity, Activity, ...)
    pub kind: String,
    pub object_type: Option<ObjectType>,
    pub annotations: Annotations,
}

impl Vertex {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, annotations: Annotations) -> Self {
        let object_type = annotations.get(KEY_OBJECT_TYPE).map(|t| ObjectType::parse(t));
        Self {
            id: id.into(),
            kind: kind.into(),
            object_type,
            annotations,
        }
    }

    /// Annotation lookup; absence is a normal outcome, not an error
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    pub fn is_type(&self, object_type: &ObjectType) -> bool {
        self.object_type.as_ref() == Some(object_type)
    }
}

// ============================================================================
// EDGE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: Option<String>,
    pub edge_type: EdgeType,
    pub from: String,
    pub to: String,
    pub from_type: ObjectType,
    pub to_type: Option<ObjectType>,
    pub relation_id: Option<i64>,
    pub annotations: Annotations,
}

impl Edge {
    /// Build an edge from its annotations.
    ///
    /// Returns `None` when `from_type` is missing: without it the record is not an edge.
    pub fn new(
        id: Option<String>,
        edge_type: EdgeType,
        from: impl Into<String>,
        to: impl Into<String>,
        annotations: Annotations,
    ) -> Option<Self> {
        let from_type = ObjectType::parse(annotations.get(KEY_FROM_TYPE)?);
        let to_type = annotations.get(KEY_TO_TYPE).map(|t| ObjectType::parse(t));
        let relation_id = annotations
            .get(KEY_RELATION_ID)
            .and_then(|r| r.trim().parse::<i64>().ok());

        Some(Self {
            id,
            edge_type,
            from: from.into(),
            to: to.into(),
            from_type,
            to_type,
            relation_id,
            annotations,
        })
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    pub fn relation_type(&self) -> Option<&str> {
        self.annotation(KEY_RELATION_TYPE)
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// One parsed log record
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Vertex(Vertex),
    Edge(Edge),
}

impl Record {
    pub fn is_edge(&self) -> bool {
        matches!(self, Record::Edge(_))
    }

    /// Wire representation (one JSON object per log line)
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Record::Vertex(v) => serde_json::json!({
                "type": v.kind,
                "id": v.id,
                "annotations": v.annotations,
            }),
            Record::Edge(e) => {
                let mut value = serde_json::json!({
                    "type": e.edge_type.as_str(),
                    "from": e.from,
                    "to": e.to,
                    "annotations": e.annotations,
                });
                if let Some(id) = &e.id {
                    value["id"] = serde_json::Value::String(id.clone());
                }
                value
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn annotations(pairs: &[(&str, &str)]) -> Annotations {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_object_type_roundtrip_keeps_unknown_subtypes() {
        assert_eq!(ObjectType::parse("process_memory"), ObjectType::ProcessMemory);
        let pipe = ObjectType::parse("pipe");
        assert_eq!(pipe, ObjectType::Other("pipe".to_string()));
        assert_eq!(pipe.as_str(), "pipe");
    }

    #[test]
    fn test_edge_requires_from_type() {
        let missing = Edge::new(None, EdgeType::Used, "a", "b", annotations(&[("to_type", "file")]));
        assert!(missing.is_none());

        let edge = Edge::new(
            None,
            EdgeType::Used,
            "a",
            "b",
            annotations(&[("from_type", "task"), ("to_type", "file"), ("relation_id", "42")]),
        )
        .unwrap();
        assert_eq!(edge.from_type, ObjectType::Task);
        assert_eq!(edge.to_type, Some(ObjectType::File));
        assert_eq!(edge.relation_id, Some(42));

        let negative = Edge::new(
            None,
            EdgeType::Used,
            "a",
            "b",
            annotations(&[("from_type", "task"), ("relation_id", "-3")]),
        )
        .unwrap();
        assert_eq!(negative.relation_id, Some(-3));
    }

    #[test]
    fn test_vertex_annotation_absent_is_none() {
        let v = Vertex::new("v1", "Entity", annotations(&[("object_type", "path"), ("pathname", "/etc")]));
        assert!(v.is_type(&ObjectType::Path));
        assert_eq!(v.annotation("pathname"), Some("/etc"));
        assert_eq!(v.annotation("inode"), None);
    }

    #[test]
    fn test_vertex_tags() {
        assert!(is_vertex_tag("Entity"));
        assert!(is_vertex_tag("Activity"));
        assert!(!is_vertex_tag("Used"));
    }
}
