//! Features Module - Context Extraction Engine
//!
//! Turns the neighborhood of a center entity into one feature record:
//! object type, entity/reader/writer paths, namespace difference vector,
//! reader/writer relation types and process arguments.

pub mod extractor;
pub mod namespaces;
pub mod record;

#[cfg(test)]
mod tests;

// Re-export common types
pub use extractor::ContextExtractor;
pub use namespaces::{namespace_difference, NamespaceSets};
pub use record::{FeatureRecord, NamespaceVector};
