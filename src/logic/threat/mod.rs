//! Threat Module - Privileged Flow Classification
//!
//! Decides whether information crossed a namespace trust boundary through
//! the center entity: written on the less privileged side, read on the
//! more privileged side.
//!
//! ## Structure
//! - `types`: FlowPolicy, KubePolicy, NamespaceScope, results and output rows
//! - `context`: reader/writer namespace sets around the center entity
//! - `rules`: namespace -> scope mapping
//! - `classifier`: Docker and Kubernetes decision logic
//!
//! ## Usage
//! ```ignore
//! use crate::logic::threat::{classify, FlowPolicy};
//!
//! let policy = FlowPolicy::docker("4026531839");
//! policy.validate()?;
//! let result = classify(&store, &policy);
//! println!("{} -> {}", snapshot, result.label());
//! ```

pub mod types;
pub mod context;
pub mod rules;
pub mod classifier;


// Re-export main types for convenience
pub use types::{
    ContainerEngine,
    FlowIndicators,
    FlowPolicy,
    KubePolicy,
    NamespaceScope,
    PrivilegedFlowRecord,
    PrivilegedFlowResult,
};

pub use context::{FlowContext, NamespacePair};

pub use classifier::{classify, classify_context, classify_docker, classify_kubernetes};
