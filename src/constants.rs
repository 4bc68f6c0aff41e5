//! Central Constants
//!
//! Single source of truth for annotation keys, record tags and output defaults.
//! CamFlow/SPADE annotation names live here so traversal code never spells them inline.

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "provflow";

// ============================================
// Record type tags
// ============================================

/// Vertex record tags (everything else is an edge type)
pub const TYPE_ENTITY: &str = "Entity";
pub const TYPE_ACTIVITY: &str = "Activity";

// ============================================
// Annotation keys
// ============================================

pub const KEY_OBJECT_TYPE: &str = "object_type";
pub const KEY_FROM_TYPE: &str = "from_type";
pub const KEY_TO_TYPE: &str = "to_type";
pub const KEY_RELATION_TYPE: &str = "relation_type";
pub const KEY_RELATION_ID: &str = "relation_id";

pub const KEY_BOOT_ID: &str = "boot_id";
pub const KEY_MACHINE_ID: &str = "cf:machine_id";
pub const KEY_OBJECT_ID: &str = "object_id";

pub const KEY_PATHNAME: &str = "pathname";
pub const KEY_ARGV_VALUE: &str = "value";

pub const KEY_IPCNS: &str = "ipcns";
pub const KEY_MNTNS: &str = "mntns";
pub const KEY_NETNS: &str = "netns";
pub const KEY_PIDNS: &str = "pidns";
pub const KEY_UTSNS: &str = "utsns";

/// Namespace keys in feature-vector order: [ipc, mnt, net, pid, uts]
pub const NAMESPACE_KEYS: [&str; 5] = [KEY_IPCNS, KEY_MNTNS, KEY_NETNS, KEY_PIDNS, KEY_UTSNS];

/// Prefix CamFlow puts in front of machine ids (stripped from snapshot file names)
pub const MACHINE_ID_PREFIX: &str = "cf:";

/// Key that can never be dropped by the key filter
pub const RESERVED_TYPE_KEY: &str = "type";

// ============================================
// Output
// ============================================

/// Feature CSV header (column order of features.csv)
pub const FEATURE_HEADER: [&str; 9] = [
    "object_type",
    "entity_path",
    "reader_path",
    "writer_path",
    "namespaces",
    "reader_relation_types",
    "writer_relation_types",
    "writer_argvs",
    "reader_argvs",
];

/// Privileged flow CSV header, spelled as existing consumers read it
pub const PRIVILEGED_HEADER: [&str; 2] = ["bID_mID_oID", "priviledged_flow"];

pub const DEFAULT_FEATURES_FILE: &str = "features.csv";
pub const DEFAULT_PRIVILEGED_FILE: &str = "privileged_flow.csv";

/// Default worker count for batch runs
pub const DEFAULT_JOBS: usize = 1;

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get batch worker count from environment or use default
pub fn get_default_jobs() -> usize {
    std::env::var("PROVFLOW_JOBS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n: &usize| *n > 0)
        .unwrap_or(DEFAULT_JOBS)
}
