//! Privileged Flow Types
//!
//! Policies, scopes and results for privileged-flow classification.
//! No classification logic here - only data structures.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ProvError, ProvResult};
use crate::logic::graph::SnapshotId;

// ============================================================================
// POLICY
// ============================================================================

/// Kubernetes comparison policy (numbered as on the command line)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KubePolicy {
    /// 1: host / cluster / pod boundaries only
    Boundary,
    /// 2: boundaries plus inter-pod flows via (ipcns, pidns) pairs
    InterPod,
}

impl KubePolicy {
    pub fn from_number(value: &str) -> ProvResult<Self> {
        match value.trim() {
            "1" => Ok(KubePolicy::Boundary),
            "2" => Ok(KubePolicy::InterPod),
            other => Err(ProvError::Config(format!(
                "unknown Kubernetes policy '{}' (expected 1 or 2)",
                other
            ))),
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            KubePolicy::Boundary => 1,
            KubePolicy::InterPod => 2,
        }
    }
}

/// Container engine whose namespace layout is being checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerEngine {
    #[default]
    Docker,
    Kube,
}

impl ContainerEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerEngine::Docker => "docker",
            ContainerEngine::Kube => "kubernetes",
        }
    }
}

/// Namespace-comparison policy for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "engine", rename_all = "lowercase")]
pub enum FlowPolicy {
    /// Host vs container
    Docker { host_ipcns: String },
    /// Host vs cluster vs pod
    Kubernetes {
        host_ipcns: String,
        cluster_ipcns: String,
        policy: KubePolicy,
    },
}

impl FlowPolicy {
    pub fn docker(host_ipcns: impl Into<String>) -> Self {
        FlowPolicy::Docker {
            host_ipcns: host_ipcns.into(),
        }
    }

    pub fn kubernetes(host_ipcns: impl Into<String>, cluster_ipcns: impl Into<String>, policy: KubePolicy) -> Self {
        FlowPolicy::Kubernetes {
            host_ipcns: host_ipcns.into(),
            cluster_ipcns: cluster_ipcns.into(),
            policy,
        }
    }

    /// Build and validate a policy from loosely typed settings (flags, env)
    pub fn from_parts(
        engine: ContainerEngine,
        host_ipcns: Option<&str>,
        cluster_ipcns: Option<&str>,
        policy: Option<&str>,
    ) -> ProvResult<Self> {
        let host = host_ipcns.unwrap_or_default().trim();
        let built = match engine {
            ContainerEngine::Docker => FlowPolicy::docker(host),
            ContainerEngine::Kube => {
                let policy = policy.ok_or_else(|| {
                    ProvError::Config("Kubernetes policy is required (1 or 2)".to_string())
                })?;
                FlowPolicy::kubernetes(
                    host,
                    cluster_ipcns.unwrap_or_default().trim(),
                    KubePolicy::from_number(policy)?,
                )
            }
        };
        built.validate()?;
        Ok(built)
    }

    pub fn engine(&self) -> ContainerEngine {
        match self {
            FlowPolicy::Docker { .. } => ContainerEngine::Docker,
            FlowPolicy::Kubernetes { .. } => ContainerEngine::Kube,
        }
    }

    /// Reject policies that cannot classify anything meaningfully.
    /// Must run before the first snapshot is processed.
    pub fn validate(&self) -> ProvResult<()> {
        match self {
            FlowPolicy::Docker { host_ipcns } => require_namespace("host", host_ipcns),
            FlowPolicy::Kubernetes {
                host_ipcns,
                cluster_ipcns,
                ..
            } => {
                require_namespace("host", host_ipcns)?;
                require_namespace("cluster", cluster_ipcns)?;
                if host_ipcns.trim() == cluster_ipcns.trim() {
                    return Err(ProvError::Config(
                        "host and cluster IPC namespaces must differ".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// `docker (host ipcns X)` / `kubernetes policy N (host ipcns X, cluster ipcns Y)`
impl fmt::Display for FlowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowPolicy::Docker { host_ipcns } => {
                write!(f, "{} (host ipcns {})", self.engine().as_str(), host_ipcns)
            }
            FlowPolicy::Kubernetes {
                host_ipcns,
                cluster_ipcns,
                policy,
            } => write!(
                f,
                "{} policy {} (host ipcns {}, cluster ipcns {})",
                self.engine().as_str(),
                policy.number(),
                host_ipcns,
                cluster_ipcns
            ),
        }
    }
}

fn require_namespace(name: &str, value: &str) -> ProvResult<()> {
    if value.trim().is_empty() {
        Err(ProvError::Config(format!("{} IPC namespace is required", name)))
    } else {
        Ok(())
    }
}

// ============================================================================
// SCOPES & INDICATORS
// ============================================================================

/// Where a namespace sits relative to the trust boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamespaceScope {
    Host,
    Cluster,
    Pod,
}

/// Which scope combinations were observed on the flow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowIndicators {
    pub write_from_host: bool,
    pub write_from_cluster: bool,
    /// Docker: any non-host writer. Kubernetes: any writer outside host/cluster.
    pub write_from_pod: bool,
    pub read_from_host: bool,
    pub read_from_cluster: bool,
    /// A pod (ipcns, pidns) pair visible to readers but not to writers
    pub inter_pod: bool,
}

// ============================================================================
// RESULTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrivilegedFlowResult {
    pub privileged: bool,
    pub indicators: FlowIndicators,
    pub reasons: Vec<String>,
}

impl PrivilegedFlowResult {
    /// Non-privileged result with a single explanation
    pub fn neutral(reason: impl Into<String>) -> Self {
        Self {
            privileged: false,
            indicators: FlowIndicators::default(),
            reasons: vec![reason.into()],
        }
    }

    /// Binary label as written to the output (0 / 1)
    pub fn label(&self) -> u8 {
        u8::from(self.privileged)
    }
}

/// One row of the privileged-flow output
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PrivilegedFlowRecord {
    #[serde(rename = "bID_mID_oID")]
    pub identifier: String,
    #[serde(rename = "priviledged_flow")]
    pub privileged_flow: u8,
}

impl PrivilegedFlowRecord {
    pub fn new(id: &SnapshotId, result: &PrivilegedFlowResult) -> Self {
        Self {
            identifier: id.to_string(),
            privileged_flow: result.label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_numbers() {
        assert_eq!(KubePolicy::from_number("1").unwrap(), KubePolicy::Boundary);
        assert_eq!(KubePolicy::from_number(" 2 ").unwrap(), KubePolicy::InterPod);
        assert!(KubePolicy::from_number("3").is_err());
        assert!(KubePolicy::from_number("").is_err());
    }

    #[test]
    fn test_validate_rejects_missing_namespaces() {
        assert!(FlowPolicy::docker("").validate().is_err());
        assert!(FlowPolicy::docker("4026531839").validate().is_ok());
        assert!(FlowPolicy::kubernetes("h", "", KubePolicy::Boundary).validate().is_err());
        assert!(FlowPolicy::kubernetes("h", "h", KubePolicy::Boundary).validate().is_err());
        assert!(FlowPolicy::kubernetes("h", "c", KubePolicy::InterPod).validate().is_ok());
    }

    #[test]
    fn test_from_parts() {
        let docker = FlowPolicy::from_parts(ContainerEngine::Docker, Some(" h "), None, None).unwrap();
        assert_eq!(docker, FlowPolicy::docker("h"));
        assert_eq!(docker.engine(), ContainerEngine::Docker);

        let kube = FlowPolicy::from_parts(ContainerEngine::Kube, Some("h"), Some("c"), Some("2")).unwrap();
        assert_eq!(kube, FlowPolicy::kubernetes("h", "c", KubePolicy::InterPod));

        assert!(FlowPolicy::from_parts(ContainerEngine::Docker, None, None, None).is_err());
        assert!(FlowPolicy::from_parts(ContainerEngine::Kube, Some("h"), Some("c"), None).is_err());
        assert!(FlowPolicy::from_parts(ContainerEngine::Kube, Some("h"), Some("c"), Some("7")).is_err());
        assert!(FlowPolicy::from_parts(ContainerEngine::Kube, Some("h"), None, Some("1")).is_err());
    }

    #[test]
    fn test_policy_display() {
        assert_eq!(FlowPolicy::docker("4026531839").to_string(), "docker (host ipcns 4026531839)");
        assert_eq!(
            FlowPolicy::kubernetes("h", "c", KubePolicy::InterPod).to_string(),
            "kubernetes policy 2 (host ipcns h, cluster ipcns c)"
        );
    }

    #[test]
    fn test_record_identifier_and_label() {
        let id = SnapshotId::new("6", "cf:1851734740", "22675");
        let mut result = PrivilegedFlowResult::neutral("none");
        assert_eq!(PrivilegedFlowRecord::new(&id, &result).privileged_flow, 0);

        result.privileged = true;
        let record = PrivilegedFlowRecord::new(&id, &result);
        assert_eq!(record.identifier, "6_1851734740_22675");
        assert_eq!(record.privileged_flow, 1);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["bID_mID_oID"], "6_1851734740_22675");
        assert_eq!(json["priviledged_flow"], 1);
    }
}
