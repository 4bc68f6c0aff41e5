//! Configuration module
//!
//! Environment settings (optionally loaded from `.env`) and the classifier
//! configuration assembled from flags plus environment fallbacks.

use serde::{Deserialize, Serialize};
use std::env;

use crate::constants::get_default_jobs;
use crate::error::ProvResult;
use crate::logic::threat::{ContainerEngine, FlowPolicy};

// ============================================================================
// ENVIRONMENT
// ============================================================================

/// Settings read from the environment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// PROVFLOW_HOST_IPCNS
    pub host_ipcns: Option<String>,

    /// PROVFLOW_CLUSTER_IPCNS
    pub cluster_ipcns: Option<String>,

    /// PROVFLOW_POLICY (1 or 2)
    pub policy: Option<String>,

    /// PROVFLOW_JOBS
    pub jobs: usize,
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            host_ipcns: non_empty_var("PROVFLOW_HOST_IPCNS"),
            cluster_ipcns: non_empty_var("PROVFLOW_CLUSTER_IPCNS"),
            policy: non_empty_var("PROVFLOW_POLICY"),
            jobs: get_default_jobs(),
        }
    }
}

// ============================================================================
// CLASSIFIER CONFIG
// ============================================================================

/// Classifier settings before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub engine: ContainerEngine,
    pub host_ipcns: Option<String>,
    pub cluster_ipcns: Option<String>,
    pub policy: Option<String>,
}

impl ClassifierConfig {
    /// Docker: host vs container
    pub fn docker(host_ipcns: impl Into<String>) -> Self {
        Self {
            engine: ContainerEngine::Docker,
            host_ipcns: Some(host_ipcns.into()),
            ..Default::default()
        }
    }

    /// Kubernetes: host vs cluster vs pod
    pub fn kubernetes(host_ipcns: impl Into<String>, cluster_ipcns: impl Into<String>, policy: impl Into<String>) -> Self {
        Self {
            engine: ContainerEngine::Kube,
            host_ipcns: Some(host_ipcns.into()),
            cluster_ipcns: Some(cluster_ipcns.into()),
            policy: Some(policy.into()),
        }
    }

    /// Fill unset fields from the environment
    pub fn with_env_fallback(mut self, config: &Config) -> Self {
        if self.host_ipcns.is_none() {
            self.host_ipcns = config.host_ipcns.clone();
        }
        if self.cluster_ipcns.is_none() {
            self.cluster_ipcns = config.cluster_ipcns.clone();
        }
        if self.policy.is_none() {
            self.policy = config.policy.clone();
        }
        self
    }

    /// Turn the settings into a policy, rejecting anything unusable
    pub fn validate(&self) -> ProvResult<FlowPolicy> {
        FlowPolicy::from_parts(
            self.engine,
            self.host_ipcns.as_deref(),
            self.cluster_ipcns.as_deref(),
            self.policy.as_deref(),
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::threat::KubePolicy;

    #[test]
    fn test_default_config_is_docker_without_host() {
        let config = ClassifierConfig::default();
        assert_eq!(config.engine, ContainerEngine::Docker);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_named_constructors_validate() {
        assert_eq!(
            ClassifierConfig::docker("4026531839").validate().unwrap(),
            FlowPolicy::docker("4026531839")
        );
        assert_eq!(
            ClassifierConfig::kubernetes("h", "c", "1").validate().unwrap(),
            FlowPolicy::kubernetes("h", "c", KubePolicy::Boundary)
        );
        assert!(ClassifierConfig::kubernetes("h", "h", "1").validate().is_err());
        assert!(ClassifierConfig::kubernetes("h", "c", "3").validate().is_err());
    }

    #[test]
    fn test_env_fallback_only_fills_gaps() {
        let env = Config {
            host_ipcns: Some("env-host".to_string()),
            cluster_ipcns: Some("env-cluster".to_string()),
            policy: Some("2".to_string()),
            jobs: 1,
        };
        let config = ClassifierConfig {
            engine: ContainerEngine::Kube,
            host_ipcns: Some("flag-host".to_string()),
            ..Default::default()
        }
        .with_env_fallback(&env);

        assert_eq!(config.host_ipcns.as_deref(), Some("flag-host"));
        assert_eq!(config.cluster_ipcns.as_deref(), Some("env-cluster"));
        assert_eq!(
            config.validate().unwrap(),
            FlowPolicy::kubernetes("flag-host", "env-cluster", KubePolicy::InterPod)
        );
    }
}
