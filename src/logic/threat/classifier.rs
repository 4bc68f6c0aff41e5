//! Privileged Flow Classifier
//!
//! Only classification logic - no types, no policy parsing.
//! Input: FlowContext + FlowPolicy
//! Output: PrivilegedFlowResult

use super::context::FlowContext;
use super::rules::{any_in_scope, docker_scope, kube_scope};
use super::types::{FlowIndicators, FlowPolicy, KubePolicy, NamespaceScope, PrivilegedFlowResult};
use crate::logic::graph::ProvenanceStore;

// ============================================================================
// MAIN CLASSIFICATION FUNCTION
// ============================================================================

/// Classify the flow around the store's center entity.
///
/// A store without a resolved center entity is never privileged.
pub fn classify(store: &ProvenanceStore, policy: &FlowPolicy) -> PrivilegedFlowResult {
    match FlowContext::collect(store) {
        Some(ctx) => classify_context(&ctx, policy),
        None => PrivilegedFlowResult::neutral("Center entity not found"),
    }
}

/// Classify an already collected context
pub fn classify_context(ctx: &FlowContext, policy: &FlowPolicy) -> PrivilegedFlowResult {
    match policy {
        FlowPolicy::Docker { host_ipcns } => classify_docker(ctx, host_ipcns),
        FlowPolicy::Kubernetes {
            host_ipcns,
            cluster_ipcns,
            policy,
        } => classify_kubernetes(ctx, host_ipcns, cluster_ipcns, *policy),
    }
}

// ============================================================================
// DOCKER
// ============================================================================

/// Privileged iff a container wrote the entity and the host read it
pub fn classify_docker(ctx: &FlowContext, host_ipcns: &str) -> PrivilegedFlowResult {
    let scope_of = |ns: &str| docker_scope(ns, host_ipcns);

    let indicators = FlowIndicators {
        write_from_host: any_in_scope(&ctx.writer_ipcns, NamespaceScope::Host, scope_of),
        write_from_pod: any_in_scope(&ctx.writer_ipcns, NamespaceScope::Pod, scope_of),
        read_from_host: any_in_scope(&ctx.reader_ipcns, NamespaceScope::Host, scope_of),
        ..FlowIndicators::default()
    };

    let mut reasons = Vec::new();
    let privileged = indicators.write_from_pod && indicators.read_from_host;
    if privileged {
        reasons.push("Container write read by host".to_string());
    } else if !indicators.write_from_pod {
        reasons.push("No container writer".to_string());
    } else {
        reasons.push("No host reader".to_string());
    }

    PrivilegedFlowResult {
        privileged,
        indicators,
        reasons,
    }
}

// ============================================================================
// KUBERNETES
// ============================================================================

/// Host / cluster / pod boundary checks, plus inter-pod flows under policy 2
pub fn classify_kubernetes(
    ctx: &FlowContext,
    host_ipcns: &str,
    cluster_ipcns: &str,
    policy: KubePolicy,
) -> PrivilegedFlowResult {
    if ctx.written_only_by(host_ipcns) {
        return PrivilegedFlowResult::neutral("Only written from host");
    }

    let scope_of = |ns: &str| kube_scope(ns, host_ipcns, cluster_ipcns);

    let mut indicators = FlowIndicators {
        write_from_host: any_in_scope(&ctx.writer_ipcns, NamespaceScope::Host, scope_of),
        write_from_cluster: any_in_scope(&ctx.writer_ipcns, NamespaceScope::Cluster, scope_of),
        write_from_pod: any_in_scope(&ctx.writer_ipcns, NamespaceScope::Pod, scope_of),
        read_from_host: any_in_scope(&ctx.reader_ipcns, NamespaceScope::Host, scope_of),
        read_from_cluster: any_in_scope(&ctx.reader_ipcns, NamespaceScope::Cluster, scope_of),
        inter_pod: false,
    };

    let mut reasons = Vec::new();

    if indicators.write_from_cluster && indicators.read_from_host {
        reasons.push("Cluster write read by host".to_string());
    }
    if indicators.write_from_pod && indicators.read_from_host {
        reasons.push("Pod write read by host".to_string());
    }
    if indicators.write_from_pod && indicators.read_from_cluster {
        reasons.push("Pod write read by cluster".to_string());
    }

    if policy == KubePolicy::InterPod && indicators.write_from_pod {
        let is_pod = |pair: &&(String, String)| scope_of(&pair.0) == NamespaceScope::Pod;
        let foreign = ctx
            .reader_pairs
            .iter()
            .filter(is_pod)
            .find(|pair| !ctx.writer_pairs.contains(*pair));

        if let Some((ipc, pid)) = foreign {
            indicators.inter_pod = true;
            reasons.push(format!("Pod write read by another pod (ipcns {}, pidns {})", ipc, pid));
        }
    }

    let privileged = !reasons.is_empty();
    if !privileged {
        reasons.push("No cross-boundary flow".to_string());
    }

    PrivilegedFlowResult {
        privileged,
        indicators,
        reasons,
    }
}
