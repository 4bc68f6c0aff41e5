//! Namespace Boundary Rules
//!
//! Maps an IPC namespace to its scope under a given policy.

use super::types::NamespaceScope;

/// Docker has two scopes: the host namespace and everything else
pub fn docker_scope(ipcns: &str, host_ipcns: &str) -> NamespaceScope {
    if ipcns == host_ipcns {
        NamespaceScope::Host
    } else {
        NamespaceScope::Pod
    }
}

/// Kubernetes separates the host, the cluster (node agent) and pods
pub fn kube_scope(ipcns: &str, host_ipcns: &str, cluster_ipcns: &str) -> NamespaceScope {
    if ipcns == host_ipcns {
        NamespaceScope::Host
    } else if ipcns == cluster_ipcns {
        NamespaceScope::Cluster
    } else {
        NamespaceScope::Pod
    }
}

/// Any namespace in `set` falls in `scope`
pub fn any_in_scope<'a, I, F>(set: I, scope: NamespaceScope, scope_of: F) -> bool
where
    I: IntoIterator<Item = &'a String>,
    F: Fn(&str) -> NamespaceScope,
{
    set.into_iter().any(|ns| scope_of(ns) == scope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes() {
        assert_eq!(docker_scope("h", "h"), NamespaceScope::Host);
        assert_eq!(docker_scope("c", "h"), NamespaceScope::Pod);
        assert_eq!(kube_scope("h", "h", "c"), NamespaceScope::Host);
        assert_eq!(kube_scope("c", "h", "c"), NamespaceScope::Cluster);
        assert_eq!(kube_scope("p", "h", "c"), NamespaceScope::Pod);
    }
}
