//! Kubeconfig checks
//!
//! k3d prints the kubeconfig on stdout; a truncated or garbled document would
//! otherwise be recorded as a valid credential.

use cluster_types::Secret;
use kube::config::Kubeconfig;

/// Non-secret facts about a kubeconfig, safe to log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeconfigSummary {
    /// `current-context`, if set
    pub current_context: Option<String>,
    /// API server URLs, in document order
    pub servers: Vec<String>,
}

/// Parse a kubeconfig and check it points at an API server
///
/// The returned error never contains the document itself.
pub fn inspect(kubeconfig: &Secret) -> Result<KubeconfigSummary, String> {
    if kubeconfig.is_blank() {
        return Err("kubeconfig is empty".to_string());
    }

    // Parser errors quote scalar values from the document, so none of their
    // text is kept
    let parsed = Kubeconfig::from_yaml(kubeconfig.expose())
        .map_err(|_| "kubeconfig does not parse as a kubeconfig document".to_string())?;

    let servers: Vec<String> = parsed
        .clusters
        .iter()
        .filter_map(|named| named.cluster.as_ref()?.server.clone())
        .collect();
    if servers.is_empty() {
        return Err("kubeconfig has no cluster with an API server".to_string());
    }

    Ok(KubeconfigSummary {
        current_context: parsed.current_context,
        servers,
    })
}
