//! Cluster resource
//!
//! Desired and recorded state of a single k3d cluster.

use crate::secret::{REDACTED, Secret};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Resource type token exposed to the orchestration engine
pub const CLUSTER_RESOURCE_TYPE: &str = "k3d:index:Cluster";

/// Longest cluster name k3d accepts
pub const MAX_CLUSTER_NAME_LEN: usize = 32;

/// Image repository a bare version is resolved against
pub const DEFAULT_K3S_REPOSITORY: &str = "rancher/k3s";

/// State attributes that hold secret values (serialized names)
pub const SECRET_FIELDS: &[&str] = &["kubeConfig"];

/// Desired state of a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// k3d `Simple` config document (YAML). The default config is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,

    /// Cluster name. A unique name is derived from the resource name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Pinned k3s version (e.g. `v1.31.5-k3s1`) or full image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ClusterSpec {
    /// Create an empty spec
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the config document
    #[must_use]
    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = Some(config.into());
        self
    }

    /// Set the cluster name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Pin the k3s version
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Recorded state of a cluster
///
/// `kube_config` is output-only: it is `None` until a create has completed and
/// is never read from a `ClusterSpec`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterState {
    /// Inputs that were actually applied
    #[serde(flatten)]
    pub inputs: ClusterSpec,

    /// Kubeconfig for the cluster (secret)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_config: Option<Secret>,
}

impl ClusterState {
    /// State for inputs that have not been provisioned yet
    pub fn planned(inputs: ClusterSpec) -> Self {
        Self {
            inputs,
            kube_config: None,
        }
    }

    /// State after a successful create
    pub fn provisioned(inputs: ClusterSpec, kube_config: Secret) -> Self {
        Self {
            inputs,
            kube_config: Some(kube_config),
        }
    }

    /// Cluster name, which doubles as the resource id
    pub fn name(&self) -> Option<&str> {
        self.inputs.name.as_deref()
    }

    /// Applied config document
    pub fn config(&self) -> Option<&str> {
        self.inputs.config.as_deref()
    }

    /// Applied version pin
    pub fn version(&self) -> Option<&str> {
        self.inputs.version.as_deref()
    }

    /// JSON view with every secret attribute replaced by a placeholder
    ///
    /// This is the only form of a state that may be logged.
    pub fn redacted(&self) -> serde_json::Value {
        let mut value = match serde_json::to_value(self) {
            Ok(value) => value,
            Err(e) => return serde_json::json!({ "error": e.to_string() }),
        };
        if let Some(object) = value.as_object_mut() {
            for field in SECRET_FIELDS {
                if let Some(slot) = object.get_mut(*field) {
                    *slot = serde_json::Value::String(REDACTED.to_string());
                }
            }
        }
        value
    }
}

/// Resolve a version pin to the k3s image k3d should run
///
/// A value that already looks like an image reference is used as-is.
pub fn image_for_version(repository: &str, version: &str) -> String {
    if version.contains(':') || version.contains('/') {
        version.to_string()
    } else {
        format!("{repository}:{version}")
    }
}

/// Whether a running node image satisfies a version pin
///
/// Registries may be prefixed by the container runtime, so a pin resolved to
/// `rancher/k3s:v1` matches `docker.io/rancher/k3s:v1`.
pub fn image_matches(repository: &str, version: &str, running_image: &str) -> bool {
    let wanted = image_for_version(repository, version);
    running_image == wanted || running_image.ends_with(&format!("/{wanted}"))
}

/// Version tag of an image reference (`rancher/k3s:v1.31.5-k3s1` → `v1.31.5-k3s1`)
pub fn version_from_image(image: &str) -> Option<&str> {
    let (repository, tag) = image.rsplit_once(':')?;
    // A colon inside the last path segment is a tag; otherwise it is a registry port
    if tag.contains('/') || repository.is_empty() {
        return None;
    }
    Some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_deserializes_camel_case_and_ignores_kube_config() {
        let spec: ClusterSpec = serde_json::from_str(
            r#"{"config":"servers: 1","name":"demo","version":"v1.31.5-k3s1","kubeConfig":"forged"}"#,
        )
        .unwrap();
        assert_eq!(spec.name.as_deref(), Some("demo"));
        assert_eq!(spec.version.as_deref(), Some("v1.31.5-k3s1"));
        assert_eq!(spec.config.as_deref(), Some("servers: 1"));
    }

    #[test]
    fn test_state_flattens_inputs() {
        let state = ClusterState::provisioned(
            ClusterSpec::new().with_name("demo"),
            Secret::new("apiVersion: v1"),
        );
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["name"], "demo");
        assert_eq!(json["kubeConfig"], "apiVersion: v1");
        assert!(json.get("inputs").is_none());

        let back: ClusterState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_planned_state_has_no_kube_config() {
        let state = ClusterState::planned(ClusterSpec::new().with_name("demo"));
        assert!(state.kube_config.is_none());
        assert!(serde_json::to_value(&state).unwrap().get("kubeConfig").is_none());
    }

    #[test]
    fn test_redacted_view_and_debug_hide_kube_config() {
        let state = ClusterState::provisioned(
            ClusterSpec::new().with_name("demo"),
            Secret::new("token: abc123"),
        );
        let redacted = state.redacted();
        assert_eq!(redacted["kubeConfig"], REDACTED);
        assert_eq!(redacted["name"], "demo");
        assert!(!format!("{:?}", state).contains("abc123"));
    }

    #[test]
    fn test_image_for_version() {
        assert_eq!(
            image_for_version(DEFAULT_K3S_REPOSITORY, "v1.31.5-k3s1"),
            "rancher/k3s:v1.31.5-k3s1"
        );
        assert_eq!(
            image_for_version(DEFAULT_K3S_REPOSITORY, "registry.local:5000/k3s:dev"),
            "registry.local:5000/k3s:dev"
        );
    }

    #[test]
    fn test_image_matches_with_registry_prefix() {
        assert!(image_matches(
            DEFAULT_K3S_REPOSITORY,
            "v1.31.5-k3s1",
            "docker.io/rancher/k3s:v1.31.5-k3s1"
        ));
        assert!(!image_matches(
            DEFAULT_K3S_REPOSITORY,
            "v1.31.5-k3s1",
            "docker.io/rancher/k3s:v1.30.2-k3s1"
        ));
    }

    #[test]
    fn test_version_from_image() {
        assert_eq!(version_from_image("docker.io/rancher/k3s:v1.31.5-k3s1"), Some("v1.31.5-k3s1"));
        assert_eq!(version_from_image("registry.local:5000/k3s"), None);
        assert_eq!(version_from_image("rancher/k3s"), None);
    }
}
