//! Test utilities for unit testing the reconciler
//!
//! Helpers for building specs and reconcilers backed by `MockK3dClient`.

use crate::reconciler::Reconciler;
use cluster_types::{ClusterSpec, ClusterState, DEFAULT_K3S_REPOSITORY};
use k3d_client::MockK3dClient;

/// Version pin used across tests; matches the mock's default image
pub const TEST_VERSION: &str = "v1.31.5-k3s1";

/// A second version for upgrade tests
pub const TEST_UPGRADE_VERSION: &str = "v1.32.1-k3s1";

/// A kubeconfig with a different API server port than the mock hands out
pub const TEST_ROTATED_KUBECONFIG: &str = "apiVersion: v1
clusters:
- cluster:
    server: https://0.0.0.0:7443
  name: k3d-demo
contexts:
- context:
    cluster: k3d-demo
    user: admin@k3d-demo
  name: k3d-demo
current-context: k3d-demo
kind: Config
users:
- name: admin@k3d-demo
  user:
    token: rotated
";

/// Reconciler sharing state with `mock`
pub fn create_test_reconciler(mock: &MockK3dClient) -> Reconciler {
    Reconciler::new(mock.clone(), DEFAULT_K3S_REPOSITORY)
}

/// Config document with the given topology
pub fn create_test_config(servers: u64, agents: u64) -> String {
    format!(
        "apiVersion: k3d.io/v1alpha5\nkind: Simple\nservers: {}\nagents: {}\n",
        servers, agents
    )
}

/// Named spec with one server and `agents` agents
pub fn create_test_spec(name: &str, agents: u64) -> ClusterSpec {
    ClusterSpec::new()
        .with_name(name)
        .with_config(create_test_config(1, agents))
}

/// Create a cluster through the reconciler and return its state
pub async fn create_test_cluster(reconciler: &Reconciler, spec: &ClusterSpec) -> ClusterState {
    reconciler
        .create("test-resource", spec)
        .await
        .expect("create should succeed against the mock")
}
