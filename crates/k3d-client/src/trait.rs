//! K3dClient trait for mocking
//!
//! This trait abstracts the k3d CLI so the provider can be unit tested
//! against `MockK3dClient` without Docker.

use crate::error::K3dError;
use crate::models::ClusterInfo;
use cluster_types::Secret;

/// Trait for k3d operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait K3dClientTrait: Send + Sync {
    /// Binary (or mock identifier) used for operations
    fn binary(&self) -> &str;

    /// k3d version string, used as a connectivity check
    async fn version(&self) -> Result<String, K3dError>;

    /// Create a cluster from a `Simple` config document
    ///
    /// `image` overrides the k3s image for every node when set.
    async fn create_cluster(&self, name: &str, config: &str, image: Option<&str>) -> Result<(), K3dError>;

    /// All clusters known to k3d
    async fn list_clusters(&self) -> Result<Vec<ClusterInfo>, K3dError>;

    /// A single cluster, or `None` when it does not exist
    async fn get_cluster(&self, name: &str) -> Result<Option<ClusterInfo>, K3dError> {
        Ok(self
            .list_clusters()
            .await?
            .into_iter()
            .find(|c| c.name == name))
    }

    /// Kubeconfig for a cluster
    async fn get_kubeconfig(&self, name: &str) -> Result<Secret, K3dError>;

    /// Delete a cluster. Returns `K3dError::NotFound` if it does not exist.
    async fn delete_cluster(&self, name: &str) -> Result<(), K3dError>;

    /// Replace the image a node runs
    async fn set_node_image(&self, node: &str, image: &str) -> Result<(), K3dError>;
}
