//! In-place update
//!
//! Only the version can change in place. k3d has no upgrade command, so a new
//! pin is applied by swapping the image of every k3s node.

use crate::error::{ProviderError, Stage};
use crate::reconciler::Reconciler;
use crate::reconciler::check::validate_version;
use crate::reconciler::diff::diff_cluster;
use cluster_types::{Attribute, ChangeKind, ClusterSpec, ClusterState, image_matches};
use k3d_client::K3dError;
use tracing::{error, info};

impl Reconciler {
    /// Apply `spec` to cluster `id` without recreating it
    ///
    /// Fails with a validation error, before touching k3d, when the change
    /// needs a replace. Removing a version pin changes only the record.
    pub async fn update(
        &self,
        id: &str,
        spec: &ClusterSpec,
        last: &ClusterState,
    ) -> Result<ClusterState, ProviderError> {
        let diff = diff_cluster(spec, last);
        if diff.requires_replace() {
            let keys: Vec<&str> = diff.replace_keys().iter().map(|a| a.as_str()).collect();
            return Err(ProviderError::Validation(format!(
                "cluster {} cannot be updated in place; changed: {}",
                id,
                keys.join(", ")
            )));
        }
        if let Some(version) = spec.version.as_deref() {
            validate_version(version)?;
        }

        let mut next = last.clone();
        if diff.change(Attribute::Version) == ChangeKind::ChangedUpdatable {
            if let Some(version) = spec.version.as_deref() {
                self.set_cluster_version(id, version).await?;
            } else {
                info!("Cluster {}: version unpinned, running nodes are left as they are", id);
            }
            next.inputs.version = spec.version.clone();
        }

        // The name cannot change here; a supplied config is equivalent to the
        // recorded one, so the recorded text is kept
        next.inputs.name = Some(id.to_string());
        Ok(next)
    }

    async fn set_cluster_version(&self, id: &str, version: &str) -> Result<(), ProviderError> {
        let image = self.image_for(version);
        let cluster = self
            .k3d_client
            .get_cluster(id)
            .await
            .map_err(|e| ProviderError::provision(Stage::Update, e))?
            .ok_or_else(|| {
                ProviderError::provision(
                    Stage::Update,
                    K3dError::NotFound(format!("cluster {} does not exist", id)),
                )
            })?;

        info!("Updating cluster {} to image {}", id, image);
        for node in cluster.k3s_nodes() {
            if image_matches(&self.image_repository, version, &node.image) {
                continue;
            }
            self.k3d_client
                .set_node_image(&node.name, &image)
                .await
                .map_err(|e| {
                    error!("Failed to update node {} of cluster {}: {}", node.name, id, e);
                    ProviderError::provision(Stage::Update, e)
                })?;
        }
        Ok(())
    }
}
