//! Preview and create

use crate::error::{ProviderError, Stage};
use crate::kubeconfig;
use crate::reconciler::Reconciler;
use cluster_types::{ClusterSpec, ClusterState};
use k3d_client::K3dError;
use tracing::{error, info, warn};

impl Reconciler {
    /// State a create would produce, without creating anything
    ///
    /// The kubeconfig is unknown until the cluster exists, so it is absent.
    pub fn preview(
        &self,
        resource_name: &str,
        spec: &ClusterSpec,
    ) -> Result<ClusterState, ProviderError> {
        let checked = self.check(resource_name, spec, None)?;
        info!("Preview: would create cluster {}", checked.name);
        Ok(ClusterState::planned(checked.into_spec()))
    }

    /// Create the cluster and record its kubeconfig
    ///
    /// On failure no state is returned. If k3d created the cluster but the
    /// kubeconfig could not be fetched, the cluster is left in place and a
    /// later read will pick it up.
    pub async fn create(
        &self,
        resource_name: &str,
        spec: &ClusterSpec,
    ) -> Result<ClusterState, ProviderError> {
        let checked = self.check(resource_name, spec, None)?;
        let name = checked.name.clone();
        let image = checked.version.as_deref().map(|v| self.image_for(v));

        info!(
            "Creating cluster {} for resource {} (image: {})",
            name,
            resource_name,
            image.as_deref().unwrap_or("k3d default")
        );

        self.k3d_client
            .create_cluster(&name, &checked.config, image.as_deref())
            .await
            .map_err(|e| {
                error!("Failed to create cluster {}: {}", name, e);
                ProviderError::provision(Stage::Create, e)
            })?;

        let kube_config = self.k3d_client.get_kubeconfig(&name).await.map_err(|e| {
            warn!(
                "Cluster {} was created but its kubeconfig could not be fetched: {}",
                name, e
            );
            ProviderError::provision(Stage::Create, e)
        })?;

        let summary = kubeconfig::inspect(&kube_config).map_err(|reason| {
            warn!("Cluster {} returned an unusable kubeconfig: {}", name, reason);
            ProviderError::provision(Stage::Create, K3dError::InvalidOutput(reason))
        })?;

        info!(
            "Created cluster {} (context: {}, API server: {})",
            name,
            summary.current_context.as_deref().unwrap_or("none"),
            summary.servers.join(", ")
        );
        Ok(ClusterState::provisioned(checked.into_spec(), kube_config))
    }
}
