//! Teardown

use crate::error::{ProviderError, Stage};
use crate::reconciler::Reconciler;
use cluster_types::ClusterState;
use tracing::{info, warn};

impl Reconciler {
    /// Delete cluster `id`
    ///
    /// Deleting a cluster that is already gone succeeds.
    pub async fn delete(&self, id: &str, last: &ClusterState) -> Result<(), ProviderError> {
        if let Some(recorded) = last.name().filter(|name| *name != id) {
            warn!("Deleting cluster {} whose record names it {}", id, recorded);
        }

        match self.k3d_client.delete_cluster(id).await {
            Ok(()) => {
                info!("Deleted cluster {}", id);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                info!("Cluster {} was already gone", id);
                Ok(())
            }
            Err(e) => Err(ProviderError::provision(Stage::Delete, e)),
        }
    }
}
