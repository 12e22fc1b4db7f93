//! Refresh recorded state from the live cluster
//!
//! k3d reports node counts and node images, so drift in `servers`, `agents`
//! and the pinned version is detectable. Everything else in the config is
//! taken from the record as-is.

use crate::error::ProviderError;
use crate::kubeconfig;
use crate::reconciler::{ReadOutcome, Reconciler};
use cluster_types::{ClusterState, SimpleConfig, image_matches, version_from_image};
use k3d_client::{ClusterInfo, K3dError};
use tracing::{debug, info, warn};

impl Reconciler {
    /// Read the live cluster `id` and reconcile it with `last`
    ///
    /// A missing cluster is `ReadOutcome::NotFound`, not an error.
    pub async fn read(&self, id: &str, last: &ClusterState) -> Result<ReadOutcome, ProviderError> {
        debug!("Reading cluster {}", id);

        let cluster = match self.k3d_client.get_cluster(id).await {
            Ok(Some(cluster)) => cluster,
            Ok(None) => {
                info!("Cluster {} no longer exists", id);
                return Ok(ReadOutcome::NotFound);
            }
            Err(e) if e.is_not_found() => {
                info!("Cluster {} no longer exists", id);
                return Ok(ReadOutcome::NotFound);
            }
            Err(e) => return Err(ProviderError::drift_read(id, e)),
        };

        let kube_config = match self.k3d_client.get_kubeconfig(id).await {
            Ok(kube_config) => kube_config,
            // Deleted between the two calls
            Err(e) if e.is_not_found() => {
                info!("Cluster {} disappeared while being read", id);
                return Ok(ReadOutcome::NotFound);
            }
            Err(e) => return Err(ProviderError::drift_read(id, e)),
        };
        kubeconfig::inspect(&kube_config)
            .map_err(|reason| ProviderError::drift_read(id, K3dError::InvalidOutput(reason)))?;

        let mut inputs = last.inputs.clone();
        inputs.name = Some(id.to_string());
        inputs.config = Some(self.observed_config(id, last.config(), &cluster));
        inputs.version = self.observed_version(id, last.version(), &cluster);

        Ok(ReadOutcome::Found(ClusterState::provisioned(inputs, kube_config)))
    }

    /// Recorded config with node counts replaced by the observed ones
    ///
    /// The text is returned untouched when the counts agree. A record without
    /// a config is treated as the default config for `id`.
    fn observed_config(&self, id: &str, recorded: Option<&str>, cluster: &ClusterInfo) -> String {
        let recorded = recorded
            .map(str::to_string)
            .unwrap_or_else(|| SimpleConfig::default_for(id));

        let mut parsed = match SimpleConfig::parse(&recorded) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Recorded config of cluster {} does not parse, keeping it: {}", id, e);
                return recorded;
            }
        };

        let mut drifted = false;
        let observed_servers = cluster.servers();
        if parsed.servers().ok() != Some(observed_servers) {
            warn!(
                "Cluster {} drifted: {} server(s) running, config declares {:?}",
                id,
                observed_servers,
                parsed.servers().ok()
            );
            parsed.set_servers(observed_servers);
            drifted = true;
        }
        let observed_agents = cluster.agents();
        if parsed.agents().ok() != Some(observed_agents) {
            warn!(
                "Cluster {} drifted: {} agent(s) running, config declares {:?}",
                id,
                observed_agents,
                parsed.agents().ok()
            );
            parsed.set_agents(observed_agents);
            drifted = true;
        }

        if !drifted {
            return recorded;
        }
        match parsed.to_yaml() {
            Ok(yaml) => yaml,
            Err(e) => {
                warn!("Failed to re-serialize config of cluster {}: {}", id, e);
                recorded
            }
        }
    }

    /// Recorded version pin, replaced by the running one if they disagree
    ///
    /// An unpinned cluster stays unpinned whatever image it runs.
    fn observed_version(
        &self,
        id: &str,
        pinned: Option<&str>,
        cluster: &ClusterInfo,
    ) -> Option<String> {
        let pinned = pinned?;
        let Some(running) = cluster.server_image() else {
            return Some(pinned.to_string());
        };
        if image_matches(&self.image_repository, pinned, running) {
            return Some(pinned.to_string());
        }

        // Keep the form of the pin: bare tag stays a tag, image ref stays a ref
        let observed = if pinned.contains(':') || pinned.contains('/') {
            running.to_string()
        } else {
            version_from_image(running).unwrap_or(running).to_string()
        };
        warn!(
            "Cluster {} drifted: running {}, version pinned to {}",
            id, observed, pinned
        );
        Some(observed)
    }
}
