//! Process-backed k3d client

use crate::common::{CLUSTER_NOT_FOUND, CommandRunner, NODE_NOT_FOUND};
use crate::error::K3dError;
use crate::k3d_trait::K3dClientTrait;
use crate::models::ClusterInfo;
use cluster_types::Secret;
use std::time::Duration;
use tracing::{debug, info};

/// k3d client that shells out to the k3d binary
#[derive(Debug, Clone)]
pub struct K3dClient {
    runner: CommandRunner,
    timeout: Option<Duration>,
}

impl K3dClient {
    /// Create a client for the given binary name or path
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            runner: CommandRunner::new(binary),
            timeout: None,
        }
    }

    /// Pass `--timeout` to k3d for cluster creation
    ///
    /// k3d enforces the timeout itself and rolls the cluster back when it
    /// expires; the client only forwards the value.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Arguments for `k3d cluster create`
    pub fn create_args(&self, name: &str, image: Option<&str>) -> Vec<String> {
        let mut args: Vec<String> = ["cluster", "create", name, "--config", "-"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        if let Some(image) = image {
            args.push("--image".to_string());
            args.push(image.to_string());
        }
        if let Some(timeout) = self.timeout {
            args.push("--timeout".to_string());
            args.push(format!("{}s", timeout.as_secs()));
        }
        args
    }
}

#[async_trait::async_trait]
impl K3dClientTrait for K3dClient {
    fn binary(&self) -> &str {
        self.runner.binary()
    }

    async fn version(&self) -> Result<String, K3dError> {
        let output = self.runner.run_checked(&["version"], None, &[]).await?;
        output
            .stdout
            .lines()
            .next()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .ok_or_else(|| K3dError::InvalidOutput("k3d version printed nothing".to_string()))
    }

    async fn create_cluster(&self, name: &str, config: &str, image: Option<&str>) -> Result<(), K3dError> {
        let args = self.create_args(name, image);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        info!("Creating k3d cluster {}", name);
        self.runner.run_checked(&args, Some(config.as_bytes()), &[]).await?;
        info!("Created k3d cluster {}", name);
        Ok(())
    }

    async fn list_clusters(&self) -> Result<Vec<ClusterInfo>, K3dError> {
        let output = self
            .runner
            .run_checked(&["cluster", "list", "-o", "json"], None, &[])
            .await?;
        let body = output.stdout.trim();
        if body.is_empty() || body == "null" {
            return Ok(Vec::new());
        }
        let clusters: Vec<ClusterInfo> = serde_json::from_str(body)?;
        debug!("k3d reports {} cluster(s)", clusters.len());
        Ok(clusters)
    }

    async fn get_kubeconfig(&self, name: &str) -> Result<Secret, K3dError> {
        let output = self
            .runner
            .run_checked(&["kubeconfig", "get", name], None, CLUSTER_NOT_FOUND)
            .await?;
        let kubeconfig = Secret::new(output.stdout);
        if kubeconfig.is_blank() {
            return Err(K3dError::InvalidOutput(format!(
                "k3d returned an empty kubeconfig for cluster {}",
                name
            )));
        }
        Ok(kubeconfig)
    }

    async fn delete_cluster(&self, name: &str) -> Result<(), K3dError> {
        info!("Deleting k3d cluster {}", name);
        let output = self
            .runner
            .run_checked(&["cluster", "delete", name], None, CLUSTER_NOT_FOUND)
            .await?;
        // Older k3d releases exit zero when there is nothing to delete
        if output.combined().to_lowercase().contains("no clusters found") {
            return Err(K3dError::NotFound(format!("cluster {} does not exist", name)));
        }
        info!("Deleted k3d cluster {}", name);
        Ok(())
    }

    async fn set_node_image(&self, node: &str, image: &str) -> Result<(), K3dError> {
        info!("Setting image of k3d node {} to {}", node, image);
        self.runner
            .run_checked(&["node", "edit", node, "--image", image], None, NODE_NOT_FOUND)
            .await?;
        Ok(())
    }
}
