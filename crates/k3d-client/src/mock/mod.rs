//! Mock K3dClient for unit testing
//!
//! This module provides a mock implementation of K3dClientTrait that keeps
//! clusters in memory, records every call, and can be told to fail specific
//! operations. Tests can also mutate clusters behind the provider's back to
//! simulate drift.

mod helpers;

pub use helpers::{MOCK_DEFAULT_IMAGE, MOCK_PROXY_IMAGE};

use crate::error::K3dError;
use crate::k3d_trait::K3dClientTrait;
use crate::models::{ClusterInfo, NodeRole};
use cluster_types::{Secret, SimpleConfig};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Operations the mock records and can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    /// `k3d version`
    Version,
    /// `k3d cluster create`
    CreateCluster,
    /// `k3d cluster list`
    ListClusters,
    /// `k3d kubeconfig get`
    GetKubeconfig,
    /// `k3d cluster delete`
    DeleteCluster,
    /// `k3d node edit --image`
    SetNodeImage,
}

/// Failure to inject into the next call of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// Non-zero exit with the given output
    CommandFailed(String),
    /// k3d timeout
    Timeout,
    /// Resource missing
    NotFound,
    /// Output that does not decode
    InvalidOutput(String),
}

impl MockFailure {
    fn into_error(self, operation: MockOperation) -> K3dError {
        let command = format!("{:?}", operation);
        match self {
            MockFailure::CommandFailed(output) => K3dError::CommandFailed { command, output },
            MockFailure::Timeout => K3dError::Timeout {
                command,
                output: "context deadline exceeded".to_string(),
            },
            MockFailure::NotFound => K3dError::NotFound(command),
            MockFailure::InvalidOutput(output) => K3dError::InvalidOutput(output),
        }
    }
}

/// A cluster held by the mock
#[derive(Debug, Clone)]
struct MockCluster {
    info: ClusterInfo,
    config: String,
    kubeconfig: String,
}

/// Mock K3dClient for testing
#[derive(Debug, Clone)]
pub struct MockK3dClient {
    clusters: Arc<Mutex<HashMap<String, MockCluster>>>,
    failures: Arc<Mutex<HashMap<MockOperation, MockFailure>>>,
    calls: Arc<Mutex<Vec<(MockOperation, String)>>>,
    // Counter for generating API server ports
    next_port: Arc<Mutex<u16>>,
}

impl Default for MockK3dClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockK3dClient {
    /// Create a new mock client with no clusters
    pub fn new() -> Self {
        Self {
            clusters: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            next_port: Arc::new(Mutex::new(6443)),
        }
    }

    /// Make the next call of `operation` fail
    pub fn fail_next(&self, operation: MockOperation, failure: MockFailure) {
        self.failures.lock().unwrap().insert(operation, failure);
    }

    /// Every call made so far, with its target
    pub fn calls(&self) -> Vec<(MockOperation, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls of one operation
    pub fn call_count(&self, operation: MockOperation) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| *op == operation)
            .count()
    }

    /// Number of calls that change the external system
    pub fn mutating_calls(&self) -> usize {
        self.call_count(MockOperation::CreateCluster)
            + self.call_count(MockOperation::DeleteCluster)
            + self.call_count(MockOperation::SetNodeImage)
    }

    /// Whether a cluster exists
    pub fn has_cluster(&self, name: &str) -> bool {
        self.clusters.lock().unwrap().contains_key(name)
    }

    /// Config document a cluster was created with
    pub fn cluster_config(&self, name: &str) -> Option<String> {
        self.clusters
            .lock()
            .unwrap()
            .get(name)
            .map(|c| c.config.clone())
    }

    /// Snapshot of a cluster
    pub fn cluster(&self, name: &str) -> Option<ClusterInfo> {
        self.clusters.lock().unwrap().get(name).map(|c| c.info.clone())
    }

    /// Add a cluster directly (for test setup)
    pub fn add_cluster(&self, name: &str, servers: u64, agents: u64, image: &str) {
        let port = self.next_port();
        self.clusters.lock().unwrap().insert(
            name.to_string(),
            MockCluster {
                info: helpers::cluster(name, servers, agents, image),
                config: format!("servers: {}\nagents: {}\n", servers, agents),
                kubeconfig: helpers::kubeconfig(name, port),
            },
        );
    }

    /// Remove a cluster without going through the client (out-of-band deletion)
    pub fn remove_cluster(&self, name: &str) {
        self.clusters.lock().unwrap().remove(name);
    }

    /// Change the agent count without going through the client (drift)
    pub fn scale_agents(&self, name: &str, agents: u64) {
        let mut clusters = self.clusters.lock().unwrap();
        if let Some(cluster) = clusters.get_mut(name) {
            let image = cluster
                .info
                .server_image()
                .unwrap_or(MOCK_DEFAULT_IMAGE)
                .to_string();
            let servers = cluster.info.servers();
            cluster.info = helpers::cluster(name, servers, agents, &image);
        }
    }

    /// Replace every k3s node image without going through the client (drift)
    pub fn set_cluster_image(&self, name: &str, image: &str) {
        let mut clusters = self.clusters.lock().unwrap();
        if let Some(cluster) = clusters.get_mut(name) {
            for node in cluster.info.nodes.iter_mut() {
                if matches!(node.role, NodeRole::Server | NodeRole::Agent) {
                    node.image = image.to_string();
                }
            }
        }
    }

    /// Override the kubeconfig k3d returns for a cluster
    pub fn set_kubeconfig(&self, name: &str, kubeconfig: &str) {
        if let Some(cluster) = self.clusters.lock().unwrap().get_mut(name) {
            cluster.kubeconfig = kubeconfig.to_string();
        }
    }

    fn next_port(&self) -> u16 {
        let mut port = self.next_port.lock().unwrap();
        let current = *port;
        *port += 1;
        current
    }

    /// Record a call and return the injected failure, if any
    fn record(&self, operation: MockOperation, target: &str) -> Result<(), K3dError> {
        self.calls
            .lock()
            .unwrap()
            .push((operation, target.to_string()));
        match self.failures.lock().unwrap().remove(&operation) {
            Some(failure) => Err(failure.into_error(operation)),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl K3dClientTrait for MockK3dClient {
    fn binary(&self) -> &str {
        "mock-k3d"
    }

    async fn version(&self) -> Result<String, K3dError> {
        self.record(MockOperation::Version, "")?;
        Ok("k3d version v5.7.4".to_string())
    }

    async fn create_cluster(&self, name: &str, config: &str, image: Option<&str>) -> Result<(), K3dError> {
        self.record(MockOperation::CreateCluster, name)?;

        if self.has_cluster(name) {
            return Err(K3dError::CommandFailed {
                command: format!("cluster create {}", name),
                output: format!("Failed to create cluster '{}' because a cluster with that name already exists", name),
            });
        }

        let parsed = SimpleConfig::parse(config).map_err(|e| K3dError::CommandFailed {
            command: format!("cluster create {}", name),
            output: e.to_string(),
        })?;
        let invalid = |e: cluster_types::ConfigError| K3dError::CommandFailed {
            command: format!("cluster create {}", name),
            output: e.to_string(),
        };
        let servers = parsed.servers().map_err(invalid)?;
        let agents = parsed.agents().map_err(invalid)?;

        let port = self.next_port();
        self.clusters.lock().unwrap().insert(
            name.to_string(),
            MockCluster {
                info: helpers::cluster(name, servers, agents, image.unwrap_or(MOCK_DEFAULT_IMAGE)),
                config: config.to_string(),
                kubeconfig: helpers::kubeconfig(name, port),
            },
        );
        Ok(())
    }

    async fn list_clusters(&self) -> Result<Vec<ClusterInfo>, K3dError> {
        self.record(MockOperation::ListClusters, "")?;
        let mut clusters: Vec<ClusterInfo> = self
            .clusters
            .lock()
            .unwrap()
            .values()
            .map(|c| c.info.clone())
            .collect();
        clusters.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clusters)
    }

    async fn get_kubeconfig(&self, name: &str) -> Result<Secret, K3dError> {
        self.record(MockOperation::GetKubeconfig, name)?;
        self.clusters
            .lock()
            .unwrap()
            .get(name)
            .map(|c| Secret::new(c.kubeconfig.clone()))
            .ok_or_else(|| K3dError::NotFound(format!("cluster {} does not exist", name)))
    }

    async fn delete_cluster(&self, name: &str) -> Result<(), K3dError> {
        self.record(MockOperation::DeleteCluster, name)?;
        self.clusters
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| K3dError::NotFound(format!("No nodes found for given cluster {}", name)))
    }

    async fn set_node_image(&self, node: &str, image: &str) -> Result<(), K3dError> {
        self.record(MockOperation::SetNodeImage, node)?;
        let mut clusters = self.clusters.lock().unwrap();
        let target = clusters
            .values_mut()
            .flat_map(|c| c.info.nodes.iter_mut())
            .find(|n| n.name == node)
            .ok_or_else(|| K3dError::NotFound(format!("node {} does not exist", node)))?;
        target.image = image.to_string();
        Ok(())
    }
}
