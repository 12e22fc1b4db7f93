//! k3d output models
//!
//! Subset of the JSON printed by `k3d cluster list -o json`. Fields the
//! provider does not use (including the cluster join token) are not decoded.

use serde::{Deserialize, Serialize};

/// A cluster as reported by k3d
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInfo {
    /// Cluster name
    pub name: String,
    /// Containers that make up the cluster
    #[serde(default)]
    pub nodes: Vec<NodeInfo>,
    /// Server count as summarised by k3d
    #[serde(default)]
    pub servers_count: u64,
    /// Running servers
    #[serde(default)]
    pub servers_running: u64,
    /// Agent count as summarised by k3d
    #[serde(default)]
    pub agents_count: u64,
    /// Running agents
    #[serde(default)]
    pub agents_running: u64,
}

impl ClusterInfo {
    /// Number of server nodes
    pub fn servers(&self) -> u64 {
        self.count_role(NodeRole::Server, self.servers_count)
    }

    /// Number of agent nodes
    pub fn agents(&self) -> u64 {
        self.count_role(NodeRole::Agent, self.agents_count)
    }

    /// Image of the first server node
    pub fn server_image(&self) -> Option<&str> {
        self.nodes
            .iter()
            .find(|n| n.role == NodeRole::Server && !n.image.is_empty())
            .map(|n| n.image.as_str())
    }

    /// Server and agent nodes, i.e. the nodes running k3s
    pub fn k3s_nodes(&self) -> impl Iterator<Item = &NodeInfo> {
        self.nodes
            .iter()
            .filter(|n| matches!(n.role, NodeRole::Server | NodeRole::Agent))
    }

    fn count_role(&self, role: NodeRole, summary: u64) -> u64 {
        if self.nodes.is_empty() {
            return summary;
        }
        self.nodes.iter().filter(|n| n.role == role).count() as u64
    }
}

/// A single k3d node container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Container name (e.g. `k3d-demo-server-0`)
    pub name: String,
    /// Node role
    pub role: NodeRole,
    /// Container image
    #[serde(default)]
    pub image: String,
    /// Runtime state
    #[serde(default, rename = "State")]
    pub state: NodeState,
}

/// Node role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// k3s server
    Server,
    /// k3s agent
    Agent,
    /// Load balancer in front of the servers
    Loadbalancer,
    /// Image registry
    Registry,
    /// Any role this client does not know about
    #[serde(other)]
    Unknown,
}

/// Container runtime state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    /// Whether the container is running
    #[serde(default, rename = "Running")]
    pub running: bool,
    /// Runtime status string (e.g. "running", "exited")
    #[serde(default, rename = "Status")]
    pub status: String,
}
