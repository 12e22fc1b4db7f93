//! Helper functions for building mock k3d objects

use crate::models::{ClusterInfo, NodeInfo, NodeRole, NodeState};

/// Image mock nodes run when no image is requested
pub const MOCK_DEFAULT_IMAGE: &str = "docker.io/rancher/k3s:v1.31.5-k3s1";

/// Load balancer image for mock clusters
pub const MOCK_PROXY_IMAGE: &str = "ghcr.io/k3d-io/k3d-proxy:5.7.4";

/// Build a running node
pub fn node(cluster: &str, role: NodeRole, index: u64, image: &str) -> NodeInfo {
    let name = match role {
        NodeRole::Loadbalancer => format!("k3d-{}-serverlb", cluster),
        NodeRole::Server => format!("k3d-{}-server-{}", cluster, index),
        NodeRole::Agent => format!("k3d-{}-agent-{}", cluster, index),
        NodeRole::Registry => format!("k3d-{}-registry", cluster),
        NodeRole::Unknown => format!("k3d-{}-node-{}", cluster, index),
    };
    NodeInfo {
        name,
        role,
        image: image.to_string(),
        state: NodeState {
            running: true,
            status: "running".to_string(),
        },
    }
}

/// Build a cluster with the requested topology
pub fn cluster(name: &str, servers: u64, agents: u64, image: &str) -> ClusterInfo {
    let mut nodes: Vec<NodeInfo> = (0..servers)
        .map(|i| node(name, NodeRole::Server, i, image))
        .chain((0..agents).map(|i| node(name, NodeRole::Agent, i, image)))
        .collect();
    nodes.push(node(name, NodeRole::Loadbalancer, 0, MOCK_PROXY_IMAGE));

    ClusterInfo {
        name: name.to_string(),
        nodes,
        servers_count: servers,
        servers_running: servers,
        agents_count: agents,
        agents_running: agents,
    }
}

/// Kubeconfig shaped like the one `k3d kubeconfig get` prints
pub fn kubeconfig(name: &str, port: u16) -> String {
    format!(
        "---\n\
apiVersion: v1\n\
clusters:\n\
- cluster:\n    certificate-authority-data: LS0tLS1CRUdJTi1NT0NL\n    server: https://0.0.0.0:{port}\n  name: k3d-{name}\n\
contexts:\n\
- context:\n    cluster: k3d-{name}\n    user: admin@k3d-{name}\n  name: k3d-{name}\n\
current-context: k3d-{name}\n\
kind: Config\n\
preferences: {{}}\n\
users:\n\
- name: admin@k3d-{name}\n  user:\n    client-certificate-data: LS0tLS1DRVJULU1PQ0s=\n    client-key-data: LS0tLS1LRVktTU9DSw==\n"
    )
}
