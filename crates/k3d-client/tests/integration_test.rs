//! Integration tests for the k3d client
//!
//! These tests require Docker and a k3d binary on PATH (or in K3D_BINARY).
//! They create and delete a real cluster named `k3d-client-it`.

use k3d_client::{K3dClient, K3dClientTrait};

const CLUSTER: &str = "k3d-client-it";

fn client() -> K3dClient {
    let binary = std::env::var("K3D_BINARY").unwrap_or_else(|_| "k3d".to_string());
    K3dClient::new(binary)
}

#[tokio::test]
#[ignore] // Requires k3d
async fn test_version() {
    let version = client().version().await.expect("Failed to run k3d version");
    assert!(version.contains("k3d"), "unexpected version output: {}", version);
}

#[tokio::test]
#[ignore] // Requires k3d
async fn test_list_clusters() {
    let clusters = client().list_clusters().await.expect("Failed to list clusters");
    println!("Found {} clusters", clusters.len());
}

#[tokio::test]
#[ignore] // Requires k3d and Docker, creates a cluster
async fn test_create_read_delete_cluster() {
    let client = client();
    let config = "apiVersion: k3d.io/v1alpha5\nkind: Simple\nservers: 1\nagents: 1\n";

    client
        .create_cluster(CLUSTER, config, None)
        .await
        .expect("Failed to create cluster");

    let cluster = client
        .get_cluster(CLUSTER)
        .await
        .expect("Failed to list clusters")
        .expect("Cluster missing after create");
    assert_eq!(cluster.servers(), 1);
    assert_eq!(cluster.agents(), 1);

    let kubeconfig = client
        .get_kubeconfig(CLUSTER)
        .await
        .expect("Failed to get kubeconfig");
    assert!(kubeconfig.expose().contains("current-context"));

    client
        .delete_cluster(CLUSTER)
        .await
        .expect("Failed to delete cluster");

    let gone = client.get_cluster(CLUSTER).await.expect("Failed to list clusters");
    assert!(gone.is_none());
}

#[tokio::test]
#[ignore] // Requires k3d
async fn test_delete_missing_cluster_reports_not_found() {
    let result = client().delete_cluster("k3d-client-it-missing").await;
    if let Err(e) = result {
        assert!(e.is_not_found(), "unexpected error: {}", e);
    }
}
