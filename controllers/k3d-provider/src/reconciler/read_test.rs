//! Unit tests for refreshing state from the live cluster

#[cfg(test)]
mod tests {
    use crate::error::ProviderError;
    use crate::reconciler::ReadOutcome;
    use crate::test_utils::*;
    use cluster_types::{
        Attribute, ClusterSpec, ClusterState, DiffOutcome, Secret, SimpleConfig,
    };
    use k3d_client::{MOCK_DEFAULT_IMAGE, MockFailure, MockK3dClient, MockOperation};

    fn found(outcome: ReadOutcome) -> ClusterState {
        match outcome {
            ReadOutcome::Found(state) => state,
            ReadOutcome::NotFound => panic!("expected the cluster to be found"),
        }
    }

    #[tokio::test]
    async fn test_read_after_create_echoes_inputs() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        let spec = create_test_spec("demo", 2).with_version(TEST_VERSION);
        let created = create_test_cluster(&reconciler, &spec).await;

        let state = found(reconciler.read("demo", &created).await.unwrap());

        assert_eq!(state.inputs, spec);
        assert_eq!(state, created);
        assert_eq!(mock.mutating_calls(), 1);
    }

    #[tokio::test]
    async fn test_read_missing_cluster_is_not_found() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        let created = create_test_cluster(&reconciler, &create_test_spec("demo", 1)).await;
        mock.remove_cluster("demo");

        let outcome = reconciler.read("demo", &created).await.unwrap();

        assert_eq!(outcome, ReadOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_read_records_agent_drift() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        let spec = create_test_spec("demo", 2);
        let created = create_test_cluster(&reconciler, &spec).await;
        mock.scale_agents("demo", 5);

        let state = found(reconciler.read("demo", &created).await.unwrap());

        let config = SimpleConfig::parse(state.config().unwrap()).unwrap();
        assert_eq!(config.agents().unwrap(), 5);
        assert_eq!(config.servers().unwrap(), 1);

        // The drift now shows up as a replace against the unchanged spec
        let diff = reconciler.diff(&spec, &state);
        assert_eq!(diff.outcome, DiffOutcome::RequiresReplace);
        assert_eq!(diff.replace_keys(), vec![Attribute::Config]);
    }

    #[tokio::test]
    async fn test_read_records_version_drift() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        let spec = create_test_spec("demo", 1).with_version(TEST_VERSION);
        let created = create_test_cluster(&reconciler, &spec).await;
        mock.set_cluster_image("demo", "docker.io/rancher/k3s:v1.30.2-k3s1");

        let state = found(reconciler.read("demo", &created).await.unwrap());

        assert_eq!(state.version(), Some("v1.30.2-k3s1"));
        assert_eq!(state.config(), created.config());
        assert_eq!(reconciler.diff(&spec, &state).outcome, DiffOutcome::Update);
    }

    #[tokio::test]
    async fn test_read_keeps_unpinned_version_unpinned() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        let created = create_test_cluster(&reconciler, &create_test_spec("demo", 1)).await;
        mock.set_cluster_image("demo", "docker.io/rancher/k3s:v1.30.2-k3s1");

        let state = found(reconciler.read("demo", &created).await.unwrap());

        assert_eq!(state.version(), None);
    }

    #[tokio::test]
    async fn test_read_refreshes_kubeconfig() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        let created = create_test_cluster(&reconciler, &create_test_spec("demo", 1)).await;
        mock.set_kubeconfig("demo", TEST_ROTATED_KUBECONFIG);

        let state = found(reconciler.read("demo", &created).await.unwrap());

        assert_eq!(state.kube_config, Some(Secret::new(TEST_ROTATED_KUBECONFIG)));
        assert_ne!(state.kube_config, created.kube_config);
    }

    #[tokio::test]
    async fn test_read_adopts_cluster_without_recorded_config() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        mock.add_cluster("imported", 1, 1, MOCK_DEFAULT_IMAGE);

        let state = found(reconciler.read("imported", &ClusterState::default()).await.unwrap());

        assert_eq!(state.name(), Some("imported"));
        assert_eq!(state.config(), Some(SimpleConfig::default_for("imported").as_str()));
        assert!(state.kube_config.is_some());
        let no_change = reconciler.diff(&ClusterSpec::new(), &state);
        assert!(!no_change.has_changes());
    }

    #[tokio::test]
    async fn test_read_failure_is_drift_read_error() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        let created = create_test_cluster(&reconciler, &create_test_spec("demo", 1)).await;
        mock.fail_next(
            MockOperation::ListClusters,
            MockFailure::CommandFailed("Cannot connect to the Docker daemon".to_string()),
        );

        let err = reconciler.read("demo", &created).await.unwrap_err();

        assert!(matches!(err, ProviderError::DriftRead { ref id, .. } if id == "demo"));
        assert_eq!(err.stage(), None);
    }

    #[tokio::test]
    async fn test_read_rejects_garbled_kubeconfig() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        let created = create_test_cluster(&reconciler, &create_test_spec("demo", 1)).await;
        mock.set_kubeconfig("demo", "apiVersion: v1\nkind: Config\nclusters: []\n");

        let err = reconciler.read("demo", &created).await.unwrap_err();

        assert!(matches!(err, ProviderError::DriftRead { .. }));
    }

    #[tokio::test]
    async fn test_read_cluster_deleted_during_read_is_not_found() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        let created = create_test_cluster(&reconciler, &create_test_spec("demo", 1)).await;
        mock.fail_next(MockOperation::GetKubeconfig, MockFailure::NotFound);

        let outcome = reconciler.read("demo", &created).await.unwrap();

        assert_eq!(outcome, ReadOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_list_failure_mentioning_absence_is_drift_read_error() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        let created = create_test_cluster(&reconciler, &create_test_spec("demo", 1)).await;
        mock.fail_next(
            MockOperation::ListClusters,
            MockFailure::CommandFailed(
                "failed to list nodes: Error response from daemon: context \"remote-docker\" does not exist"
                    .to_string(),
            ),
        );

        let err = reconciler.read("demo", &created).await.unwrap_err();

        assert!(matches!(err, ProviderError::DriftRead { .. }));
        assert!(mock.has_cluster("demo"));
    }

    #[tokio::test]
    async fn test_malformed_kubeconfig_error_does_not_leak_values() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        let created = create_test_cluster(&reconciler, &create_test_spec("demo", 1)).await;
        mock.set_kubeconfig(
            "demo",
            "apiVersion: v1\nkind: Config\nusers:\n- name: admin\n  user: s3cr3t-bearer-token\n",
        );

        let err = reconciler.read("demo", &created).await.unwrap_err();

        assert!(matches!(err, ProviderError::DriftRead { .. }));
        assert!(!err.to_string().contains("s3cr3t-bearer-token"), "{err}");
    }
}
