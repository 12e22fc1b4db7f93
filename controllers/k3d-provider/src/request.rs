//! Request envelope
//!
//! The provider is invoked once per operation: a JSON request on stdin, a
//! JSON response on stdout. Field names are camelCase, as in the resource
//! schema.

use crate::error::{ProviderError, Stage};
use crate::reconciler::{ReadOutcome, Reconciler};
use cluster_types::{ClusterSpec, ClusterState, cluster_schema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info, warn};

/// One lifecycle request
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    /// Validate and default a spec
    Check {
        /// Logical resource name, used to derive a cluster name
        resource_name: String,
        /// Submitted spec
        #[serde(default)]
        spec: ClusterSpec,
        /// Previously recorded state, if the resource exists
        #[serde(default)]
        prior: Option<ClusterState>,
    },
    /// Planned state of a create, without side effects
    Preview {
        /// Logical resource name
        resource_name: String,
        /// Submitted spec
        #[serde(default)]
        spec: ClusterSpec,
    },
    /// Create a cluster
    Create {
        /// Logical resource name
        resource_name: String,
        /// Submitted spec
        #[serde(default)]
        spec: ClusterSpec,
    },
    /// Refresh recorded state
    Read {
        /// Cluster name
        id: String,
        /// Last recorded state
        #[serde(default)]
        state: ClusterState,
    },
    /// Compare desired with recorded state
    Diff {
        /// Desired spec
        #[serde(default)]
        spec: ClusterSpec,
        /// Last recorded state
        state: ClusterState,
    },
    /// Apply an in-place change
    Update {
        /// Cluster name
        id: String,
        /// Desired spec
        #[serde(default)]
        spec: ClusterSpec,
        /// Last recorded state
        state: ClusterState,
    },
    /// Delete a cluster
    Delete {
        /// Cluster name
        id: String,
        /// Last recorded state
        #[serde(default)]
        state: ClusterState,
    },
    /// Resource schema
    Schema,
}

impl Request {
    /// Whether the operation runs k3d
    pub fn touches_cluster(&self) -> bool {
        matches!(
            self,
            Request::Create { .. } | Request::Read { .. } | Request::Update { .. } | Request::Delete { .. }
        )
    }

    /// Operation name, for logging
    pub fn operation(&self) -> &'static str {
        match self {
            Request::Check { .. } => "check",
            Request::Preview { .. } => "preview",
            Request::Create { .. } => "create",
            Request::Read { .. } => "read",
            Request::Diff { .. } => "diff",
            Request::Update { .. } => "update",
            Request::Delete { .. } => "delete",
            Request::Schema => "schema",
        }
    }
}

/// Error as reported to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Error category (see `ProviderError::kind`)
    pub kind: &'static str,
    /// Failed stage, for provisioning errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    /// Human-readable message
    pub message: String,
}

/// Response written to stdout
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Response {
    /// Operation succeeded
    Ok {
        /// Operation-specific result
        result: Value,
    },
    /// Operation failed
    Error {
        /// What went wrong
        error: ErrorBody,
    },
}

impl Response {
    /// Error response for a provider error
    pub fn from_error(err: &ProviderError) -> Self {
        Response::Error {
            error: ErrorBody {
                kind: err.kind(),
                stage: err.stage(),
                message: err.to_string(),
            },
        }
    }

    /// True for error responses
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }
}

/// Run one request against the reconciler
pub async fn handle(reconciler: &Reconciler, request: Request) -> Response {
    let operation = request.operation();
    info!("Handling {} request", operation);
    if request.touches_cluster() {
        reconciler.preflight().await;
    }

    match dispatch(reconciler, request).await {
        Ok(result) => Response::Ok { result },
        Err(e) => {
            error!("{} failed: {}", operation, e);
            if e.is_timeout() {
                warn!("k3d timed out; raise K3D_TIMEOUT if the cluster needs longer to start");
            }
            Response::from_error(&e)
        }
    }
}

async fn dispatch(reconciler: &Reconciler, request: Request) -> Result<Value, ProviderError> {
    let result = match request {
        Request::Check {
            resource_name,
            spec,
            prior,
        } => {
            let checked = reconciler.check(&resource_name, &spec, prior.as_ref())?;
            serde_json::to_value(checked.into_spec())?
        }
        Request::Preview {
            resource_name,
            spec,
        } => serde_json::to_value(reconciler.preview(&resource_name, &spec)?)?,
        Request::Create {
            resource_name,
            spec,
        } => {
            let state = reconciler.create(&resource_name, &spec).await?;
            info!("Created state: {}", state.redacted());
            json!({ "id": state.name(), "state": state })
        }
        Request::Read { id, state } => match reconciler.read(&id, &state).await? {
            ReadOutcome::Found(state) => json!({ "found": true, "state": state }),
            ReadOutcome::NotFound => json!({ "found": false }),
        },
        Request::Diff { spec, state } => serde_json::to_value(reconciler.diff(&spec, &state))?,
        Request::Update { id, spec, state } => {
            serde_json::to_value(reconciler.update(&id, &spec, &state).await?)?
        }
        Request::Delete { id, state } => {
            reconciler.delete(&id, &state).await?;
            json!({})
        }
        Request::Schema => cluster_schema(),
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use k3d_client::{MockFailure, MockK3dClient, MockOperation};

    fn parse(raw: &str) -> Request {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_parse_camel_case_envelope() {
        let request = parse(
            r#"{"operation":"create","resourceName":"dev","spec":{"name":"demo","version":"v1.31.5-k3s1"}}"#,
        );
        match request {
            Request::Create {
                resource_name,
                spec,
            } => {
                assert_eq!(resource_name, "dev");
                assert_eq!(spec.name.as_deref(), Some("demo"));
            }
            other => panic!("unexpected request: {:?}", other),
        }
        assert_eq!(parse(r#"{"operation":"schema"}"#).operation(), "schema");
    }

    #[test]
    fn test_unknown_operation_is_rejected() {
        assert!(serde_json::from_str::<Request>(r#"{"operation":"upgrade"}"#).is_err());
    }

    #[tokio::test]
    async fn test_create_response_carries_id_and_secret_state() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        let request = parse(
            r#"{"operation":"create","resourceName":"dev","spec":{"name":"demo","config":"servers: 1\nagents: 1\n"}}"#,
        );

        let response = handle(&reconciler, request).await;

        let result = match response {
            Response::Ok { result } => result,
            other => panic!("create failed: {:?}", other),
        };
        assert_eq!(result["id"], "demo");
        assert_eq!(result["state"]["name"], "demo");
        assert!(result["state"]["kubeConfig"].as_str().unwrap().contains("k3d-demo"));
    }

    #[tokio::test]
    async fn test_read_of_missing_cluster() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);

        let response = handle(&reconciler, parse(r#"{"operation":"read","id":"gone"}"#)).await;

        assert_eq!(
            response,
            Response::Ok {
                result: json!({ "found": false })
            }
        );
    }

    #[tokio::test]
    async fn test_diff_response() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        let request = parse(
            r#"{"operation":"diff","spec":{"config":"servers: 1\nagents: 3"},"state":{"name":"demo","config":"servers: 1\nagents: 2"}}"#,
        );

        let response = handle(&reconciler, request).await;

        let result = match response {
            Response::Ok { result } => result,
            other => panic!("diff failed: {:?}", other),
        };
        assert_eq!(result["outcome"], "requires-replace");
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_provision_error_response() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        mock.fail_next(
            MockOperation::DeleteCluster,
            MockFailure::CommandFailed("Cannot connect to the Docker daemon".to_string()),
        );

        let response = handle(&reconciler, parse(r#"{"operation":"delete","id":"demo"}"#)).await;

        assert!(response.is_error());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["kind"], "provision");
        assert_eq!(json["error"]["stage"], "delete");
    }

    #[tokio::test]
    async fn test_validation_error_has_no_stage() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        let request = parse(r#"{"operation":"check","resourceName":"dev","spec":{"name":"Bad_Name"}}"#);

        let json = serde_json::to_value(handle(&reconciler, request).await).unwrap();

        assert_eq!(json["error"]["kind"], "validation");
        assert!(json["error"].get("stage").is_none());
    }

    #[tokio::test]
    async fn test_k3d_is_probed_only_for_cluster_operations() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);

        handle(&reconciler, parse(r#"{"operation":"schema"}"#)).await;
        handle(
            &reconciler,
            parse(r#"{"operation":"check","resourceName":"dev","spec":{}}"#),
        )
        .await;
        assert_eq!(mock.call_count(MockOperation::Version), 0);

        handle(&reconciler, parse(r#"{"operation":"read","id":"gone"}"#)).await;
        assert_eq!(mock.call_count(MockOperation::Version), 1);
    }

    #[tokio::test]
    async fn test_failed_version_check_does_not_block_the_operation() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);
        mock.fail_next(MockOperation::Version, MockFailure::Timeout);

        let response = handle(&reconciler, parse(r#"{"operation":"delete","id":"gone"}"#)).await;

        assert!(!response.is_error());
    }

    #[test]
    fn test_config_error_response() {
        let err = ProviderError::InvalidConfig("K3D_TIMEOUT must be greater than zero".to_string());
        let json = serde_json::to_value(Response::from_error(&err)).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["kind"], "invalidConfig");
        assert!(json["error"].get("stage").is_none());
    }

    #[tokio::test]
    async fn test_schema_response() {
        let mock = MockK3dClient::new();
        let reconciler = create_test_reconciler(&mock);

        let response = handle(&reconciler, parse(r#"{"operation":"schema"}"#)).await;

        let result = match response {
            Response::Ok { result } => result,
            other => panic!("schema failed: {:?}", other),
        };
        assert_eq!(result["type"], "k3d:index:Cluster");
    }
}
