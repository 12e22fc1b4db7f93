//! Resource schema
//!
//! JSON schema of the `Cluster` resource as the orchestration engine sees it.
//! Secret attributes carry `"secret": true` so storage and logging layers
//! downstream know to redact them.

use crate::cluster::{CLUSTER_RESOURCE_TYPE, ClusterSpec, ClusterState, SECRET_FIELDS};
use serde_json::{Value, json};

/// Schema key marking an attribute as sensitive
pub const SECRET_MARKER: &str = "secret";

/// Build the resource schema
///
/// `inputProperties` describes `ClusterSpec`, `properties` describes
/// `ClusterState`, and `outputOnly` lists attributes callers cannot set.
pub fn cluster_schema() -> Value {
    let inputs = serde_json::to_value(schemars::schema_for!(ClusterSpec)).unwrap_or(Value::Null);
    let mut outputs =
        serde_json::to_value(schemars::schema_for!(ClusterState)).unwrap_or(Value::Null);

    for field in SECRET_FIELDS {
        if let Some(property) = outputs
            .pointer_mut(&format!("/properties/{field}"))
            .and_then(Value::as_object_mut)
        {
            property.insert(SECRET_MARKER.to_string(), Value::Bool(true));
        }
    }

    json!({
        "type": CLUSTER_RESOURCE_TYPE,
        "inputProperties": inputs,
        "properties": outputs,
        "outputOnly": SECRET_FIELDS,
        "secretOutputs": SECRET_FIELDS,
    })
}
