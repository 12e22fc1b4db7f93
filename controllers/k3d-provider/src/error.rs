//! Provider error types.
//!
//! Every failure carries the lifecycle stage and the underlying k3d error so
//! the caller can decide between retrying and giving up. "Cluster does not
//! exist" on read is not an error; see `ReadOutcome::NotFound`.

use k3d_client::K3dError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Lifecycle stage that touched the external system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Cluster creation
    Create,
    /// In-place update
    Update,
    /// Teardown
    Delete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Create => "create",
            Stage::Update => "update",
            Stage::Delete => "delete",
        })
    }
}

/// Errors that can occur in the k3d provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Create, update or delete failed against k3d
    #[error("Cluster {stage} failed: {source}")]
    Provision {
        /// Stage that failed
        stage: Stage,
        /// Underlying k3d failure
        #[source]
        source: K3dError,
    },

    /// Reading the live cluster failed for a reason other than absence
    #[error("Failed to read cluster {id}: {source}")]
    DriftRead {
        /// Cluster that was being read
        id: String,
        /// Underlying k3d failure
        #[source]
        source: K3dError,
    },

    /// Inputs were rejected before any external call
    #[error("Invalid cluster spec: {0}")]
    Validation(String),

    /// Provider configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The request envelope could not be understood
    #[error("Invalid request: {0}")]
    Request(String),

    /// A result could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProviderError {
    /// Wrap a k3d failure for a lifecycle stage
    pub fn provision(stage: Stage, source: K3dError) -> Self {
        ProviderError::Provision { stage, source }
    }

    /// Wrap a k3d failure during read
    pub fn drift_read(id: &str, source: K3dError) -> Self {
        ProviderError::DriftRead {
            id: id.to_string(),
            source,
        }
    }

    /// Short machine-readable category
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Provision { .. } => "provision",
            ProviderError::DriftRead { .. } => "driftRead",
            ProviderError::Validation(_) => "validation",
            ProviderError::InvalidConfig(_) => "invalidConfig",
            ProviderError::Request(_) => "request",
            ProviderError::Serialization(_) => "serialization",
        }
    }

    /// Stage for provisioning failures
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ProviderError::Provision { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// True when k3d reported its own timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            ProviderError::Provision { source, .. } | ProviderError::DriftRead { source, .. } => {
                source.is_timeout()
            }
            _ => false,
        }
    }
}
