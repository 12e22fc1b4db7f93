//! Cluster lifecycle
//!
//! One file per lifecycle operation:
//! - `check`: input validation and defaulting (pure)
//! - `create`: preview and create
//! - `read`: refresh recorded state from the live cluster
//! - `diff`: classify desired against recorded state (pure)
//! - `update`: apply in-place changes
//! - `delete`: teardown
//!
//! Operations run one k3d invocation at a time and never retry; retry and
//! ordering policy belong to the caller.

pub mod check;
pub mod create;
pub mod delete;
pub mod diff;
pub mod read;
pub mod update;

#[cfg(test)]
mod read_test;

use cluster_types::{ClusterState, image_for_version};
use k3d_client::K3dClientTrait;
use std::fmt;
use tracing::{info, warn};

/// Result of reading a cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The cluster exists; the state reflects what was observed
    Found(ClusterState),
    /// The cluster is gone; the caller should drop its record
    NotFound,
}

/// Reconciles k3d `Cluster` resources.
pub struct Reconciler {
    pub(crate) k3d_client: Box<dyn K3dClientTrait + Send + Sync>,
    pub(crate) image_repository: String,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("k3d_binary", &self.k3d_client.binary())
            .field("image_repository", &self.image_repository)
            .finish()
    }
}

impl Reconciler {
    /// Create a reconciler around a k3d client
    pub fn new(
        k3d_client: impl K3dClientTrait + 'static,
        image_repository: impl Into<String>,
    ) -> Self {
        Self {
            k3d_client: Box::new(k3d_client),
            image_repository: image_repository.into(),
        }
    }

    /// Confirm the k3d binary runs, logging its version
    ///
    /// Only logs: a broken binary surfaces as the operation's own error.
    pub async fn preflight(&self) {
        match self.k3d_client.version().await {
            Ok(version) => info!("Using {} ({})", self.k3d_client.binary(), version),
            Err(e) => warn!("k3d version check failed for {}: {}", self.k3d_client.binary(), e),
        }
    }

    /// k3s image for a version pin
    pub(crate) fn image_for(&self, version: &str) -> String {
        image_for_version(&self.image_repository, version)
    }
}
