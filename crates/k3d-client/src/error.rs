//! k3d client errors

use thiserror::Error;

/// Errors that can occur when driving the k3d CLI
#[derive(Debug, Error)]
pub enum K3dError {
    /// The binary could not be spawned or its pipes failed
    #[error("Failed to run k3d: {0}")]
    Io(#[from] std::io::Error),

    /// k3d exited non-zero
    #[error("k3d {command} failed: {output}")]
    CommandFailed {
        /// Subcommand that failed (e.g. "cluster create demo")
        command: String,
        /// Captured output with ANSI escapes removed
        output: String,
    },

    /// The cluster or node does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// k3d reported that its own timeout expired
    #[error("k3d {command} timed out: {output}")]
    Timeout {
        /// Subcommand that timed out
        command: String,
        /// Captured output with ANSI escapes removed
        output: String,
    },

    /// JSON output could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Output decoded but did not contain what was asked for
    #[error("Unexpected k3d output: {0}")]
    InvalidOutput(String),
}

impl K3dError {
    /// True for the "resource is gone" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, K3dError::NotFound(_))
    }

    /// True when k3d gave up waiting
    pub fn is_timeout(&self) -> bool {
        matches!(self, K3dError::Timeout { .. })
    }
}
