//! Provider configuration from environment variables

use crate::error::ProviderError;
use cluster_types::DEFAULT_K3S_REPOSITORY;
use k3d_client::K3dClient;
use std::env;
use std::time::Duration;

/// Default k3d binary, resolved through PATH
pub const DEFAULT_K3D_BINARY: &str = "k3d";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// k3d binary name or path (`K3D_BINARY`)
    pub k3d_binary: String,
    /// Timeout forwarded to `k3d cluster create` (`K3D_TIMEOUT`, seconds)
    pub timeout: Option<Duration>,
    /// Repository a bare version pin resolves against (`K3S_IMAGE_REPOSITORY`)
    pub image_repository: String,
}

impl ProviderConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ProviderError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let k3d_binary = non_empty("K3D_BINARY").unwrap_or_else(|| DEFAULT_K3D_BINARY.to_string());
        let image_repository = non_empty("K3S_IMAGE_REPOSITORY")
            .unwrap_or_else(|| DEFAULT_K3S_REPOSITORY.to_string());

        let timeout = match non_empty("K3D_TIMEOUT") {
            None => None,
            Some(raw) => {
                let seconds: u64 = raw.trim().parse().map_err(|_| {
                    ProviderError::InvalidConfig(format!(
                        "K3D_TIMEOUT must be a whole number of seconds, got {:?}",
                        raw
                    ))
                })?;
                if seconds == 0 {
                    return Err(ProviderError::InvalidConfig(
                        "K3D_TIMEOUT must be greater than zero".to_string(),
                    ));
                }
                Some(Duration::from_secs(seconds))
            }
        };

        if image_repository.contains(':') && !image_repository.contains('/') {
            return Err(ProviderError::InvalidConfig(format!(
                "K3S_IMAGE_REPOSITORY must not carry a tag, got {:?}",
                image_repository
            )));
        }

        Ok(Self {
            k3d_binary,
            timeout,
            image_repository,
        })
    }

    /// Build the k3d client described by this configuration
    pub fn client(&self) -> K3dClient {
        let client = K3dClient::new(self.k3d_binary.clone());
        match self.timeout {
            Some(timeout) => client.with_timeout(timeout),
            None => client,
        }
    }
}
