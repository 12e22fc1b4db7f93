//! Input validation and defaulting
//!
//! Check runs before every other operation and never touches k3d. It fills in
//! the cluster name and config so that everything downstream works on a
//! complete spec.

use crate::error::ProviderError;
use crate::reconciler::Reconciler;
use cluster_types::{ClusterSpec, ClusterState, MAX_CLUSTER_NAME_LEN, SimpleConfig};
use tracing::debug;
use uuid::Uuid;

/// Hex characters appended to a derived name
const NAME_SUFFIX_LEN: usize = 7;

/// Base used when nothing of the resource name survives sanitising
const FALLBACK_NAME_BASE: &str = "cluster";

/// A spec with every input resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedSpec {
    /// Cluster name, also the resource id
    pub name: String,
    /// Config document passed to k3d
    pub config: String,
    /// Version pin, if any
    pub version: Option<String>,
}

impl CheckedSpec {
    /// Back to the wire form
    pub fn into_spec(self) -> ClusterSpec {
        ClusterSpec {
            config: Some(self.config),
            name: Some(self.name),
            version: self.version,
        }
    }
}

impl Reconciler {
    /// Validate a spec and fill in defaults
    ///
    /// When the name is absent it is taken from `prior` if there is one, so
    /// repeated checks of an existing resource do not invent a new name.
    pub fn check(
        &self,
        resource_name: &str,
        spec: &ClusterSpec,
        prior: Option<&ClusterState>,
    ) -> Result<CheckedSpec, ProviderError> {
        check_spec(resource_name, spec, prior)
    }
}

/// Validate a spec and fill in defaults (see [`Reconciler::check`])
pub fn check_spec(
    resource_name: &str,
    spec: &ClusterSpec,
    prior: Option<&ClusterState>,
) -> Result<CheckedSpec, ProviderError> {
    let name = match spec.name.as_deref() {
        Some(name) => name.to_string(),
        None => match prior.and_then(ClusterState::name) {
            Some(name) => name.to_string(),
            None => {
                let derived = derive_name(resource_name);
                debug!("Derived cluster name {} from resource {}", derived, resource_name);
                derived
            }
        },
    };
    validate_name(&name)?;

    let config = match spec.config.as_deref() {
        Some(config) if !config.trim().is_empty() => config.to_string(),
        _ => SimpleConfig::default_for(&name),
    };
    validate_config(&config)?;

    if let Some(version) = spec.version.as_deref() {
        validate_version(version)?;
    }

    Ok(CheckedSpec {
        name,
        config,
        version: spec.version.clone(),
    })
}

/// Derive a unique, valid cluster name from a resource name
///
/// The resource name is lowercased, anything outside `[a-z0-9-]` becomes `-`,
/// and a random suffix is appended. The result always fits
/// `MAX_CLUSTER_NAME_LEN`.
pub fn derive_name(resource_name: &str) -> String {
    let max_base = MAX_CLUSTER_NAME_LEN - NAME_SUFFIX_LEN - 1;

    let mut base: String = resource_name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '-'
            }
        })
        .collect();
    // All characters are ASCII at this point
    base.truncate(max_base);
    let base = base.trim_matches('-');
    let base = if base.is_empty() { FALLBACK_NAME_BASE } else { base };

    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", base, &suffix[..NAME_SUFFIX_LEN])
}

/// Cluster names: `[a-z0-9]([-a-z0-9]*[a-z0-9])?`, at most `MAX_CLUSTER_NAME_LEN`
pub fn validate_name(name: &str) -> Result<(), ProviderError> {
    if name.is_empty() {
        return Err(ProviderError::Validation("cluster name must not be empty".to_string()));
    }
    if name.len() > MAX_CLUSTER_NAME_LEN {
        return Err(ProviderError::Validation(format!(
            "cluster name {:?} is longer than {} characters",
            name, MAX_CLUSTER_NAME_LEN
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(ProviderError::Validation(format!(
            "cluster name {:?} contains {:?}; only lowercase letters, digits and '-' are allowed",
            name, bad
        )));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(ProviderError::Validation(format!(
            "cluster name {:?} must start and end with a letter or digit",
            name
        )));
    }
    Ok(())
}

/// Version pins: non-empty, no whitespace
pub fn validate_version(version: &str) -> Result<(), ProviderError> {
    if version.is_empty() {
        return Err(ProviderError::Validation("version must not be empty".to_string()));
    }
    if version.chars().any(char::is_whitespace) {
        return Err(ProviderError::Validation(format!(
            "version {:?} must not contain whitespace",
            version
        )));
    }
    Ok(())
}

/// The config must be a k3d `Simple` document with at least one server
pub fn validate_config(config: &str) -> Result<(), ProviderError> {
    SimpleConfig::parse(config)
        .and_then(|parsed| parsed.validate())
        .map_err(|e| ProviderError::Validation(format!("invalid k3d config: {}", e)))
}
