//! k3d `Simple` config documents
//!
//! The `config` attribute is opaque to the caller but the provider needs to
//! validate it before invoking k3d and to read and rewrite the node counts when
//! recording drift.

use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// API version used by the default config
pub const DEFAULT_API_VERSION: &str = "k3d.io/v1alpha5";

/// API group prefix every accepted `apiVersion` must start with
pub const K3D_API_GROUP: &str = "k3d.io/";

/// The only config kind k3d accepts for `cluster create --config`
pub const SIMPLE_KIND: &str = "Simple";

/// Server count k3d uses when `servers` is not set
pub const DEFAULT_SERVERS: u64 = 1;

/// Agent count k3d uses when `agents` is not set
pub const DEFAULT_AGENTS: u64 = 0;

/// Errors found while parsing or validating a config document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Not parseable as YAML
    #[error("config is not valid YAML: {0}")]
    Parse(String),

    /// Parsed, but the top level is not a mapping
    #[error("config must be a YAML mapping")]
    NotAMapping,

    /// `kind` is set to something other than `Simple`
    #[error("unsupported config kind {0}, expected {SIMPLE_KIND}")]
    UnsupportedKind(String),

    /// `apiVersion` is outside the k3d API group
    #[error("unsupported config apiVersion {0}, expected {K3D_API_GROUP}*")]
    UnsupportedApiVersion(String),

    /// A node count is not a non-negative integer
    #[error("{field} must be a non-negative integer")]
    InvalidCount {
        /// Offending key
        field: &'static str,
    },

    /// `servers: 0`
    #[error("servers must be at least 1")]
    NoServers,

    /// Re-serializing the document failed
    #[error("failed to serialize config: {0}")]
    Serialize(String),
}

/// A parsed k3d `Simple` config document
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleConfig {
    doc: Mapping,
}

impl SimpleConfig {
    /// Parse a config document
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let value: Value =
            serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        match value {
            Value::Mapping(doc) => Ok(Self { doc }),
            _ => Err(ConfigError::NotAMapping),
        }
    }

    /// The config used when the caller does not supply one
    pub fn default_for(name: &str) -> String {
        format!(
            "apiVersion: {DEFAULT_API_VERSION}\nkind: {SIMPLE_KIND}\nmetadata:\n  name: {name}\nservers: 1\nagents: 1\n"
        )
    }

    /// Check the fields the provider depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(kind) = self.doc.get("kind") {
            if kind.as_str() != Some(SIMPLE_KIND) {
                return Err(ConfigError::UnsupportedKind(describe(kind)));
            }
        }

        if let Some(api_version) = self.doc.get("apiVersion") {
            let accepted = api_version
                .as_str()
                .is_some_and(|v| v.starts_with(K3D_API_GROUP));
            if !accepted {
                return Err(ConfigError::UnsupportedApiVersion(describe(api_version)));
            }
        }

        if self.servers()? == 0 {
            return Err(ConfigError::NoServers);
        }
        self.agents()?;

        Ok(())
    }

    /// Declared server count, or the k3d default
    pub fn servers(&self) -> Result<u64, ConfigError> {
        self.count("servers", DEFAULT_SERVERS)
    }

    /// Declared agent count, or the k3d default
    pub fn agents(&self) -> Result<u64, ConfigError> {
        self.count("agents", DEFAULT_AGENTS)
    }

    /// Overwrite the server count
    pub fn set_servers(&mut self, servers: u64) {
        self.doc.insert(Value::from("servers"), Value::from(servers));
    }

    /// Overwrite the agent count
    pub fn set_agents(&mut self, agents: u64) {
        self.doc.insert(Value::from("agents"), Value::from(agents));
    }

    /// Serialize back to YAML
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(&self.doc).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    fn count(&self, field: &'static str, default: u64) -> Result<u64, ConfigError> {
        match self.doc.get(field) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => value.as_u64().ok_or(ConfigError::InvalidCount { field }),
        }
    }
}

/// Compare two config documents by content rather than formatting
///
/// Falls back to a textual comparison when either side does not parse.
pub fn configs_equivalent(left: &str, right: &str) -> bool {
    match (
        serde_yaml::from_str::<Value>(left),
        serde_yaml::from_str::<Value>(right),
    ) {
        (Ok(l), Ok(r)) => l == r,
        _ => left == right,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}
