//! Secret values
//!
//! Values produced by the external system that must be persisted by the caller
//! but never printed. Serialization passes the value through unchanged; `Debug`
//! and `Display` always print a placeholder.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder printed in place of a secret value
pub const REDACTED: &str = "<redacted>";

/// A string value that is redacted whenever it is formatted
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the plaintext value
    ///
    /// Callers must not pass the result to a log macro.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the plaintext value
    pub fn into_inner(self) -> String {
        self.0
    }

    /// True when the value is empty or only whitespace
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secret").field(&REDACTED).finish()
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}
