//! Diff between desired and recorded state

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparable cluster attributes
///
/// `kubeConfig` is output-only and is never compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Attribute {
    /// k3d config document
    Config,
    /// Cluster name
    Name,
    /// k3s version pin
    Version,
}

impl Attribute {
    /// All compared attributes, in report order
    pub const ALL: [Attribute; 3] = [Attribute::Config, Attribute::Name, Attribute::Version];

    /// Classification of a change to this attribute
    pub const fn change_policy(self) -> ChangeKind {
        match self {
            // Cluster topology cannot be changed in place
            Attribute::Config | Attribute::Name => ChangeKind::ChangedRequiresReplace,
            Attribute::Version => ChangeKind::ChangedUpdatable,
        }
    }

    /// Serialized attribute name
    pub const fn as_str(self) -> &'static str {
        match self {
            Attribute::Config => "config",
            Attribute::Name => "name",
            Attribute::Version => "version",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-attribute classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    /// Desired and recorded values agree
    Unchanged,
    /// Differs and can be applied in place
    ChangedUpdatable,
    /// Differs and needs delete-then-create
    ChangedRequiresReplace,
}

/// What the caller has to do to converge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DiffOutcome {
    /// Nothing to do
    NoChange,
    /// Call update
    Update,
    /// Call delete, then create
    RequiresReplace,
}

/// Classification of a single attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDiff {
    /// Compared attribute
    pub attribute: Attribute,
    /// Result of the comparison
    pub change: ChangeKind,
}

/// Result of comparing a `ClusterSpec` with a `ClusterState`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDiff {
    /// One entry per compared attribute
    pub attributes: Vec<AttributeDiff>,
    /// Overall outcome
    pub outcome: DiffOutcome,
}

impl ClusterDiff {
    /// Build a diff from per-attribute "changed" flags
    ///
    /// Each changed attribute is classified by its change policy. Any attribute
    /// requiring replacement makes the whole diff a replace.
    pub fn from_changes(changes: impl IntoIterator<Item = (Attribute, bool)>) -> Self {
        let attributes: Vec<AttributeDiff> = changes
            .into_iter()
            .map(|(attribute, changed)| AttributeDiff {
                attribute,
                change: if changed {
                    attribute.change_policy()
                } else {
                    ChangeKind::Unchanged
                },
            })
            .collect();

        let outcome = if attributes
            .iter()
            .any(|a| a.change == ChangeKind::ChangedRequiresReplace)
        {
            DiffOutcome::RequiresReplace
        } else if attributes
            .iter()
            .any(|a| a.change == ChangeKind::ChangedUpdatable)
        {
            DiffOutcome::Update
        } else {
            DiffOutcome::NoChange
        };

        Self {
            attributes,
            outcome,
        }
    }

    /// Classification of one attribute (`Unchanged` if it was not compared)
    pub fn change(&self, attribute: Attribute) -> ChangeKind {
        self.attributes
            .iter()
            .find(|a| a.attribute == attribute)
            .map_or(ChangeKind::Unchanged, |a| a.change)
    }

    /// Attributes that differ
    pub fn changed(&self) -> Vec<Attribute> {
        self.attributes
            .iter()
            .filter(|a| a.change != ChangeKind::Unchanged)
            .map(|a| a.attribute)
            .collect()
    }

    /// Attributes forcing replacement
    pub fn replace_keys(&self) -> Vec<Attribute> {
        self.attributes
            .iter()
            .filter(|a| a.change == ChangeKind::ChangedRequiresReplace)
            .map(|a| a.attribute)
            .collect()
    }

    /// True when the caller must delete and recreate
    pub fn requires_replace(&self) -> bool {
        self.outcome == DiffOutcome::RequiresReplace
    }

    /// True when anything differs
    pub fn has_changes(&self) -> bool {
        self.outcome != DiffOutcome::NoChange
    }
}
