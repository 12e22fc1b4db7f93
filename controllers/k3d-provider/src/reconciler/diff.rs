//! Classify desired state against recorded state

use crate::reconciler::Reconciler;
use cluster_types::{Attribute, ClusterDiff, ClusterSpec, ClusterState, SimpleConfig, configs_equivalent};

impl Reconciler {
    /// Compare a spec with the recorded state (see [`diff_cluster`])
    pub fn diff(&self, spec: &ClusterSpec, last: &ClusterState) -> ClusterDiff {
        diff_cluster(spec, last)
    }
}

/// Compare a spec with the recorded state
///
/// - An absent name means "keep the recorded name".
/// - An absent or blank config means the default config for the effective name.
/// - Configs are compared as YAML documents, so formatting changes are not
///   reported.
/// - `kubeConfig` is never compared.
pub fn diff_cluster(spec: &ClusterSpec, last: &ClusterState) -> ClusterDiff {
    let recorded_name = last.name().unwrap_or_default();

    let name_changed = spec
        .name
        .as_deref()
        .is_some_and(|name| name != recorded_name);
    let effective_name = spec.name.as_deref().unwrap_or(recorded_name);

    let desired_config = non_blank(spec.config.as_deref())
        .map_or_else(|| SimpleConfig::default_for(effective_name), str::to_string);
    let recorded_config = non_blank(last.config())
        .map_or_else(|| SimpleConfig::default_for(recorded_name), str::to_string);
    let config_changed = !configs_equivalent(&desired_config, &recorded_config);

    let version_changed = spec.version.as_deref() != last.version();

    ClusterDiff::from_changes([
        (Attribute::Config, config_changed),
        (Attribute::Name, name_changed),
        (Attribute::Version, version_changed),
    ])
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
