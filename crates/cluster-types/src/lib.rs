//! Cluster Resource Types
//!
//! Data model shared by the k3d client and the provider:
//! - `ClusterSpec`: desired state submitted by the caller
//! - `ClusterState`: last recorded actual state, including the kubeconfig
//! - `ClusterDiff`: attribute-by-attribute comparison of the two
//! - `Secret`: wrapper for values that must never reach logs
//! - `SimpleConfig`: the k3d `kind: Simple` config document carried in `config`

pub mod cluster;
pub mod config;
pub mod diff;
pub mod schema;
pub mod secret;

pub use cluster::*;
pub use config::*;
pub use diff::*;
pub use schema::*;
pub use secret::*;
