//! k3d CLI Client
//!
//! An async wrapper around the `k3d` command line tool, the external system
//! behind the `Cluster` resource.
//!
//! # Example
//!
//! ```no_run
//! use k3d_client::{K3dClient, K3dClientTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = K3dClient::new("k3d");
//!
//! // Create a cluster from a Simple config passed on stdin
//! client
//!     .create_cluster("demo", "apiVersion: k3d.io/v1alpha5\nkind: Simple\nservers: 1\n", None)
//!     .await?;
//!
//! // Inspect it
//! let cluster = client.get_cluster("demo").await?;
//!
//! // Fetch its kubeconfig (a redacted-on-format secret)
//! let kubeconfig = client.get_kubeconfig("demo").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Cluster lifecycle**: create, list, delete
//! - **Kubeconfig retrieval**: returned wrapped in `Secret`
//! - **Node image replacement**: used for in-place version changes
//! - **Error classification**: "not found" and timeouts are distinct errors
//! - **Mocking**: `MockK3dClient` behind the `test-util` feature

pub mod client;
pub mod common;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod k3d_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::K3dClient;
pub use common::{CommandOutput, CommandRunner};
pub use error::K3dError;
pub use models::*;
pub use k3d_trait::K3dClientTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MOCK_DEFAULT_IMAGE, MOCK_PROXY_IMAGE, MockFailure, MockK3dClient, MockOperation};
