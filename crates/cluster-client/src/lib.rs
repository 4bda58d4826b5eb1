//! Cluster API Client
//!
//! The narrow slice of the Kubernetes API the Falcon Operator core consumes:
//! listing secrets, reading the image-stream build target, and writing
//! `FalconConfig` status. Each operation is scoped to one namespace.
//!
//! # Example
//!
//! ```no_run
//! use cluster_client::{ClusterClientTrait, KubeClusterClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeClusterClient::new(kube::Client::try_default().await?);
//!
//! let secrets = client.list_secrets("falcon-system").await?;
//! let repository = client
//!     .get_image_stream_repository("falcon-system", "falcon-container")
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod cluster_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::KubeClusterClient;
pub use cluster_trait::ClusterClientTrait;
pub use error::ClusterError;
pub use models::*;
#[cfg(feature = "test-util")]
pub use mock::{MockClusterClient, StatusUpdate};
