//! Google Cloud provider for gproj
//!
//! Implements [`gproj_cloud::ResourceService`], [`gproj_cloud::BillingService`]
//! and [`gproj_cloud::ActivationService`] over the public REST APIs:
//!
//! - Cloud Resource Manager v1 (projects, project operations)
//! - Cloud Billing v1 (billing info, billing accounts)
//! - Service Usage v1 (service listing, batch enable, operations)
//!
//! # Requirements
//!
//! - `GOOGLE_OAUTH_ACCESS_TOKEN`, or the `gcloud` CLI logged in with
//!   `gcloud auth application-default login`
//!
//! # Example
//!
//! ```ignore
//! use gproj_cloud_gcp::{Credentials, GoogleCloud};
//! use gproj_cloud::ResourceService;
//!
//! let gcp = GoogleCloud::new(Credentials::discover().await?);
//! let project = gcp.get_project("my-project-123").await?;
//! println!("{} is {}", project.id, project.lifecycle);
//! ```

pub mod billing;
pub mod client;
pub mod credentials;
pub mod error;
pub mod resource_manager;
pub mod service_usage;

pub use client::{GcpEndpoints, GoogleCloud};
pub use credentials::Credentials;
pub use error::{GcpError, Result};
