//! gproj cloud project reconciliation
//!
//! Converges a single Google Cloud project onto a declarative spec: project
//! identity and labels, billing account link, and the set of enabled APIs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                    gproj CLI                     │
//! │              (gproj apply / sync)                │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                  gproj-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │            Reconciler (engine)            │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌────────────────┐  ┌──────────────────────┐   │
//! │  │ OperationPoller│  │     CatalogCache     │   │
//! │  └────────────────┘  └──────────────────────┘   │
//! │  trait ResourceService / BillingService /        │
//! │        ActivationService                         │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │       gproj-cloud-gcp (REST implementation)      │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod action;
pub mod catalog;
pub mod error;
pub mod model;
pub mod operation;
pub mod provider;
pub mod reconcile;

// Re-exports
pub use action::{Action, Event, Progress, RecordingProgress, ReconcileReport, SilentProgress};
pub use catalog::{CatalogCache, fetch_catalog};
pub use error::{CloudError, Result};
pub use model::{
    BATCH_ENABLE_LIMIT, BILLING_SERVICE, BillingAccount, BillingLink, BillingRef,
    CallingConvention, LifecycleState, MANAGED_BY_LABEL, Operation, OperationError,
    ProjectNumber, ProjectRecord, ProjectSpec, ProjectState, SERVICE_DOMAIN_SUFFIX,
    ServiceCatalogEntry, ServicePage,
};
pub use operation::{DEFAULT_POLL_INTERVAL, OperationPhase, OperationPoller};
pub use provider::{ActivationService, BillingService, ResourceService};
pub use reconcile::{
    DEFAULT_CREATE_DEADLINE, ReconcileOptions, ReconcileStep, Reconciler, plan_enablement,
};
pub use tokio_util::sync::CancellationToken;
