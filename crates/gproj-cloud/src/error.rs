//! Error types for project reconciliation

use crate::reconcile::ReconcileStep;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the facade, the poller, the catalog cache and the engine
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("invalid project spec: {0}")]
    Validation(String),

    /// The provider answers "forbidden" both for projects that do not exist and
    /// for projects owned by someone else. Only the project lookup interprets
    /// this as "missing".
    #[error("project {0} not found or not accessible")]
    NotFoundOrForbidden(String),

    #[error("project {0} is pending deletion; run `gproj undelete` to restore it")]
    PendingDeletion(String),

    #[error("error performing operation: {code} {message}")]
    RemoteOperation { code: i32, message: String },

    #[error(
        "no billing account in spec and found {total} billing accounts (of which {open} were open)"
    )]
    AmbiguousBillingAccount { open: usize, total: usize },

    #[error("billing account was updated to {account} but billing is still not enabled")]
    BillingNotEnabled { account: String },

    #[error("no such API: {0}")]
    UnknownService(String),

    #[error("cannot enable more than 20 APIs at a time (requested {0})")]
    BatchLimitExceeded(usize),

    #[error("error decoding cached API listing; try deleting {}: {source}", .path.display())]
    CacheCorruption {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to cache API listing: {0}")]
    CacheWrite(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("cancelled")]
    Cancelled,

    #[error("API error {code}: {message}")]
    Api { code: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("error during {step}: {source}")]
    Step {
        step: ReconcileStep,
        #[source]
        source: Box<CloudError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Strip step context and return the underlying error
    pub fn root(&self) -> &CloudError {
        match self {
            CloudError::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// The pipeline step this error was raised in, if any
    pub fn step(&self) -> Option<ReconcileStep> {
        match self {
            CloudError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Short class label printed in front of user-facing error messages
    pub fn class(&self) -> &'static str {
        match self.root() {
            CloudError::Validation(_) => "validation",
            CloudError::NotFoundOrForbidden(_) => "not-found-or-forbidden",
            CloudError::PendingDeletion(_) => "pending-deletion",
            CloudError::RemoteOperation { .. } => "remote-operation",
            CloudError::AmbiguousBillingAccount { .. } => "ambiguous-billing-account",
            CloudError::BillingNotEnabled { .. } => "billing-not-enabled",
            CloudError::UnknownService(_) => "unknown-service",
            CloudError::BatchLimitExceeded(_) => "batch-limit-exceeded",
            CloudError::CacheCorruption { .. } => "cache-corruption",
            CloudError::CacheWrite(_) => "cache-write",
            CloudError::Timeout(_) => "timeout",
            CloudError::Cancelled => "cancelled",
            CloudError::Api { .. } => "api",
            CloudError::Transport(_) => "transport",
            CloudError::Io(_) => "io",
            CloudError::Json(_) => "json",
            CloudError::Step { .. } => "step",
        }
    }

    pub(crate) fn in_step(self, step: ReconcileStep) -> Self {
        match self {
            already @ CloudError::Step { .. } => already,
            other => CloudError::Step {
                step,
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_strips_step_context() {
        let err = CloudError::UnknownService("foo.googleapis.com".into())
            .in_step(ReconcileStep::PlanServices);

        assert_eq!(err.step(), Some(ReconcileStep::PlanServices));
        assert!(matches!(err.root(), CloudError::UnknownService(name) if name == "foo.googleapis.com"));
        assert_eq!(err.class(), "unknown-service");
        assert!(err.to_string().starts_with("error during planning services"));
    }

    #[test]
    fn test_in_step_keeps_innermost_step() {
        let err = CloudError::Cancelled
            .in_step(ReconcileStep::EnableServices)
            .in_step(ReconcileStep::PlanServices);
        assert_eq!(err.step(), Some(ReconcileStep::EnableServices));
    }

    #[test]
    fn test_ambiguous_billing_message_names_counts() {
        let err = CloudError::AmbiguousBillingAccount { open: 2, total: 3 };
        assert_eq!(
            err.to_string(),
            "no billing account in spec and found 3 billing accounts (of which 2 were open)"
        );
    }
}
