//! Desired-state and live-state types

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Suffix shared by every first-party service name
pub const SERVICE_DOMAIN_SUFFIX: &str = ".googleapis.com";

/// Service that must be enabled on a fresh project before billing can be linked
pub const BILLING_SERVICE: &str = "cloudbilling.googleapis.com";

/// Label merged into every project created by gproj
pub const MANAGED_BY_LABEL: (&str, &str) = ("managed-by", "gproj");

/// Maximum number of services accepted by a single batch-enable call
pub const BATCH_ENABLE_LIMIT: usize = 20;

/// Minimum project display name length accepted by the provider
pub const MIN_NAME_LEN: usize = 4;

const BILLING_ACCOUNT_PREFIX: &str = "billingAccounts/";

/// Which evolution of the command-line contract a spec is interpreted under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallingConvention {
    /// `billing: enable` auto-selects, empty billing leaves the link alone,
    /// APIs missing from the catalog are treated as not yet enabled
    #[default]
    Apply,
    /// Empty billing auto-selects, every requested API must be in the catalog
    Sync,
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallingConvention::Apply => write!(f, "apply"),
            CallingConvention::Sync => write!(f, "sync"),
        }
    }
}

/// Billing account reference from the spec document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingRef {
    /// Pick the single open billing account visible to the caller
    AutoSelect,
    /// Link this account (always in `billingAccounts/...` form)
    Account(String),
    /// Do not touch the billing link
    Unmanaged,
}

impl BillingRef {
    /// Interpret the raw `billing` field under a calling convention
    pub fn parse(raw: Option<&str>, convention: CallingConvention) -> Self {
        let raw = raw.map(str::trim).unwrap_or_default();
        match (convention, raw) {
            (CallingConvention::Apply, "enable") => BillingRef::AutoSelect,
            (CallingConvention::Apply, "") => BillingRef::Unmanaged,
            (CallingConvention::Sync, "") => BillingRef::AutoSelect,
            (_, account) => BillingRef::Account(billing_account_name(account)),
        }
    }
}

/// Qualify a bare billing account id (`012345-6789AB-CDEFG0`) with its collection
pub fn billing_account_name(account: &str) -> String {
    if account.starts_with(BILLING_ACCOUNT_PREFIX) {
        account.to_string()
    } else {
        format!("{}{}", BILLING_ACCOUNT_PREFIX, account)
    }
}

/// Desired state for one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSpec {
    pub name: String,
    pub id: String,
    pub labels: BTreeMap<String, String>,
    pub billing: BillingRef,
    pub apis: Vec<String>,
}

impl ProjectSpec {
    pub fn validate(&self) -> Result<()> {
        if self.name.chars().count() < MIN_NAME_LEN {
            return Err(CloudError::Validation(format!(
                "project name {:?} invalid: must be at least {} characters long (required by Google Cloud)",
                self.name, MIN_NAME_LEN
            )));
        }
        if self.id.trim().is_empty() {
            return Err(CloudError::Validation("project id must not be empty".into()));
        }
        Ok(())
    }

    /// Labels for a newly created project: a fresh copy with the management marker merged in
    pub fn creation_labels(&self) -> BTreeMap<String, String> {
        let mut labels = self.labels.clone();
        labels.insert(MANAGED_BY_LABEL.0.to_string(), MANAGED_BY_LABEL.1.to_string());
        labels
    }
}

/// Provider-assigned numeric project handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectNumber(pub i64);

impl ProjectNumber {
    /// Resource name used by billing and service usage endpoints
    pub fn resource_name(&self) -> String {
        format!("projects/{}", self.0)
    }
}

impl fmt::Display for ProjectNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Active,
    DeleteRequested,
    DeleteInProgress,
    #[default]
    #[serde(other)]
    LifecycleStateUnspecified,
}

impl LifecycleState {
    pub fn is_pending_deletion(&self) -> bool {
        matches!(
            self,
            LifecycleState::DeleteRequested | LifecycleState::DeleteInProgress
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Active => write!(f, "active"),
            LifecycleState::DeleteRequested => write!(f, "delete requested"),
            LifecycleState::DeleteInProgress => write!(f, "delete in progress"),
            LifecycleState::LifecycleStateUnspecified => write!(f, "unspecified"),
        }
    }
}

/// Live project snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectState {
    pub id: String,
    pub number: ProjectNumber,
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub lifecycle: LifecycleState,
}

/// Project record submitted for creation or update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingLink {
    pub project: ProjectNumber,
    /// Empty when no account is linked
    pub account: String,
    pub billing_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingAccount {
    pub name: String,
    pub display_name: String,
    pub open: bool,
}

/// One activatable service in a project's catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCatalogEntry {
    /// Machine readable name, e.g. "billingbudgets.googleapis.com"
    pub name: String,
    /// Human readable name, e.g. "Cloud Billing API"
    pub title: String,
    pub summary: String,
    pub enabled: bool,
}

impl ServiceCatalogEntry {
    pub fn is_first_party(&self) -> bool {
        self.name.ends_with(SERVICE_DOMAIN_SUFFIX)
    }
}

/// One page of the remote service listing
#[derive(Debug, Clone, Default)]
pub struct ServicePage {
    pub services: Vec<ServiceCatalogEntry>,
    pub next_page_token: Option<String>,
}

/// Error carried by a finished long-running operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    pub code: i32,
    pub message: String,
}

impl From<OperationError> for CloudError {
    fn from(e: OperationError) -> Self {
        CloudError::RemoteOperation {
            code: e.code,
            message: e.message,
        }
    }
}

/// Handle to an asynchronous remote mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub done: bool,
    pub error: Option<OperationError>,
}

impl Operation {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            error: None,
        }
    }

    pub fn succeeded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: true,
            error: None,
        }
    }

    pub fn failed(name: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: true,
            error: Some(OperationError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Expand a short service name to its fully-qualified form.
///
/// Returns the name to use and whether an assumption was made.
pub fn normalize_service_name(requested: &str) -> (String, bool) {
    let requested = requested.trim();
    if requested.contains('.') {
        (requested.to_string(), false)
    } else {
        (format!("{}{}", requested, SERVICE_DOMAIN_SUFFIX), true)
    }
}

/// First line of a possibly multi-line string
pub fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> ProjectSpec {
        ProjectSpec {
            name: name.to_string(),
            id: "my-project-123".to_string(),
            labels: BTreeMap::from([("team".to_string(), "infra".to_string())]),
            billing: BillingRef::Unmanaged,
            apis: vec![],
        }
    }

    #[test]
    fn test_normalize_service_name() {
        assert_eq!(
            normalize_service_name("compute"),
            ("compute.googleapis.com".to_string(), true)
        );
        assert_eq!(
            normalize_service_name("run.googleapis.com"),
            ("run.googleapis.com".to_string(), false)
        );
        assert_eq!(
            normalize_service_name("custom.example.com"),
            ("custom.example.com".to_string(), false)
        );
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("one\ntwo\nthree"), "one");
        assert_eq!(first_line("single"), "single");
        assert_eq!(first_line(""), "");
    }

    #[test]
    fn test_billing_ref_apply_convention() {
        let c = CallingConvention::Apply;
        assert_eq!(BillingRef::parse(Some("enable"), c), BillingRef::AutoSelect);
        assert_eq!(BillingRef::parse(Some(""), c), BillingRef::Unmanaged);
        assert_eq!(BillingRef::parse(None, c), BillingRef::Unmanaged);
        assert_eq!(
            BillingRef::parse(Some("012345-6789AB-CDEFG0"), c),
            BillingRef::Account("billingAccounts/012345-6789AB-CDEFG0".into())
        );
    }

    #[test]
    fn test_billing_ref_sync_convention() {
        let c = CallingConvention::Sync;
        assert_eq!(BillingRef::parse(None, c), BillingRef::AutoSelect);
        assert_eq!(BillingRef::parse(Some("  "), c), BillingRef::AutoSelect);
        assert_eq!(
            BillingRef::parse(Some("billingAccounts/AAAAAA-BBBBBB-CCCCCC"), c),
            BillingRef::Account("billingAccounts/AAAAAA-BBBBBB-CCCCCC".into())
        );
    }

    #[test]
    fn test_validate_name_length() {
        assert!(matches!(spec("abc").validate(), Err(CloudError::Validation(_))));
        assert!(spec("abcd").validate().is_ok());
    }

    #[test]
    fn test_creation_labels_do_not_touch_spec() {
        let s = spec("demo project");
        let labels = s.creation_labels();

        assert_eq!(labels.get("managed-by").map(String::as_str), Some("gproj"));
        assert_eq!(labels.get("team").map(String::as_str), Some("infra"));
        assert!(!s.labels.contains_key("managed-by"));
    }

    #[test]
    fn test_lifecycle_state_deserialize() {
        let state: LifecycleState = serde_json::from_str("\"DELETE_REQUESTED\"").unwrap();
        assert!(state.is_pending_deletion());
        let state: LifecycleState = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(state, LifecycleState::LifecycleStateUnspecified);
    }

    #[test]
    fn test_project_number_resource_name() {
        assert_eq!(ProjectNumber(123456).resource_name(), "projects/123456");
    }
}
