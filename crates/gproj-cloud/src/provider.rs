//! Remote service facade
//!
//! One trait per remote domain. The reconciliation engine only talks to these
//! traits, so the REST implementation and the test fakes are interchangeable.

use crate::error::Result;
use crate::model::{
    BillingAccount, BillingLink, Operation, ProjectNumber, ProjectRecord, ProjectState,
    ServicePage,
};
use async_trait::async_trait;

/// Project lifecycle (resource manager)
#[async_trait]
pub trait ResourceService: Send + Sync {
    /// Fetch a project by its identifier.
    ///
    /// Missing and foreign projects both yield `CloudError::NotFoundOrForbidden`.
    async fn get_project(&self, project_id: &str) -> Result<ProjectState>;

    /// Submit a project creation; the returned operation must be polled
    async fn create_project(&self, project: &ProjectRecord) -> Result<Operation>;

    /// Replace display name and labels of an existing project
    async fn update_project(&self, project: &ProjectRecord) -> Result<ProjectState>;

    async fn delete_project(&self, project_id: &str) -> Result<()>;

    async fn undelete_project(&self, project_id: &str) -> Result<()>;

    /// Poll a resource manager operation by name
    async fn get_operation(&self, name: &str) -> Result<Operation>;
}

/// Billing linkage
#[async_trait]
pub trait BillingService: Send + Sync {
    async fn get_billing_info(&self, project: ProjectNumber) -> Result<BillingLink>;

    /// Link the project to `account`; the response must be re-checked for `billing_enabled`
    async fn update_billing_info(&self, project: ProjectNumber, account: &str) -> Result<BillingLink>;

    /// All billing accounts visible to the caller, across every page
    async fn list_billing_accounts(&self) -> Result<Vec<BillingAccount>>;
}

/// Service activation (service usage)
#[async_trait]
pub trait ActivationService: Send + Sync {
    /// One page of the project's service catalog
    async fn list_services(
        &self,
        project: ProjectNumber,
        page_token: Option<&str>,
    ) -> Result<ServicePage>;

    /// Enable up to `BATCH_ENABLE_LIMIT` services in one long-running operation
    async fn batch_enable(&self, project: ProjectNumber, service_ids: &[String]) -> Result<Operation>;

    /// Poll a service usage operation by name
    async fn get_operation(&self, name: &str) -> Result<Operation>;
}
