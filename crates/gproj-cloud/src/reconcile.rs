//! Reconciliation engine
//!
//! Converges one remote project onto a [`ProjectSpec`] in a fixed pipeline:
//!
//! ```text
//! validate → fetch/create project → enable billing API (new projects only)
//!          → resolve + link billing account → diff catalog → batch enable
//! ```
//!
//! Nothing is ever deleted or disabled. Re-running after a failure is the
//! recovery path: each step checks live state first and only mutates what
//! still differs.

use crate::action::{Action, Event, Progress, ReconcileReport, SilentProgress};
use crate::catalog::CatalogCache;
use crate::error::{CloudError, Result};
use crate::model::{
    BATCH_ENABLE_LIMIT, BILLING_SERVICE, BillingRef, CallingConvention, ProjectRecord,
    ProjectSpec, ProjectState, ServiceCatalogEntry, normalize_service_name,
};
use crate::operation::OperationPoller;
use crate::provider::{ActivationService, BillingService, ResourceService};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default bound on waiting for project creation
pub const DEFAULT_CREATE_DEADLINE: Duration = Duration::from_secs(5);

/// Named stage of the pipeline, attached to every error it raises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStep {
    Validate,
    FetchProject,
    CreateProject,
    UpdateProject,
    BootstrapBilling,
    ResolveBilling,
    UpdateBilling,
    LoadCatalog,
    PlanServices,
    EnableServices,
}

impl fmt::Display for ReconcileStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ReconcileStep::Validate => "validating the spec",
            ReconcileStep::FetchProject => "fetching the project",
            ReconcileStep::CreateProject => "creating the project",
            ReconcileStep::UpdateProject => "updating the project",
            ReconcileStep::BootstrapBilling => "enabling the billing API",
            ReconcileStep::ResolveBilling => "resolving the billing account",
            ReconcileStep::UpdateBilling => "updating billing info",
            ReconcileStep::LoadCatalog => "loading the API catalog",
            ReconcileStep::PlanServices => "planning services",
            ReconcileStep::EnableServices => "enabling services",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub convention: CallingConvention,
    /// Bound on the project-creation wait; other waits only end on cancellation
    pub create_deadline: Duration,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            convention: CallingConvention::Apply,
            create_deadline: DEFAULT_CREATE_DEADLINE,
        }
    }
}

pub struct Reconciler {
    resources: Arc<dyn ResourceService>,
    billing: Arc<dyn BillingService>,
    activation: Arc<dyn ActivationService>,
    cache: CatalogCache,
    poller: OperationPoller,
    options: ReconcileOptions,
    progress: Arc<dyn Progress>,
}

impl Reconciler {
    pub fn new(
        resources: Arc<dyn ResourceService>,
        billing: Arc<dyn BillingService>,
        activation: Arc<dyn ActivationService>,
        cache: CatalogCache,
        poller: OperationPoller,
    ) -> Self {
        Self {
            resources,
            billing,
            activation,
            cache,
            poller,
            options: ReconcileOptions::default(),
            progress: Arc::new(SilentProgress),
        }
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    /// Bring the remote project in line with `spec`
    #[tracing::instrument(skip_all, fields(project = %spec.id, convention = %self.options.convention))]
    pub async fn reconcile(&self, spec: &ProjectSpec) -> Result<ReconcileReport> {
        let mut actions = Vec::new();

        spec.validate()
            .map_err(|e| e.in_step(ReconcileStep::Validate))?;

        let project = self.ensure_project(spec, &mut actions).await?;
        self.ensure_billing(spec, &project, &mut actions).await?;
        self.ensure_services(spec, &project, &mut actions).await?;

        tracing::info!(changes = actions.len(), "Reconciliation finished");
        Ok(ReconcileReport { project, actions })
    }

    async fn ensure_project(
        &self,
        spec: &ProjectSpec,
        actions: &mut Vec<Action>,
    ) -> Result<ProjectState> {
        let lookup = self
            .guard(ReconcileStep::FetchProject, self.resources.get_project(&spec.id))
            .await;

        match lookup {
            Ok(project) if project.lifecycle.is_pending_deletion() => {
                Err(CloudError::PendingDeletion(project.id).in_step(ReconcileStep::FetchProject))
            }
            Ok(project) => self.update_project(spec, project, actions).await,
            Err(e) if matches!(e.root(), CloudError::NotFoundOrForbidden(_)) => {
                tracing::debug!("Project lookup answered not-found-or-forbidden, creating");
                self.create_project(spec, actions).await
            }
            Err(e) => Err(e),
        }
    }

    async fn create_project(
        &self,
        spec: &ProjectSpec,
        actions: &mut Vec<Action>,
    ) -> Result<ProjectState> {
        self.progress.event(Event::ProjectMissing {
            id: spec.id.clone(),
        });

        let record = ProjectRecord {
            id: spec.id.clone(),
            name: spec.name.clone(),
            labels: spec.creation_labels(),
        };
        let op = self
            .guard(ReconcileStep::CreateProject, self.resources.create_project(&record))
            .await?;

        let resources = &self.resources;
        self.poller
            .wait_until_done(op, Some(self.options.create_deadline), move |name| async move {
                resources.get_operation(&name).await
            })
            .await
            .map_err(|e| e.in_step(ReconcileStep::CreateProject))?;
        actions.push(Action::CreateProject {
            id: spec.id.clone(),
        });

        // the numeric handle only exists once the server has filled it in
        let project = self
            .guard(ReconcileStep::CreateProject, self.resources.get_project(&spec.id))
            .await?;
        tracing::info!(number = %project.number, "Project created");

        let op = self
            .guard(
                ReconcileStep::BootstrapBilling,
                self.activation
                    .batch_enable(project.number, &[BILLING_SERVICE.to_string()]),
            )
            .await?;
        self.wait_for_activation(op, ReconcileStep::BootstrapBilling)
            .await?;
        actions.push(Action::EnableBillingService);
        self.progress.event(Event::BillingServiceEnabled);

        self.progress.event(Event::ProjectCreated {
            id: project.id.clone(),
            number: project.number,
        });
        Ok(project)
    }

    async fn update_project(
        &self,
        spec: &ProjectSpec,
        project: ProjectState,
        actions: &mut Vec<Action>,
    ) -> Result<ProjectState> {
        let label_drift = spec
            .labels
            .iter()
            .any(|(k, v)| project.labels.get(k) != Some(v));
        if project.name == spec.name && !label_drift {
            tracing::debug!("Project name and labels already match");
            return Ok(project);
        }

        let mut labels = project.labels.clone();
        labels.extend(spec.labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        let record = ProjectRecord {
            id: spec.id.clone(),
            name: spec.name.clone(),
            labels,
        };

        let updated = self
            .guard(ReconcileStep::UpdateProject, self.resources.update_project(&record))
            .await?;
        actions.push(Action::UpdateProject {
            id: spec.id.clone(),
        });
        self.progress.event(Event::ProjectUpdated {
            id: spec.id.clone(),
        });
        Ok(updated)
    }

    async fn ensure_billing(
        &self,
        spec: &ProjectSpec,
        project: &ProjectState,
        actions: &mut Vec<Action>,
    ) -> Result<()> {
        let wanted = match &spec.billing {
            BillingRef::Unmanaged => {
                tracing::debug!("Billing not managed by spec, leaving link untouched");
                return Ok(());
            }
            BillingRef::AutoSelect | BillingRef::Account(_) => &spec.billing,
        };

        let link = self
            .guard(
                ReconcileStep::ResolveBilling,
                self.billing.get_billing_info(project.number),
            )
            .await?;

        let account = match wanted {
            BillingRef::Account(account) => account.clone(),
            _ => self.select_billing_account().await?,
        };

        if link.account == account {
            tracing::debug!(account = %account, "Billing account already linked");
            return Ok(());
        }

        self.progress.event(Event::UpdatingBilling {
            account: account.clone(),
        });
        let updated = self
            .guard(
                ReconcileStep::UpdateBilling,
                self.billing.update_billing_info(project.number, &account),
            )
            .await?;

        // the update call succeeding does not prove billing is active
        if !updated.billing_enabled {
            return Err(
                CloudError::BillingNotEnabled { account }.in_step(ReconcileStep::UpdateBilling)
            );
        }

        actions.push(Action::LinkBilling { account });
        self.progress.event(Event::BillingUpdated);
        Ok(())
    }

    async fn select_billing_account(&self) -> Result<String> {
        self.progress.event(Event::LookingUpBillingAccounts);
        let accounts = self
            .guard(
                ReconcileStep::ResolveBilling,
                self.billing.list_billing_accounts(),
            )
            .await?;

        let open: Vec<_> = accounts.iter().filter(|a| a.open).collect();
        match open.as_slice() {
            [only] => {
                self.progress.event(Event::BillingAccountSelected {
                    name: only.name.clone(),
                    display_name: only.display_name.clone(),
                });
                Ok(only.name.clone())
            }
            _ => Err(CloudError::AmbiguousBillingAccount {
                open: open.len(),
                total: accounts.len(),
            }
            .in_step(ReconcileStep::ResolveBilling)),
        }
    }

    async fn ensure_services(
        &self,
        spec: &ProjectSpec,
        project: &ProjectState,
        actions: &mut Vec<Action>,
    ) -> Result<()> {
        let requested = self.normalize_requested(&spec.apis);
        if requested.is_empty() {
            return Ok(());
        }

        let catalog = self
            .guard(
                ReconcileStep::LoadCatalog,
                self.cache
                    .list_services(self.activation.as_ref(), project.number),
            )
            .await?;

        let to_enable = plan_enablement(&requested, &catalog, self.options.convention)
            .map_err(|e| e.in_step(ReconcileStep::PlanServices))?;
        if to_enable.is_empty() {
            self.progress.event(Event::ServicesUpToDate);
            return Ok(());
        }
        if to_enable.len() > BATCH_ENABLE_LIMIT {
            return Err(CloudError::BatchLimitExceeded(to_enable.len())
                .in_step(ReconcileStep::PlanServices));
        }

        self.progress.event(Event::EnablingServices {
            services: to_enable.clone(),
        });
        let op = self
            .guard(
                ReconcileStep::EnableServices,
                self.activation.batch_enable(project.number, &to_enable),
            )
            .await?;
        self.wait_for_activation(op, ReconcileStep::EnableServices)
            .await?;

        if let Err(e) = self.cache.mark_enabled(project.number, &to_enable).await {
            tracing::warn!("Failed to record enabled services in cache: {}", e);
            self.progress.event(Event::CacheWarning {
                message: e.to_string(),
            });
        }
        actions.push(Action::EnableServices {
            services: to_enable,
        });
        Ok(())
    }

    /// Fully-qualified, de-duplicated service names in request order
    fn normalize_requested(&self, apis: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(apis.len());
        for requested in apis {
            let (name, assumed) = normalize_service_name(requested);
            if assumed {
                self.progress.event(Event::AssumedServiceName {
                    requested: requested.clone(),
                    assumed: name.clone(),
                });
            }
            if seen.insert(name.clone()) {
                out.push(name);
            }
        }
        out
    }

    async fn wait_for_activation(
        &self,
        op: crate::model::Operation,
        step: ReconcileStep,
    ) -> Result<()> {
        let activation = &self.activation;
        self.poller
            .wait_until_done(op, None, move |name| async move {
                activation.get_operation(&name).await
            })
            .await
            .map_err(|e| e.in_step(step))
    }

    /// Run a remote call, failing fast when the run is cancelled
    async fn guard<T>(
        &self,
        step: ReconcileStep,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.poller.cancel_token().cancelled() => Err(CloudError::Cancelled.in_step(step)),
            result = call => result.map_err(|e| e.in_step(step)),
        }
    }
}

/// Services from `requested` that still need enabling.
///
/// Under [`CallingConvention::Sync`] the catalog is authoritative and an
/// unknown name is an error; under [`CallingConvention::Apply`] it is assumed
/// to be enableable.
pub fn plan_enablement(
    requested: &[String],
    catalog: &[ServiceCatalogEntry],
    convention: CallingConvention,
) -> Result<Vec<String>> {
    let by_name: HashMap<&str, &ServiceCatalogEntry> =
        catalog.iter().map(|e| (e.name.as_str(), e)).collect();

    let mut to_enable = Vec::new();
    for name in requested {
        match by_name.get(name.as_str()) {
            Some(entry) if entry.enabled => {}
            Some(_) => to_enable.push(name.clone()),
            None => match convention {
                CallingConvention::Apply => to_enable.push(name.clone()),
                CallingConvention::Sync => return Err(CloudError::UnknownService(name.clone())),
            },
        }
    }
    Ok(to_enable)
}
