use async_trait::async_trait;
use gproj_cloud::{
    ActivationService, BillingAccount, BillingLink, BillingRef, BillingService, CatalogCache,
    CloudError, LifecycleState, Operation, OperationPoller, ProjectNumber, ProjectRecord,
    ProjectSpec, ProjectState, Reconciler, ResourceService, Result, ServiceCatalogEntry,
    ServicePage,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Every call the engine made against the fake
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Call {
    GetProject(String),
    CreateProject(ProjectRecord),
    UpdateProject(ProjectRecord),
    DeleteProject(String),
    UndeleteProject(String),
    GetBillingInfo(ProjectNumber),
    UpdateBillingInfo(ProjectNumber, String),
    ListBillingAccounts,
    ListServices(ProjectNumber, Option<String>),
    BatchEnable(ProjectNumber, Vec<String>),
    GetOperation(String),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::CreateProject(_)
                | Call::UpdateProject(_)
                | Call::DeleteProject(_)
                | Call::UndeleteProject(_)
                | Call::UpdateBillingInfo(..)
                | Call::BatchEnable(..)
        )
    }
}

#[derive(Default)]
struct State {
    projects: HashMap<String, ProjectState>,
    next_number: i64,
    billing: HashMap<ProjectNumber, BillingLink>,
    services: HashMap<ProjectNumber, BTreeMap<String, ServiceCatalogEntry>>,
    /// operation name → remaining polls before done
    operations: HashMap<String, u32>,
    failing_operations: HashMap<String, (i32, String)>,
    calls: Vec<Call>,
}

/// In-memory stand-in for the three remote services
pub struct FakeCloud {
    state: Mutex<State>,
    /// Services offered to every project, all disabled initially
    pub catalog_template: Vec<String>,
    pub accounts: Vec<BillingAccount>,
    pub polls_per_operation: u32,
    /// Polls before project creation finishes, when it differs from the rest
    pub create_polls: Option<u32>,
    pub billing_enabled_after_update: bool,
    /// HTTP status returned by `get_project` instead of a lookup
    pub get_project_status: Option<u16>,
    pub fail_create_operation: bool,
    pub page_size: usize,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_number: 100_000,
                ..Default::default()
            }),
            catalog_template: [
                "bigquery.googleapis.com",
                "cloudbilling.googleapis.com",
                "compute.googleapis.com",
                "run.googleapis.com",
                "storage.googleapis.com",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            accounts: vec![BillingAccount {
                name: "billingAccounts/000000-111111-222222".into(),
                display_name: "Main".into(),
                open: true,
            }],
            polls_per_operation: 2,
            create_polls: None,
            billing_enabled_after_update: true,
            get_project_status: None,
            fail_create_operation: false,
            page_size: 2,
        }
    }

    /// Seed an existing project with its catalog
    pub fn with_project(self, id: &str, name: &str, labels: &[(&str, &str)]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let number = ProjectNumber(state.next_number);
            state.next_number += 1;
            state.projects.insert(
                id.to_string(),
                ProjectState {
                    id: id.to_string(),
                    number,
                    name: name.to_string(),
                    labels: labels
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                    lifecycle: LifecycleState::Active,
                },
            );
            let catalog = self.template_catalog();
            state.services.insert(number, catalog);
            state.billing.insert(
                number,
                BillingLink {
                    project: number,
                    account: String::new(),
                    billing_enabled: false,
                },
            );
        }
        self
    }

    pub fn set_lifecycle(&self, id: &str, lifecycle: LifecycleState) {
        let mut state = self.state.lock().unwrap();
        if let Some(p) = state.projects.get_mut(id) {
            p.lifecycle = lifecycle;
        }
    }

    pub fn project(&self, id: &str) -> Option<ProjectState> {
        self.state.lock().unwrap().projects.get(id).cloned()
    }

    pub fn billing_account(&self, number: ProjectNumber) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .billing
            .get(&number)
            .map(|b| b.account.clone())
    }

    pub fn is_enabled(&self, number: ProjectNumber, service: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .services
            .get(&number)
            .and_then(|s| s.get(service))
            .is_some_and(|e| e.enabled)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn template_catalog(&self) -> BTreeMap<String, ServiceCatalogEntry> {
        self.catalog_template
            .iter()
            .map(|name| {
                (
                    name.clone(),
                    ServiceCatalogEntry {
                        name: name.clone(),
                        title: name.clone(),
                        summary: format!("{}\nsecond line", name),
                        enabled: false,
                    },
                )
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn start_operation(&self, prefix: &str, polls: u32) -> Operation {
        let mut state = self.state.lock().unwrap();
        let name = format!("operations/{}-{}", prefix, state.operations.len());
        state.operations.insert(name.clone(), polls);
        Operation::pending(name)
    }

    fn poll_operation(&self, name: &str) -> Result<Operation> {
        self.record(Call::GetOperation(name.to_string()));
        let mut state = self.state.lock().unwrap();
        if let Some((code, message)) = state.failing_operations.get(name) {
            return Ok(Operation::failed(name, *code, message.clone()));
        }
        let remaining = state
            .operations
            .get_mut(name)
            .ok_or_else(|| CloudError::Api {
                code: 404,
                message: format!("no operation {}", name),
            })?;
        *remaining = remaining.saturating_sub(1);
        Ok(if *remaining == 0 {
            Operation::succeeded(name)
        } else {
            Operation::pending(name)
        })
    }
}

#[async_trait]
impl ResourceService for FakeCloud {
    async fn get_project(&self, project_id: &str) -> Result<ProjectState> {
        self.record(Call::GetProject(project_id.to_string()));
        if let Some(code) = self.get_project_status {
            return Err(CloudError::Api {
                code,
                message: "injected failure".into(),
            });
        }
        self.state
            .lock()
            .unwrap()
            .projects
            .get(project_id)
            .cloned()
            .ok_or_else(|| CloudError::NotFoundOrForbidden(project_id.to_string()))
    }

    async fn create_project(&self, project: &ProjectRecord) -> Result<Operation> {
        self.record(Call::CreateProject(project.clone()));
        let op = self.start_operation(
            "create",
            self.create_polls.unwrap_or(self.polls_per_operation),
        );
        let mut state = self.state.lock().unwrap();
        if self.fail_create_operation {
            state
                .failing_operations
                .insert(op.name.clone(), (6, "project id already exists".into()));
            return Ok(op);
        }
        let number = ProjectNumber(state.next_number);
        state.next_number += 1;
        state.projects.insert(
            project.id.clone(),
            ProjectState {
                id: project.id.clone(),
                number,
                name: project.name.clone(),
                labels: project.labels.clone(),
                lifecycle: LifecycleState::Active,
            },
        );
        let catalog = self.template_catalog();
        state.services.insert(number, catalog);
        state.billing.insert(
            number,
            BillingLink {
                project: number,
                account: String::new(),
                billing_enabled: false,
            },
        );
        Ok(op)
    }

    async fn update_project(&self, project: &ProjectRecord) -> Result<ProjectState> {
        self.record(Call::UpdateProject(project.clone()));
        let mut state = self.state.lock().unwrap();
        let existing = state
            .projects
            .get_mut(&project.id)
            .ok_or_else(|| CloudError::NotFoundOrForbidden(project.id.clone()))?;
        existing.name = project.name.clone();
        existing.labels = project.labels.clone();
        Ok(existing.clone())
    }

    async fn delete_project(&self, project_id: &str) -> Result<()> {
        self.record(Call::DeleteProject(project_id.to_string()));
        self.set_lifecycle(project_id, LifecycleState::DeleteRequested);
        Ok(())
    }

    async fn undelete_project(&self, project_id: &str) -> Result<()> {
        self.record(Call::UndeleteProject(project_id.to_string()));
        self.set_lifecycle(project_id, LifecycleState::Active);
        Ok(())
    }

    async fn get_operation(&self, name: &str) -> Result<Operation> {
        self.poll_operation(name)
    }
}

#[async_trait]
impl BillingService for FakeCloud {
    async fn get_billing_info(&self, project: ProjectNumber) -> Result<BillingLink> {
        self.record(Call::GetBillingInfo(project));
        self.state
            .lock()
            .unwrap()
            .billing
            .get(&project)
            .cloned()
            .ok_or_else(|| CloudError::Api {
                code: 404,
                message: "no billing info".into(),
            })
    }

    async fn update_billing_info(&self, project: ProjectNumber, account: &str) -> Result<BillingLink> {
        self.record(Call::UpdateBillingInfo(project, account.to_string()));
        let link = BillingLink {
            project,
            account: account.to_string(),
            billing_enabled: self.billing_enabled_after_update,
        };
        self.state
            .lock()
            .unwrap()
            .billing
            .insert(project, link.clone());
        Ok(link)
    }

    async fn list_billing_accounts(&self) -> Result<Vec<BillingAccount>> {
        self.record(Call::ListBillingAccounts);
        Ok(self.accounts.clone())
    }
}

#[async_trait]
impl ActivationService for FakeCloud {
    async fn list_services(
        &self,
        project: ProjectNumber,
        page_token: Option<&str>,
    ) -> Result<ServicePage> {
        self.record(Call::ListServices(project, page_token.map(str::to_string)));
        let state = self.state.lock().unwrap();
        let all: Vec<_> = state
            .services
            .get(&project)
            .map(|s| s.values().cloned().collect())
            .unwrap_or_default();
        let start: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + self.page_size).min(all.len());
        Ok(ServicePage {
            services: all[start..end].to_vec(),
            next_page_token: (end < all.len()).then(|| end.to_string()),
        })
    }

    async fn batch_enable(&self, project: ProjectNumber, service_ids: &[String]) -> Result<Operation> {
        self.record(Call::BatchEnable(project, service_ids.to_vec()));
        let op = self.start_operation("enable", self.polls_per_operation);
        let mut state = self.state.lock().unwrap();
        let services = state.services.entry(project).or_default();
        for id in service_ids {
            services
                .entry(id.clone())
                .or_insert_with(|| ServiceCatalogEntry {
                    name: id.clone(),
                    title: id.clone(),
                    summary: String::new(),
                    enabled: false,
                })
                .enabled = true;
        }
        Ok(op)
    }

    async fn get_operation(&self, name: &str) -> Result<Operation> {
        self.poll_operation(name)
    }
}

pub struct Harness {
    pub cloud: Arc<FakeCloud>,
    pub cache_dir: TempDir,
    pub cancel: CancellationToken,
}

impl Harness {
    pub fn new(cloud: FakeCloud) -> Self {
        Self {
            cloud: Arc::new(cloud),
            cache_dir: tempfile::tempdir().unwrap(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(
            self.cloud.clone(),
            self.cloud.clone(),
            self.cloud.clone(),
            CatalogCache::new(self.cache_dir.path()),
            OperationPoller::new(Duration::from_millis(1), self.cancel.clone()),
        )
    }
}

pub fn spec(name: &str, id: &str, billing: BillingRef, apis: &[&str]) -> ProjectSpec {
    ProjectSpec {
        name: name.to_string(),
        id: id.to_string(),
        labels: BTreeMap::from([("env".to_string(), "dev".to_string())]),
        billing,
        apis: apis.iter().map(|s| s.to_string()).collect(),
    }
}
