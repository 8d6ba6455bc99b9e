//! Mutations performed during a run and the progress events narrating them

use crate::model::{ProjectNumber, ProjectState};
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

/// A remote side effect that actually happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CreateProject { id: String },
    UpdateProject { id: String },
    EnableBillingService,
    LinkBilling { account: String },
    EnableServices { services: Vec<String> },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::CreateProject { id } => write!(f, "created project {}", id),
            Action::UpdateProject { id } => write!(f, "updated project {}", id),
            Action::EnableBillingService => write!(f, "enabled the billing API"),
            Action::LinkBilling { account } => write!(f, "linked billing account {}", account),
            Action::EnableServices { services } => write!(f, "enabled {} APIs", services.len()),
        }
    }
}

/// Outcome of a successful reconciliation
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    /// Project state after all mutations
    pub project: ProjectState,
    /// Mutations in the order they were issued; empty when already converged
    pub actions: Vec<Action>,
}

impl ReconcileReport {
    pub fn has_changes(&self) -> bool {
        !self.actions.is_empty()
    }
}

/// Narration emitted while the engine and the catalog cache work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ProjectMissing { id: String },
    ProjectCreated { id: String, number: ProjectNumber },
    ProjectUpdated { id: String },
    BillingServiceEnabled,
    LookingUpBillingAccounts,
    BillingAccountSelected { name: String, display_name: String },
    UpdatingBilling { account: String },
    BillingUpdated,
    AssumedServiceName { requested: String, assumed: String },
    EnablingServices { services: Vec<String> },
    ServicesUpToDate,
    FetchingCatalog,
    CatalogStored { count: usize, path: PathBuf },
    CacheWarning { message: String },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ProjectMissing { id } => {
                write!(f, "project {} does not exist, attempting to create it...", id)
            }
            Event::ProjectCreated { id, number } => write!(f, "created {} ({})", id, number),
            Event::ProjectUpdated { id } => write!(f, "updated name and labels of {}", id),
            Event::BillingServiceEnabled => write!(f, "enabled the billing API"),
            Event::LookingUpBillingAccounts => write!(
                f,
                "no billing account in spec, looking up available billing accounts..."
            ),
            Event::BillingAccountSelected { name, display_name } => write!(
                f,
                "using the only open billing account {:?} ({})",
                name, display_name
            ),
            Event::UpdatingBilling { account } => {
                write!(f, "updating billing account to {}", account)
            }
            Event::BillingUpdated => write!(f, "updated billing info"),
            Event::AssumedServiceName { requested, assumed } => {
                write!(f, "assuming that {:?} means {:?}", requested, assumed)
            }
            Event::EnablingServices { services } => {
                write!(f, "enabling {} APIs:", services.len())?;
                for service in services {
                    write!(f, "\n  {}", service)?;
                }
                write!(f, "\nthis may take a minute or two...")
            }
            Event::ServicesUpToDate => write!(f, "all requested APIs are already enabled"),
            Event::FetchingCatalog => {
                write!(f, "fetching available APIs, this may take a minute or two...")
            }
            Event::CatalogStored { count, path } => {
                write!(f, "fetched {} APIs and stored at {}", count, path.display())
            }
            Event::CacheWarning { message } => write!(f, "warning: {}", message),
        }
    }
}

/// Receives progress events; the CLI prints them, tests record them
pub trait Progress: Send + Sync {
    fn event(&self, event: Event);
}

/// Drops every event
#[derive(Debug, Default)]
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn event(&self, _event: Event) {}
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<Event>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Progress for RecordingProgress {
    fn event(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
