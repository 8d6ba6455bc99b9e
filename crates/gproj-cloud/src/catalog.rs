//! API catalog cache
//!
//! Listing every activatable service for a project walks dozens of pages, so
//! the result is stored as `<root>/<project number>/available-apis.json` and
//! reused on every later run. Entries are keyed by the numeric project handle,
//! not the project id.
//!
//! There is no expiry: a cached listing is returned as-is until the file is
//! deleted by hand. The only rewrite is [`CatalogCache::mark_enabled`], which
//! records services gproj itself just enabled.

use crate::action::{Event, Progress, SilentProgress};
use crate::error::{CloudError, Result};
use crate::model::{ProjectNumber, ServiceCatalogEntry, first_line};
use crate::provider::ActivationService;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

const CACHE_FILE: &str = "available-apis.json";

/// Read-through cache of project service catalogs
#[derive(Clone)]
pub struct CatalogCache {
    root: PathBuf,
    progress: Arc<dyn Progress>,
}

impl CatalogCache {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            progress: Arc::new(SilentProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the cache for one project
    fn project_dir(&self, project: ProjectNumber) -> PathBuf {
        self.root.join(project.to_string())
    }

    /// Cache file path for one project
    pub fn cache_path(&self, project: ProjectNumber) -> PathBuf {
        self.project_dir(project).join(CACHE_FILE)
    }

    /// Return the catalog for `project`, fetching and storing it on a miss
    pub async fn list_services(
        &self,
        activation: &dyn ActivationService,
        project: ProjectNumber,
    ) -> Result<Vec<ServiceCatalogEntry>> {
        let dir = self.project_dir(project);
        if let Err(e) = fs::create_dir_all(&dir).await {
            let warning = CloudError::CacheWrite(format!("{}: {}", dir.display(), e));
            tracing::warn!("{}", warning);
            self.progress.event(Event::CacheWarning {
                message: warning.to_string(),
            });
            return fetch_catalog(activation, project).await;
        }

        let path = self.cache_path(project);
        match fs::read(&path).await {
            Ok(cached) => {
                let entries: Vec<ServiceCatalogEntry> =
                    serde_json::from_slice(&cached).map_err(|source| {
                        CloudError::CacheCorruption {
                            path: path.clone(),
                            source,
                        }
                    })?;
                tracing::debug!(
                    "Loaded {} cached services from {}",
                    entries.len(),
                    path.display()
                );
                Ok(entries)
            }
            Err(e) => {
                tracing::debug!("Catalog cache miss at {}: {}", path.display(), e);
                self.progress.event(Event::FetchingCatalog);
                let entries = fetch_catalog(activation, project).await?;
                match self.store(&path, &entries).await {
                    Ok(()) => self.progress.event(Event::CatalogStored {
                        count: entries.len(),
                        path,
                    }),
                    Err(e) => {
                        tracing::warn!("{}", e);
                        self.progress.event(Event::CacheWarning {
                            message: e.to_string(),
                        });
                    }
                }
                Ok(entries)
            }
        }
    }

    /// Flag `names` as enabled in the cached snapshot, if one exists, adding
    /// entries for names the snapshot does not list
    pub async fn mark_enabled(&self, project: ProjectNumber, names: &[String]) -> Result<()> {
        let path = self.cache_path(project);
        let cached = match fs::read(&path).await {
            Ok(cached) => cached,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut entries: Vec<ServiceCatalogEntry> = serde_json::from_slice(&cached)
            .map_err(|source| CloudError::CacheCorruption {
                path: path.clone(),
                source,
            })?;

        let names: BTreeSet<&str> = names.iter().map(String::as_str).collect();
        let mut changed = false;
        for entry in entries.iter_mut().filter(|e| names.contains(e.name.as_str())) {
            if !entry.enabled {
                entry.enabled = true;
                changed = true;
            }
        }

        // services the listing never showed still get an entry
        let known: BTreeSet<String> = entries.iter().map(|e| e.name.clone()).collect();
        for name in names.iter().filter(|n| !known.contains(**n)) {
            entries.push(ServiceCatalogEntry {
                name: name.to_string(),
                title: String::new(),
                summary: String::new(),
                enabled: true,
            });
            changed = true;
        }

        if changed {
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            self.store(&path, &entries).await?;
            tracing::debug!("Marked {} services enabled in {}", names.len(), path.display());
        }
        Ok(())
    }

    async fn store(&self, path: &Path, entries: &[ServiceCatalogEntry]) -> Result<()> {
        let buf = serde_json::to_vec(entries)?;
        fs::write(path, buf)
            .await
            .map_err(|e| CloudError::CacheWrite(format!("{}: {}", path.display(), e)))
    }
}

/// Fetch every page of the live catalog, sorted by canonical name
pub async fn fetch_catalog(
    activation: &dyn ActivationService,
    project: ProjectNumber,
) -> Result<Vec<ServiceCatalogEntry>> {
    let mut entries = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0u32;

    loop {
        let page = activation
            .list_services(project, page_token.as_deref())
            .await?;
        pages += 1;

        entries.extend(page.services.into_iter().map(|mut entry| {
            entry.summary = first_line(&entry.summary).to_string();
            entry
        }));

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::info!(
        "Fetched {} services for project {} in {} pages",
        entries.len(),
        project,
        pages
    );
    Ok(entries)
}
