use anyhow::Context;
use gproj_cloud::{
    CallingConvention, CancellationToken, CatalogCache, OperationPoller, ProjectSpec,
};
use gproj_cloud_gcp::{Credentials, GoogleCloud};
use gproj_config::Settings;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::progress::ConsolePrinter;

/// Everything a project command needs: the spec, settings and a client
pub struct Session {
    pub spec_path: PathBuf,
    pub spec: ProjectSpec,
    pub convention: CallingConvention,
    pub settings: Settings,
    pub cloud: Arc<GoogleCloud>,
    pub cancel: CancellationToken,
    pub printer: Arc<ConsolePrinter>,
}

impl Session {
    pub async fn open(
        spec_override: Option<&Path>,
        convention: CallingConvention,
        cancel: CancellationToken,
    ) -> anyhow::Result<Self> {
        let spec_path = gproj_config::resolve_spec_path(spec_override)
            .context("error finding project specification")?;
        let spec = gproj_config::load_spec(&spec_path)
            .with_context(|| format!("error reading project spec at {}", spec_path.display()))?
            .into_spec(convention);
        tracing::debug!(path = %spec_path.display(), project = %spec.id, "Loaded project spec");

        let settings = Settings::load().context("error loading settings")?;
        let credentials = Credentials::discover()
            .await
            .context("error obtaining Google Cloud credentials")?;

        Ok(Self {
            spec_path,
            spec,
            convention,
            settings,
            cloud: Arc::new(GoogleCloud::new(credentials)),
            cancel,
            printer: Arc::new(ConsolePrinter),
        })
    }

    pub fn catalog_cache(&self) -> anyhow::Result<CatalogCache> {
        let root = self.settings.cache_dir()?;
        Ok(CatalogCache::new(root).with_progress(self.printer.clone()))
    }

    pub fn poller(&self) -> OperationPoller {
        OperationPoller::new(self.settings.poll_interval(), self.cancel.clone())
    }
}
