//! Access token and quota project discovery
//!
//! The token comes from `GOOGLE_OAUTH_ACCESS_TOKEN` when set, otherwise from
//! `gcloud auth application-default print-access-token`. The quota project is
//! read from `GOOGLE_CLOUD_QUOTA_PROJECT` or the `quota_project_id` field of
//! the application default credentials file.

use crate::error::{GcpError, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
pub const QUOTA_PROJECT_ENV: &str = "GOOGLE_CLOUD_QUOTA_PROJECT";
const ADC_PATH_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

#[derive(Clone)]
pub struct Credentials {
    access_token: String,
    quota_project: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("quota_project", &self.quota_project)
            .finish()
    }
}

#[derive(Deserialize)]
struct AdcFile {
    quota_project_id: Option<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, quota_project: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            quota_project,
        }
    }

    /// Resolve credentials from the environment and local gcloud state
    pub async fn discover() -> Result<Self> {
        let access_token = match non_empty_env(ACCESS_TOKEN_ENV) {
            Some(token) => {
                tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                token
            }
            None => gcloud_access_token().await?,
        };

        let quota_project = match non_empty_env(QUOTA_PROJECT_ENV) {
            Some(project) => Some(project),
            None => adc_quota_project().await,
        };
        if let Some(project) = &quota_project {
            tracing::debug!("Billing API quota to project {}", project);
        }

        Ok(Self {
            access_token,
            quota_project,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn quota_project(&self) -> Option<&str> {
        self.quota_project.as_deref()
    }

    /// Credentials without a quota project.
    ///
    /// Project creation rejects requests that bill quota to another project,
    /// so the resource manager client always uses this form.
    pub fn for_resource_creation(&self) -> Self {
        Self {
            access_token: self.access_token.clone(),
            quota_project: None,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn gcloud_access_token() -> Result<String> {
    tracing::debug!("Running: gcloud auth application-default print-access-token");
    let output = Command::new("gcloud")
        .args(["auth", "application-default", "print-access-token"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            GcpError::Credentials(format!(
                "could not run gcloud ({}); set {} or install the Google Cloud SDK",
                e, ACCESS_TOKEN_ENV
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GcpError::Credentials(stderr.trim().to_string()));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(GcpError::Credentials(
            "gcloud printed an empty access token".into(),
        ));
    }
    Ok(token)
}

/// Location of the application default credentials file
pub fn adc_path() -> Option<PathBuf> {
    if let Some(path) = non_empty_env(ADC_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| {
        home.join(".config")
            .join("gcloud")
            .join("application_default_credentials.json")
    })
}

async fn adc_quota_project() -> Option<String> {
    let path = adc_path()?;
    let contents = match tokio::fs::read(&path).await {
        Ok(contents) => contents,
        Err(e) => {
            tracing::debug!("No application default credentials at {}: {}", path.display(), e);
            return None;
        }
    };
    quota_project_from_adc(&contents)
}

/// Extract `quota_project_id` from an application default credentials document
pub fn quota_project_from_adc(contents: &[u8]) -> Option<String> {
    match serde_json::from_slice::<AdcFile>(contents) {
        Ok(adc) => adc.quota_project_id.filter(|p| !p.is_empty()),
        Err(e) => {
            tracing::warn!("Ignoring unreadable application default credentials: {}", e);
            None
        }
    }
}
