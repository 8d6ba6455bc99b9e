//! `googlecloudproject.yaml` discovery and parsing

use crate::error::{ConfigError, Result};
use gproj_cloud::{BillingRef, CallingConvention, ProjectSpec};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const SPEC_FILE_NAME: &str = "googlecloudproject.yaml";

/// Environment variable pointing directly at a spec file
pub const SPEC_PATH_ENV: &str = "GPROJ_SPEC";

const MAX_SEARCH_DEPTH: usize = 100;

/// The spec file as written by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SpecDocument {
    /// Human readable project name
    #[serde(default)]
    pub name: String,
    /// Globally unique project id
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub apis: Vec<String>,
    /// Billing account id, `enable`, or empty
    #[serde(default)]
    pub billing: Option<String>,
}

impl SpecDocument {
    pub fn into_spec(self, convention: CallingConvention) -> ProjectSpec {
        ProjectSpec {
            billing: BillingRef::parse(self.billing.as_deref(), convention),
            name: self.name,
            id: self.id,
            labels: self.labels,
            apis: self.apis,
        }
    }
}

/// Locate the spec file.
///
/// Search order:
/// 1. `explicit` (the `--spec` flag)
/// 2. `GPROJ_SPEC`, when it names an existing file
/// 3. `googlecloudproject.yaml` in the current directory or one of its parents
pub fn resolve_spec_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(env_path) = std::env::var(SPEC_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.is_file() {
            return Ok(path);
        }
        tracing::warn!("{} points at {}, which is not a file", SPEC_PATH_ENV, path.display());
    }

    find_spec_file(&std::env::current_dir()?)
}

/// Walk up from `start` looking for the spec file
pub fn find_spec_file(start: &Path) -> Result<PathBuf> {
    let mut dir = start;
    for _ in 0..MAX_SEARCH_DEPTH {
        let candidate = dir.join(SPEC_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!("Found spec file at {}", candidate.display());
            return Ok(candidate);
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => {
                return Err(ConfigError::SpecNotFound {
                    start: start.to_path_buf(),
                });
            }
        }
    }
    Err(ConfigError::SearchTooDeep(MAX_SEARCH_DEPTH))
}

/// Read and parse a spec file
pub fn load_spec(path: &Path) -> Result<SpecDocument> {
    let contents = std::fs::read_to_string(path)?;
    parse_spec(&contents, path)
}

fn parse_spec(contents: &str, path: &Path) -> Result<SpecDocument> {
    serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
