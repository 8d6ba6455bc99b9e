use anyhow::Context;
use colored::Colorize;
use gproj_config::ConfigError;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Run gcloud against the spec's project and return its exit code
pub async fn handle(spec_override: Option<&Path>, args: Vec<String>, verbose: bool) -> anyhow::Result<i32> {
    // a missing spec must not make gcloud unusable
    let project_id = match gproj_config::resolve_spec_path(spec_override) {
        Ok(path) => Some(
            gproj_config::load_spec(&path)
                .with_context(|| format!("error reading project spec at {}", path.display()))?
                .id,
        ),
        Err(ConfigError::SpecNotFound { .. }) => {
            if verbose {
                println!("{}", "no googlecloudproject.yaml found, not setting --project".dimmed());
            }
            None
        }
        Err(e) => return Err(e.into()),
    };

    let args = inject_project_arg(project_id.as_deref(), args);
    tracing::debug!("Running: gcloud {}", args.join(" "));

    let status = Command::new("gcloud")
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .with_context(|| format!("error executing 'gcloud {}'", args.join(" ")))?;

    Ok(status.code().unwrap_or(1))
}

/// Prepend `--project=<id>` unless the caller already passed a project flag
pub fn inject_project_arg(project_id: Option<&str>, args: Vec<String>) -> Vec<String> {
    let has_project = args.iter().any(|a| a.starts_with("--project"));
    match project_id {
        Some(id) if !has_project => std::iter::once(format!("--project={}", id))
            .chain(args)
            .collect(),
        _ => args,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_project_prepended() {
        assert_eq!(
            inject_project_arg(Some("demo-1"), args(&["compute", "instances", "list"])),
            args(&["--project=demo-1", "compute", "instances", "list"])
        );
    }

    #[test]
    fn test_explicit_project_flag_wins() {
        let given = args(&["--project", "other", "services", "list"]);
        assert_eq!(inject_project_arg(Some("demo-1"), given.clone()), given);

        let given = args(&["services", "list", "--project=other"]);
        assert_eq!(inject_project_arg(Some("demo-1"), given.clone()), given);
    }

    #[test]
    fn test_no_spec_means_no_injection() {
        let given = args(&["config", "list"]);
        assert_eq!(inject_project_arg(None, given.clone()), given);
    }
}
