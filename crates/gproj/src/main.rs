mod commands;
mod progress;
mod session;

use clap::{Parser, Subcommand};
use colored::Colorize;
use gproj_cloud::{CallingConvention, CancellationToken, CloudError};
use gproj_cloud_gcp::GcpError;
use gproj_config::ConfigError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gproj")]
#[command(about = "Declarative Google Cloud project setup from googlecloudproject.yaml", long_about = None)]
struct Cli {
    /// Path to the project spec (defaults to googlecloudproject.yaml in this or a parent directory)
    #[arg(long, global = true)]
    spec: Option<PathBuf>,
    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the project, link billing and enable APIs
    Apply,
    /// Like apply, but billing defaults to auto-selection and every API must exist
    Sync,
    /// List APIs that can be enabled on the project
    #[command(alias = "list-available")]
    Available {
        /// Include third-party services
        #[arg(long)]
        all: bool,
        /// Print a one-line description of each API
        #[arg(long)]
        description: bool,
    },
    /// Delete the project (can be undone for 30 days)
    Delete,
    /// Restore a project that is pending deletion
    Undelete,
    /// Run gcloud with --project set to the project in the spec
    Gcloud {
        /// Arguments passed to gcloud unchanged
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if matches!(cli.command, Commands::Version) {
        println!("gproj {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // gcloud keeps its own exit code
    if let Commands::Gcloud { args } = &cli.command {
        match commands::gcloud::handle(cli.spec.as_deref(), args.clone(), cli.verbose).await {
            Ok(code) => std::process::exit(code),
            Err(e) => exit_with_error(&e),
        }
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "interrupted, cancelling...".yellow());
            on_interrupt.cancel();
        }
    });

    if let Err(e) = run(cli, cancel).await {
        exit_with_error(&e);
    }
    Ok(())
}

async fn run(cli: Cli, cancel: CancellationToken) -> anyhow::Result<()> {
    let convention = match cli.command {
        Commands::Sync => CallingConvention::Sync,
        _ => CallingConvention::Apply,
    };
    let session = session::Session::open(cli.spec.as_deref(), convention, cancel).await?;

    match cli.command {
        Commands::Apply | Commands::Sync => commands::apply::handle(&session).await?,
        Commands::Available { all, description } => {
            commands::available::handle(&session, all, description).await?
        }
        Commands::Delete => commands::delete::handle_delete(&session).await?,
        Commands::Undelete => commands::delete::handle_undelete(&session).await?,
        Commands::Gcloud { .. } | Commands::Version => {}
    }
    Ok(())
}

/// Class label of the first typed error in the chain
fn error_class(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<CloudError>() {
            return e.class();
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return "config";
        }
        if cause.downcast_ref::<GcpError>().is_some() {
            return "credentials";
        }
    }
    "error"
}

fn exit_with_error(err: &anyhow::Error) -> ! {
    eprintln!(
        "{} {:#}",
        format!("error[{}]:", error_class(err)).red().bold(),
        err
    );
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_error_class_finds_cloud_error_under_context() {
        let err = anyhow::Error::new(CloudError::UnknownService("x.googleapis.com".into()))
            .context("reconciling project");
        assert_eq!(error_class(&err), "unknown-service");
    }

    #[test]
    fn test_error_class_for_config_error() {
        let err = anyhow::Error::new(ConfigError::ConfigDirNotFound);
        assert_eq!(error_class(&err), "config");
        assert_eq!(error_class(&anyhow::anyhow!("plain")), "error");
    }

    #[test]
    fn test_gcloud_args_keep_hyphens() {
        let cli = Cli::try_parse_from(["gproj", "gcloud", "compute", "instances", "list", "--format=json"])
            .unwrap();
        match cli.command {
            Commands::Gcloud { args } => {
                assert_eq!(args, vec!["compute", "instances", "list", "--format=json"])
            }
            _ => panic!("expected gcloud command"),
        }
    }

    #[test]
    fn test_list_available_alias() {
        let cli = Cli::try_parse_from(["gproj", "list-available", "--all"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Available {
                all: true,
                description: false
            }
        ));
    }
}
