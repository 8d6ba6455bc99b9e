use crate::session::Session;
use colored::Colorize;
use gproj_cloud::{ReconcileOptions, Reconciler};

pub async fn handle(session: &Session) -> anyhow::Result<()> {
    println!(
        "{} {} ({}, from {})",
        "Reconciling".cyan().bold(),
        session.spec.id.bold(),
        session.convention,
        session.spec_path.display()
    );

    let cloud = session.cloud.clone();
    let reconciler = Reconciler::new(
        cloud.clone(),
        cloud.clone(),
        cloud,
        session.catalog_cache()?,
        session.poller(),
    )
    .with_options(ReconcileOptions {
        convention: session.convention,
        create_deadline: session.settings.create_timeout(),
    })
    .with_progress(session.printer.clone());

    let report = reconciler.reconcile(&session.spec).await?;

    println!();
    if report.has_changes() {
        for action in &report.actions {
            println!("  {} {}", "•".cyan(), action);
        }
        println!(
            "{}",
            format!(
                "✓ {} ({}) reconciled with {} change(s)",
                report.project.id,
                report.project.number,
                report.actions.len()
            )
            .green()
            .bold()
        );
    } else {
        println!(
            "{}",
            format!("✓ {} is up to date", report.project.id).green().bold()
        );
    }
    Ok(())
}
