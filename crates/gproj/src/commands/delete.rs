use crate::session::Session;
use colored::Colorize;
use gproj_cloud::ResourceService;

pub async fn handle_delete(session: &Session) -> anyhow::Result<()> {
    let id = &session.spec.id;
    session.cloud.delete_project(id).await?;
    println!(
        "{}",
        format!(
            "Project {} has been deleted. To undelete in the next 30 days, run gproj undelete",
            id
        )
        .yellow()
    );
    Ok(())
}

pub async fn handle_undelete(session: &Session) -> anyhow::Result<()> {
    let id = &session.spec.id;
    session.cloud.undelete_project(id).await?;
    println!("{}", format!("✓ Project {} has been restored", id).green());
    Ok(())
}
