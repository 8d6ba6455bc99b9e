use crate::session::Session;
use anyhow::bail;
use gproj_cloud::{CloudError, ResourceService, ServiceCatalogEntry};

pub async fn handle(session: &Session, all: bool, description: bool) -> anyhow::Result<()> {
    let project = match session.cloud.get_project(&session.spec.id).await {
        Ok(project) => project,
        Err(CloudError::NotFoundOrForbidden(id)) => bail!(
            "cannot list the available APIs before project {} has been created; run gproj apply first",
            id
        ),
        Err(e) => return Err(e.into()),
    };

    let cache = session.catalog_cache()?;
    let entries = cache
        .list_services(session.cloud.as_ref(), project.number)
        .await?;

    for line in format_listing(&entries, all, description) {
        println!("{}", line);
    }
    Ok(())
}

/// One line per service; third-party services only with `all`
fn format_listing(entries: &[ServiceCatalogEntry], all: bool, description: bool) -> Vec<String> {
    entries
        .iter()
        .filter(|e| all || e.is_first_party())
        .map(|e| {
            if description {
                format!("{:<50} {}", e.name, e.summary)
            } else {
                e.name.clone()
            }
        })
        .collect()
}
