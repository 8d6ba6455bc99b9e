//! Service Usage v1

use crate::client::{Api, ApiOperation, GoogleCloud};
use async_trait::async_trait;
use gproj_cloud::{
    ActivationService, Operation, ProjectNumber, Result, ServiceCatalogEntry, ServicePage,
};
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Largest page the listing endpoint accepts
const PAGE_SIZE: &str = "200";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListServicesResponse {
    #[serde(default)]
    services: Vec<ApiService>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiService {
    #[serde(default)]
    config: ServiceConfig,
    #[serde(default)]
    state: String,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceConfig {
    #[serde(default)]
    name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    documentation: Documentation,
}

#[derive(Debug, Default, Deserialize)]
struct Documentation {
    #[serde(default)]
    summary: String,
}

impl From<ApiService> for ServiceCatalogEntry {
    fn from(s: ApiService) -> Self {
        ServiceCatalogEntry {
            name: s.config.name,
            title: s.config.title,
            summary: s.config.documentation.summary,
            enabled: s.state == "ENABLED",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchEnableRequest<'a> {
    service_ids: &'a [String],
}

#[async_trait]
impl ActivationService for GoogleCloud {
    async fn list_services(
        &self,
        project: ProjectNumber,
        page_token: Option<&str>,
    ) -> Result<ServicePage> {
        let mut request = self
            .request(
                Api::ServiceUsage,
                Method::GET,
                &format!("{}/services", project.resource_name()),
            )
            .query(&[("pageSize", PAGE_SIZE)]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let page: ListServicesResponse = self.send(request).await?;
        Ok(ServicePage {
            services: page.services.into_iter().map(Into::into).collect(),
            next_page_token: page.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn batch_enable(&self, project: ProjectNumber, service_ids: &[String]) -> Result<Operation> {
        let request = self
            .request(
                Api::ServiceUsage,
                Method::POST,
                &format!("{}/services:batchEnable", project.resource_name()),
            )
            .json(&BatchEnableRequest { service_ids });
        let op: ApiOperation = self.send(request).await?;
        tracing::info!("Enabling {} services: {}", service_ids.len(), op.name);
        Ok(op.into())
    }

    async fn get_operation(&self, name: &str) -> Result<Operation> {
        let request = self.request(Api::ServiceUsage, Method::GET, name);
        let op: ApiOperation = self.send(request).await?;
        Ok(op.into())
    }
}
