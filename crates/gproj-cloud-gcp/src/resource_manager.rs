//! Cloud Resource Manager v1

use crate::client::{Api, ApiOperation, GoogleCloud};
use crate::error::GcpError;
use async_trait::async_trait;
use gproj_cloud::{
    CloudError, LifecycleState, Operation, ProjectNumber, ProjectRecord, ProjectState,
    ResourceService, Result,
};
use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiProject {
    project_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    project_number: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    lifecycle_state: LifecycleState,
}

impl TryFrom<ApiProject> for ProjectState {
    type Error = GcpError;

    /// A project without its numeric handle cannot be addressed by the other APIs
    fn try_from(p: ApiProject) -> std::result::Result<Self, GcpError> {
        if p.project_number <= 0 {
            return Err(GcpError::UnexpectedResponse(format!(
                "project {} has no projectNumber",
                p.project_id
            )));
        }
        Ok(ProjectState {
            id: p.project_id,
            number: ProjectNumber(p.project_number),
            name: p.name,
            labels: p.labels,
            lifecycle: p.lifecycle_state,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateProjectRequest<'a> {
    project_id: &'a str,
    name: &'a str,
    labels: &'a BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct UpdateProjectRequest<'a> {
    name: &'a str,
    labels: &'a BTreeMap<String, String>,
}

/// The v1 API encodes int64 fields as JSON strings
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[async_trait]
impl ResourceService for GoogleCloud {
    async fn get_project(&self, project_id: &str) -> Result<ProjectState> {
        let request = self.request(
            Api::ResourceManager,
            Method::GET,
            &format!("projects/{}", project_id),
        );
        match self.send::<ApiProject>(request).await {
            Ok(project) => Ok(ProjectState::try_from(project)?),
            Err(GcpError::Api { code: 403 | 404, .. }) => {
                Err(CloudError::NotFoundOrForbidden(project_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_project(&self, project: &ProjectRecord) -> Result<Operation> {
        let body = CreateProjectRequest {
            project_id: &project.id,
            name: &project.name,
            labels: &project.labels,
        };
        let request = self
            .request(Api::ResourceManager, Method::POST, "projects")
            .json(&body);
        let op: ApiOperation = self.send(request).await?;
        tracing::info!("Project creation started: {}", op.name);
        Ok(op.into())
    }

    async fn update_project(&self, project: &ProjectRecord) -> Result<ProjectState> {
        let body = UpdateProjectRequest {
            name: &project.name,
            labels: &project.labels,
        };
        let request = self
            .request(
                Api::ResourceManager,
                Method::PUT,
                &format!("projects/{}", project.id),
            )
            .json(&body);
        let updated: ApiProject = self.send(request).await?;
        Ok(ProjectState::try_from(updated)?)
    }

    async fn delete_project(&self, project_id: &str) -> Result<()> {
        let request = self.request(
            Api::ResourceManager,
            Method::DELETE,
            &format!("projects/{}", project_id),
        );
        self.send::<serde_json::Value>(request).await?;
        Ok(())
    }

    async fn undelete_project(&self, project_id: &str) -> Result<()> {
        let request = self
            .request(
                Api::ResourceManager,
                Method::POST,
                &format!("projects/{}:undelete", project_id),
            )
            .json(&serde_json::json!({}));
        self.send::<serde_json::Value>(request).await?;
        Ok(())
    }

    async fn get_operation(&self, name: &str) -> Result<Operation> {
        let request = self.request(Api::ResourceManager, Method::GET, name);
        let op: ApiOperation = self.send(request).await?;
        Ok(op.into())
    }
}
