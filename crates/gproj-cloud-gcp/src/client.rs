//! Shared HTTP plumbing for the Google REST APIs

use crate::credentials::Credentials;
use crate::error::{GcpError, Result};
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

const QUOTA_PROJECT_HEADER: &str = "x-goog-user-project";

/// Base URLs of the three APIs, without version suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcpEndpoints {
    pub resource_manager: String,
    pub billing: String,
    pub service_usage: String,
}

impl Default for GcpEndpoints {
    fn default() -> Self {
        Self {
            resource_manager: "https://cloudresourcemanager.googleapis.com".into(),
            billing: "https://cloudbilling.googleapis.com".into(),
            service_usage: "https://serviceusage.googleapis.com".into(),
        }
    }
}

impl GcpEndpoints {
    /// Route every API to one base URL
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            resource_manager: base.clone(),
            billing: base.clone(),
            service_usage: base,
        }
    }
}

/// Which credential form a request is sent with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Api {
    ResourceManager,
    Billing,
    ServiceUsage,
}

/// REST client implementing all three provider traits
pub struct GoogleCloud {
    pub(crate) http: reqwest::Client,
    pub(crate) endpoints: GcpEndpoints,
    credentials: Credentials,
    creation_credentials: Credentials,
}

impl GoogleCloud {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_endpoints(credentials, GcpEndpoints::default())
    }

    pub fn with_endpoints(credentials: Credentials, endpoints: GcpEndpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
            creation_credentials: credentials.for_resource_creation(),
            credentials,
        }
    }

    pub fn endpoints(&self) -> &GcpEndpoints {
        &self.endpoints
    }

    pub(crate) fn url(&self, api: Api, path: &str) -> String {
        let base = match api {
            Api::ResourceManager => &self.endpoints.resource_manager,
            Api::Billing => &self.endpoints.billing,
            Api::ServiceUsage => &self.endpoints.service_usage,
        };
        format!("{}/v1/{}", base.trim_end_matches('/'), path)
    }

    pub(crate) fn request(&self, api: Api, method: Method, path: &str) -> RequestBuilder {
        let credentials = match api {
            Api::ResourceManager => &self.creation_credentials,
            Api::Billing | Api::ServiceUsage => &self.credentials,
        };
        let url = self.url(api, path);
        tracing::debug!("{} {}", method, url);

        let mut builder = self
            .http
            .request(method, url)
            .bearer_auth(credentials.access_token());
        if let Some(project) = credentials.quota_project() {
            builder = builder.header(QUOTA_PROJECT_HEADER, project);
        }
        builder
    }

    /// Send a request and decode a JSON body, mapping Google error bodies
    pub(crate) async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let response = check_status(response).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_slice(b"{}")?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&text) {
        Ok(envelope) => Err(GcpError::Api {
            code: if envelope.error.code == 0 {
                status.as_u16()
            } else {
                envelope.error.code
            },
            status: envelope.error.status,
            message: envelope.error.message,
        }),
        Err(_) => Err(GcpError::Api {
            code: status.as_u16(),
            status: status.canonical_reason().unwrap_or_default().to_string(),
            message: text,
        }),
    }
}

/// Long-running operation as returned by both resource manager and service usage
#[derive(Debug, Deserialize)]
pub(crate) struct ApiOperation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl From<ApiOperation> for gproj_cloud::Operation {
    fn from(op: ApiOperation) -> Self {
        gproj_cloud::Operation {
            name: op.name,
            done: op.done,
            error: op.error.map(|e| gproj_cloud::OperationError {
                code: e.code,
                message: e.message,
            }),
        }
    }
}
