//! Cloud Billing v1

use crate::client::{Api, GoogleCloud};
use async_trait::async_trait;
use gproj_cloud::{BillingAccount, BillingLink, BillingService, ProjectNumber, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiBillingInfo {
    #[serde(default)]
    billing_account_name: String,
    #[serde(default)]
    billing_enabled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBillingInfoRequest<'a> {
    billing_account_name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiBillingAccount {
    name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    open: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListBillingAccountsResponse {
    #[serde(default)]
    billing_accounts: Vec<ApiBillingAccount>,
    next_page_token: Option<String>,
}

impl GoogleCloud {
    fn billing_link(project: ProjectNumber, info: ApiBillingInfo) -> BillingLink {
        BillingLink {
            project,
            account: info.billing_account_name,
            billing_enabled: info.billing_enabled,
        }
    }
}

#[async_trait]
impl BillingService for GoogleCloud {
    async fn get_billing_info(&self, project: ProjectNumber) -> Result<BillingLink> {
        let request = self.request(
            Api::Billing,
            Method::GET,
            &format!("{}/billingInfo", project.resource_name()),
        );
        let info: ApiBillingInfo = self.send(request).await?;
        Ok(Self::billing_link(project, info))
    }

    async fn update_billing_info(&self, project: ProjectNumber, account: &str) -> Result<BillingLink> {
        let request = self
            .request(
                Api::Billing,
                Method::PUT,
                &format!("{}/billingInfo", project.resource_name()),
            )
            .json(&UpdateBillingInfoRequest {
                billing_account_name: account,
            });
        let info: ApiBillingInfo = self.send(request).await?;
        tracing::info!(
            "Billing account of {} set to {:?} (enabled: {})",
            project,
            info.billing_account_name,
            info.billing_enabled
        );
        Ok(Self::billing_link(project, info))
    }

    async fn list_billing_accounts(&self) -> Result<Vec<BillingAccount>> {
        let mut accounts = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.request(Api::Billing, Method::GET, "billingAccounts");
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page: ListBillingAccountsResponse = self.send(request).await?;
            accounts.extend(page.billing_accounts.into_iter().map(|a| BillingAccount {
                name: a.name,
                display_name: a.display_name,
                open: a.open,
            }));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!("Found {} billing accounts", accounts.len());
        Ok(accounts)
    }
}
