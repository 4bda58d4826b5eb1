//! CrowdStrike Falcon API client
//!
//! Just enough of the API to pull the Falcon Container image: OAuth2 token,
//! customer ID lookup and the registry pull token.

use super::PublishError;
use crds::{CloudRegion, FalconApi};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// API host for a cloud region
pub fn api_base_url(region: CloudRegion) -> &'static str {
    match region {
        CloudRegion::Us1 => "https://api.crowdstrike.com",
        CloudRegion::Us2 => "https://api.us-2.crowdstrike.com",
        CloudRegion::Eu1 => "https://api.eu-1.crowdstrike.com",
        CloudRegion::UsGov1 => "https://api.laggar.gcw.crowdstrike.com",
    }
}

/// Fully qualified Falcon Container sensor image (without tag) for a region
pub fn sensor_image(region: CloudRegion) -> String {
    let (registry, path) = match region {
        CloudRegion::Us1 => ("registry.crowdstrike.com", "us-1"),
        CloudRegion::Us2 => ("registry.crowdstrike.com", "us-2"),
        CloudRegion::Eu1 => ("registry.crowdstrike.com", "eu-1"),
        CloudRegion::UsGov1 => ("registry.laggar.gcw.crowdstrike.com", "gov1"),
    };
    format!("{registry}/falcon-container/{path}/release/falcon-sensor")
}

/// Registry host part of [`sensor_image`]
pub fn registry_host(region: CloudRegion) -> &'static str {
    match region {
        CloudRegion::UsGov1 => "registry.laggar.gcw.crowdstrike.com",
        _ => "registry.crowdstrike.com",
    }
}

/// Registry login name for a customer ID
///
/// `ABCDEF0123-45` logs in as `fc-abcdef0123`.
pub fn registry_login(cid: &str) -> String {
    let base = cid.split('-').next().unwrap_or(cid);
    format!("fc-{}", base.to_lowercase())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ResourceList<T> {
    #[serde(default = "Vec::new")]
    resources: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct RegistryToken {
    token: String,
}

/// Authenticated session against the Falcon API
pub struct FalconApiClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl std::fmt::Debug for FalconApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FalconApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl FalconApiClient {
    /// Log in with the OAuth2 client credentials from `api`
    pub async fn login(api: &FalconApi) -> Result<Self, PublishError> {
        Self::login_at(api, api_base_url(api.cloud_region)).await
    }

    /// Log in against an explicit API base URL
    pub async fn login_at(api: &FalconApi, base_url: &str) -> Result<Self, PublishError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        debug!("Requesting Falcon API token from {}", base_url);
        let response = client
            .post(format!("{base_url}/oauth2/token"))
            .header("Accept", "application/json")
            .form(&[
                ("client_id", api.client_id.as_str()),
                ("client_secret", api.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == 401 || status == 403 {
            return Err(PublishError::Authentication(format!(
                "token request rejected with {status}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Failed(format!(
                "token request failed: {status} - {body}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        if token.access_token.is_empty() {
            return Err(PublishError::Authentication(
                "empty access token".to_string(),
            ));
        }

        Ok(Self {
            client,
            base_url,
            access_token: token.access_token,
        })
    }

    async fn get_resources<T>(&self, path: &str) -> Result<Vec<T>, PublishError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Failed(format!(
                "GET {path} failed: {status} - {body}"
            )));
        }

        let list: ResourceList<T> = response.json().await?;
        Ok(list.resources)
    }

    /// Customer ID (CCID) the client credentials belong to
    pub async fn customer_id(&self) -> Result<String, PublishError> {
        self.get_resources::<String>("/sensors/queries/installers/ccid/v1")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PublishError::Failed("no customer ID returned".to_string()))
    }

    /// Pull token for the Falcon Container registry
    pub async fn registry_token(&self) -> Result<String, PublishError> {
        self.get_resources::<RegistryToken>(
            "/container-security/entities/image-registry-credentials/v1",
        )
        .await?
        .into_iter()
        .next()
        .map(|t| t.token)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| PublishError::Credential("no registry token returned".to_string()))
    }
}
