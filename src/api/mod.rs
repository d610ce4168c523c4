use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::record::RawSchool;

pub const DEFAULT_API_BASE_URL: &str = "https://schooldb.skillline.ru/api";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    #[error("{message}")]
    Api { message: String },

    #[error("response envelope carried no data")]
    MissingData,
}

// Response envelope shared by every endpoint: a false `status` is an
// application-level failure even when the HTTP layer reports 200.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    status: bool,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SchoolsPage {
    #[serde(default)]
    pub list: Vec<RawSchool>,
    #[serde(default)]
    pub pages_count: u32,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Region {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct FederalDistrict {
    pub id: u64,
    pub name: String,
}

/// Seam between the session engine and the remote registry; the
/// production implementation is [`SchoolsApi`].
pub trait RecordSource {
    fn fetch_page(
        &self,
        page: u32,
        count: u32,
        region_id: Option<&str>,
        status: Option<&str>,
    ) -> impl std::future::Future<Output = Result<SchoolsPage, ApiError>> + Send;

    fn fetch_regions(&self)
        -> impl std::future::Future<Output = Result<Vec<Region>, ApiError>> + Send;

    fn fetch_federal_districts(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<FederalDistrict>, ApiError>> + Send;
}

pub struct SchoolsApi {
    client: reqwest::Client,
    base_url: String,
}

impl SchoolsApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.client.get(&url).query(params).send().await?;

        if !response.status().is_success() {
            return Err(ApiError::Http {
                status: response.status().as_u16(),
            });
        }

        let envelope: ApiEnvelope<T> = response.json().await?;
        if !envelope.status {
            return Err(ApiError::Api {
                message: envelope
                    .message
                    .unwrap_or_else(|| "API returned false status".to_string()),
            });
        }
        envelope.data.ok_or(ApiError::MissingData)
    }
}

impl RecordSource for SchoolsApi {
    async fn fetch_page(
        &self,
        page: u32,
        count: u32,
        region_id: Option<&str>,
        status: Option<&str>,
    ) -> Result<SchoolsPage, ApiError> {
        let mut params = vec![("page", page.to_string()), ("count", count.to_string())];
        if let Some(region_id) = region_id {
            params.push(("region_id", region_id.to_string()));
        }
        // Accepted for completeness; the session never sets it and keeps
        // status filtering client-side.
        if let Some(status) = status {
            if status != "all" {
                params.push(("status", status.to_string()));
            }
        }
        self.request("/schools", &params).await
    }

    async fn fetch_regions(&self) -> Result<Vec<Region>, ApiError> {
        self.request("/regions", &[]).await
    }

    async fn fetch_federal_districts(&self) -> Result<Vec<FederalDistrict>, ApiError> {
        self.request("/federalDistricts", &[]).await
    }
}
