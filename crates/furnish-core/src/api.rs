use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::analytics::AnalyticsSnapshot;
use crate::recommendation::Recommendation;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("could not decode backend response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request was interrupted: {0}")]
    Interrupted(String),
}

/// The recommendation backend as seen by the client
#[async_trait]
pub trait Backend: Send + Sync {
    async fn recommend(&self, prompt: &str) -> Result<Vec<Recommendation>, ApiError>;

    async fn analytics(&self) -> Result<AnalyticsSnapshot, ApiError>;
}

#[derive(Serialize)]
struct RecommendRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = format!("{}/", self.base_url);
        debug!(%url, "checking backend health");

        let response = self.client.get(&url).send().await?;
        decode(response).await
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn recommend(&self, prompt: &str) -> Result<Vec<Recommendation>, ApiError> {
        let url = format!("{}/api/recommend", self.base_url);
        debug!(%url, prompt, "requesting recommendations");

        let response = self
            .client
            .post(&url)
            .json(&RecommendRequest { prompt })
            .send()
            .await?;

        let recommendations: Vec<Recommendation> = decode(response).await?;
        debug!(count = recommendations.len(), "received recommendations");
        Ok(recommendations)
    }

    async fn analytics(&self) -> Result<AnalyticsSnapshot, ApiError> {
        let url = format!("{}/api/analytics", self.base_url);
        debug!(%url, "fetching analytics snapshot");

        let response = self.client.get(&url).send().await?;
        decode(response).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ApiError::Status { status, body });
    }

    Ok(serde_json::from_str(&body)?)
}
