// HTTP implementation of the workflow service API

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

use super::{ApiError, WorkflowApi};
use crate::config::ApiConfig;
use crate::models::{DocumentSubmission, ErrorBody, SampleDocument, StatusResponse, SubmitResponse};
use crate::types::{AppError, AppResult};

const SUBMIT_PATH: [&str; 2] = ["api", "process-document"];
const STATUS_PATH: [&str; 2] = ["api", "workflow-status"];
const SAMPLES_PATH: [&str; 2] = ["api", "sample-documents"];

pub struct HttpWorkflowApi {
    client: Client,
    base_url: Url,
}

impl HttpWorkflowApi {
    pub fn new(base_url: &str, request_timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Self::with_client(client, base_url)
    }

    pub fn from_config(config: &ApiConfig) -> AppResult<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.request_timeout_secs))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: Client, base_url: &str) -> AppResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("invalid API URL {:?}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!("API URL {} cannot be a base URL", base_url)));
        }
        Ok(Self { client, base_url })
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn error_message(response: reqwest::Response) -> Option<String> {
        let body = response.text().await.ok()?;
        serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
    }
}

#[async_trait]
impl WorkflowApi for HttpWorkflowApi {
    async fn submit(&self, document: &DocumentSubmission) -> Result<SubmitResponse, ApiError> {
        let url = self.endpoint(&SUBMIT_PATH);
        debug!("POST {}", url);

        let response = self.client.post(url).json(document).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response).await;
            return Err(ApiError::Rejected { status: status.as_u16(), message });
        }

        Self::read_json(response).await
    }

    async fn status(&self, workflow_id: &str) -> Result<StatusResponse, ApiError> {
        let url = self.endpoint(&[STATUS_PATH[0], STATUS_PATH[1], workflow_id]);
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(workflow_id.to_string()));
        }
        if !status.is_success() {
            let message = Self::error_message(response)
                .await
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
            return Err(ApiError::Status { status: status.as_u16(), message });
        }

        Self::read_json(response).await
    }

    async fn sample_documents(&self) -> Result<Vec<SampleDocument>, ApiError> {
        let url = self.endpoint(&SAMPLES_PATH);
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response)
                .await
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
            return Err(ApiError::Status { status: status.as_u16(), message });
        }

        Self::read_json(response).await
    }
}
