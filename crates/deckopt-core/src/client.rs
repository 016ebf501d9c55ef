// HTTP client for the deck generation and analysis service.
//
// `DeckApi` is the network boundary the orchestrator and app loop depend on;
// `HttpDeckClient` implements it over reqwest. Tests substitute fakes.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::ServerConfig;
use crate::protocol::{
    AnalysisRequest, AnalysisResponse, CustomDeckRequest, CustomDeckResponse, RandomDeckResponse,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Connection refused, reset, DNS failure, body read failure.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server answered HTTP {status}")]
    Status { status: u16 },

    /// The body was not valid JSON.
    #[error("invalid JSON body: {0}")]
    Decode(String),

    /// Valid JSON whose fields have the wrong types.
    #[error("unexpected response shape: {0}")]
    Shape(String),
}

impl ApiError {
    /// True when the response arrived but did not have the expected shape.
    pub fn is_malformed(&self) -> bool {
        matches!(self, ApiError::Shape(_))
    }
}

// ---------------------------------------------------------------------------
// DeckApi trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait DeckApi: Send + Sync {
    async fn generate_random(&self) -> Result<RandomDeckResponse, ApiError>;

    async fn complete_custom(
        &self,
        request: &CustomDeckRequest,
    ) -> Result<CustomDeckResponse, ApiError>;

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, ApiError>;
}

// ---------------------------------------------------------------------------
// HttpDeckClient
// ---------------------------------------------------------------------------

pub struct HttpDeckClient {
    http: reqwest::Client,
    random_url: String,
    custom_url: String,
    analyze_url: String,
}

impl HttpDeckClient {
    pub fn new(server: &ServerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            random_url: server.endpoint(&server.random_path),
            custom_url: server.endpoint(&server.custom_path),
            analyze_url: server.endpoint(&server.analyze_path),
        }
    }

    async fn read_json(
        response: reqwest::Response,
        honor_error_body: bool,
    ) -> Result<Value, ApiError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = body.len(), "deck service response");
        interpret_body(status, &body, honor_error_body)
    }
}

#[async_trait]
impl DeckApi for HttpDeckClient {
    async fn generate_random(&self) -> Result<RandomDeckResponse, ApiError> {
        let response = self
            .http
            .get(&self.random_url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        into_shape(Self::read_json(response, false).await?)
    }

    async fn complete_custom(
        &self,
        request: &CustomDeckRequest,
    ) -> Result<CustomDeckResponse, ApiError> {
        let response = self
            .http
            .post(&self.custom_url)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        into_shape(Self::read_json(response, false).await?)
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, ApiError> {
        let response = self
            .http
            .post(&self.analyze_url)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        into_shape(Self::read_json(response, true).await?)
    }
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

/// Classify a response body.
///
/// Non-2xx is a `Status` error unless `honor_error_body` is set and the body
/// is a JSON object carrying a `status` field, in which case that body is
/// returned for the caller to report.
pub fn interpret_body(
    status: StatusCode,
    body: &str,
    honor_error_body: bool,
) -> Result<Value, ApiError> {
    if !status.is_success() {
        if honor_error_body {
            if let Ok(value) = serde_json::from_str::<Value>(body) {
                if value.get("status").is_some() {
                    return Ok(value);
                }
            }
        }
        return Err(ApiError::Status {
            status: status.as_u16(),
        });
    }
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn into_shape<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Shape(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
