//! Transport-agnostic endpoint handler.
//!
//! [`Handler::handle`] takes a method and a raw body and returns a status,
//! headers, and an optional JSON body. Any HTTP front end (a serverless
//! adapter, a local server, the `invoke` CLI command) only has to copy those
//! across.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::generator::{GenerateError, MatchRequest, TagGenerator};
use crate::llm::LlmError;

/// Request methods the handler distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Post,
    Options,
    Other(String),
}

impl Method {
    pub fn parse(method: &str) -> Self {
        match method.trim().to_ascii_uppercase().as_str() {
            "POST" => Self::Post,
            "OPTIONS" => Self::Options,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub body: String,
}

impl ApiRequest {
    pub fn new(method: &str, body: impl Into<String>) -> Self {
        Self {
            method: Method::parse(method),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// `None` for 204 responses.
    pub body: Option<String>,
}

impl ApiResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// CORS settings applied to every response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cors {
    pub allow_origin: String,
}

impl Default for Cors {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
        }
    }
}

impl Cors {
    fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("Access-Control-Allow-Origin".to_string(), self.allow_origin.clone()),
            ("Access-Control-Allow-Methods".to_string(), "POST, OPTIONS".to_string()),
            ("Access-Control-Allow-Headers".to_string(), "Content-Type".to_string()),
        ]
    }
}

/// Failures as the caller sees them: a status plus a stable category.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("Malformed JSON body: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    /// Upstream answered with a non-success status; it is passed through.
    #[error("{detail}")]
    Upstream { status: u16, detail: String },

    /// Upstream could not be reached or answered with garbage.
    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            Self::MethodNotAllowed(_) => 405,
            Self::InvalidJson(_) | Self::Validation(_) => 400,
            Self::Upstream { status, .. } => *status,
            Self::BadGateway(_) => 502,
            Self::Internal(_) => 500,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed(_) => "method_not_allowed",
            Self::InvalidJson(_) => "invalid_json",
            Self::Validation(_) => "validation_error",
            Self::Upstream { .. } | Self::BadGateway(_) => "upstream_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Body parse failures: type mismatches are validation errors, anything
    /// that is not JSON at all is `invalid_json`.
    fn from_body_error(err: serde_json::Error) -> Self {
        match err.classify() {
            serde_json::error::Category::Data => Self::Validation(err.to_string()),
            _ => Self::InvalidJson(err),
        }
    }
}

impl From<GenerateError> for ApiError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::Validation(msg) => Self::Validation(msg),
            GenerateError::Upstream(inner) => match &inner {
                LlmError::Http { status, detail } if *status >= 400 => Self::Upstream {
                    status: *status,
                    detail: detail.clone(),
                },
                LlmError::InvalidUrl(_) | LlmError::MissingApiKey => Self::Internal(inner.to_string()),
                _ => Self::BadGateway(inner.to_string()),
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    detail: String,
}

/// The endpoint: CORS, method dispatch, body parsing, error mapping.
pub struct Handler {
    generator: TagGenerator,
    cors: Cors,
}

impl Handler {
    pub fn new(generator: TagGenerator, cors: Cors) -> Self {
        Self { generator, cors }
    }

    /// Handles one request. Never fails: every error becomes a response.
    pub fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let response = match &request.method {
            Method::Options => ApiResponse {
                status: 204,
                headers: self.cors.headers(),
                body: None,
            },
            Method::Post => match self.generate(&request.body) {
                Ok(body) => self.json(200, body),
                Err(err) => self.error(&err),
            },
            Method::Other(method) => self.error(&ApiError::MethodNotAllowed(method.clone())),
        };

        info!(method = ?request.method, status = response.status, "Request handled");
        response
    }

    fn generate(&self, body: &str) -> Result<String, ApiError> {
        let request: MatchRequest = serde_json::from_str(body).map_err(ApiError::from_body_error)?;
        let result = self.generator.generate(&request)?;
        serde_json::to_string(&result).map_err(|e| ApiError::Internal(e.to_string()))
    }

    fn error(&self, err: &ApiError) -> ApiResponse {
        if err.status() >= 500 {
            warn!(category = err.category(), error = %err, "Request failed");
        }
        let body = ErrorBody {
            error: err.category(),
            detail: err.to_string(),
        };
        let body = serde_json::to_string(&body)
            .unwrap_or_else(|_| format!(r#"{{"error":"{}","detail":""}}"#, err.category()));
        self.json(err.status(), body)
    }

    fn json(&self, status: u16, body: String) -> ApiResponse {
        let mut headers = self.cors.headers();
        headers.push(("Content-Type".to_string(), "application/json".to_string()));
        ApiResponse {
            status,
            headers,
            body: Some(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::directory::{DirectoryCache, NicknameDirectory};
    use crate::tags::TagPolicy;

    fn handler() -> Handler {
        let cache = Arc::new(DirectoryCache::preloaded(NicknameDirectory::empty()));
        Handler::new(TagGenerator::new(cache, TagPolicy::default()), Cors::default())
    }

    fn body_json(response: &ApiResponse) -> serde_json::Value {
        serde_json::from_str(response.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!(Method::parse("post"), Method::Post);
        assert_eq!(Method::parse("Options"), Method::Options);
        assert_eq!(Method::parse("get"), Method::Other("GET".to_string()));
    }

    #[test]
    fn options_is_204_with_cors_and_no_body() {
        let response = handler().handle(&ApiRequest::new("OPTIONS", ""));

        assert_eq!(response.status, 204);
        assert!(response.body.is_none());
        assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    }

    #[test]
    fn other_methods_are_405() {
        let response = handler().handle(&ApiRequest::new("GET", ""));

        assert_eq!(response.status, 405);
        assert_eq!(body_json(&response)["error"], "method_not_allowed");
        assert!(response.header("Access-Control-Allow-Origin").is_some());
    }

    #[test]
    fn malformed_json_is_invalid_json() {
        let response = handler().handle(&ApiRequest::new("POST", "{not json"));

        assert_eq!(response.status, 400);
        assert_eq!(body_json(&response)["error"], "invalid_json");
    }

    #[test]
    fn wrong_field_type_is_validation_error() {
        let response = handler().handle(&ApiRequest::new("POST", r#"{"homeTeam":"a","awayTeam":"b","maxLen":"long"}"#));

        assert_eq!(response.status, 400);
        assert_eq!(body_json(&response)["error"], "validation_error");
    }

    #[test]
    fn missing_team_is_validation_error() {
        let response = handler().handle(&ApiRequest::new("POST", r#"{"homeTeam":"a"}"#));
        let json = body_json(&response);

        assert_eq!(response.status, 400);
        assert_eq!(json["error"], "validation_error");
        assert!(json["detail"].as_str().unwrap().contains("awayTeam"));
    }

    #[test]
    fn success_body_shape() {
        let response = handler().handle(&ApiRequest::new("POST", r#"{"homeTeam":"alpha","awayTeam":"beta"}"#));
        let json = body_json(&response);

        assert_eq!(response.status, 200);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(json["mandatoryCount"], 5);
        assert_eq!(json["teams"]["home"]["canonical"], "Alpha");
        assert_eq!(json["tagList"][0], "Alpha vs Beta highlights");
    }

    #[test]
    fn upstream_status_passes_through() {
        let err: ApiError = GenerateError::Upstream(LlmError::Http {
            status: 429,
            detail: "slow down".to_string(),
        })
        .into();

        assert_eq!(err.status(), 429);
        assert_eq!(err.category(), "upstream_error");
        assert_eq!(err.to_string(), "slow down");
    }

    #[test]
    fn unusable_upstream_reply_is_bad_gateway() {
        let err: ApiError = GenerateError::Upstream(LlmError::Api {
            message: "empty".to_string(),
        })
        .into();
        assert_eq!(err.status(), 502);

        let err: ApiError = GenerateError::Upstream(LlmError::Http {
            status: 302,
            detail: String::new(),
        })
        .into();
        assert_eq!(err.status(), 502);
    }

    #[test]
    fn misconfiguration_is_internal() {
        let err: ApiError = GenerateError::Upstream(LlmError::MissingApiKey).into();
        assert_eq!(err.status(), 500);
        assert_eq!(err.category(), "internal_error");
    }
}
