//! Error types for the gateway.

use actix_web::error::PayloadError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Failures on the request path. Each one is answered locally; upstream
/// error statuses are not errors here, they are relayed as responses.
#[derive(Error, Debug)]
pub enum GatewayError {
  /// Inbound body is not valid JSON
  #[error("request body is not valid JSON: {0}")]
  MalformedBody(#[source] serde_json::Error),

  /// Inbound body exceeds the configured limit
  #[error("request body exceeds {limit} bytes")]
  PayloadTooLarge { limit: usize },

  /// Inbound body stream failed
  #[error("unable to read request body: {0}")]
  Payload(#[from] PayloadError),

  /// Backend could not be reached or its response could not be read
  #[error("backend unreachable: {0}")]
  UpstreamUnreachable(String),
}

impl GatewayError {
  pub fn kind(&self) -> &'static str {
    match self {
      GatewayError::MalformedBody(_) => "malformed_body",
      GatewayError::PayloadTooLarge { .. } => "payload_too_large",
      GatewayError::Payload(_) => "payload_error",
      GatewayError::UpstreamUnreachable(_) => "upstream_unreachable",
    }
  }
}

impl ResponseError for GatewayError {
  fn status_code(&self) -> StatusCode {
    match self {
      GatewayError::MalformedBody(_) | GatewayError::Payload(_) => StatusCode::BAD_REQUEST,
      GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
      GatewayError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
    }
  }

  fn error_response(&self) -> HttpResponse {
    HttpResponse::build(self.status_code()).json(json!({
      "error": self.kind(),
      "message": self.to_string(),
    }))
  }
}

/// Startup failures while loading the route table.
#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid route file: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("invalid header name '{name}' in allow-list")]
  InvalidHeaderName { name: String },

  #[error("route path '{path}' must start with a single '/'")]
  InvalidPath { path: String },

  #[error("route target '{target}' {reason}")]
  InvalidTarget { target: String, reason: &'static str },

  #[error("endpoint {method} {path} is defined more than once")]
  DuplicateEndpoint { method: String, path: String },

  #[error("backend url '{url}' is invalid: {reason}")]
  InvalidBackendUrl { url: String, reason: String },
}
