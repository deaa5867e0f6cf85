use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;

use crate::endpoint_map::EndpointKey;

pub const APP_NAME: &str = "RegolAI Gateway";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Proxied endpoints, listed by the index document.
pub struct EndpointIndex(pub Vec<EndpointKey>);

#[derive(Serialize)]
struct HealthStatus {
  status: &'static str,
  version: &'static str,
  name: &'static str,
  timestamp: String,
}

pub async fn health_check() -> impl Responder {
  web::Json(HealthStatus {
    status: "healthy",
    version: APP_VERSION,
    name: APP_NAME,
    timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
  })
}

pub async fn index(endpoints: web::Data<EndpointIndex>) -> impl Responder {
  let listed: Vec<_> = endpoints
    .0
    .iter()
    .map(|key| json!({ "method": key.method.to_string(), "path": &*key.path }))
    .collect();

  web::Json(json!({
    "name": APP_NAME,
    "version": APP_VERSION,
    "description": "Gateway to the EU AI Act, GDPR and DORA compliance API",
    "endpoints": {
      "health": "/health",
      "proxied": listed,
    },
    "note": "AI-powered endpoints use the caller's own LLM credentials (X-LLM-Provider, X-LLM-API-Key, X-LLM-Model).",
  }))
}

pub async fn not_found(req: HttpRequest) -> HttpResponse {
  HttpResponse::NotFound().json(json!({
    "error": "Not Found",
    "message": format!("The requested endpoint '{}' does not exist.", req.path()),
  }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/health", web::get().to(health_check))
    .route("/", web::get().to(index));
}
