use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::http::header::HeaderName;
use actix_web::middleware::DefaultHeaders;
use clap::Parser;
use log::LevelFilter;

use crate::http_client::HttpClientConfig;

const DEFAULT_ORIGINS: [&str; 4] = [
  "http://localhost:3000",
  "http://localhost:3001",
  "http://127.0.0.1:3000",
  "http://127.0.0.1:3001",
];

#[derive(Parser, Debug, Clone)]
#[command(name = "regolai_gateway", version, about = "Credential-filtering JSON gateway for the RegolAI compliance API")]
pub struct AppConfig {
  /// Address to listen on
  #[arg(long, env = "HTTP_BIND", default_value = "0.0.0.0")]
  pub bind: String,

  #[arg(long, env = "HTTP_PORT", default_value_t = 8080)]
  pub port: u16,

  #[arg(long, env = "HTTP_WORKER_COUNT", default_value_t = 4)]
  pub worker_count: usize,

  /// Base URL every route target is joined onto
  #[arg(long, env = "BACKEND_URL", default_value = "http://localhost:8000")]
  pub backend_url: String,

  /// YAML route table; the built-in RegolAI routes are used when absent
  #[arg(long, env = "ROUTE_CONF_LOCATION")]
  pub route_config: Option<PathBuf>,

  /// Egress proxy for backend calls
  #[arg(long, env = "HTTP_PROXY_URL")]
  pub proxy_url: Option<String>,

  #[arg(long, env = "HTTP_PROXY_USER")]
  pub proxy_user: Option<String>,

  #[arg(long, env = "HTTP_PROXY_PASS", hide_env_values = true)]
  pub proxy_pass: Option<String>,

  /// Largest accepted request body, in bytes
  #[arg(long, env = "MAX_BODY_SIZE", default_value_t = 1024 * 1024)]
  pub max_body_size: usize,

  /// Comma separated CORS origins; `*` allows any origin
  #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
  pub allowed_origins: Vec<String>,

  #[arg(long, env = "LOG_LEVEL", default_value = "info")]
  pub log_level: LevelFilter,
}

impl AppConfig {
  pub fn http_client_config(&self) -> HttpClientConfig {
    HttpClientConfig {
      http_proxy: self.proxy_url.clone(),
      user: self.proxy_user.clone(),
      pass: self.proxy_pass.clone(),
    }
  }

  fn origins(&self) -> Vec<&str> {
    let configured: Vec<&str> = self
      .allowed_origins
      .iter()
      .map(|origin| origin.trim())
      .filter(|origin| !origin.is_empty())
      .collect();

    if configured.is_empty() {
      DEFAULT_ORIGINS.to_vec()
    } else {
      configured
    }
  }

  /// CORS for the browser front-end. `forwarded` are the allow-listed header
  /// names of every route, which the browser must be permitted to send.
  pub fn cors(&self, forwarded: &[HeaderName]) -> Cors {
    let mut allowed_headers = vec!["content-type", "authorization"];
    for name in forwarded {
      if !allowed_headers.contains(&name.as_str()) {
        allowed_headers.push(name.as_str());
      }
    }

    let mut cors = Cors::default()
      .allowed_methods(vec!["GET", "POST", "OPTIONS"])
      .allowed_headers(allowed_headers)
      .supports_credentials()
      .max_age(3600);

    let origins = self.origins();
    if origins.contains(&"*") {
      cors = cors.allow_any_origin();
    } else {
      for origin in origins {
        cors = cors.allowed_origin(origin);
      }
    }

    cors
  }
}

pub fn security_headers() -> DefaultHeaders {
  DefaultHeaders::new()
    .add(("X-Content-Type-Options", "nosniff"))
    .add(("X-Frame-Options", "DENY"))
    .add(("X-XSS-Protection", "1; mode=block"))
    .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
}
