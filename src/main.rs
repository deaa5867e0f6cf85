mod allow_list;
mod app_config;
mod endpoint_map;
mod error;
mod health;
mod http_client;
mod proxy_service;
mod route_config;
mod std_logger;

use std::io::{Error, ErrorKind, Result};
use std::sync::Arc;

use actix_web::http::header::HeaderName;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::info;

use app_config::{security_headers, AppConfig};
use endpoint_map::{configure_endpoints, sorted_keys, EndpointMap, EndpointTable};
use health::EndpointIndex;
use proxy_service::upstream::{ReqwestUpstream, Upstream};
use route_config::EndpointConfigFile;

fn to_io<E>(err: E) -> Error
where
  E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
  Error::new(ErrorKind::Other, err)
}

#[actix_web::main]
async fn main() -> Result<()> {
  let config = AppConfig::parse();
  std_logger::init(config.log_level).map_err(|err| to_io(err.to_string()))?;

  let backend_url = proxy_service::parse_backend_url(&config.backend_url).map_err(to_io)?;

  let route_file = match &config.route_config {
    Some(path) => {
      info!("Loading routes from '{}'.", path.display());
      EndpointConfigFile::load_from_path(path)
    }
    None => {
      info!("No route file configured, using built-in routes.");
      EndpointConfigFile::builtin()
    }
  }
  .map_err(to_io)?;

  let endpoints = EndpointTable::from_config(route_file, &backend_url).map_err(to_io)?;

  let http_client = config.http_client_config().to_client().map_err(to_io)?;
  let upstream: Arc<dyn Upstream> = Arc::new(ReqwestUpstream::new(http_client));

  let mut forwarded_headers: Vec<HeaderName> = Vec::new();
  for proxy_config in endpoints.values() {
    for name in proxy_config.allow_list.names() {
      if !forwarded_headers.contains(name) {
        forwarded_headers.push(name.clone());
      }
    }
  }

  let index = web::Data::new(EndpointIndex(sorted_keys(&endpoints)));
  let max_body_size = config.max_body_size;
  let app_config = config.clone();

  info!(
    "Proxying {} endpoint(s) to '{}', listening on {}:{}.",
    endpoints.len(),
    backend_url,
    config.bind,
    config.port
  );

  HttpServer::new(move || {
    App::new()
      .wrap(app_config.cors(&forwarded_headers))
      .wrap(security_headers())
      .app_data(index.clone())
      .configure(health::configure)
      .configure(|cfg| configure_endpoints(cfg, &endpoints, &upstream, max_body_size))
      .default_service(web::to(health::not_found))
  })
  .workers(config.worker_count)
  .bind((config.bind.as_str(), config.port))?
  .run()
  .await
}
