use std::sync::Arc;

use reqwest::Url;

use crate::allow_list::HeaderAllowList;
use crate::error::ConfigError;
use crate::proxy_service::proxy_config::ProxyConfig;
use crate::route_config::RouteConfig;

pub mod forward;
pub mod proxy_config;
pub mod proxy_factory;
pub mod proxy_route_service;
pub mod upstream;

/// Checks the backend base URL once, before any route is joined onto it.
pub fn parse_backend_url(backend_url: &str) -> Result<Box<str>, ConfigError> {
  let invalid = |reason: String| ConfigError::InvalidBackendUrl {
    url: backend_url.to_string(),
    reason,
  };

  let url = Url::parse(backend_url).map_err(|e| invalid(e.to_string()))?;

  if !matches!(url.scheme(), "http" | "https") {
    return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
  }

  if url.query().is_some() || url.fragment().is_some() {
    return Err(invalid("must not carry a query or fragment".into()));
  }

  Ok(Box::from(backend_url.trim_end_matches('/')))
}

impl ProxyConfig {
  pub fn from_route(route: &RouteConfig, backend_url: &str) -> Result<ProxyConfig, ConfigError> {
    route.validate()?;

    let allow_list = match &route.forward_headers {
      Some(names) => HeaderAllowList::new(names.iter().map(String::as_str))?,
      None => HeaderAllowList::default(),
    };

    Ok(ProxyConfig {
      url: Arc::from(format!("{}{}", backend_url, route.target)),
      method: route.method(),
      allow_list,
    })
  }
}
