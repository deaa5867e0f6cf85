use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use actix_web::web;
use log::info;

use crate::error::ConfigError;
use crate::proxy_service::proxy_config::ProxyConfig;
use crate::proxy_service::proxy_factory::ProxyRouteServiceFactory;
use crate::proxy_service::upstream::Upstream;
use crate::route_config::{EndpointConfigFile, HttpMethod};

pub trait EndpointMap: Sized {
  fn from_config(config: EndpointConfigFile, backend_url: &str) -> Result<Self, ConfigError>;
}

#[derive(PartialEq, Hash, Eq, Clone, Debug, PartialOrd, Ord)]
pub struct EndpointKey {
  pub path: Arc<str>,
  pub method: HttpMethod,
}

impl EndpointKey {
  pub fn new(path: &str, method: HttpMethod) -> EndpointKey {
    EndpointKey {
      method,
      path: Arc::from(path),
    }
  }
}

pub type EndpointTable = HashMap<EndpointKey, Arc<ProxyConfig>>;

impl EndpointMap for EndpointTable {
  fn from_config(config: EndpointConfigFile, backend_url: &str) -> Result<Self, ConfigError> {
    let mut endpoint_store: EndpointTable = HashMap::new();

    for route in config.routes.iter() {
      let proxy_config = ProxyConfig::from_route(route, backend_url)?;
      let key = EndpointKey::new(route.path.as_str(), proxy_config.method);

      if endpoint_store.contains_key(&key) {
        return Err(ConfigError::DuplicateEndpoint {
          method: key.method.to_string(),
          path: route.path.clone(),
        });
      }

      info!(
        "New endpoint created at '{}:{}' -> '{}' forwarding {} header(s).",
        &key.method,
        &route.path,
        &proxy_config.url,
        proxy_config.allow_list.names().len()
      );
      endpoint_store.insert(key, Arc::new(proxy_config));
    }

    Ok(endpoint_store)
  }
}

/// Registers one actix resource per path, with a route for each configured
/// method. Unknown methods on a known path get actix's 405.
pub fn configure_endpoints(
  cfg: &mut web::ServiceConfig,
  endpoints: &EndpointTable,
  upstream: &Arc<dyn Upstream>,
  max_body_size: usize,
) {
  let mut by_path: BTreeMap<&str, Vec<(HttpMethod, &Arc<ProxyConfig>)>> = BTreeMap::new();

  for (key, config) in endpoints.iter() {
    by_path.entry(key.path.as_ref()).or_default().push((key.method, config));
  }

  for (path, mut routes) in by_path.into_iter() {
    routes.sort_by_key(|(method, _)| *method);
    let mut resource = web::resource(path);

    for (method, config) in routes {
      let factory = ProxyRouteServiceFactory::create(upstream.clone(), config.clone(), max_body_size);
      resource = resource.route(web::method(method.into()).service(factory));
    }

    cfg.service(resource);
  }
}

/// Method/path pairs in a stable order, for listings.
pub fn sorted_keys(endpoints: &EndpointTable) -> Vec<EndpointKey> {
  let mut keys: Vec<EndpointKey> = endpoints.keys().cloned().collect();
  keys.sort_by(|a, b| a.path.cmp(&b.path).then(a.method.cmp(&b.method)));
  keys
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::proxy_service::forward::tests::RecordingUpstream;
  use actix_web::http::StatusCode;
  use actix_web::test::{self, TestRequest};
  use actix_web::App;

  const ROUTES: &str = r#"
routes:
  - path: /api/expert/generate-report
    target: /api/expert/generate-report
    method: post
    forward_headers: [X-LLM-Provider, X-LLM-API-Key, X-LLM-Model]
  - path: /api/obligations/find
    target: /api/obligations/find
    method: post
  - path: /api/search
    target: /api/search
"#;

  fn table() -> EndpointTable {
    let config = EndpointConfigFile::load_from_str(ROUTES).unwrap();
    EndpointTable::from_config(config, "http://backend:8000").unwrap()
  }

  #[test]
  fn builds_table_from_config() {
    let endpoints = table();

    assert_eq!(endpoints.len(), 3);
    let report = &endpoints[&EndpointKey::new("/api/expert/generate-report", HttpMethod::Post)];
    assert_eq!(&*report.url, "http://backend:8000/api/expert/generate-report");
    assert_eq!(report.allow_list.names().len(), 3);

    let find = &endpoints[&EndpointKey::new("/api/obligations/find", HttpMethod::Post)];
    assert!(find.allow_list.names().is_empty());

    assert!(endpoints.contains_key(&EndpointKey::new("/api/search", HttpMethod::Get)));
  }

  #[test]
  fn builtin_table_builds() {
    let endpoints = EndpointTable::from_config(EndpointConfigFile::builtin().unwrap(), "http://localhost:8000").unwrap();
    assert_eq!(endpoints.len(), 7);
  }

  #[test]
  fn rejects_duplicate_endpoints() {
    let yaml = "routes:\n  - {path: /a, target: /a, method: post}\n  - {path: /a, target: /b, method: post}\n";
    let config = EndpointConfigFile::load_from_str(yaml).unwrap();

    let result = EndpointTable::from_config(config, "http://backend");

    assert!(matches!(result, Err(ConfigError::DuplicateEndpoint { .. })));
  }

  #[test]
  fn same_path_different_methods_are_distinct() {
    let yaml = "routes:\n  - {path: /a, target: /a, method: post}\n  - {path: /a, target: /a, method: get}\n";
    let config = EndpointConfigFile::load_from_str(yaml).unwrap();

    let endpoints = EndpointTable::from_config(config, "http://backend").unwrap();

    let keys = sorted_keys(&endpoints);
    assert_eq!(keys, [EndpointKey::new("/a", HttpMethod::Get), EndpointKey::new("/a", HttpMethod::Post)]);
  }

  #[test]
  fn rejects_invalid_allow_list() {
    let yaml = "routes:\n  - {path: /a, target: /a, method: post, forward_headers: [\"bad header\"]}\n";
    let config = EndpointConfigFile::load_from_str(yaml).unwrap();

    assert!(matches!(
      EndpointTable::from_config(config, "http://backend"),
      Err(ConfigError::InvalidHeaderName { .. })
    ));
  }

  #[actix_web::test]
  async fn routes_requests_by_path_and_method() {
    let recording = Arc::new(RecordingUpstream::answering(StatusCode::OK, "{}"));
    let upstream: Arc<dyn Upstream> = recording.clone();
    let endpoints = table();
    let app = test::init_service(App::new().configure(|cfg| configure_endpoints(cfg, &endpoints, &upstream, 1024))).await;

    let req = TestRequest::post()
      .uri("/api/obligations/find")
      .insert_header(("X-LLM-API-Key", "sk-abc"))
      .set_payload(r#"{"use_case":"credit_scoring","institution_type":"bank"}"#)
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::get().uri("/api/obligations/find").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

    let recorded = recording.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(&*recorded[0].url, "http://backend:8000/api/obligations/find");
    assert!(recorded[0].headers.is_empty());
  }
}
