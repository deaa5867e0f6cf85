use std::convert::Infallible;
use std::sync::Arc;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use futures_core::future::LocalBoxFuture;
use crate::proxy_service::proxy_config::ProxyConfig;
use crate::proxy_service::proxy_route_service::ProxyRouteService;
use crate::proxy_service::upstream::Upstream;

pub struct ProxyRouteServiceFactory {
  pub config: Arc<ProxyConfig>,
  pub upstream: Arc<dyn Upstream>,
  pub max_body_size: usize,
}

impl ServiceFactory<ServiceRequest> for ProxyRouteServiceFactory {
  type Response = ServiceResponse;
  type Error = Infallible;
  type Config = ();
  type Service = ProxyRouteService;
  type InitError = ();
  type Future = LocalBoxFuture<'static, Result<Self::Service, Self::InitError>>;

  fn new_service(&self, _: Self::Config) -> Self::Future {
    let service = ProxyRouteService {
      config: self.config.clone(),
      upstream: self.upstream.clone(),
      max_body_size: self.max_body_size,
    };

    Box::pin(async move { Ok(service) })
  }
}

impl ProxyRouteServiceFactory {
  pub fn create(upstream: Arc<dyn Upstream>, proxy_config: Arc<ProxyConfig>, max_body_size: usize) -> Self {
    Self {
      config: proxy_config,
      upstream,
      max_body_size,
    }
  }
}
