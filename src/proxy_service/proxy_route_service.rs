use std::convert::Infallible;
use std::sync::Arc;
use actix_web::{dev, HttpRequest, HttpResponse, ResponseError};
use actix_web::body::BoxBody;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse};
use bytes::{Bytes, BytesMut};
use futures_core::future::LocalBoxFuture;
use futures_util::StreamExt;
use log::error;
use crate::error::GatewayError;
use crate::proxy_service::forward::{build_forwarded_request, forward};
use crate::proxy_service::proxy_config::ProxyConfig;
use crate::proxy_service::upstream::{Upstream, UpstreamResponse};

/// Connection-scoped headers that describe the backend hop, not the payload.
const HOP_BY_HOP: [&str; 9] = [
  "connection",
  "content-length",
  "keep-alive",
  "proxy-authenticate",
  "proxy-authorization",
  "te",
  "trailer",
  "transfer-encoding",
  "upgrade",
];

pub struct ProxyRouteService {
  pub(super) config: Arc<ProxyConfig>,
  pub(super) upstream: Arc<dyn Upstream>,
  pub(super) max_body_size: usize,
}

impl Service<ServiceRequest> for ProxyRouteService {
  type Response = ServiceResponse;
  type Error = Infallible;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  dev::always_ready!();

  fn call(&self, req: ServiceRequest) -> Self::Future {
    let (http_request, payload) = req.into_parts();
    let config = self.config.clone();
    let upstream = self.upstream.clone();
    let max_body_size = self.max_body_size;

    Box::pin(async move {
      let response = match ProxyRouteService::exec(&config, &*upstream, &http_request, payload, max_body_size).await {
        Ok(upstream_response) => ProxyRouteService::map_response(upstream_response),
        Err(err) => {
          error!("{} {} failed: {}", http_request.method(), http_request.path(), err);
          err.error_response()
        }
      };

      Ok(ServiceResponse::new(http_request, response))
    })
  }
}

impl ProxyRouteService {
  async fn exec(
    config: &ProxyConfig,
    upstream: &dyn Upstream,
    http: &HttpRequest,
    payload: Payload,
    max_body_size: usize,
  ) -> Result<UpstreamResponse, GatewayError> {
    let body = if config.method.carries_body() {
      ProxyRouteService::read_body(payload, max_body_size).await?
    } else {
      Bytes::new()
    };

    let request = build_forwarded_request(config, http.headers(), http.query_string(), &body)?;
    forward(upstream, request).await
  }

  async fn read_body(mut payload: Payload, limit: usize) -> Result<Bytes, GatewayError> {
    let mut body_buffer = BytesMut::new();

    while let Some(chunk) = payload.next().await {
      let bytes = chunk?;

      if body_buffer.len() + bytes.len() > limit {
        return Err(GatewayError::PayloadTooLarge { limit });
      }

      body_buffer.extend_from_slice(&bytes);
    }

    Ok(body_buffer.freeze())
  }

  fn map_response(upstream: UpstreamResponse) -> HttpResponse {
    let UpstreamResponse { status, headers, body } = upstream;
    let mut http_response = HttpResponse::new(status);
    let response_headers = http_response.headers_mut();

    for (name, value) in headers.iter() {
      if !HOP_BY_HOP.contains(&name.as_str()) {
        response_headers.append(name.clone(), value.clone());
      }
    }

    http_response.set_body(BoxBody::new(body))
  }
}
