use std::sync::Arc;

use actix_web::http::header::HeaderMap as InboundHeaders;
use bytes::Bytes;
use log::{debug, info, warn};
use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::error::GatewayError;
use crate::proxy_service::proxy_config::ProxyConfig;
use crate::proxy_service::upstream::{Upstream, UpstreamResponse};
use crate::route_config::HttpMethod;

/// Request handed to the backend. Only the allow-list contributes headers.
#[derive(Debug, Clone)]
pub struct ForwardedRequest {
  pub method: HttpMethod,
  pub url: Arc<str>,
  pub headers: HeaderMap,
  pub query: Option<String>,
  pub body: Option<Bytes>,
}

/// Builds the outbound request for `config`.
///
/// Body routes parse and re-serialize the JSON body, so malformed input is
/// rejected here, before any network call. Body-less routes carry the query
/// string instead.
pub fn build_forwarded_request(
  config: &ProxyConfig,
  inbound_headers: &InboundHeaders,
  query_string: &str,
  body: &[u8],
) -> Result<ForwardedRequest, GatewayError> {
  let (query, body) = if config.method.carries_body() {
    (None, Some(reserialize_json(body)?))
  } else if query_string.is_empty() {
    (None, None)
  } else {
    (Some(query_string.to_string()), None)
  };

  Ok(ForwardedRequest {
    method: config.method,
    url: config.url.clone(),
    headers: config.allow_list.filter(inbound_headers),
    query,
    body,
  })
}

fn reserialize_json(raw: &[u8]) -> Result<Bytes, GatewayError> {
  let value: Value = serde_json::from_slice(raw).map_err(GatewayError::MalformedBody)?;
  let encoded = serde_json::to_vec(&value).map_err(GatewayError::MalformedBody)?;
  Ok(Bytes::from(encoded))
}

/// Sends `request` once and hands back whatever the backend answered.
pub async fn forward(upstream: &dyn Upstream, request: ForwardedRequest) -> Result<UpstreamResponse, GatewayError> {
  let method = request.method;
  let url = request.url.clone();
  let forwarded: Vec<&str> = request.headers.keys().map(|name| name.as_str()).collect();
  info!("Forwarding {} {} with headers [{}]", method, url, forwarded.join(", "));

  let response = upstream.send(request).await?;

  if response.status.is_success() {
    debug!("Backend answered {} {} with {}", method, url, response.status);
  } else {
    warn!("Backend answered {} {} with {}", method, url, response.status);
  }

  Ok(response)
}
