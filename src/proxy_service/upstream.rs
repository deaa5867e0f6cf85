use bytes::Bytes;
use futures_core::future::LocalBoxFuture;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, StatusCode};

use crate::error::GatewayError;
use crate::proxy_service::forward::ForwardedRequest;

/// Buffered response from the backend, relayed to the caller as-is.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
  pub status: StatusCode,
  pub headers: HeaderMap,
  pub body: Bytes,
}

/// The single outbound call of a proxied request.
pub trait Upstream: Send + Sync {
  fn send(&self, request: ForwardedRequest) -> LocalBoxFuture<'static, Result<UpstreamResponse, GatewayError>>;
}

pub struct ReqwestUpstream {
  client: Client,
}

impl ReqwestUpstream {
  pub fn new(client: Client) -> Self {
    Self { client }
  }
}

impl Upstream for ReqwestUpstream {
  fn send(&self, request: ForwardedRequest) -> LocalBoxFuture<'static, Result<UpstreamResponse, GatewayError>> {
    let ForwardedRequest {
      method,
      url,
      headers,
      query,
      body,
    } = request;

    let url = match query {
      Some(query) => format!("{}?{}", url, query),
      None => url.to_string(),
    };

    let mut builder = self.client.request(method.into(), url).headers(headers);

    if let Some(body) = body {
      builder = builder.header(CONTENT_TYPE, "application/json").body(body);
    }

    Box::pin(async move {
      let response = builder
        .send()
        .await
        .map_err(|err| GatewayError::UpstreamUnreachable(err.to_string()))?;

      let status = response.status();
      let headers = response.headers().clone();
      let body = response
        .bytes()
        .await
        .map_err(|err| GatewayError::UpstreamUnreachable(err.to_string()))?;

      Ok(UpstreamResponse { status, headers, body })
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::route_config::HttpMethod;
  use actix_web::{rt, web, App, HttpRequest, HttpResponse, HttpServer};
  use serde_json::{json, Value};
  use std::net::SocketAddr;
  use std::sync::Arc;

  async fn echo(req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let headers: serde_json::Map<String, Value> = req
      .headers()
      .iter()
      .map(|(name, value)| (name.to_string(), json!(value.to_str().unwrap_or_default())))
      .collect();

    HttpResponse::Ok().json(json!({
      "method": req.method().as_str(),
      "query": req.query_string(),
      "headers": headers,
      "body": String::from_utf8_lossy(&body),
    }))
  }

  async fn rate_limited() -> HttpResponse {
    HttpResponse::InternalServerError()
      .content_type("application/json")
      .body(r#"{"error":"rate_limited"}"#)
  }

  fn start_backend() -> (SocketAddr, actix_web::dev::ServerHandle) {
    let server = HttpServer::new(|| {
      App::new()
        .route("/echo", web::to(echo))
        .route("/fail", web::post().to(rate_limited))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();

    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    rt::spawn(server);
    (addr, handle)
  }

  fn client() -> Client {
    Client::builder().no_proxy().build().unwrap()
  }

  fn request(url: String, method: HttpMethod, headers: HeaderMap, query: Option<&str>, body: Option<&str>) -> ForwardedRequest {
    ForwardedRequest {
      method,
      url: Arc::from(url),
      headers,
      query: query.map(String::from),
      body: body.map(|b| Bytes::from(b.to_string())),
    }
  }

  #[actix_web::test]
  async fn sends_headers_and_json_body() {
    let (addr, handle) = start_backend();
    let mut headers = HeaderMap::new();
    headers.insert("x-llm-provider", "openai".parse().unwrap());

    let response = ReqwestUpstream::new(client())
      .send(request(
        format!("http://{}/echo", addr),
        HttpMethod::Post,
        headers,
        None,
        Some(r#"{"useCaseId":42}"#),
      ))
      .await
      .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    let echoed: Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["headers"]["x-llm-provider"], "openai");
    assert_eq!(echoed["headers"]["content-type"], "application/json");
    assert_eq!(echoed["headers"].get("cookie"), None);
    assert_eq!(echoed["body"], r#"{"useCaseId":42}"#);

    handle.stop(true).await;
  }

  #[actix_web::test]
  async fn appends_query_for_get() {
    let (addr, handle) = start_backend();

    let response = ReqwestUpstream::new(client())
      .send(request(
        format!("http://{}/echo", addr),
        HttpMethod::Get,
        HeaderMap::new(),
        Some("query=article+5"),
        None,
      ))
      .await
      .unwrap();

    let echoed: Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(echoed["method"], "GET");
    assert_eq!(echoed["query"], "query=article+5");
    assert_eq!(echoed["body"], "");

    handle.stop(true).await;
  }

  #[actix_web::test]
  async fn error_status_is_a_response_not_an_error() {
    let (addr, handle) = start_backend();

    let response = ReqwestUpstream::new(client())
      .send(request(
        format!("http://{}/fail", addr),
        HttpMethod::Post,
        HeaderMap::new(),
        None,
        Some("{}"),
      ))
      .await
      .unwrap();

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&response.body[..], br#"{"error":"rate_limited"}"#);

    handle.stop(true).await;
  }

  #[actix_web::test]
  async fn refused_connection_is_unreachable() {
    let result = ReqwestUpstream::new(client())
      .send(request(
        "http://127.0.0.1:1/echo".into(),
        HttpMethod::Post,
        HeaderMap::new(),
        None,
        Some("{}"),
      ))
      .await;

    assert!(matches!(result, Err(GatewayError::UpstreamUnreachable(_))));
  }
}
