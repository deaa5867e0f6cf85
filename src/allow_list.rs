use std::sync::Arc;

use actix_web::http::header::HeaderMap as InboundHeaders;
use reqwest::header::{HeaderMap, HeaderName};

use crate::error::ConfigError;

/// Headers carrying the caller's own LLM settings for AI-backed endpoints.
pub const LLM_PROVIDER: &str = "x-llm-provider";
pub const LLM_API_KEY: &str = "x-llm-api-key";
pub const LLM_MODEL: &str = "x-llm-model";

/// Ordered set of header names allowed to cross into the backend request.
///
/// Immutable once built. Names are matched case-insensitively and kept in
/// first-seen order.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderAllowList {
  names: Arc<[HeaderName]>,
}

impl Default for HeaderAllowList {
  fn default() -> Self {
    Self {
      names: Arc::from(Vec::new()),
    }
  }
}

impl HeaderAllowList {
  pub fn new<'a, I>(names: I) -> Result<Self, ConfigError>
  where
    I: IntoIterator<Item = &'a str>,
  {
    let mut buffer: Vec<HeaderName> = Vec::new();

    for name in names {
      let header = HeaderName::try_from(name.trim()).map_err(|_| ConfigError::InvalidHeaderName {
        name: name.to_string(),
      })?;

      if !buffer.contains(&header) {
        buffer.push(header);
      }
    }

    Ok(Self {
      names: Arc::from(buffer),
    })
  }

  pub fn llm_credentials() -> Self {
    Self {
      names: Arc::from(vec![
        HeaderName::from_static(LLM_PROVIDER),
        HeaderName::from_static(LLM_API_KEY),
        HeaderName::from_static(LLM_MODEL),
      ]),
    }
  }

  pub fn names(&self) -> &[HeaderName] {
    &self.names
  }

  /// Builds the outbound header map from scratch: only listed names, only
  /// non-empty values. When a listed header repeats, the first value wins.
  pub fn filter(&self, inbound: &InboundHeaders) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(self.names.len());

    for name in self.names.iter() {
      match inbound.get(name) {
        Some(value) if !value.as_bytes().iter().all(u8::is_ascii_whitespace) => {
          outbound.insert(name.clone(), value.clone());
        }
        _ => {}
      }
    }

    outbound
  }
}
