use crate::error::ConfigError;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::path::Path;

/// Route table shipped with the binary, used when no route file is configured.
const BUILTIN_ROUTES: &str = include_str!("../config.yaml");

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy, Hash, Eq, Default, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
  #[default]
  Get,
  Post,
  Put,
  Delete,
  Head,
  Patch,
}

impl HttpMethod {
  /// Whether requests on this method carry a JSON body to the backend.
  pub fn carries_body(self) -> bool {
    matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
  }
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct RouteConfig {
  pub path: String,
  pub target: String,
  pub method: Option<HttpMethod>,
  pub forward_headers: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct EndpointConfigFile {
  pub routes: Vec<RouteConfig>,
}

impl EndpointConfigFile {
  pub fn load_from_file(file: &File) -> Result<EndpointConfigFile, ConfigError> {
    let path_configs: EndpointConfigFile = serde_yaml::from_reader(file)?;
    Ok(path_configs)
  }

  pub fn load_from_path(path: &Path) -> Result<EndpointConfigFile, ConfigError> {
    let config_fd = File::open(path)?;
    Self::load_from_file(&config_fd)
  }

  pub fn load_from_str(content: &str) -> Result<EndpointConfigFile, ConfigError> {
    let path_configs: EndpointConfigFile = serde_yaml::from_str(content)?;
    Ok(path_configs)
  }

  pub fn builtin() -> Result<EndpointConfigFile, ConfigError> {
    Self::load_from_str(BUILTIN_ROUTES)
  }
}

impl RouteConfig {
  pub fn method(&self) -> HttpMethod {
    self.method.unwrap_or_default()
  }

  /// Rejects anything other than a plain absolute path, so a route can never
  /// point the gateway at another host.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if !is_plain_path(&self.path) {
      return Err(ConfigError::InvalidPath {
        path: self.path.clone(),
      });
    }

    let target = self.target.as_str();
    let reason = if !is_plain_path(target) {
      Some("must start with a single '/'")
    } else if target.contains("://") {
      Some("must not contain a scheme")
    } else if target.split('/').any(|segment| segment == "..") {
      Some("must not contain '..' segments")
    } else if target.contains('?') || target.contains('#') {
      Some("must not contain a query or fragment")
    } else {
      None
    };

    match reason {
      Some(reason) => Err(ConfigError::InvalidTarget {
        target: self.target.clone(),
        reason,
      }),
      None => Ok(()),
    }
  }
}

fn is_plain_path(path: &str) -> bool {
  path.starts_with('/') && !path.starts_with("//")
}

impl From<HttpMethod> for Method {
  fn from(value: HttpMethod) -> Self {
    match value {
      HttpMethod::Get => Method::GET,
      HttpMethod::Post => Method::POST,
      HttpMethod::Put => Method::PUT,
      HttpMethod::Delete => Method::DELETE,
      HttpMethod::Head => Method::HEAD,
      HttpMethod::Patch => Method::PATCH,
    }
  }
}

impl Display for HttpMethod {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      HttpMethod::Get => f.write_str("GET"),
      HttpMethod::Post => f.write_str("POST"),
      HttpMethod::Put => f.write_str("PUT"),
      HttpMethod::Delete => f.write_str("DELETE"),
      HttpMethod::Head => f.write_str("HEAD"),
      HttpMethod::Patch => f.write_str("PATCH"),
    }
  }
}
