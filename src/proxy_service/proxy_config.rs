use crate::allow_list::HeaderAllowList;
use crate::route_config::HttpMethod;
use std::sync::Arc;

/// Everything a proxy route needs at request time. Built once at startup.
#[derive(Clone, Debug)]
pub struct ProxyConfig {
  pub url: Arc<str>,
  pub method: HttpMethod,
  pub allow_list: HeaderAllowList,
}
