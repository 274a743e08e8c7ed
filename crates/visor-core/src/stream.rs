//! Stream connection parameters and request URL construction

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Network location of a stream source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamAddress {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Request path; defaults to "/" when unset
    pub uri: Option<String>,
}

impl StreamAddress {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
            uri: None,
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }
}

/// Parameters for a single playback attempt.
///
/// Constructed per play attempt and consumed by the engine; extra
/// key/value pairs are forwarded to the stream endpoint as query
/// parameters in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub address: Option<StreamAddress>,
    /// Pre-built request URL; takes precedence over address-based construction
    pub url: Option<String>,
    params: Vec<(String, String)>,
}

impl ConnectionParams {
    pub fn new(address: StreamAddress) -> Self {
        Self {
            address: Some(address),
            url: None,
            params: Vec::new(),
        }
    }

    /// Appends an extra query parameter, keeping insertion order.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// The explicit URL override when present, otherwise a URL built
    /// from the address.
    pub fn resolve_url(&self) -> Result<String> {
        match &self.url {
            Some(url) => Ok(url.clone()),
            None => build_url(self),
        }
    }
}

/// Builds a fully qualified request URL from connection parameters.
///
/// Produces `scheme://host:port/uri?key=value&...&rand=<float>`. The
/// trailing `rand` component makes every URL unique so intermediary
/// HTTP caches cannot serve a stale stream response.
pub fn build_url(params: &ConnectionParams) -> Result<String> {
    let addr = params.address.as_ref().ok_or(Error::MissingAddress)?;
    let mut url = format!(
        "{}://{}:{}{}",
        addr.scheme,
        addr.host,
        addr.port,
        addr.uri.as_deref().unwrap_or("/")
    );

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in &params.params {
        query.append_pair(key, value);
    }
    let query = query.finish();

    url.push('?');
    if !query.is_empty() {
        url.push_str(&query);
        url.push('&');
    }
    url.push_str(&format!("rand={}", rand::random::<f64>()));
    Ok(url)
}
