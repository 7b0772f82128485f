//! Backend selection and connection settings for source clusters.
//!
//! Elasticsearch and OpenSearch speak the same search/scroll API for the calls
//! the converter makes; they only differ in connection defaults. A single
//! [`SearchBackend`] value selects those defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::{SourceError, SourceResult};

/// Default number of hits fetched per scroll page.
pub const DEFAULT_SCROLL_PAGE_SIZE: usize = 1000;

/// Default scroll context keep-alive.
pub const DEFAULT_SCROLL_KEEP_ALIVE: &str = "5m";

/// Search engine flavor of the source cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    #[default]
    Elasticsearch,
    #[serde(alias = "open_search")]
    OpenSearch,
}

impl SearchBackend {
    /// Human-readable label used in logs and progress output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Elasticsearch => "Elasticsearch",
            Self::OpenSearch => "OpenSearch",
        }
    }
}

impl fmt::Display for SearchBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SearchBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "elasticsearch" | "elastic" | "es" => Ok(Self::Elasticsearch),
            "opensearch" | "open_search" | "os" => Ok(Self::OpenSearch),
            other => Err(format!(
                "unknown backend '{}', expected 'elasticsearch' or 'opensearch'",
                other
            )),
        }
    }
}

/// URL scheme used to reach the cluster nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(format!("unknown scheme '{}', expected 'http' or 'https'", other)),
        }
    }
}

/// Resolved authentication mode.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    None,
    Basic { username: String, password: String },
    ApiKey { id: String, key: String },
    Bearer(String),
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => write!(f, "Basic({})", username),
            Self::ApiKey { id, .. } => write!(f, "ApiKey({})", id),
            Self::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

/// Raw credential parameters as supplied by the caller.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub api_key_id: Option<String>,
    pub api_key: Option<String>,
    /// Token for managed/cloud clusters that expect `Authorization: Bearer`.
    pub bearer_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_key_id", &self.api_key_id)
            .field("has_password", &!self.password.is_empty())
            .field("has_api_key", &self.api_key.is_some())
            .field("has_bearer_token", &self.bearer_token.is_some())
            .finish()
    }
}

impl Credentials {
    /// Resolve to a single authentication mode.
    ///
    /// API key wins over bearer token, which wins over basic auth. Basic auth
    /// is only used when a username is set.
    pub fn resolve(&self) -> SourceResult<Auth> {
        match (&self.api_key_id, &self.api_key) {
            (Some(id), Some(key)) => {
                return Ok(Auth::ApiKey {
                    id: id.clone(),
                    key: key.clone(),
                })
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(SourceError::config(
                    "api_key_id and api_key must be supplied together",
                ))
            }
            (None, None) => {}
        }

        if let Some(token) = &self.bearer_token {
            return Ok(Auth::Bearer(token.clone()));
        }

        if !self.username.is_empty() {
            return Ok(Auth::Basic {
                username: self.username.clone(),
                password: self.password.clone(),
            });
        }

        Ok(Auth::None)
    }
}

/// Everything needed to open a client against the source cluster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Node host names (or full URLs)
    pub hosts: Vec<String>,
    /// One port for all hosts, or one port per host
    pub ports: Vec<u16>,
    pub credentials: Credentials,
    pub scheme: Scheme,
    /// PEM bundle with root certificates
    pub ca_certs: Option<PathBuf>,
    pub verify_certs: bool,
    /// Per-request timeout
    pub timeout: Duration,
    pub use_system_proxy: bool,
    pub scroll_page_size: usize,
    pub scroll_keep_alive: String,
}

impl ConnectionConfig {
    /// Connection defaults for the given backend.
    pub fn for_backend(backend: SearchBackend) -> Self {
        let (scheme, credentials, verify_certs) = match backend {
            SearchBackend::Elasticsearch => (Scheme::Http, Credentials::default(), true),
            SearchBackend::OpenSearch => (
                Scheme::Https,
                Credentials {
                    username: "admin".to_string(),
                    password: "admin".to_string(),
                    ..Credentials::default()
                },
                false,
            ),
        };

        Self {
            hosts: vec!["localhost".to_string()],
            ports: vec![9200],
            credentials,
            scheme,
            ca_certs: None,
            verify_certs,
            timeout: Duration::from_secs(30),
            use_system_proxy: false,
            scroll_page_size: DEFAULT_SCROLL_PAGE_SIZE,
            scroll_keep_alive: DEFAULT_SCROLL_KEEP_ALIVE.to_string(),
        }
    }

    /// Base URLs of every configured node, in order.
    pub fn node_urls(&self) -> SourceResult<Vec<Url>> {
        if self.hosts.is_empty() {
            return Err(SourceError::config("at least one host is required"));
        }

        let ports: Vec<u16> = match self.ports.len() {
            0 => return Err(SourceError::config("at least one port is required")),
            1 => vec![self.ports[0]; self.hosts.len()],
            n if n == self.hosts.len() => self.ports.clone(),
            n => {
                return Err(SourceError::config(format!(
                    "{} ports given for {} hosts; supply one port or one per host",
                    n,
                    self.hosts.len()
                )))
            }
        };

        self.hosts
            .iter()
            .zip(ports)
            .map(|(host, port)| node_url(host, port, self.scheme))
            .collect()
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::for_backend(SearchBackend::default())
    }
}

fn node_url(host: &str, port: u16, scheme: Scheme) -> SourceResult<Url> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(SourceError::config("empty host name"));
    }

    if host.contains("://") {
        let mut url = Url::parse(host)
            .map_err(|e| SourceError::config(format!("invalid host URL '{}': {}", host, e)))?;
        // `Url` hides a scheme's default port, so look at the raw authority.
        if !has_explicit_port(host) && url.set_port(Some(port)).is_err() {
            return Err(SourceError::config(format!("cannot set port on '{}'", host)));
        }
        // Request paths are joined relative to the node URL.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        return Ok(url);
    }

    Url::parse(&format!("{}://{}:{}", scheme.as_str(), host, port))
        .map_err(|e| SourceError::config(format!("invalid host '{}': {}", host, e)))
}

/// Whether the authority of a `scheme://...` host string names a port.
fn has_explicit_port(raw: &str) -> bool {
    let Some((_, rest)) = raw.split_once("://") else {
        return false;
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let after_host = match host_port.rfind(']') {
        Some(end) => &host_port[end + 1..],
        None => host_port,
    };
    after_host
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}
