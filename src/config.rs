//! Application configuration.
//!
//! Layered with figment: built-in defaults, then the TOML file, then
//! `BROWNFIELD_*` environment variables (`__` separates nested keys). CLI
//! flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::core::converter::{DEFAULT_BATCH_SIZE, DEFAULT_TARGET_INDEX};
use crate::core::source::{ConnectionConfig, Credentials, Scheme, SearchBackend};
use crate::core::store::SurrealStoreConfig;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "BROWNFIELD_";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: SearchBackend,
    pub connection: ConnectionSettings,
    pub target: TargetConfig,
    pub conversion: ConversionDefaults,
    pub logging: LoggingConfig,
}

/// Overrides of the backend's connection defaults. Unset fields keep the
/// backend default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    pub hosts: Option<Vec<String>>,
    pub ports: Option<Vec<u16>>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key_id: Option<String>,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
    pub scheme: Option<Scheme>,
    pub ca_certs: Option<PathBuf>,
    pub verify_certs: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub use_system_proxy: Option<bool>,
    pub scroll_page_size: Option<usize>,
}

impl ConnectionSettings {
    /// Resolve against the defaults of `backend`.
    pub fn resolve(&self, backend: SearchBackend) -> ConnectionConfig {
        let mut config = ConnectionConfig::for_backend(backend);

        if let Some(hosts) = &self.hosts {
            config.hosts = hosts.clone();
        }
        if let Some(ports) = &self.ports {
            config.ports = ports.clone();
        }

        let defaults = config.credentials.clone();
        config.credentials = Credentials {
            username: self.username.clone().unwrap_or(defaults.username),
            password: self.password.clone().unwrap_or(defaults.password),
            api_key_id: self.api_key_id.clone().or(defaults.api_key_id),
            api_key: self.api_key.clone().or(defaults.api_key),
            bearer_token: self.bearer_token.clone().or(defaults.bearer_token),
        };

        if let Some(scheme) = self.scheme {
            config.scheme = scheme;
        }
        if self.ca_certs.is_some() {
            config.ca_certs = self.ca_certs.clone();
        }
        if let Some(verify) = self.verify_certs {
            config.verify_certs = verify;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(proxy) = self.use_system_proxy {
            config.use_system_proxy = proxy;
        }
        if let Some(size) = self.scroll_page_size {
            config.scroll_page_size = size;
        }

        config
    }
}

/// Where converted documents go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// RocksDB directory. `None` uses the data directory.
    pub path: Option<PathBuf>,
    pub namespace: String,
    pub database: String,
    /// Default target index
    pub index: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        let store = SurrealStoreConfig::default();
        Self {
            path: None,
            namespace: store.namespace,
            database: store.database,
            index: DEFAULT_TARGET_INDEX.to_string(),
        }
    }
}

impl TargetConfig {
    /// Resolved store directory (override or XDG data dir).
    pub fn store_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("brownfield").join("store"))
                .unwrap_or_else(|| PathBuf::from("brownfield-store"))
        })
    }

    pub fn store_config(&self) -> SurrealStoreConfig {
        SurrealStoreConfig {
            namespace: self.namespace.clone(),
            database: self.database.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionDefaults {
    pub batch_size: usize,
    pub store_original_ids: bool,
}

impl Default for ConversionDefaults {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            store_original_ids: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Override the log directory
    pub log_dir: Option<PathBuf>,
    /// Write JSON logs to a daily rolling file
    pub json_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            json_file: true,
        }
    }
}

impl LoggingConfig {
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("brownfield").join("logs"))
                .unwrap_or_else(|| PathBuf::from("logs"))
        })
    }
}

impl AppConfig {
    /// Load defaults < TOML file < environment.
    ///
    /// `path` overrides the default file location. A missing file is not an
    /// error; a malformed one is.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        Self::figment(&config_path).extract()
    }

    /// Layered provider stack, exposed for callers that merge CLI flags.
    pub fn figment(config_path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Connection settings resolved against the selected backend.
    pub fn connection_config(&self) -> ConnectionConfig {
        self.connection.resolve(self.backend)
    }

    /// Default config file location (`$XDG_CONFIG_HOME/brownfield/config.toml`).
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("brownfield").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
