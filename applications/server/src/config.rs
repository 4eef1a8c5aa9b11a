/// Server configuration
use crate::error::{Result, ServerError};
use mirror_core::LauncherConfig;
use mirror_github::GithubConfig;
use mirror_sync::{AssetRouting, DownloadSettings as MirrorDownloadSettings, PublicUrls};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound for minute-valued settings (one week)
const MAX_MINUTES: u64 = 7 * 24 * 60;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub github: GithubSettings,

    #[serde(default)]
    pub download: DownloadSettings,

    #[serde(default)]
    pub proxy: ProxySettings,

    #[serde(default)]
    pub public: PublicSettings,

    #[serde(default)]
    pub schedule: ScheduleSettings,

    #[serde(default)]
    pub launchers: Vec<LauncherConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Root of the mirror tree
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubSettings {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Ceiling for a rate-limit backoff
    #[serde(default = "default_max_rate_limit_wait_secs")]
    pub max_rate_limit_wait_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadSettings {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Time budget of one launcher cycle
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u64,

    #[serde(default = "default_cleanup_old_versions")]
    pub cleanup_old_versions: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProxySettings {
    /// Outbound HTTP proxy for every request
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// Prefix prepended to asset URLs
    #[serde(default)]
    pub asset_proxy_url: Option<String>,

    #[serde(default)]
    pub xget_enabled: bool,

    /// Acceleration domain substituted for github.com
    #[serde(default)]
    pub xget_domain: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublicSettings {
    /// Absolute base for manifest download URLs
    #[serde(default)]
    pub download_url_base: Option<String>,

    #[serde(default = "default_server_address")]
    pub server_address: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleSettings {
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,

    #[serde(default = "default_scan_on_startup")]
    pub scan_on_startup: bool,
}

impl ServerConfig {
    /// Load configuration from file and environment
    ///
    /// `path` overrides the default `config.toml` in the working directory.
    /// Environment variables prefixed `MIRROR_` override file values, with
    /// `__` between nested keys (`MIRROR_SERVER__PORT=9000`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let config_path = PathBuf::from("config.toml");
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("MIRROR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.launchers.is_empty() {
            return Err(ServerError::Config(
                "At least one launcher must be configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for launcher in &self.launchers {
            let name = launcher.name.trim();
            if name.is_empty() {
                return Err(ServerError::Config("Launcher name is empty".to_string()));
            }
            if name != launcher.name
                || name.contains(['/', '\\'])
                || name.contains("..")
                || name.starts_with('.')
            {
                return Err(ServerError::Config(format!(
                    "Launcher name {:?} is not usable as a directory name",
                    launcher.name
                )));
            }
            if !seen.insert(name) {
                return Err(ServerError::Config(format!(
                    "Duplicate launcher name {name:?}"
                )));
            }
            if launcher.source_url.trim().is_empty() {
                return Err(ServerError::Config(format!(
                    "Launcher {name:?} has no source_url"
                )));
            }
        }

        if self.download.concurrency == 0 {
            return Err(ServerError::Config(
                "download.concurrency must be at least 1".to_string(),
            ));
        }

        if !(1..=MAX_MINUTES).contains(&self.download.timeout_minutes) {
            return Err(ServerError::Config(format!(
                "download.timeout_minutes must be between 1 and {MAX_MINUTES}"
            )));
        }

        if !(1..=MAX_MINUTES).contains(&self.schedule.interval_minutes) {
            return Err(ServerError::Config(format!(
                "schedule.interval_minutes must be between 1 and {MAX_MINUTES}"
            )));
        }

        if self.proxy.xget_enabled && self.acceleration_domain().is_none() {
            return Err(ServerError::Config(
                "proxy.xget_domain is required when proxy.xget_enabled is set".to_string(),
            ));
        }

        Ok(())
    }

    pub fn github_config(&self) -> GithubConfig {
        GithubConfig {
            api_base: self.github.api_base.clone(),
            token: self.github.token.clone().filter(|t| !t.is_empty()),
            proxy_url: self.proxy.proxy_url.clone(),
            max_rate_limit_wait: Duration::from_secs(self.github.max_rate_limit_wait_secs),
            ..GithubConfig::default()
        }
    }

    /// Base of the download URLs written to manifests
    pub fn public_urls(&self) -> PublicUrls {
        match self
            .public
            .download_url_base
            .as_deref()
            .filter(|b| !b.trim().is_empty())
        {
            Some(base) => PublicUrls::new(base),
            None => PublicUrls::for_server(&self.public.server_address, self.server.port),
        }
    }

    pub fn download_settings(&self) -> MirrorDownloadSettings {
        MirrorDownloadSettings {
            base_dir: self.storage.base_path.clone(),
            concurrency: self.download.concurrency,
            proxy_url: self.proxy.proxy_url.clone(),
            routing: AssetRouting {
                acceleration_domain: self.acceleration_domain(),
                asset_proxy_url: self.proxy.asset_proxy_url.clone(),
            },
            public: self.public_urls(),
            cleanup_old: self.download.cleanup_old_versions,
        }
    }

    pub fn launcher_timeout(&self) -> Duration {
        Duration::from_secs(self.download.timeout_minutes.saturating_mul(60))
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_minutes.saturating_mul(60))
    }

    fn acceleration_domain(&self) -> Option<String> {
        if !self.proxy.xget_enabled {
            return None;
        }
        self.proxy
            .xget_domain
            .clone()
            .filter(|d| !d.trim().is_empty())
    }
}

// Default values
impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            database_url: default_database_url(),
        }
    }
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            token: None,
            api_base: default_api_base(),
            max_rate_limit_wait_secs: default_max_rate_limit_wait_secs(),
        }
    }
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_minutes: default_timeout_minutes(),
            cleanup_old_versions: default_cleanup_old_versions(),
        }
    }
}

impl Default for PublicSettings {
    fn default() -> Self {
        Self {
            download_url_base: None,
            server_address: default_server_address(),
        }
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            scan_on_startup: default_scan_on_startup(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_base_path() -> PathBuf {
    PathBuf::from("./data/mirror")
}

fn default_database_url() -> String {
    "sqlite://./data/versions.db".to_string()
}

fn default_api_base() -> String {
    mirror_github::DEFAULT_API_BASE.to_string()
}

fn default_max_rate_limit_wait_secs() -> u64 {
    900
}

fn default_concurrency() -> usize {
    4
}

fn default_timeout_minutes() -> u64 {
    30
}

fn default_cleanup_old_versions() -> bool {
    true
}

fn default_server_address() -> String {
    "localhost".to_string()
}

fn default_interval_minutes() -> u64 {
    60
}

fn default_scan_on_startup() -> bool {
    true
}
