use devscope_auth::AuthConfig;
use devscope_core::MAX_TTL;
use devscope_github::GitHubClientConfig;
use serde::{Deserialize, Serialize};
use std::{fmt, net::SocketAddr, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Upstream GitHub REST API
    #[serde(default)]
    pub github: GitHubSettings,
    /// Popular-repository search and its cache
    #[serde(default)]
    pub explore: ExploreSettings,
    /// GitHub login and sessions
    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Explore validations
        if self.explore.per_page == 0 || self.explore.per_page > 100 {
            return Err("explore.per_page must be between 1 and 100".into());
        }
        if self.explore.lock_ttl.is_zero() {
            return Err("explore.lock_ttl must be > 0".into());
        }
        if self.explore.results_ttl > MAX_TTL || self.explore.lock_ttl > MAX_TTL {
            return Err("explore TTLs must not exceed one year".into());
        }
        if self.explore.empty_ttl >= self.explore.results_ttl {
            return Err("explore.empty_ttl must be shorter than explore.results_ttl".into());
        }
        // Auth validation
        self.auth
            .validate()
            .map_err(|e| format!("auth config error: {e}"))?;
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    pub fn is_production(&self) -> bool {
        self.server.environment == Environment::Production
    }

    /// Error details (the source chain) are exposed only in development.
    pub fn expose_error_details(&self) -> bool {
        self.server.environment == Environment::Development
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    5000
}
fn default_body_limit() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSettings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Personal access token; falls back to `GITHUB_API_KEY`.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_base_url() -> String {
    devscope_github::client::GITHUB_API_BASE.into()
}
fn default_user_agent() -> String {
    concat!("devscope/", env!("CARGO_PKG_VERSION")).into()
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            token: None,
            user_agent: default_user_agent(),
        }
    }
}

impl GitHubSettings {
    pub fn client_config(&self) -> GitHubClientConfig {
        GitHubClientConfig {
            api_base_url: self.api_base_url.clone(),
            token: self.token.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploreSettings {
    /// Repositories returned per language
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Cache lifetime of a non-empty search result
    #[serde(default = "default_results_ttl", with = "humantime_serde")]
    pub results_ttl: Duration,
    /// Cache lifetime of an empty search result
    #[serde(default = "default_empty_ttl", with = "humantime_serde")]
    pub empty_ttl: Duration,
    /// Lifetime of the refresh lock if it is never released
    #[serde(default = "default_lock_ttl", with = "humantime_serde")]
    pub lock_ttl: Duration,
}

fn default_per_page() -> u32 {
    10
}
fn default_results_ttl() -> Duration {
    Duration::from_secs(60 * 60)
}
fn default_empty_ttl() -> Duration {
    Duration::from_secs(60)
}
fn default_lock_ttl() -> Duration {
    Duration::from_secs(5)
}

impl Default for ExploreSettings {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
            results_ttl: default_results_ttl(),
            empty_ttl: default_empty_ttl(),
            lock_ttl: default_lock_ttl(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::env;
    use std::path::{Path, PathBuf};

    /// Plain environment variables used when the matching key is not set in
    /// the file or through `DEVSCOPE__*`.
    const ENV_FALLBACKS: [(&str, &str); 4] = [
        ("GITHUB_API_KEY", "github.token"),
        ("GITHUB_CLIENT_ID", "auth.client_id"),
        ("GITHUB_CLIENT_SECRET", "auth.client_secret"),
        ("CLIENT_BASE_URL", "auth.client_base_url"),
    ];

    pub const DEFAULT_CONFIG_FILE: &str = "devscope.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        for (var, key) in ENV_FALLBACKS {
            if let Ok(value) = env::var(var)
                && !value.is_empty()
            {
                builder = builder
                    .set_default(key, value)
                    .map_err(|e| format!("config default error for {key}: {e}"))?;
            }
        }

        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., DEVSCOPE__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("DEVSCOPE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        // Validate
        merged.validate()?;
        Ok(merged)
    }

    pub fn load_config_with_default_path<P: AsRef<Path>>(
        path: Option<P>,
    ) -> Result<AppConfig, String> {
        let p = path
            .as_ref()
            .map(|p| p.as_ref().to_string_lossy().to_string());
        load_config(p.as_deref())
    }
}
