use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const CACHE_ENV_PREFIX: &str = "DRAGONFLY_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            address: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
        }
    }
}

/// `DRAGONFLY_HOST`, `DRAGONFLY_PORT` and `DRAGONFLY_PASSWORD`.
#[derive(Debug, Deserialize, Default)]
struct CacheEnv {
    host: Option<String>,
    port: Option<u16>,
    password: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProviderConfig {
    pub base_url: String,
}

impl ProviderConfig {
    fn new(base_url: &str) -> Self {
        ProviderConfig {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default = "default_official")]
    pub official: ProviderConfig,
    #[serde(default = "default_p2p")]
    pub p2p: ProviderConfig,
    /// EUR/USD source; the euro rate is skipped when set to `null`.
    #[serde(default = "default_fx")]
    pub fx: Option<ProviderConfig>,
}

fn default_official() -> ProviderConfig {
    ProviderConfig::new("https://api.dolarvzla.com")
}

fn default_p2p() -> ProviderConfig {
    ProviderConfig::new("https://criptoya.com")
}

fn default_fx() -> Option<ProviderConfig> {
    Some(ProviderConfig::new("https://api.frankfurter.app"))
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            official: default_official(),
            p2p: default_p2p(),
            fx: default_fx(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RefreshConfig {
    /// Delete every snapshot key before writing the new ones.
    pub clear_previous: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            clear_previous: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl AppConfig {
    /// Loads the default config file, or built-in defaults when it does not exist.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "vesrates", "vesrates")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Applies `DRAGONFLY_*` variables from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(std::env::vars())
    }

    pub fn with_overrides_from<I>(mut self, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars = vars.into_iter().filter(|(_, v)| !v.is_empty());
        let env: CacheEnv = envy::prefixed(CACHE_ENV_PREFIX)
            .from_iter(vars)
            .context("Invalid DRAGONFLY_* environment variables")?;

        if let Some(host) = env.host {
            self.cache.host = host;
        }
        if let Some(port) = env.port {
            self.cache.port = port;
        }
        if env.password.is_some() {
            self.cache.password = env.password;
        }
        Ok(self)
    }
}
