use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables that override the config file.
pub const ENV_WORKSPACE: &str = "BITBUCKET_WORKSPACE";
pub const ENV_BASE_URL: &str = "BITBUCKET_URL";
pub const ENV_USERNAME: &str = "APP_USERNAME";
pub const ENV_APP_PASSWORD: &str = "APP_PASSWORD";

/// Configuration for bbsearch
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub bitbucket: BitbucketConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub mcp: McpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitbucketConfig {
    /// Workspace slug every operation is scoped to
    #[serde(default)]
    pub workspace: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub username: String,

    /// Usually supplied through `APP_PASSWORD` rather than the file
    #[serde(default)]
    pub app_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Page cap for aggregated listings
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub read_only: bool,
}

impl Default for BitbucketConfig {
    fn default() -> Self {
        Self {
            workspace: String::new(),
            base_url: default_base_url(),
            username: String::new(),
            app_password: String::new(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            read_only: false,
        }
    }
}

fn default_base_url() -> String {
    "https://api.bitbucket.org/2.0/".to_string()
}

fn default_max_pages() -> u32 {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    17373
}

impl Config {
    /// Load config from default location or create default if not found,
    /// then apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load config from `path`, writing the defaults there if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::parse(&content)
        } else {
            let config = Config::default();
            match Self::write_default(path, &config) {
                Ok(()) => tracing::info!("Wrote default config to {}", path.display()),
                Err(e) => tracing::warn!(
                    "Could not write default config to {}: {}; continuing with defaults",
                    path.display(),
                    e
                ),
            }
            Ok(config)
        }
    }

    fn write_default(path: &Path, config: &Config) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(config)?)?;
        Ok(())
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay non-empty values returned by `lookup` for the known variables.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let overrides = [
            (ENV_WORKSPACE, &mut self.bitbucket.workspace),
            (ENV_BASE_URL, &mut self.bitbucket.base_url),
            (ENV_USERNAME, &mut self.bitbucket.username),
            (ENV_APP_PASSWORD, &mut self.bitbucket.app_password),
        ];

        for (key, slot) in overrides {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *slot = value;
            }
        }

        if !self.bitbucket.base_url.ends_with('/') {
            self.bitbucket.base_url.push('/');
        }
    }

    /// Check the settings every remote call depends on.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bitbucket.workspace.trim().is_empty() {
            anyhow::bail!(
                "Bitbucket workspace is not set (set {} or bitbucket.workspace in {})",
                ENV_WORKSPACE,
                Self::config_path().display()
            );
        }

        let url = &self.bitbucket.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!("Base URL must start with http:// or https://: {}", url);
        }

        Ok(())
    }

    pub fn has_credentials(&self) -> bool {
        !self.bitbucket.username.is_empty() && !self.bitbucket.app_password.is_empty()
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "bbsearch", "bbsearch") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.bbsearch/config.toml")
        }
    }
}
