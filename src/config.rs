use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `openai_api_key`
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Basic auth username
    #[serde(default = "default_username")]
    pub username: String,

    /// Basic auth password
    #[serde(default = "default_password")]
    pub password: String,

    /// OpenAI API key (the OPENAI_API_KEY environment variable takes precedence)
    #[serde(default)]
    pub openai_api_key: String,

    /// Chat completion model
    #[serde(default = "default_model")]
    pub openai_model: String,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// Base URL of the GitHub REST API
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    /// Directory holding the issue store (None = ~/.cache/issue-analyzer)
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default location (~/.config/issue-analyzer/config.toml)
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AnalyzerError::config(format!(
                "Config file not found at: {}",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AnalyzerError::config("Could not determine home directory"))?;
        Ok(home.join(".config").join("issue-analyzer").join("config.toml"))
    }

    /// Get the default data directory path
    pub fn default_data_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AnalyzerError::config("Could not determine home directory"))?;
        Ok(home.join(".cache").join("issue-analyzer"))
    }

    /// Directory the issue store lives in
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_data_dir(),
        }
    }

    /// Create a default configuration file at the default location
    pub fn create_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config = Self::default();
        let toml_string = toml::to_string_pretty(&config)?;
        fs::write(&config_path, toml_string)?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(AnalyzerError::config(
                "username and password must not be empty",
            ));
        }

        if self.bind_address.parse::<SocketAddr>().is_err() {
            return Err(AnalyzerError::config(format!(
                "Invalid bind_address: {}",
                self.bind_address
            )));
        }

        if self.openai_model.is_empty() {
            return Err(AnalyzerError::config("openai_model must not be empty"));
        }

        for (name, url) in [
            ("openai_base_url", &self.openai_base_url),
            ("github_api_url", &self.github_api_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AnalyzerError::config(format!(
                    "{} must be an http(s) URL",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Resolve the OpenAI API key, preferring the environment over the file
    pub fn get_api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key.trim().to_string());
            }
        }

        if self.openai_api_key.is_empty() {
            return Err(AnalyzerError::MissingConfig(format!(
                "openai_api_key is required (or set {})",
                API_KEY_ENV
            )));
        }

        Ok(self.openai_api_key.clone())
    }

    /// Copy of the configuration with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.password = mask(&config.password);
        config.openai_api_key = mask(&config.openai_api_key);
        config
    }

    /// Load config from file, or create default if it doesn't exist
    pub fn load_or_create_default() -> Result<Self> {
        match Self::load() {
            Ok(config) => Ok(config),
            Err(AnalyzerError::Config(_)) if !Self::default_config_path()?.exists() => {
                tracing::info!("Config file not found. Creating default config...");
                Self::create_default()
            }
            Err(e) => Err(e),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            username: default_username(),
            password: default_password(),
            openai_api_key: String::new(),
            openai_model: default_model(),
            openai_base_url: default_openai_base_url(),
            github_api_url: default_github_api_url(),
            data_dir: None,
        }
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}

// Serde default functions
fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "password".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}
