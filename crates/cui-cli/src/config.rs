//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for cui
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend host
    pub host: Option<String>,
    /// Backend port
    pub port: Option<u16>,
    /// Auth token sent as a bearer credential
    pub token: Option<String>,
    /// Talk to the backend without a token
    pub skip_auth_token: Option<bool>,
    /// Conversations per page
    pub page_size: Option<usize>,
    /// Color theme (dark, light)
    pub theme: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cui")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("CUI_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file. A missing or unreadable file yields defaults.
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Self::default()
            }),
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Write the example config if no file exists yet
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, example_config())?;
        Ok(path)
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# cui configuration file
# Place at ~/.config/cui/config.toml (Linux/Mac) or %APPDATA%\cui\config.toml (Windows)
# Command-line flags and the PORT, HOST, AUTH_TOKEN and SKIP_AUTH_TOKEN
# environment variables override these values.

# Backend address
host = "localhost"
port = 3001

# Auth token (optional - `cui --login <url>` stores one for you)
# token = "0123456789abcdef0123456789abcdef"

# Talk to the backend without a token
# skip_auth_token = false

# Conversations fetched per page
page_size = 20

# Color theme (dark, light)
theme = "dark"
"#
}
