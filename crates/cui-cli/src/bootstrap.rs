//! Resolve where the backend is and how to authenticate against it

use crate::config::Config;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3001;

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub token: Option<String>,
    pub skip_auth_token: bool,
}

/// Backend connection settings after precedence is applied
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub token: Option<String>,
    pub skip_auth_token: bool,
}

impl ServerSettings {
    /// Command line beats environment, environment beats the config file.
    ///
    /// An unusable `PORT` is reported and ignored rather than failing.
    pub fn resolve<E>(cli: &CliOverrides, env: E, config: &Config) -> Self
    where
        E: Fn(&str) -> Option<String>,
    {
        let env_port = env("PORT").and_then(|raw| match parse_port(&raw) {
            Some(port) => {
                tracing::debug!("Loaded port from PORT environment variable: {}", port);
                Some(port)
            }
            None => {
                tracing::warn!("Invalid PORT environment variable: {}", raw);
                None
            }
        });
        let env_skip = env("SKIP_AUTH_TOKEN").is_some_and(|v| v == "true" || v == "1");

        Self {
            host: cli
                .host
                .clone()
                .or_else(|| env("HOST"))
                .or_else(|| config.host.clone())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli
                .port
                .or(env_port)
                .or(config.port)
                .unwrap_or(DEFAULT_PORT),
            token: cli
                .token
                .clone()
                .or_else(|| env("AUTH_TOKEN"))
                .or_else(|| config.token.clone()),
            skip_auth_token: cli.skip_auth_token
                || env_skip
                || config.skip_auth_token.unwrap_or(false),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Token to send, or `None` when auth is skipped
    pub fn bearer(&self) -> Option<&str> {
        if self.skip_auth_token {
            None
        } else {
            self.token.as_deref()
        }
    }

    /// Lines announcing where the console is pointed
    pub fn banner(&self) -> Vec<String> {
        let mut lines = vec![format!("🚀 Using backend at {}", self.base_url())];
        if self.bearer().is_none() {
            lines.push("🔓 Direct access - no authentication required".to_string());
        }
        lines
    }
}

/// Port in 1..=65535
pub fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse::<u16>().ok().filter(|p| *p > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = ServerSettings::resolve(&CliOverrides::default(), env(&[]), &Config::default());
        assert_eq!(settings.base_url(), "http://localhost:3001");
        assert_eq!(settings.token, None);
        assert!(!settings.skip_auth_token);
    }

    #[test]
    fn test_cli_overrides_env_overrides_config() {
        let config = Config {
            host: Some("config-host".into()),
            port: Some(4000),
            token: Some("config-token".into()),
            ..Default::default()
        };
        let vars = env(&[("HOST", "env-host"), ("PORT", "5000"), ("AUTH_TOKEN", "env-token")]);

        let from_env = ServerSettings::resolve(&CliOverrides::default(), &vars, &config);
        assert_eq!(from_env.host, "env-host");
        assert_eq!(from_env.port, 5000);
        assert_eq!(from_env.token.as_deref(), Some("env-token"));

        let cli = CliOverrides {
            host: Some("cli-host".into()),
            port: Some(6000),
            token: None,
            skip_auth_token: false,
        };
        let from_cli = ServerSettings::resolve(&cli, &vars, &config);
        assert_eq!(from_cli.host, "cli-host");
        assert_eq!(from_cli.port, 6000);
        assert_eq!(from_cli.token.as_deref(), Some("env-token"));

        let from_config = ServerSettings::resolve(&CliOverrides::default(), env(&[]), &config);
        assert_eq!(from_config.base_url(), "http://config-host:4000");
    }

    #[test]
    fn test_invalid_env_port_ignored() {
        for bad in ["0", "70000", "http", ""] {
            let settings = ServerSettings::resolve(
                &CliOverrides::default(),
                env(&[("PORT", bad)]),
                &Config::default(),
            );
            assert_eq!(settings.port, DEFAULT_PORT, "PORT={:?}", bad);
        }
    }

    #[test]
    fn test_skip_auth_token_values() {
        for (value, expected) in [("true", true), ("1", true), ("yes", false), ("TRUE", false)] {
            let settings = ServerSettings::resolve(
                &CliOverrides::default(),
                env(&[("SKIP_AUTH_TOKEN", value), ("AUTH_TOKEN", "t")]),
                &Config::default(),
            );
            assert_eq!(settings.skip_auth_token, expected, "SKIP_AUTH_TOKEN={:?}", value);
            assert_eq!(settings.bearer().is_none(), expected);
        }
    }

    #[test]
    fn test_banner_mentions_direct_access() {
        let mut settings = ServerSettings::resolve(&CliOverrides::default(), env(&[]), &Config::default());
        assert_eq!(settings.banner().len(), 2);
        settings.token = Some("abc".into());
        assert_eq!(settings.banner(), vec!["🚀 Using backend at http://localhost:3001".to_string()]);
    }
}
