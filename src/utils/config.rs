use std::path::PathBuf;
use std::str::FromStr;
use log::LevelFilter;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PORT must be a number between 0 and 65535, got '{0}'")]
    InvalidPort(String),
    #[error("LOG_LEVEL must be one of off, error, warn, info, debug, trace, got '{0}'")]
    InvalidLogLevel(String),
    #[error("{var} must be true or false, got '{value}'")]
    InvalidBool { var: &'static str, value: String },
}

/// Server configuration - immutable after load
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub words_file: Option<PathBuf>,
    pub prune_empty_lobbies: bool,
    pub log_level: LevelFilter,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            words_file: None,
            prune_empty_lobbies: false, // keep lobbies for the process lifetime
            log_level: LevelFilter::Info,
            log_file: None,
        }
    }
}

impl Config {
    /// Read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable lookup; unset or empty values keep the default
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }
        config.words_file = get("WORDS_FILE").map(PathBuf::from);
        if let Some(value) = get("PRUNE_EMPTY_LOBBIES") {
            config.prune_empty_lobbies = parse_bool("PRUNE_EMPTY_LOBBIES", value)?;
        }
        if let Some(level) = get("LOG_LEVEL") {
            config.log_level = LevelFilter::from_str(&level).map_err(|_| ConfigError::InvalidLogLevel(level))?;
        }
        config.log_file = get("LOG_FILE").map(PathBuf::from);

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool { var, value }),
    }
}
