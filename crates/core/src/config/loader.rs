//! Configuration loading: file, then environment overrides, then validation

use super::schema::{ConfigSchema, Environment};
use crate::error::{Error, Result, ResultExt};
use std::path::Path;
use std::str::FromStr;

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from a file path (or a standard location), apply
    /// environment overrides and validate the result
    pub fn load(path: Option<&str>) -> Result<Self> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an explicit environment lookup
    pub fn load_with_env<F>(path: Option<&str>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = match path {
            Some(p) if !Path::new(p).exists() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_string()),
            None => find_config_file(),
        };

        let mut schema = if let Some(ref p) = config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };

        apply_env_overrides(&mut schema, lookup)?;
        validate(&schema)?;

        Ok(Self {
            schema,
            path: config_path,
        })
    }

    /// Check the values again, e.g. after command-line overrides
    pub fn validate(&self) -> Result<()> {
        validate(&self.schema)
    }

    /// `host:port` string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.schema.server.host, self.schema.server.port)
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<String> {
    let candidates = ["catalog.toml", ".catalog.toml", ".config/catalog.toml"];

    for candidate in candidates {
        if Path::new(candidate).exists() {
            return Some(candidate.to_string());
        }
    }

    None
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &str) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("Failed to read config file {}", path))?;

    toml::from_str(&content)
        .map_err(Error::from)
        .context(format!("Failed to parse config file {}", path))
}

/// Override file values with environment variables
fn apply_env_overrides<F>(schema: &mut ConfigSchema, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(env) = lookup("APP_ENV").or_else(|| lookup("NODE_ENV")) {
        schema.server.environment = Environment::from_str(&env).map_err(|_| {
            Error::invalid_config_value(
                "APP_ENV",
                &env,
                &format!("one of {}", Environment::CHOICES.join(", ")),
            )
        })?;
    }

    if let Some(host) = lookup("HOST") {
        if host.trim().is_empty() {
            return Err(Error::invalid_config_value("HOST", &host, "a host name or IP address"));
        }
        schema.server.host = host;
    }

    if let Some(port) = lookup("PORT") {
        schema.server.port = parse_env("PORT", &port, "a port number between 1 and 65535")?;
    }

    if let Some(max) = lookup("COMMON_RATE_LIMIT_MAX_REQUESTS") {
        schema.rate_limit.max_requests =
            parse_env("COMMON_RATE_LIMIT_MAX_REQUESTS", &max, "a positive integer")?;
    }

    if let Some(window) = lookup("COMMON_RATE_LIMIT_WINDOW_MS") {
        schema.rate_limit.window_ms =
            parse_env("COMMON_RATE_LIMIT_WINDOW_MS", &window, "a duration in milliseconds")?;
    }

    if let Some(distance) = lookup("SEARCH_MAX_DISTANCE") {
        schema.search.max_distance = parse_env("SEARCH_MAX_DISTANCE", &distance, "an integer")?;
    }

    Ok(())
}

fn parse_env<T: FromStr>(key: &str, value: &str, expected: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::invalid_config_value(key, value, expected))
}

/// Reject values that parse but cannot work
fn validate(schema: &ConfigSchema) -> Result<()> {
    if schema.server.port == 0 {
        return Err(Error::invalid_config_value("server.port", "0", "between 1 and 65535"));
    }
    if schema.rate_limit.max_requests == 0 {
        return Err(Error::invalid_config_value("rate_limit.max_requests", "0", "at least 1"));
    }
    if schema.rate_limit.window_ms == 0 {
        return Err(Error::invalid_config_value("rate_limit.window_ms", "0", "at least 1"));
    }
    if schema.pagination.default_limit == 0 {
        return Err(Error::invalid_config_value("pagination.default_limit", "0", "at least 1"));
    }
    Ok(())
}
