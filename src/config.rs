use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

pub const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_CHAT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 4;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    pub weather_api_key: String,
    pub google_api_key: String,
    /// Directory for state files (logs). Defaults to current directory.
    pub data_dir: PathBuf,
    /// Upper bound on messages handled at the same time.
    pub max_concurrent_requests: usize,
    pub weather_api_url: String,
    pub gemini_api_base: String,
    /// Conversational model name, e.g. `gemini-2.5-flash`.
    pub gemini_chat_model: String,
}

impl Config {
    /// Load from the process environment, reading `.env` first if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(var))
        };
        let optional = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let telegram_token = required("TELEGRAM_API_KEY")?;
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let valid_token = matches!(
            telegram_token.split_once(':'),
            Some((id, secret)) if id.parse::<u64>().is_ok() && !secret.is_empty() && !secret.contains(':')
        );
        if !valid_token {
            return Err(ConfigError::Invalid {
                var: "TELEGRAM_API_KEY",
                reason: "expected format 123456789:ABCdefGHI...".into(),
            });
        }

        let weather_api_key = required("OPENWEATHER_API_KEY")?;
        let google_api_key = required("GOOGLE_API_KEY")?;

        let max_concurrent_requests = match optional("MAX_CONCURRENT_REQUESTS") {
            None => DEFAULT_MAX_CONCURRENT_REQUESTS,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "MAX_CONCURRENT_REQUESTS",
                        reason: format!("expected a positive integer, got '{raw}'"),
                    });
                }
            },
        };

        let config = Self {
            telegram_token,
            weather_api_key,
            google_api_key,
            data_dir: optional("DATA_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
            max_concurrent_requests,
            weather_api_url: optional("WEATHER_API_URL").unwrap_or_else(|| DEFAULT_WEATHER_API_URL.to_string()),
            gemini_api_base: optional("GEMINI_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            gemini_chat_model: optional("GEMINI_CHAT_MODEL")
                .map(|model| model.trim_start_matches("models/").to_string())
                .unwrap_or_else(|| DEFAULT_GEMINI_CHAT_MODEL.to_string()),
        };

        debug!("Telegram token length: {} characters", config.telegram_token.len());
        debug!("OpenWeather key length: {} characters", config.weather_api_key.len());
        debug!("Google key length: {} characters", config.google_api_key.len());

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    const BASE: [(&str, &str); 3] = [
        ("TELEGRAM_API_KEY", "123456789:ABCdefGHIjklMNOpqrsTUVwxyz"),
        ("OPENWEATHER_API_KEY", "weather-key"),
        ("GOOGLE_API_KEY", "google-key"),
    ];

    fn assert_err(result: Result<Config, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut vars = BASE.to_vec();
        for (k, v) in extra {
            vars.retain(|(name, _)| name != k);
            vars.push((*k, *v));
        }
        vars
    }

    #[test]
    fn test_valid_config_defaults() {
        let config = load(&BASE).expect("should load valid config");
        assert_eq!(config.weather_api_key, "weather-key");
        assert_eq!(config.google_api_key, "google-key");
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert_eq!(config.max_concurrent_requests, 4);
        assert_eq!(config.weather_api_url, DEFAULT_WEATHER_API_URL);
        assert_eq!(config.gemini_api_base, DEFAULT_GEMINI_API_BASE);
        assert_eq!(config.gemini_chat_model, DEFAULT_GEMINI_CHAT_MODEL);
    }

    #[test]
    fn test_chat_model_override() {
        let config = load(&with(&[("GEMINI_CHAT_MODEL", "models/gemini-2.5-pro")])).unwrap();
        assert_eq!(config.gemini_chat_model, "gemini-2.5-pro");

        let config = load(&with(&[("GEMINI_CHAT_MODEL", "  ")])).unwrap();
        assert_eq!(config.gemini_chat_model, DEFAULT_GEMINI_CHAT_MODEL);
    }

    #[test]
    fn test_missing_weather_key() {
        let vars: Vec<_> = BASE.iter().copied().filter(|(k, _)| *k != "OPENWEATHER_API_KEY").collect();
        let err = assert_err(load(&vars));
        assert!(matches!(err, ConfigError::Missing("OPENWEATHER_API_KEY")));
    }

    #[test]
    fn test_blank_google_key_counts_as_missing() {
        let err = assert_err(load(&with(&[("GOOGLE_API_KEY", "   ")])));
        assert!(matches!(err, ConfigError::Missing("GOOGLE_API_KEY")));
    }

    #[test]
    fn test_invalid_token_format_no_colon() {
        let err = assert_err(load(&with(&[("TELEGRAM_API_KEY", "invalid_token_no_colon")])));
        assert!(matches!(err, ConfigError::Invalid { var: "TELEGRAM_API_KEY", .. }));
    }

    #[test]
    fn test_invalid_token_format_non_numeric_id() {
        let err = assert_err(load(&with(&[("TELEGRAM_API_KEY", "notanumber:ABCdef")])));
        assert!(err.to_string().contains("TELEGRAM_API_KEY"));
    }

    #[test]
    fn test_invalid_token_format_empty_secret() {
        let err = assert_err(load(&with(&[("TELEGRAM_API_KEY", "123456789:")])));
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_overrides() {
        let config = load(&with(&[
            ("DATA_DIR", "/var/lib/intentbot"),
            ("MAX_CONCURRENT_REQUESTS", "16"),
            ("GEMINI_API_BASE", "http://localhost:9000/v1beta/"),
        ]))
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/intentbot"));
        assert_eq!(config.max_concurrent_requests, 16);
        assert_eq!(config.gemini_api_base, "http://localhost:9000/v1beta");
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = assert_err(load(&with(&[("MAX_CONCURRENT_REQUESTS", "0")])));
        assert!(matches!(err, ConfigError::Invalid { var: "MAX_CONCURRENT_REQUESTS", .. }));

        let err = assert_err(load(&with(&[("MAX_CONCURRENT_REQUESTS", "lots")])));
        assert!(err.to_string().contains("lots"));
    }
}
