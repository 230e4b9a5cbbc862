//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

const DEFAULT_USER_AGENT: &str = "StudyHelper/1.0 (Educational Tool)";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// Used by sessions that have not supplied their own key.
    pub groq_api_key: Option<String>,
    pub generation_api_base: String,
    pub generation_model: String,
    pub wikipedia_rest_base: String,
    pub wikipedia_action_api: String,
    pub user_agent: String,
    pub lookup_timeout: Duration,
    pub search_timeout: Duration,
    pub lookup_max_attempts: u32,
    pub retry_delay: Duration,
    pub cors_origin: String,
    /// Sessions unused for this long are dropped along with their key.
    pub session_idle_timeout: Duration,
    pub max_sessions: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server Settings ---
        let bind_address = parse("BIND_ADDRESS", &var("BIND_ADDRESS", "0.0.0.0:3000"))?;

        let log_level_str = var("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = var("CORS_ORIGIN", "http://localhost:3000");
        let session_idle_timeout = Duration::from_secs(parse(
            "SESSION_IDLE_TIMEOUT_SECS",
            &var("SESSION_IDLE_TIMEOUT_SECS", "3600"),
        )?);
        let max_sessions: usize = parse("MAX_SESSIONS", &var("MAX_SESSIONS", "1000"))?;
        if max_sessions == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_SESSIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        // --- Generation Backend ---
        let groq_api_key = lookup("GROQ_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let generation_api_base = var("GENERATION_API_BASE", "https://api.groq.com/openai/v1");
        let generation_model = var("GENERATION_MODEL", "llama3-8b-8192");

        // --- Encyclopedia Backend ---
        let wikipedia_rest_base =
            var("WIKIPEDIA_REST_BASE", "https://en.wikipedia.org/api/rest_v1");
        let wikipedia_action_api =
            var("WIKIPEDIA_ACTION_API", "https://en.wikipedia.org/w/api.php");
        let user_agent = var("HTTP_USER_AGENT", DEFAULT_USER_AGENT);
        let lookup_timeout =
            Duration::from_secs(parse("LOOKUP_TIMEOUT_SECS", &var("LOOKUP_TIMEOUT_SECS", "15"))?);
        let search_timeout =
            Duration::from_secs(parse("SEARCH_TIMEOUT_SECS", &var("SEARCH_TIMEOUT_SECS", "10"))?);
        let lookup_max_attempts: u32 =
            parse("LOOKUP_MAX_ATTEMPTS", &var("LOOKUP_MAX_ATTEMPTS", "3"))?;
        if lookup_max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "LOOKUP_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let retry_delay =
            Duration::from_millis(parse("RETRY_DELAY_MS", &var("RETRY_DELAY_MS", "1000"))?);

        Ok(Self {
            bind_address,
            log_level,
            groq_api_key,
            generation_api_base,
            generation_model,
            wikipedia_rest_base,
            wikipedia_action_api,
            user_agent,
            lookup_timeout,
            search_timeout,
            lookup_max_attempts,
            retry_delay,
            cors_origin,
            session_idle_timeout,
            max_sessions,
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("log_level", &self.log_level)
            .field("groq_api_key", &self.groq_api_key.as_ref().map(|_| "<redacted>"))
            .field("generation_api_base", &self.generation_api_base)
            .field("generation_model", &self.generation_model)
            .field("wikipedia_rest_base", &self.wikipedia_rest_base)
            .field("wikipedia_action_api", &self.wikipedia_action_api)
            .field("lookup_timeout", &self.lookup_timeout)
            .field("search_timeout", &self.search_timeout)
            .field("lookup_max_attempts", &self.lookup_max_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("cors_origin", &self.cors_origin)
            .field("session_idle_timeout", &self.session_idle_timeout)
            .field("max_sessions", &self.max_sessions)
            .finish()
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}
