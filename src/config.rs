use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::controller::DEFAULT_MAX_SESSIONS;
use crate::error::{AppError, Result};
use crate::llm::CompletionOptions;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.9;
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// What to do when the moderation endpoint cannot be reached or answers garbage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModerationPolicy {
    /// Treat a failed check as a failed run.
    #[default]
    FailClosed,
    /// Log the failure and carry on to the completion call.
    FailOpen,
}

impl FromStr for ModerationPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-closed" | "closed" => Ok(ModerationPolicy::FailClosed),
            "fail-open" | "open" => Ok(ModerationPolicy::FailOpen),
            other => Err(AppError::Config(format!(
                "Invalid MODERATION_POLICY '{}', expected fail-closed or fail-open",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub completion: CompletionOptions,
    pub moderation_policy: ModerationPolicy,
    pub fetch_timeout: Duration,
    pub llm_timeout: Duration,
    pub max_sessions: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::Config("OPENAI_API_KEY is not set".to_string()))?;

        let openai_base_url = lookup("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let model = lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let temperature: f32 = parse_or(&lookup, "OPENAI_TEMPERATURE", DEFAULT_TEMPERATURE)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AppError::Config(format!(
                "OPENAI_TEMPERATURE must be between 0 and 2, got {}",
                temperature
            )));
        }
        let max_tokens: u32 = parse_or(&lookup, "OPENAI_MAX_TOKENS", DEFAULT_MAX_TOKENS)?;
        if max_tokens == 0 {
            return Err(AppError::Config("OPENAI_MAX_TOKENS must be at least 1".to_string()));
        }

        let moderation_policy = match lookup("MODERATION_POLICY") {
            Some(raw) => raw.parse()?,
            None => ModerationPolicy::default(),
        };

        let fetch_timeout = Duration::from_secs(parse_or(&lookup, "FETCH_TIMEOUT_SECS", 10u64)?);
        let llm_timeout = Duration::from_secs(parse_or(&lookup, "LLM_TIMEOUT_SECS", 60u64)?);
        let max_sessions: usize = parse_or(&lookup, "MAX_SESSIONS", DEFAULT_MAX_SESSIONS)?;
        if max_sessions == 0 {
            return Err(AppError::Config("MAX_SESSIONS must be at least 1".to_string()));
        }

        // Load server configuration with defaults
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::Config(format!("Invalid host address: {}", e)))?;

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            openai_api_key,
            openai_base_url,
            completion: CompletionOptions {
                model,
                temperature,
                max_tokens,
            },
            moderation_policy,
            fetch_timeout,
            llm_timeout,
            max_sessions,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("OPENAI_API_KEY")));
    }

    #[test]
    fn defaults_apply() {
        let config = config_from(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.openai_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.completion.model, DEFAULT_MODEL);
        assert_eq!(config.completion.max_tokens, 500);
        assert!((config.completion.temperature - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.moderation_policy, ModerationPolicy::FailClosed);
        assert_eq!(config.server_addr.port(), 3000);
        assert_eq!(config.max_sessions, DEFAULT_MAX_SESSIONS);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:9000/v1/"),
            ("MODERATION_POLICY", "fail-open"),
            ("PORT", "8080"),
            ("FETCH_TIMEOUT_SECS", "3"),
            ("MAX_SESSIONS", "25"),
        ])
        .unwrap();
        assert_eq!(config.openai_base_url, "http://localhost:9000/v1");
        assert_eq!(config.moderation_policy, ModerationPolicy::FailOpen);
        assert_eq!(config.server_addr.port(), 8080);
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
        assert_eq!(config.max_sessions, 25);
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = config_from(&[("OPENAI_API_KEY", "sk"), ("PORT", "nope")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        let err = config_from(&[("OPENAI_API_KEY", "sk"), ("MODERATION_POLICY", "maybe")])
            .unwrap_err();
        assert!(err.to_string().contains("MODERATION_POLICY"));
    }
}
