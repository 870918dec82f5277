//! Host configuration read from the environment.

use crate::host::HostError;
use settlers_core::options::OPTION_TTL;
use settlers_core::ranker::DEFAULT_LIMIT;
use std::str::FromStr;
use std::time::Duration;

const LOG_FILTER: &str = "RUST_LOG";
const OPTION_TTL_SECS: &str = "SETTLERS_OPTION_TTL_SECS";
const IDLE_GAME_SECS: &str = "SETTLERS_IDLE_GAME_SECS";
const OPTION_LIMIT: &str = "SETTLERS_OPTION_LIMIT";

/// Games untouched this long are dropped
pub const IDLE_GAME_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: String,
    pub option_ttl: Duration,
    pub idle_game_timeout: Duration,
    /// Ranked vertices and edges published per view
    pub option_limit: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            option_ttl: OPTION_TTL,
            idle_game_timeout: IDLE_GAME_TIMEOUT,
            option_limit: DEFAULT_LIMIT,
        }
    }
}

impl HostConfig {
    pub fn from_env() -> Result<Self, HostError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys take defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HostError> {
        let defaults = Self::default();

        let option_limit = parse(&lookup, OPTION_LIMIT, defaults.option_limit)?;
        if option_limit == 0 {
            return Err(HostError::Config {
                key: OPTION_LIMIT,
                message: "must be at least 1".into(),
            });
        }

        Ok(Self {
            log_filter: lookup(LOG_FILTER).unwrap_or(defaults.log_filter),
            option_ttl: Duration::from_secs(parse(
                &lookup,
                OPTION_TTL_SECS,
                defaults.option_ttl.as_secs(),
            )?),
            idle_game_timeout: Duration::from_secs(parse(
                &lookup,
                IDLE_GAME_SECS,
                defaults.idle_game_timeout.as_secs(),
            )?),
            option_limit,
        })
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, HostError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| HostError::Config {
            key,
            message: format!("{raw:?}: {e}"),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HostConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.option_ttl, Duration::from_secs(300));
        assert_eq!(config.idle_game_timeout, Duration::from_secs(3600));
        assert_eq!(config.option_limit, 5);
    }

    #[test]
    fn test_overrides() {
        let config = HostConfig::from_lookup(lookup(&[
            ("RUST_LOG", "debug"),
            ("SETTLERS_OPTION_TTL_SECS", "30"),
            ("SETTLERS_IDLE_GAME_SECS", " 120 "),
            ("SETTLERS_OPTION_LIMIT", "8"),
        ]))
        .unwrap();

        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.option_ttl, Duration::from_secs(30));
        assert_eq!(config.idle_game_timeout, Duration::from_secs(120));
        assert_eq!(config.option_limit, 8);
    }

    #[test]
    fn test_invalid_values() {
        let err = HostConfig::from_lookup(lookup(&[("SETTLERS_OPTION_TTL_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            HostError::Config {
                key: "SETTLERS_OPTION_TTL_SECS",
                ..
            }
        ));

        assert!(HostConfig::from_lookup(lookup(&[("SETTLERS_OPTION_LIMIT", "0")])).is_err());
    }
}
