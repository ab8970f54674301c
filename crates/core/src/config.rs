use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub catalog_dir: Option<PathBuf>,
    pub catalog_ttl: Duration,
    pub suggestion_limit: usize,
    pub utc_offset_hours: i32,
    pub history_limit: usize,
    /// Idle time after which an API session is forgotten.
    pub session_ttl: Duration,
    pub bind: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_dir: None,
            catalog_ttl: Duration::from_secs(60 * 60),
            suggestion_limit: 5,
            utc_offset_hours: 8,
            history_limit: 40,
            session_ttl: Duration::from_secs(60 * 60 * 24),
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            catalog_dir: env::var("SNOWTRIP_CATALOG_DIR")
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
            catalog_ttl: env::var("SNOWTRIP_CATALOG_TTL_SECONDS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.catalog_ttl),
            suggestion_limit: env::var("SNOWTRIP_SUGGESTION_LIMIT")
                .ok()
                .and_then(|value| value.parse::<usize>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(defaults.suggestion_limit),
            utc_offset_hours: env::var("SNOWTRIP_UTC_OFFSET_HOURS")
                .ok()
                .and_then(|value| value.parse::<i32>().ok())
                .unwrap_or(defaults.utc_offset_hours),
            history_limit: env::var("SNOWTRIP_HISTORY_LIMIT")
                .ok()
                .and_then(|value| value.parse::<usize>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(defaults.history_limit),
            session_ttl: env::var("SNOWTRIP_SESSION_TTL_SECONDS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .filter(|value| *value > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
            bind: env::var("SNOWTRIP_BIND").unwrap_or(defaults.bind),
        }
    }
}
