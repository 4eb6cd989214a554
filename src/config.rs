use std::{env, path::PathBuf, time::Duration};

const DEFAULT_DB_PATH: &str = "data/hub.sqlite";
const DEFAULT_GRAPHQL_URL: &str = "http://localhost:4000/graphql";
const DEFAULT_CONTENT_URL: &str = "https://cdn.contentful.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub graphql_url: String,
    pub content_url: String,
    pub content_space: String,
    pub content_environment: String,
    pub content_token: String,
    pub live_sheet_url: String,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub search_debounce: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; missing or unparseable values take defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| normalize(&v))
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let number = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| normalize(&v).parse::<u64>().ok())
                .unwrap_or(default)
        };

        Self {
            db_path: PathBuf::from(text("HUB_DB_PATH", DEFAULT_DB_PATH)),
            graphql_url: text("HUB_GRAPHQL_URL", DEFAULT_GRAPHQL_URL),
            content_url: text("HUB_CONTENT_URL", DEFAULT_CONTENT_URL),
            content_space: text("HUB_CONTENT_SPACE", ""),
            content_environment: text("HUB_CONTENT_ENVIRONMENT", "master"),
            content_token: text("HUB_CONTENT_TOKEN", ""),
            live_sheet_url: text("HUB_LIVE_SHEET_URL", ""),
            poll_interval: Duration::from_secs(number("HUB_POLL_SECS", 60).max(1)),
            http_timeout: Duration::from_secs(number("HUB_HTTP_TIMEOUT_SECS", 10).max(1)),
            search_debounce: Duration::from_millis(number("HUB_SEARCH_DEBOUNCE_MS", 300)),
        }
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().trim_matches('"').trim_matches('\'').to_string()
}
