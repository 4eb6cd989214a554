pub mod content;
pub mod relational;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::HubError;

/// Outcome of one adapter call. `ok` is the adapter-level success flag;
/// on failure `records` is empty and the merge proceeds without this source.
#[derive(Debug)]
pub struct SourceFetch<T> {
    pub source: &'static str,
    pub records: Vec<T>,
    pub ok: bool,
}

impl<T> SourceFetch<T> {
    pub fn from_result(source: &'static str, result: Result<Vec<T>, HubError>) -> Self {
        match result {
            Ok(records) => {
                info!("Fetched {} records from {}", records.len(), source);
                SourceFetch {
                    source,
                    records,
                    ok: true,
                }
            }
            Err(e) => {
                warn!("{} unavailable, continuing without it: {}", source, e);
                SourceFetch {
                    source,
                    records: Vec::new(),
                    ok: false,
                }
            }
        }
    }
}

pub fn http_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.http_timeout)
        .user_agent(concat!("startup_hub/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Render a JSON scalar as a string; null, arrays and objects become `None`.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn loose_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(value.as_ref().and_then(scalar_to_string))
}

pub(crate) fn loose_id<'de, D>(de: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    match &value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| serde::de::Error::custom(format!("invalid id: {}", value)))
}

pub(crate) fn loose_string_list<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(match value {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(Value::String(s)) => s
            .split([',', ';'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_fetch_degrades_to_empty() {
        let fetch: SourceFetch<u8> =
            SourceFetch::from_result("content", Err(HubError::unavailable("content", "timeout")));
        assert!(!fetch.ok);
        assert!(fetch.records.is_empty());
    }

    #[test]
    fn successful_fetch_keeps_records() {
        let fetch = SourceFetch::from_result("relational", Ok(vec![1, 2, 3]));
        assert!(fetch.ok);
        assert_eq!(fetch.records, vec![1, 2, 3]);
    }
}
