use thiserror::Error;

/// Failures raised by the source adapters and the merge input checks.
///
/// None of these reach the listing as a hard failure: adapters degrade to an
/// empty list and malformed records are skipped.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("source '{source_name}' is unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Decode(#[from] serde_json::Error),
}

impl HubError {
    pub fn unavailable(source_name: &str, reason: impl Into<String>) -> Self {
        HubError::SourceUnavailable {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }
}
