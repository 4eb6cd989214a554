pub mod filter;
pub mod merge;
pub mod slug;
pub mod team;
pub mod year;

use serde::Serialize;
use serde_json::Value;

use team::TeamMemberRef;

/// Which upstream source(s) contributed to a merged record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Provenance {
    RelationalOnly,
    ContentOnly,
    Merged,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::RelationalOnly => "relational",
            Provenance::ContentOnly => "content",
            Provenance::Merged => "merged",
        }
    }
}

/// A project as seen by listings, unified across both sources.
///
/// `slug` is derived from `title` on every merge and is never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRecord {
    pub title: String,
    pub slug: String,
    pub relational_id: Option<i64>,
    pub content_id: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub about: Option<String>,
    pub competition: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub team_members: Vec<TeamMemberRef>,
    pub created_at: Option<String>,
    pub provenance: Provenance,
}

/// Rewrite protocol-relative URLs (`//host/x`) to `https://host/x`.
pub fn format_image_url(url: &str) -> String {
    let url = url.trim();
    match url.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

/// Pull an image URL out of a plain string, a `{url}` object or a content
/// asset (`{fields: {file: {url}}}`).
pub fn image_from_value(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(_) => value
            .pointer("/fields/file/url")
            .or_else(|| value.get("url"))
            .and_then(Value::as_str),
        _ => None,
    };
    non_blank(raw).map(|u| format_image_url(&u))
}

/// Trimmed owned copy, or `None` when absent or blank.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn protocol_relative_images() {
        assert_eq!(
            format_image_url("//images.ctfassets.net/a/b.png"),
            "https://images.ctfassets.net/a/b.png"
        );
        assert_eq!(format_image_url("http://x.io/a.png"), "http://x.io/a.png");
    }

    #[test]
    fn image_shapes() {
        assert_eq!(
            image_from_value(&json!({"fields": {"file": {"url": "//cdn/x.jpg"}}})).as_deref(),
            Some("https://cdn/x.jpg")
        );
        assert_eq!(
            image_from_value(&json!({"url": "https://cdn/y.jpg"})).as_deref(),
            Some("https://cdn/y.jpg")
        );
        assert_eq!(image_from_value(&json!("  ")), None);
        assert_eq!(image_from_value(&json!(42)), None);
    }
}
