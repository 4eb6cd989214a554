use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::scalar_to_string;
use crate::config::Config;
use crate::error::HubError;
use crate::projects::team::{normalize_members, TeamMemberRef};
use crate::projects::{image_from_value, non_blank};

pub const SOURCE: &str = "content";

const PROJECT_CONTENT_TYPE: &str = "project";
const PAGE_LIMIT: usize = 1000;
const LINK_DEPTH: usize = 3;

/// Project entry from the content source, flattened out of `fields`/`sys`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentProject {
    pub entry_id: String,
    pub title: Option<String>,
    pub tagline: Option<String>,
    pub about: Option<String>,
    pub competition: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub team_members: Vec<TeamMemberRef>,
    pub created_at: Option<String>,
}

pub struct ContentClient {
    http: reqwest::Client,
    base_url: String,
    space: String,
    environment: String,
    token: String,
}

impl ContentClient {
    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.content_url.trim_end_matches('/').to_string(),
            space: config.content_space.clone(),
            environment: config.content_environment.clone(),
            token: config.content_token.clone(),
        }
    }

    /// `getEntries({contentType, select?, limit?})` against the delivery API.
    pub async fn get_entries(
        &self,
        content_type: &str,
        select: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Value, HubError> {
        if self.space.is_empty() {
            return Err(HubError::unavailable(SOURCE, "HUB_CONTENT_SPACE is not set"));
        }
        let url = format!(
            "{}/spaces/{}/environments/{}/entries",
            self.base_url, self.space, self.environment
        );
        let limit = limit.unwrap_or(PAGE_LIMIT).to_string();
        let mut query = vec![
            ("content_type", content_type),
            ("limit", limit.as_str()),
            ("include", "2"),
        ];
        if let Some(select) = select {
            query.push(("select", select));
        }

        debug!("GET {} content_type={}", url, content_type);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await
            .map_err(|e| HubError::unavailable(SOURCE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HubError::unavailable(SOURCE, format!("HTTP {}", status)));
        }
        Ok(response.json().await?)
    }

    pub async fn projects(&self) -> Result<Vec<ContentProject>, HubError> {
        let body = self.get_entries(PROJECT_CONTENT_TYPE, None, None).await?;
        Ok(parse_projects(&body))
    }
}

/// Turn a `getEntries` body into project records, resolving linked entries
/// and assets from `includes`.
pub fn parse_projects(body: &Value) -> Vec<ContentProject> {
    let Some(items) = body.get("items").and_then(Value::as_array) else {
        warn!("Content response has no items array");
        return Vec::new();
    };
    let includes = collect_includes(body);

    items
        .iter()
        .filter_map(|item| {
            let resolved = resolve_links(item, &includes, LINK_DEPTH);
            parse_entry(&resolved)
        })
        .collect()
}

fn parse_entry(item: &Value) -> Option<ContentProject> {
    let entry_id = item.pointer("/sys/id").and_then(Value::as_str)?.to_string();
    let fields = item.get("fields")?;
    let text = |key: &str| {
        fields
            .get(key)
            .and_then(scalar_to_string)
            .and_then(|s| non_blank(Some(s.as_str())))
    };

    Some(ContentProject {
        entry_id,
        title: text("title").or_else(|| text("name")),
        tagline: text("tagline").or_else(|| text("shortDescription")),
        about: fields.get("about").and_then(plain_text),
        competition: fields.get("competition").and_then(label_of),
        image_url: fields
            .get("image")
            .or_else(|| fields.get("logo"))
            .and_then(image_from_value),
        video_url: text("videoUrl").or_else(|| text("video")),
        team_members: fields
            .get("teamMembers")
            .map(normalize_members)
            .unwrap_or_default(),
        created_at: item
            .pointer("/sys/createdAt")
            .and_then(scalar_to_string)
            .or_else(|| text("createdAt")),
    })
}

/// A competition is either free text or a linked entry with a name/title.
fn label_of(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) => value
            .pointer("/fields/name")
            .or_else(|| value.pointer("/fields/title"))
            .and_then(Value::as_str)
            .and_then(|s| non_blank(Some(s))),
        other => scalar_to_string(other).and_then(|s| non_blank(Some(s.as_str()))),
    }
}

/// Flatten a plain string or a rich-text document into text.
fn plain_text(value: &Value) -> Option<String> {
    fn walk(node: &Value, out: &mut Vec<String>) {
        if node.get("nodeType").and_then(Value::as_str) == Some("text") {
            if let Some(v) = node.get("value").and_then(Value::as_str) {
                out.push(v.to_string());
            }
        }
        if let Some(children) = node.get("content").and_then(Value::as_array) {
            let paragraph = node.get("nodeType").and_then(Value::as_str) == Some("paragraph");
            for child in children {
                walk(child, out);
            }
            if paragraph {
                out.push("\n".to_string());
            }
        }
    }

    match value {
        Value::String(s) => non_blank(Some(s.as_str())),
        Value::Object(_) => {
            let mut parts = Vec::new();
            walk(value, &mut parts);
            non_blank(Some(parts.concat().as_str()))
        }
        _ => None,
    }
}

fn collect_includes(body: &Value) -> HashMap<String, Value> {
    let mut map = HashMap::new();
    for kind in ["Entry", "Asset"] {
        let Some(list) = body.pointer(&format!("/includes/{}", kind)).and_then(Value::as_array)
        else {
            continue;
        };
        for item in list {
            if let Some(id) = item.pointer("/sys/id").and_then(Value::as_str) {
                map.insert(format!("{}:{}", kind, id), item.clone());
            }
        }
    }
    map
}

fn resolve_links(value: &Value, includes: &HashMap<String, Value>, depth: usize) -> Value {
    match value {
        Value::Object(obj) => {
            if let Some(key) = link_key(value) {
                return match includes.get(&key) {
                    Some(target) if depth > 0 => resolve_links(target, includes, depth - 1),
                    Some(target) => target.clone(),
                    None => value.clone(),
                };
            }
            Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.clone(), resolve_links(v, includes, depth)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| resolve_links(v, includes, depth))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn link_key(value: &Value) -> Option<String> {
    let sys = value.get("sys")?;
    if sys.get("type").and_then(Value::as_str) != Some("Link") {
        return None;
    }
    let kind = sys.get("linkType").and_then(Value::as_str)?;
    let id = sys.get("id").and_then(Value::as_str)?;
    Some(format!("{}:{}", kind, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body() -> Value {
        json!({
            "items": [
                {
                    "sys": { "id": "e1", "createdAt": "2024-03-02T12:00:00.000Z" },
                    "fields": {
                        "title": "Acme Bot",
                        "tagline": "A robot startup",
                        "competition": { "sys": { "type": "Link", "linkType": "Entry", "id": "c1" } },
                        "image": { "sys": { "type": "Link", "linkType": "Asset", "id": "a1" } },
                        "about": {
                            "nodeType": "document",
                            "content": [{
                                "nodeType": "paragraph",
                                "content": [{ "nodeType": "text", "value": "We build robots." }]
                            }]
                        },
                        "teamMembers": [
                            { "sys": { "type": "Link", "linkType": "Entry", "id": "p1" } }
                        ]
                    }
                },
                { "sys": { "id": "e2" }, "fields": { "tagline": "untitled" } },
                { "fields": { "title": "No sys" } }
            ],
            "includes": {
                "Entry": [
                    { "sys": { "id": "c1" }, "fields": { "name": "Pitch Summit" } },
                    { "sys": { "id": "p1" }, "fields": { "name": "Jane Doe", "email": "jane@uni.edu" } }
                ],
                "Asset": [
                    { "sys": { "id": "a1" }, "fields": { "file": { "url": "//images.ctfassets.net/acme.png" } } }
                ]
            }
        })
    }

    #[test]
    fn resolves_links_and_flattens_fields() {
        let projects = parse_projects(&body());
        assert_eq!(projects.len(), 2);
        let acme = &projects[0];
        assert_eq!(acme.entry_id, "e1");
        assert_eq!(acme.competition.as_deref(), Some("Pitch Summit"));
        assert_eq!(
            acme.image_url.as_deref(),
            Some("https://images.ctfassets.net/acme.png")
        );
        assert_eq!(acme.about.as_deref(), Some("We build robots."));
        assert_eq!(acme.team_members.len(), 1);
        assert_eq!(acme.team_members[0].email.as_deref(), Some("jane@uni.edu"));
        assert_eq!(acme.created_at.as_deref(), Some("2024-03-02T12:00:00.000Z"));
    }

    #[test]
    fn untitled_entries_survive_parsing() {
        // Title checks belong to the merge; the adapter keeps the entry.
        let projects = parse_projects(&body());
        assert_eq!(projects[1].title, None);
        assert_eq!(projects[1].tagline.as_deref(), Some("untitled"));
    }

    #[test]
    fn unresolved_links_are_left_alone() {
        let body = json!({ "items": [{
            "sys": { "id": "e9" },
            "fields": {
                "title": "Orphan",
                "competition": { "sys": { "type": "Link", "linkType": "Entry", "id": "missing" } }
            }
        }]});
        let projects = parse_projects(&body);
        assert_eq!(projects[0].competition, None);
    }

    #[test]
    fn missing_items_is_empty() {
        assert!(parse_projects(&json!({ "sys": { "type": "Error" } })).is_empty());
    }
}
