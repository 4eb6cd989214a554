use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{loose_id, loose_string, loose_string_list};
use crate::error::HubError;

pub const SOURCE: &str = "relational";

const PROJECT_FIELDS: &str = "id title short_description long_description competition \
     team_members_emails video_url image_url created_date";

/// Project row as returned by the relational GraphQL API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationalProject {
    #[serde(deserialize_with = "loose_id")]
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub competition: Option<String>,
    #[serde(default, deserialize_with = "loose_string_list")]
    pub team_members_emails: Vec<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub created_date: Option<String>,
}

/// Identity bag handed over by the auth provider and mirrored in the database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    #[serde(alias = "clerkId")]
    pub clerk_id: String,
    pub email: String,
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

pub struct RelationalClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RelationalClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub async fn projects(&self) -> Result<Vec<RelationalProject>, HubError> {
        let query = format!("query Projects {{ projects {{ {} }} }}", PROJECT_FIELDS);
        let rows: Value = self.query(&query, "projects", json!({})).await?;
        Ok(decode_rows(rows))
    }

    pub async fn project(&self, id: i64) -> Result<Option<RelationalProject>, HubError> {
        let query = format!(
            "query Project($id: ID!) {{ project(id: $id) {{ {} }} }}",
            PROJECT_FIELDS
        );
        self.query(&query, "project", json!({ "id": id })).await
    }

    pub async fn projects_by_email(&self, email: &str) -> Result<Vec<RelationalProject>, HubError> {
        let query = format!(
            "query ProjectsByEmail($email: String!) {{ projectsByEmail(email: $email) {{ {} }} }}",
            PROJECT_FIELDS
        );
        let rows: Value = self
            .query(&query, "projectsByEmail", json!({ "email": email }))
            .await?;
        Ok(decode_rows(rows))
    }

    pub async fn user_by_clerk_id(&self, clerk_id: &str) -> Result<Option<UserIdentity>, HubError> {
        let query = "query GetUserByClerkId($clerkId: String!) { \
             getUserByClerkId(clerkId: $clerkId) { clerk_id email first_name last_name image_url } }";
        self.query(query, "getUserByClerkId", json!({ "clerkId": clerk_id }))
            .await
    }

    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        field: &str,
        variables: Value,
    ) -> Result<T, HubError> {
        debug!("GraphQL {} -> {}", field, self.endpoint);
        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| HubError::unavailable(SOURCE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HubError::unavailable(SOURCE, format!("HTTP {}", status)));
        }

        let body: Value = response.json().await?;
        decode_field(body, field)
    }
}

/// Extract `data.<field>` from a GraphQL response body.
///
/// Errors alongside usable data are logged and the data kept; errors with
/// no data make the source unavailable.
pub fn decode_field<T: DeserializeOwned>(body: Value, field: &str) -> Result<T, HubError> {
    let response: GraphqlResponse = serde_json::from_value(body)?;
    let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();

    let value = response
        .data
        .and_then(|mut d| d.get_mut(field).map(Value::take))
        .unwrap_or(Value::Null);

    if !messages.is_empty() {
        if value.is_null() {
            return Err(HubError::unavailable(SOURCE, messages.join("; ")));
        }
        warn!("GraphQL {} returned partial errors: {}", field, messages.join("; "));
    }

    Ok(serde_json::from_value(value)?)
}

/// Decode project rows one at a time; a row that does not fit is logged and
/// dropped without affecting the others.
pub fn decode_rows(value: Value) -> Vec<RelationalProject> {
    let items = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        if !has_integer_id(&item) {
            let reason = format!("relational row without integer id: {}", item);
            warn!("Skipping {}", HubError::MalformedRecord(reason));
            continue;
        }
        match RelationalProject::deserialize(&item) {
            Ok(row) => rows.push(row),
            Err(e) => {
                let reason = format!("relational row {}: {}", item["id"], e);
                warn!("Skipping {}", HubError::MalformedRecord(reason));
            }
        }
    }
    rows
}

fn has_integer_id(v: &Value) -> bool {
    match v.get("id") {
        Some(Value::Number(n)) => n.as_i64().is_some(),
        Some(Value::String(s)) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}
