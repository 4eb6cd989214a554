use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{format_image_url, image_from_value, non_blank};

/// Flat team member shape every consumer works with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMemberRef {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub image_url: Option<String>,
}

impl TeamMemberRef {
    pub fn from_email(email: &str) -> Option<Self> {
        non_blank(Some(email)).map(|e| TeamMemberRef {
            email: Some(e),
            ..Default::default()
        })
    }

    /// Best label for listings: name, then email.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("unknown")
    }
}

/// Team member as delivered by either source. Content entries wrap their
/// attributes in `fields`; relational users are flat; some payloads carry
/// only an email string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTeamMember {
    Content { fields: ContentPerson },
    Relational(RelationalPerson),
    Email(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPerson {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "title")]
    pub role: Option<String>,
    #[serde(alias = "photo")]
    pub image: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationalPerson {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(alias = "imageUrl")]
    pub image_url: Option<String>,
    pub role: Option<String>,
}

impl RawTeamMember {
    pub fn normalize(self) -> Option<TeamMemberRef> {
        let member = match self {
            RawTeamMember::Content { fields } => TeamMemberRef {
                name: non_blank(fields.name.as_deref()),
                email: non_blank(fields.email.as_deref()),
                role: non_blank(fields.role.as_deref()),
                image_url: fields.image.as_ref().and_then(image_from_value),
            },
            RawTeamMember::Relational(p) => {
                let joined = [p.first_name.as_deref(), p.last_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                TeamMemberRef {
                    name: non_blank(p.name.as_deref()).or_else(|| non_blank(Some(joined.as_str()))),
                    email: non_blank(p.email.as_deref()),
                    role: non_blank(p.role.as_deref()),
                    image_url: non_blank(p.image_url.as_deref()).map(|u| format_image_url(&u)),
                }
            }
            RawTeamMember::Email(email) => return TeamMemberRef::from_email(&email),
        };
        (member.name.is_some() || member.email.is_some()).then_some(member)
    }
}

/// Normalize a raw JSON array of mixed-shape members, skipping unusable ones.
pub fn normalize_members(raw: &Value) -> Vec<TeamMemberRef> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|v| serde_json::from_value::<RawTeamMember>(v.clone()).ok())
        .filter_map(RawTeamMember::normalize)
        .collect()
}
