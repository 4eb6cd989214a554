use std::collections::HashMap;

use tracing::{debug, warn};

use super::slug::slugify;
use super::team::TeamMemberRef;
use super::{format_image_url, non_blank, ProjectRecord, Provenance};
use crate::error::HubError;
use crate::sources::content::ContentProject;
use crate::sources::relational::RelationalProject;

/// Reconcile both sources into one record per slug.
///
/// Relational rows go in first; content entries with a matching slug are
/// layered on top without clearing anything they leave blank. Records whose
/// title is missing (or slugifies to nothing) are skipped.
pub fn merge(
    relational: &[RelationalProject],
    content: &[ContentProject],
) -> HashMap<String, ProjectRecord> {
    let mut merged: HashMap<String, ProjectRecord> = HashMap::new();

    for row in relational {
        let Some((title, slug)) = identity(row.title.as_deref()) else {
            let reason = format!("relational project {} has no title", row.id);
            warn!("Skipping {}", HubError::MalformedRecord(reason));
            continue;
        };
        if merged.contains_key(&slug) {
            debug!("Relational project {} replaces an earlier row for '{}'", row.id, slug);
        }
        merged.insert(slug.clone(), from_relational(row, title, slug));
    }

    for entry in content {
        let Some((title, slug)) = identity(entry.title.as_deref()) else {
            let reason = format!("content entry {} has no title", entry.entry_id);
            warn!("Skipping {}", HubError::MalformedRecord(reason));
            continue;
        };
        match merged.get_mut(&slug) {
            Some(existing) => overlay(existing, entry),
            None => {
                merged.insert(slug.clone(), from_content(entry, title, slug));
            }
        }
    }

    merged
}

/// Merged records as a list ordered by title, for display.
pub fn into_listing(merged: HashMap<String, ProjectRecord>) -> Vec<ProjectRecord> {
    let mut listing: Vec<ProjectRecord> = merged.into_values().collect();
    listing.sort_by(|a, b| {
        a.title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.slug.cmp(&b.slug))
    });
    listing
}

fn identity(title: Option<&str>) -> Option<(String, String)> {
    let title = non_blank(title)?;
    let slug = slugify(&title);
    (!slug.is_empty()).then_some((title, slug))
}

fn from_relational(row: &RelationalProject, title: String, slug: String) -> ProjectRecord {
    ProjectRecord {
        title,
        slug,
        relational_id: Some(row.id),
        content_id: None,
        short_description: non_blank(row.short_description.as_deref()),
        long_description: non_blank(row.long_description.as_deref()),
        about: None,
        competition: non_blank(row.competition.as_deref()),
        image_url: non_blank(row.image_url.as_deref()).map(|u| format_image_url(&u)),
        video_url: non_blank(row.video_url.as_deref()),
        team_members: row
            .team_members_emails
            .iter()
            .filter_map(|e| TeamMemberRef::from_email(e))
            .collect(),
        created_at: non_blank(row.created_date.as_deref()),
        provenance: Provenance::RelationalOnly,
    }
}

fn from_content(entry: &ContentProject, title: String, slug: String) -> ProjectRecord {
    ProjectRecord {
        title,
        slug,
        relational_id: None,
        content_id: Some(entry.entry_id.clone()),
        short_description: non_blank(entry.tagline.as_deref()),
        long_description: None,
        about: non_blank(entry.about.as_deref()),
        competition: non_blank(entry.competition.as_deref()),
        image_url: non_blank(entry.image_url.as_deref()).map(|u| format_image_url(&u)),
        video_url: non_blank(entry.video_url.as_deref()),
        team_members: entry.team_members.clone(),
        created_at: non_blank(entry.created_at.as_deref()),
        provenance: Provenance::ContentOnly,
    }
}

fn overlay(existing: &mut ProjectRecord, entry: &ContentProject) {
    fill(&mut existing.short_description, entry.tagline.as_deref());
    fill(&mut existing.about, entry.about.as_deref());
    fill(&mut existing.competition, entry.competition.as_deref());
    fill(&mut existing.video_url, entry.video_url.as_deref());

    // Editorial publish date and curated imagery win whenever supplied.
    if let Some(created) = non_blank(entry.created_at.as_deref()) {
        existing.created_at = Some(created);
    }
    if let Some(image) = non_blank(entry.image_url.as_deref()) {
        existing.image_url = Some(format_image_url(&image));
    }

    if existing.team_members.is_empty() {
        existing.team_members = entry.team_members.clone();
    }
    if existing.content_id.is_none() {
        existing.content_id = Some(entry.entry_id.clone());
    }
    existing.provenance = match existing.provenance {
        Provenance::ContentOnly => Provenance::ContentOnly,
        Provenance::RelationalOnly | Provenance::Merged => Provenance::Merged,
    };
}

/// Set `slot` from `incoming` only when `slot` is empty and `incoming` is not.
fn fill(slot: &mut Option<String>, incoming: Option<&str>) {
    if slot.is_none() {
        *slot = non_blank(incoming);
    }
}
