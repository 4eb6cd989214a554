use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use super::year::{normalize_year, UNKNOWN_YEAR};
use super::ProjectRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FacetGroup {
    Competition,
    Year,
}

impl fmt::Display for FacetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacetGroup::Competition => write!(f, "Competition"),
            FacetGroup::Year => write!(f, "Year"),
        }
    }
}

impl FromStr for FacetGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "competition" => Ok(FacetGroup::Competition),
            "year" => Ok(FacetGroup::Year),
            other => Err(format!("unknown facet group: {}", other)),
        }
    }
}

/// Selected facet values per group. Values are stored trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    selected: BTreeMap<FacetGroup, BTreeSet<String>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to `group` if absent, remove it if present.
    /// Returns whether the value is selected afterwards. Blank values are ignored.
    pub fn toggle(&mut self, group: FacetGroup, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        let set = self.selected.entry(group).or_default();
        let now_selected = if set.remove(value) {
            false
        } else {
            set.insert(value.to_string());
            true
        };
        if set.is_empty() {
            self.selected.remove(&group);
        }
        now_selected
    }

    pub fn is_selected(&self, group: FacetGroup, value: &str) -> bool {
        self.selected
            .get(&group)
            .is_some_and(|set| set.contains(value.trim()))
    }

    pub fn values(&self, group: FacetGroup) -> impl Iterator<Item = &str> {
        self.selected
            .get(&group)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    fn set(&self, group: FacetGroup) -> Option<&BTreeSet<String>> {
        self.selected.get(&group).filter(|s| !s.is_empty())
    }
}

/// Records passing the text query and every active facet, in input order.
pub fn filter_projects<'a>(
    records: &'a [ProjectRecord],
    query: &str,
    filters: &FilterState,
) -> Vec<&'a ProjectRecord> {
    let needle = query.trim().to_lowercase();
    let competitions = filters.set(FacetGroup::Competition);
    let years = filters.set(FacetGroup::Year);

    records
        .iter()
        .filter(|record| {
            matches_text(record, &needle)
                && competitions.map_or(true, |set| {
                    set.contains(record.competition.as_deref().unwrap_or("").trim())
                })
                && years.map_or(true, |set| set.contains(&record_year(record)))
        })
        .collect()
}

fn matches_text(record: &ProjectRecord, needle: &str) -> bool {
    needle.is_empty() || record.title.trim().to_lowercase().contains(needle)
}

pub fn record_year(record: &ProjectRecord) -> String {
    normalize_year(record.created_at.as_deref().unwrap_or(""))
}

/// Facet values available in a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetOptions {
    pub competitions: Vec<String>,
    /// Newest first; unknown years are left out.
    pub years: Vec<String>,
}

pub fn facet_options(records: &[ProjectRecord]) -> FacetOptions {
    let competitions: BTreeSet<String> = records
        .iter()
        .filter_map(|r| r.competition.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    let years: BTreeSet<String> = records
        .iter()
        .map(record_year)
        .filter(|y| y != UNKNOWN_YEAR)
        .collect();

    FacetOptions {
        competitions: competitions.into_iter().collect(),
        years: years.into_iter().rev().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projects::Provenance;

    fn record(title: &str, competition: Option<&str>, created_at: Option<&str>) -> ProjectRecord {
        ProjectRecord {
            title: title.to_string(),
            slug: crate::projects::slug::slugify(title),
            relational_id: None,
            content_id: None,
            short_description: None,
            long_description: None,
            about: None,
            competition: competition.map(str::to_string),
            image_url: None,
            video_url: None,
            team_members: Vec::new(),
            created_at: created_at.map(str::to_string),
            provenance: Provenance::RelationalOnly,
        }
    }

    fn sample() -> Vec<ProjectRecord> {
        vec![
            record("Acme Bot", Some("Pitch Summit"), Some("2024-05-01")),
            record("Beta App", Some("DeisHacks"), Some("2023-01-01")),
            record("Acme Labs", Some(" DeisHacks "), Some("1700000000")),
            record("Gamma", None, None),
        ]
    }

    fn titles(found: Vec<&ProjectRecord>) -> Vec<&str> {
        found.into_iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn competition_facet_scenario() {
        let records = vec![
            record("Acme Bot", Some("Pitch Summit"), Some("2024-05-01")),
            record("Beta App", Some("DeisHacks"), Some("2023-01-01")),
        ];
        let mut filters = FilterState::new();
        filters.toggle(FacetGroup::Competition, "Pitch Summit");
        assert_eq!(titles(filter_projects(&records, "", &filters)), vec!["Acme Bot"]);
    }

    #[test]
    fn empty_query_and_filters_keep_everything_in_order() {
        let records = sample();
        let found = filter_projects(&records, "   ", &FilterState::new());
        assert_eq!(titles(found), vec!["Acme Bot", "Beta App", "Acme Labs", "Gamma"]);
    }

    #[test]
    fn text_match_is_trimmed_and_case_insensitive() {
        let records = sample();
        let found = filter_projects(&records, "  ACME ", &FilterState::new());
        assert_eq!(titles(found), vec!["Acme Bot", "Acme Labs"]);
    }

    #[test]
    fn text_and_facets_are_anded() {
        let records = sample();
        let mut filters = FilterState::new();
        filters.toggle(FacetGroup::Competition, "DeisHacks");
        assert_eq!(titles(filter_projects(&records, "acme", &filters)), vec!["Acme Labs"]);

        filters.toggle(FacetGroup::Year, "2024");
        assert!(filter_projects(&records, "acme", &filters).is_empty());
    }

    #[test]
    fn year_facet_uses_normalized_year() {
        let records = sample();
        let mut filters = FilterState::new();
        filters.toggle(FacetGroup::Year, "2023");
        assert_eq!(
            titles(filter_projects(&records, "", &filters)),
            vec!["Beta App", "Acme Labs"]
        );
    }

    #[test]
    fn records_without_competition_fail_active_facet() {
        let records = sample();
        let mut filters = FilterState::new();
        filters.toggle(FacetGroup::Competition, "Pitch Summit");
        assert!(!titles(filter_projects(&records, "", &filters)).contains(&"Gamma"));
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut filters = FilterState::new();
        assert!(filters.toggle(FacetGroup::Year, " 2024 "));
        assert!(filters.is_selected(FacetGroup::Year, "2024"));
        assert!(!filters.toggle(FacetGroup::Year, "2024"));
        assert!(filters.is_empty());
        assert!(!filters.toggle(FacetGroup::Year, "  "));
        assert!(filters.is_empty());
    }

    #[test]
    fn values_are_unique_per_group() {
        let mut filters = FilterState::new();
        filters.toggle(FacetGroup::Competition, "DeisHacks");
        filters.toggle(FacetGroup::Competition, "Pitch Summit");
        filters.toggle(FacetGroup::Year, "2024");
        let comps: Vec<&str> = filters.values(FacetGroup::Competition).collect();
        assert_eq!(comps, vec!["DeisHacks", "Pitch Summit"]);
        let years: Vec<&str> = filters.values(FacetGroup::Year).collect();
        assert_eq!(years, vec!["2024"]);
    }

    #[test]
    fn facet_group_parsing() {
        assert_eq!("Competition".parse::<FacetGroup>(), Ok(FacetGroup::Competition));
        assert_eq!(" year".parse::<FacetGroup>(), Ok(FacetGroup::Year));
        assert!("colour".parse::<FacetGroup>().is_err());
    }

    #[test]
    fn options_are_distinct_and_sorted() {
        let options = facet_options(&sample());
        assert_eq!(options.competitions, vec!["DeisHacks", "Pitch Summit"]);
        assert_eq!(options.years, vec!["2024", "2023"]);
    }
}
