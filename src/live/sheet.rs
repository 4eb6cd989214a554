use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::csv::split_line;
use super::{CoordinatorInfo, GroupInfo, JudgeInfo, LiveSheet, Meeting, GROUP_PALETTE};

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());

const GROUP_COLUMNS: usize = 11;
const COORDINATOR_COLUMNS: usize = 3;
const JUDGE_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Groups,
    Coordinators,
    Judges,
}

/// Parse a CSV export with `Groups`, `Coordinators` and `Judges` sections.
///
/// Each section marker is followed by optional blank rows, one label row and
/// more optional blank rows; data then runs until a blank row or the next
/// marker. Rows outside any section are skipped. Never fails: short rows are
/// padded with empty cells.
pub fn parse_sheet(text: &str) -> LiveSheet {
    let rows: Vec<Vec<String>> = text.lines().map(split_line).collect();
    let mut sheet = LiveSheet::default();
    let mut i = 0;

    while i < rows.len() {
        let Some(section) = section_marker(&rows[i]) else {
            if !is_blank(&rows[i]) {
                debug!("Skipping row {} outside any section: {:?}", i + 1, rows[i][0]);
            }
            i += 1;
            continue;
        };

        let start = skip_preamble(&rows, i + 1);
        let end = data_end(&rows, start);
        let data = &rows[start..end];
        match section {
            Section::Groups => sheet.groups.extend(parse_groups(data)),
            Section::Coordinators => sheet.coordinators.extend(parse_coordinators(data)),
            Section::Judges => sheet.judges.extend(parse_judges(data)),
        }
        i = end.max(i + 1);
    }

    sheet
}

fn section_marker(row: &[String]) -> Option<Section> {
    let first = row.first()?.to_lowercase();
    match first.as_str() {
        "groups" => Some(Section::Groups),
        "coordinators" => Some(Section::Coordinators),
        "judges" => Some(Section::Judges),
        _ => None,
    }
}

fn is_blank(row: &[String]) -> bool {
    row.first().map_or(true, |c| c.is_empty())
}

/// Skip blank rows, exactly one label row, then blank rows again.
fn skip_preamble(rows: &[Vec<String>], mut j: usize) -> usize {
    while j < rows.len() && is_blank(&rows[j]) {
        j += 1;
    }
    if j < rows.len() && section_marker(&rows[j]).is_none() {
        j += 1;
    }
    while j < rows.len() && is_blank(&rows[j]) {
        j += 1;
    }
    j
}

fn data_end(rows: &[Vec<String>], start: usize) -> usize {
    rows[start..]
        .iter()
        .position(|r| is_blank(r) || section_marker(r).is_some())
        .map_or(rows.len(), |offset| start + offset)
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

fn note_short(row: &[String], expected: usize, what: &str) {
    if row.len() < expected {
        debug!(
            "{} row '{}' has {} of {} columns, padding with blanks",
            what,
            cell(row, 0),
            row.len(),
            expected
        );
    }
}

fn parse_groups(data: &[Vec<String>]) -> Vec<GroupInfo> {
    data.iter()
        .map(|row| {
            note_short(row, GROUP_COLUMNS, "Group");
            let name = cell(row, 0).to_string();
            GroupInfo {
                color: group_color(&name).to_string(),
                project: cell(row, 1).to_string(),
                members: cell(row, 2)
                    .split(';')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect(),
                breakout_room: cell(row, 3).to_string(),
                hub_coordinator_1: cell(row, 4).to_string(),
                hub_coordinator_2: cell(row, 5).to_string(),
                hub_times_1: cell(row, 6).to_string(),
                hub_times_2: cell(row, 7).to_string(),
                hub_name: cell(row, 8).to_string(),
                judge: cell(row, 9).to_string(),
                judge_room: cell(row, 10).to_string(),
                name,
            }
        })
        .collect()
}

/// Consecutive rows with the same name accumulate meetings on one coordinator.
fn parse_coordinators(data: &[Vec<String>]) -> Vec<CoordinatorInfo> {
    let mut out = Vec::new();
    let mut current: Option<CoordinatorInfo> = None;

    for row in data {
        note_short(row, COORDINATOR_COLUMNS, "Coordinator");
        let name = cell(row, 0);
        if current.as_ref().map_or(true, |c| c.name != name) {
            out.extend(current.take());
            current = Some(CoordinatorInfo {
                name: name.to_string(),
                meetings: Vec::new(),
            });
        }

        let (place, times) = (cell(row, 1), cell(row, 2));
        if let Some(coordinator) = current.as_mut() {
            if !place.is_empty() && !times.is_empty() {
                coordinator.meetings.push(Meeting {
                    place: place.to_string(),
                    times: times.to_string(),
                });
            }
        }
    }

    out.extend(current);
    out
}

fn parse_judges(data: &[Vec<String>]) -> Vec<JudgeInfo> {
    data.iter()
        .map(|row| {
            note_short(row, JUDGE_COLUMNS, "Judge");
            JudgeInfo {
                name: cell(row, 0).to_string(),
                room: cell(row, 1).to_string(),
                time: cell(row, 2).to_string(),
            }
        })
        .collect()
}

/// Palette entry for the first number in a group name, or the first color.
pub fn group_color(name: &str) -> &'static str {
    let idx = DIGITS_RE
        .find(name)
        .map(|m| {
            m.as_str()
                .bytes()
                .fold(0usize, |acc, b| (acc * 10 + usize::from(b - b'0')) % GROUP_PALETTE.len())
        })
        .unwrap_or(0);
    GROUP_PALETTE[idx]
}

// ── Tests ──
