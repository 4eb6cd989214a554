pub mod csv;
pub mod poll;
pub mod sheet;

use serde::Serialize;

/// Background colors handed out to groups by the number in their name.
pub const GROUP_PALETTE: [&str; 12] = [
    "#FDE68A", "#BFDBFE", "#C7D2FE", "#FBCFE8", "#BBF7D0", "#FED7AA",
    "#DDD6FE", "#A5F3FC", "#FECACA", "#D9F99D", "#E5E7EB", "#F5D0FE",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupInfo {
    pub name: String,
    pub project: String,
    pub members: Vec<String>,
    pub breakout_room: String,
    pub hub_coordinator_1: String,
    pub hub_coordinator_2: String,
    pub hub_times_1: String,
    pub hub_times_2: String,
    pub hub_name: String,
    pub judge: String,
    pub judge_room: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Meeting {
    pub place: String,
    pub times: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoordinatorInfo {
    pub name: String,
    pub meetings: Vec<Meeting>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JudgeInfo {
    pub name: String,
    pub room: String,
    pub time: String,
}

/// Everything parsed from one export of the live sheet. Rebuilt on every poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiveSheet {
    pub groups: Vec<GroupInfo>,
    pub coordinators: Vec<CoordinatorInfo>,
    pub judges: Vec<JudgeInfo>,
}

impl LiveSheet {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.coordinators.is_empty() && self.judges.is_empty()
    }
}
