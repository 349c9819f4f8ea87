use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::coerce::{
    count, field_mapping, field_sequence, field_text, first_text, int_any, text, to_mapping,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Season {
    Year(i64),
    /// Seasons that do not cast to a year, e.g. `"2007/08"`.
    Label(String),
    Unknown,
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Year(year) => write!(f, "{year}"),
            Season::Label(label) => f.write_str(label),
            Season::Unknown => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub match_id: String,
    pub season: Season,
    pub date: String,
    pub city: String,
    pub venue: String,
    pub team1: String,
    pub team2: String,
    pub toss_winner: String,
    pub toss_decision: String,
    pub winner: String,
    pub result: String,
    pub won_by_runs: u32,
    pub won_by_wickets: u32,
    pub player_of_match: String,
    pub umpire1: String,
    pub umpire2: String,
}

impl MatchRecord {
    pub fn teams(&self) -> [&str; 2] {
        [self.team1.as_str(), self.team2.as_str()]
    }

    /// The fielding side for `batting`. Empty when `batting` is not one of the listed teams.
    pub fn other_team(&self, batting: &str) -> String {
        if batting.is_empty() || !self.teams().contains(&batting) {
            return String::new();
        }
        self.teams()
            .into_iter()
            .find(|team| !team.is_empty() && *team != batting)
            .unwrap_or_default()
            .to_string()
    }
}

/// Builds the match record for one decoded document. Never fails; absent or malformed
/// fields come out empty or zero.
pub fn parse_match_info(doc: &Value) -> MatchRecord {
    let doc = to_mapping(doc);
    let info = field_mapping(&doc, "info");

    let dates = field_sequence(&info, "dates");
    let date = first_text(&dates, 0);
    let season = resolve_season(&info, &date);

    let teams = field_sequence(&info, "teams");
    let team1 = first_text(&teams, 0);
    let team2 = first_text(&teams, 1);

    let toss = field_mapping(&info, "toss");
    let outcome = field_mapping(&info, "outcome");
    let winner = field_text(&outcome, "winner");
    let result = match field_text(&outcome, "result") {
        explicit if !explicit.is_empty() => explicit,
        _ if !winner.is_empty() => "normal".to_string(),
        _ => String::new(),
    };
    let margin_by = field_mapping(&outcome, "by");
    let won_by_runs = margin(&outcome, &margin_by, "runs");
    let won_by_wickets = margin(&outcome, &margin_by, "wickets");

    let umpires = field_sequence(&info, "umpires");
    let mut record = MatchRecord {
        match_id: String::new(),
        season,
        date,
        city: field_text(&info, "city"),
        venue: field_text(&info, "venue"),
        team1,
        team2,
        toss_winner: field_text(&toss, "winner"),
        toss_decision: field_text(&toss, "decision"),
        winner,
        result,
        won_by_runs,
        won_by_wickets,
        player_of_match: player_of_match(info.get("player_of_match")),
        umpire1: first_text(&umpires, 0),
        umpire2: first_text(&umpires, 1),
    };
    record.match_id = explicit_match_id(&info).unwrap_or_else(|| composite_match_id(&record));
    record
}

fn resolve_season(info: &Map<String, Value>, date: &str) -> Season {
    if let Some(raw) = info.get("season") {
        if let Some(year) = int_any(raw) {
            return Season::Year(year);
        }
        let label = text(Some(raw));
        if !label.is_empty() {
            return Season::Label(label);
        }
    }
    if date.is_empty() {
        return Season::Unknown;
    }
    date.split('-')
        .next()
        .and_then(|year| year.trim().parse::<i64>().ok())
        .map(Season::Year)
        .unwrap_or(Season::Unknown)
}

fn margin(outcome: &Map<String, Value>, by: &Map<String, Value>, key: &str) -> u32 {
    match outcome.get(key) {
        Some(value) if !value.is_null() => count(Some(value)),
        _ => count(by.get(key)),
    }
}

fn player_of_match(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| text(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        other => text(other),
    }
}

/// The first id field that is set. Numeric zero and the empty string count as unset; the
/// string `"0"` is a real id.
fn explicit_match_id(info: &Map<String, Value>) -> Option<String> {
    ["match_id", "id", "match_number"]
        .iter()
        .filter_map(|key| info.get(*key))
        .filter(|value| match value {
            Value::Number(n) => n.as_f64() != Some(0.0),
            _ => true,
        })
        .map(|value| text(Some(value)))
        .find(|id| !id.is_empty())
}

fn composite_match_id(record: &MatchRecord) -> String {
    format!(
        "{}_{}_vs_{}_{}",
        record.season, record.team1, record.team2, record.date
    )
}
