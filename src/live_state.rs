//! Per-delivery live match state.
//!
//! A match is processed in two phases. [`emit_rows`] walks innings and deliveries in document
//! order and snapshots the running counters after every ball. [`resolve_chase`] then patches
//! the second-innings chase fields, which depend on the final first-innings total and so can
//! only be filled once every first-innings row exists.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::trace;

use crate::coerce::{
    count, field_mapping, field_sequence, field_text, float_any, int_any, to_mapping,
};
use crate::match_info::{MatchRecord, Season};

pub const BALLS_PER_OVER: u32 = 6;
/// Twenty 6-ball overs.
pub const DEFAULT_INNINGS_BALLS: u32 = 120;
pub const MAX_WICKETS: u32 = 10;

const ILLEGAL_EXTRAS: &[&str] = &["wides", "wide", "noballs", "noball", "nb"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryRow {
    pub match_id: String,
    pub season: Season,
    pub date: String,
    pub city: String,
    pub venue: String,
    /// 1 or 2; 0 for any other innings label, super overs included.
    pub inning: u8,
    pub over: u32,
    pub ball_in_over: u32,
    pub batting_team: String,
    pub bowling_team: String,
    pub striker: String,
    pub non_striker: String,
    pub bowler: String,
    pub runs_off_bat: u32,
    pub extras: u32,
    pub total_runs: u32,
    pub dismissal_kind: String,
    pub player_dismissed: String,
    pub inning_runs_to_date: u32,
    pub inning_wickets_down: u32,
    pub balls_bowled_in_innings: u32,
    pub balls_remaining: u32,
    pub runs_required: Option<u32>,
    pub runs_left: Option<u32>,
    pub wickets_left: u32,
    pub crr: f64,
    pub rrr: Option<f64>,
    pub target: Option<u32>,
    pub is_super_over: bool,
    pub winner: String,
    pub result: String,
}

impl DeliveryRow {
    fn set_chase(&mut self, target: u32) {
        let runs_required = target.saturating_sub(self.inning_runs_to_date);
        self.target = Some(target);
        self.runs_required = Some(runs_required);
        self.runs_left = Some(runs_required);
        self.rrr = (self.balls_remaining > 0).then(|| {
            let overs_remaining = f64::from(self.balls_remaining) / f64::from(BALLS_PER_OVER);
            round3(f64::from(runs_required) / overs_remaining)
        });
    }

    fn clear_chase(&mut self) {
        self.target = None;
        self.runs_required = None;
        self.runs_left = None;
        self.rrr = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallKey {
    pub over: u32,
    pub ball: u32,
}

/// Parses a delivery key. `"over.ball"` is read as two integers; otherwise the key is read as
/// a float whose first decimal digit is the ball. Anything else is over 0, ball 0.
pub fn parse_ball_key(raw: &str) -> BallKey {
    let raw = raw.trim();
    if let Some((over, ball)) = raw.split_once('.')
        && !ball.contains('.')
        && let (Ok(over), Ok(ball)) = (over.parse::<u32>(), ball.parse::<u32>())
    {
        return BallKey { over, ball };
    }

    let Some(value) = raw.parse::<f64>().ok().filter(|v| v.is_finite()) else {
        trace!(key = raw, "unparseable ball key");
        return BallKey { over: 0, ball: 0 };
    };
    let over = value.trunc();
    let ball = ((value - over) * 10.0).round_ties_even();
    if over < 0.0 || ball < 0.0 || over > f64::from(u32::MAX) {
        return BallKey { over: 0, ball: 0 };
    }
    BallKey {
        over: over as u32,
        ball: ball as u32,
    }
}

/// Innings number from its label. Super overs are never numbered 1 or 2, so they cannot
/// stand in for the first-innings total of the chase.
pub fn inning_number(label: &str) -> u8 {
    let label = label.to_lowercase();
    if label.contains("super over") {
        0
    } else if label.contains("1st") {
        1
    } else if label.contains("2nd") {
        2
    } else {
        0
    }
}

pub fn is_super_over(label: &str) -> bool {
    label.to_lowercase().contains("super over")
}

/// Legal balls allotted to one innings: `round(overs * 6)` when the innings declares its
/// overs, otherwise [`DEFAULT_INNINGS_BALLS`].
pub fn innings_budget(innings: &Map<String, Value>) -> u32 {
    innings
        .get("overs")
        .filter(|v| !v.is_null())
        .and_then(float_any)
        .map(|overs| (overs * f64::from(BALLS_PER_OVER)).round_ties_even())
        .map(|balls| balls.clamp(0.0, f64::from(u32::MAX)) as u32)
        .unwrap_or(DEFAULT_INNINGS_BALLS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliveryRuns {
    pub runs_off_bat: u32,
    pub extras: u32,
    pub total: u32,
}

pub fn resolve_runs(runs: &Map<String, Value>) -> DeliveryRuns {
    let extras = count(runs.get("extras"));
    let explicit_total = runs.get("total").and_then(int_any);
    let bat = runs
        .get("batsman")
        .or_else(|| runs.get("batter"))
        .filter(|v| !v.is_null());
    let runs_off_bat = match bat {
        Some(value) => count(Some(value)),
        None => non_negative(explicit_total.unwrap_or(0) - i64::from(extras)),
    };
    // A zero total defers to the components.
    let total = match explicit_total {
        Some(total) if total > 0 => non_negative(total),
        _ => runs_off_bat.saturating_add(extras),
    };
    DeliveryRuns {
        runs_off_bat,
        extras,
        total,
    }
}

/// Wides and no-balls do not use up a ball of the over. An explicit extras breakdown decides;
/// without one, extras with no runs off the bat are assumed to be a wide or no-ball. That
/// assumption misreads bye-only deliveries in sources that omit the breakdown.
pub fn is_illegal(breakdown: &Map<String, Value>, runs: &DeliveryRuns) -> bool {
    if breakdown.is_empty() {
        return runs.extras > 0 && runs.runs_off_bat == 0;
    }
    ILLEGAL_EXTRAS.iter().any(|key| breakdown.contains_key(*key))
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dismissal {
    pub kind: String,
    pub player_out: String,
}

pub fn resolve_dismissal(delivery: &Map<String, Value>) -> Dismissal {
    let wickets = field_sequence(delivery, "wickets");
    let mut wicket = field_mapping(delivery, "wicket");
    if wicket.is_empty()
        && let Some(first) = wickets.first()
    {
        wicket = to_mapping(first);
    }
    Dismissal {
        kind: field_text(&wicket, "kind"),
        player_out: field_text(&wicket, "player_out"),
    }
}

/// Running counters for one innings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InningsState {
    pub budget: u32,
    pub runs: u32,
    pub wickets: u32,
    pub legal_balls: u32,
}

impl InningsState {
    pub fn new(budget: u32) -> Self {
        Self {
            budget,
            runs: 0,
            wickets: 0,
            legal_balls: 0,
        }
    }

    pub fn record(&mut self, legal: bool, dismissed: bool, total_runs: u32) {
        if legal {
            self.legal_balls += 1;
        }
        if dismissed {
            self.wickets += 1;
        }
        self.runs = self.runs.saturating_add(total_runs);
    }

    pub fn balls_remaining(&self) -> u32 {
        self.budget.saturating_sub(self.legal_balls)
    }

    pub fn wickets_left(&self) -> u32 {
        MAX_WICKETS.saturating_sub(self.wickets)
    }

    pub fn overs_completed(&self) -> f64 {
        f64::from(self.legal_balls / BALLS_PER_OVER)
            + f64::from(self.legal_balls % BALLS_PER_OVER) / f64::from(BALLS_PER_OVER)
    }

    pub fn current_run_rate(&self) -> f64 {
        let overs = self.overs_completed();
        if overs > 0.0 {
            round3(f64::from(self.runs) / overs)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackerStats {
    pub innings: usize,
    pub deliveries: usize,
    pub illegal: usize,
    pub super_over: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedMatch {
    pub rows: Vec<DeliveryRow>,
    pub stats: TrackerStats,
}

/// Runs both phases for one match.
pub fn track_match(doc: &Value, record: &MatchRecord) -> TrackedMatch {
    let mut tracked = emit_rows(doc, record);
    resolve_chase(&mut tracked.rows, record);
    tracked
}

/// First phase: one row per delivery in document order, chase fields left unresolved.
pub fn emit_rows(doc: &Value, record: &MatchRecord) -> TrackedMatch {
    let doc = to_mapping(doc);
    let mut rows = Vec::new();
    let mut stats = TrackerStats::default();

    for entry in field_sequence(&doc, "innings").iter() {
        for (label, data) in to_mapping(entry).iter() {
            let innings = to_mapping(data);
            let inning = inning_number(label);
            let super_over = is_super_over(label);
            let batting_team = field_text(&innings, "team");
            let mut state = InningsState::new(innings_budget(&innings));
            stats.innings += 1;

            for ball in field_sequence(&innings, "deliveries").iter() {
                for (key, raw) in to_mapping(ball).iter() {
                    let delivery = to_mapping(raw);
                    let key = parse_ball_key(key);
                    let runs = resolve_runs(&field_mapping(&delivery, "runs"));
                    let dismissal = resolve_dismissal(&delivery);
                    let illegal = is_illegal(&field_mapping(&delivery, "extras"), &runs);

                    state.record(!illegal, !dismissal.kind.is_empty(), runs.total);
                    stats.deliveries += 1;
                    stats.illegal += usize::from(illegal);
                    stats.super_over += usize::from(super_over);

                    rows.push(DeliveryRow {
                        match_id: record.match_id.clone(),
                        season: record.season.clone(),
                        date: record.date.clone(),
                        city: record.city.clone(),
                        venue: record.venue.clone(),
                        inning,
                        over: key.over,
                        ball_in_over: key.ball,
                        batting_team: batting_team.clone(),
                        bowling_team: String::new(),
                        striker: participant(&delivery, &["batsman", "batter"]),
                        non_striker: participant(&delivery, &["non_striker"]),
                        bowler: participant(&delivery, &["bowler", "bowling"]),
                        runs_off_bat: runs.runs_off_bat,
                        extras: runs.extras,
                        total_runs: runs.total,
                        dismissal_kind: dismissal.kind,
                        player_dismissed: dismissal.player_out,
                        inning_runs_to_date: state.runs,
                        inning_wickets_down: state.wickets,
                        balls_bowled_in_innings: state.legal_balls,
                        balls_remaining: state.balls_remaining(),
                        runs_required: None,
                        runs_left: None,
                        wickets_left: state.wickets_left(),
                        crr: state.current_run_rate(),
                        rrr: None,
                        target: None,
                        is_super_over: super_over,
                        winner: record.winner.clone(),
                        result: record.result.clone(),
                    });
                }
            }
        }
    }

    TrackedMatch { rows, stats }
}

/// Second phase: infers the bowling side for every row and fills the chase fields of
/// second-innings rows from the last first-innings row. Without any first-innings row the
/// chase fields stay unresolved for the whole match.
pub fn resolve_chase(rows: &mut [DeliveryRow], record: &MatchRecord) {
    let first_innings_total = rows
        .iter()
        .rev()
        .find(|row| row.inning == 1)
        .map(|row| row.inning_runs_to_date);

    for row in rows.iter_mut() {
        row.bowling_team = record.other_team(&row.batting_team);
        match (row.inning, first_innings_total) {
            (2, Some(total)) => row.set_chase(total.saturating_add(1)),
            _ => row.clear_chase(),
        }
    }
}

fn participant(delivery: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| field_text(delivery, key))
        .find(|name| !name.is_empty())
        .unwrap_or_default()
}

fn non_negative(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

/// Rounds to 3 decimals, ties to even.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round_ties_even() / 1000.0
}
