use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::live_state::DeliveryRow;
use crate::match_info::{MatchRecord, Season};

/// Internal column names, in the order [`delivery_cells`] produces them.
pub const DELIVERY_COLUMNS: &[&str] = &[
    "match_id",
    "season",
    "date",
    "city",
    "venue",
    "inning",
    "over",
    "ball_in_over",
    "batting_team",
    "bowling_team",
    "striker",
    "non_striker",
    "bowler",
    "runs_off_bat",
    "extras",
    "total_runs",
    "dismissal_kind",
    "player_dismissed",
    "inning_runs_to_date",
    "inning_wickets_down",
    "balls_bowled_in_innings",
    "balls_remaining",
    "runs_required",
    "runs_left",
    "wickets_left",
    "crr",
    "rrr",
    "target",
    "is_super_over",
    "winner",
    "result",
    "team1",
    "team2",
    "toss_winner",
    "toss_decision",
    "won_by_runs",
    "won_by_wickets",
    "player_of_match",
    "umpire1",
    "umpire2",
];

pub const CONSUMER_RENAMES: &[(&str, &str)] = &[
    ("balls_remaining", "balls_left"),
    ("runs_left", "run_left"),
    ("wickets_left", "wicketsleft"),
    ("total_runs", "total_runs_off_delivery"),
];

/// `(source, alias)`: the alias column duplicates the source column.
pub const ALIASES: &[(&str, &str)] = &[("inning_runs_to_date", "inning_total_runs")];

pub const PREFERRED_COLUMNS: &[&str] = &[
    "match_id",
    "season",
    "date",
    "city",
    "venue",
    "inning",
    "over",
    "ball_in_over",
    "batting_team",
    "bowling_team",
    "striker",
    "non_striker",
    "bowler",
    "runs_off_bat",
    "total_runs_off_delivery",
    "extras",
    "inning_total_runs",
    "balls_bowled_in_innings",
    "balls_left",
    "target",
    "run_left",
    "runs_required",
    "wicketsleft",
    "crr",
    "rrr",
    "dismissal_kind",
    "player_dismissed",
    "is_super_over",
    "winner",
    "result",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    /// Not applicable; distinct from zero.
    Missing,
}

impl Cell {
    pub fn render(&self, missing: &str) -> String {
        match self {
            Cell::Int(v) => v.to_string(),
            Cell::Float(v) => format_float(*v),
            Cell::Text(v) => v.clone(),
            Cell::Bool(true) => "True".to_string(),
            Cell::Bool(false) => "False".to_string(),
            Cell::Missing => missing.to_string(),
        }
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Int(i64::from(value))
    }
}

impl From<u8> for Cell {
    fn from(value: u8) -> Self {
        Cell::Int(i64::from(value))
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<&Season> for Cell {
    fn from(value: &Season) -> Self {
        match value {
            Season::Year(year) => Cell::Int(*year),
            Season::Label(label) => Cell::Text(label.clone()),
            Season::Unknown => Cell::Text(String::new()),
        }
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Missing)
    }
}

fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// One row's cells in [`DELIVERY_COLUMNS`] order.
pub fn delivery_cells(row: &DeliveryRow, record: &MatchRecord) -> Vec<Cell> {
    vec![
        row.match_id.as_str().into(),
        (&row.season).into(),
        row.date.as_str().into(),
        row.city.as_str().into(),
        row.venue.as_str().into(),
        row.inning.into(),
        row.over.into(),
        row.ball_in_over.into(),
        row.batting_team.as_str().into(),
        row.bowling_team.as_str().into(),
        row.striker.as_str().into(),
        row.non_striker.as_str().into(),
        row.bowler.as_str().into(),
        row.runs_off_bat.into(),
        row.extras.into(),
        row.total_runs.into(),
        row.dismissal_kind.as_str().into(),
        row.player_dismissed.as_str().into(),
        row.inning_runs_to_date.into(),
        row.inning_wickets_down.into(),
        row.balls_bowled_in_innings.into(),
        row.balls_remaining.into(),
        row.runs_required.into(),
        row.runs_left.into(),
        row.wickets_left.into(),
        row.crr.into(),
        row.rrr.into(),
        row.target.into(),
        row.is_super_over.into(),
        row.winner.as_str().into(),
        row.result.as_str().into(),
        record.team1.as_str().into(),
        record.team2.as_str().into(),
        record.toss_winner.as_str().into(),
        record.toss_decision.as_str().into(),
        record.won_by_runs.into(),
        record.won_by_wickets.into(),
        record.player_of_match.as_str().into(),
        record.umpire1.as_str().into(),
        record.umpire2.as_str().into(),
    ]
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn deliveries() -> Self {
        Self::new(DELIVERY_COLUMNS)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends one row. Short rows are padded with [`Cell::Missing`], long rows truncated.
    pub fn push(&mut self, mut cells: Vec<Cell>) {
        cells.resize(self.columns.len(), Cell::Missing);
        self.rows.push(cells);
    }

    pub fn push_delivery(&mut self, row: &DeliveryRow, record: &MatchRecord) {
        self.push(delivery_cells(row, record));
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    pub fn rename_columns(&mut self, renames: &[(&str, &str)]) {
        for column in &mut self.columns {
            if let Some((_, to)) = renames.iter().find(|(from, _)| column.as_str() == *from) {
                *column = to.to_string();
            }
        }
    }

    /// Adds `alias` as a copy of `source`. No-op when `source` is absent.
    pub fn add_alias(&mut self, source: &str, alias: &str) {
        let Some(idx) = self.column_index(source) else {
            return;
        };
        self.columns.push(alias.to_string());
        for row in &mut self.rows {
            let value = row[idx].clone();
            row.push(value);
        }
    }

    /// Moves the `preferred` columns that exist to the front, in that order; the remaining
    /// columns follow in their current order.
    pub fn reorder(&mut self, preferred: &[&str]) {
        let mut order: Vec<usize> = preferred
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        order.extend(
            (0..self.columns.len()).filter(|idx| !preferred.contains(&self.columns[*idx].as_str())),
        );

        self.columns = order.iter().map(|idx| self.columns[*idx].clone()).collect();
        for row in &mut self.rows {
            *row = order.iter().map(|idx| row[*idx].clone()).collect();
        }
    }

    /// Applies the consumer-facing names, alias columns and column order.
    pub fn finalize(&mut self) {
        self.rename_columns(CONSUMER_RENAMES);
        for (source, alias) in ALIASES {
            self.add_alias(source, alias);
        }
        self.reorder(PREFERRED_COLUMNS);
    }

    pub fn write_csv_to<W: Write>(&self, writer: W, missing: &str) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(&self.columns).context("write csv header")?;
        for row in &self.rows {
            out.write_record(row.iter().map(|cell| cell.render(missing)))
                .context("write csv row")?;
        }
        out.flush().context("flush csv")?;
        Ok(())
    }

    /// Writes the table next to `path` and swaps it into place.
    pub fn write_csv(&self, path: &Path, missing: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let tmp = path.with_extension("csv.tmp");
        let file =
            fs::File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
        self.write_csv_to(std::io::BufWriter::new(file), missing)?;
        fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
        Ok(())
    }
}
