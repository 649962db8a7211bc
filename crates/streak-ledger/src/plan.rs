//! The plan document: a list of tables, each one header row plus seven data
//! rows (one ISO week). Columns are resolved by case-insensitive header text,
//! never by fixed position.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Required column: tri-state day status.
pub const STATUS_COLUMN: &str = "status";
/// Required column: free-text hard topic.
pub const HARD_TOPIC_COLUMN: &str = "hard topic";
/// Column holding the day's calendar date, `%Y-%m-%d`.
pub const DATE_COLUMN: &str = "date";

/// Glyph written for a completed day.
pub const DONE_MARK: &str = "✅";
/// Glyph written for a missed day.
pub const MISS_MARK: &str = "❌";
/// Sentinel meaning "explicitly no hard topic", distinct from unanswered.
pub const NO_TOPIC: &str = "None";

/// Errors from plan document access.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The day indexes a table that does not exist yet.
    #[error("plan has no table {table}")]
    NoTable { table: usize },

    /// The day indexes a row that does not exist in its table.
    #[error("table {table} has no row {row}")]
    NoRow { table: usize, row: usize },

    /// A required column is missing from a table's header row.
    #[error("missing column: {0}")]
    NoColumn(String),

    /// The document as a whole is malformed (e.g. zero tables).
    #[error("structural error: {0}")]
    Structural(String),

    /// The document could not be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be parsed or serialized.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<PlanError> for streak_core::error::StreakError {
    fn from(e: PlanError) -> Self {
        streak_core::error::StreakError::Ledger(e.to_string())
    }
}

/// Tri-state day status, encoded in the status cell by glyph presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Done,
    Missed,
    Unset,
}

impl Status {
    /// Decode a status cell.
    pub fn from_cell(text: &str) -> Self {
        if text.contains(DONE_MARK) {
            Status::Done
        } else if text.contains(MISS_MARK) {
            Status::Missed
        } else {
            Status::Unset
        }
    }
}

/// A parsed data row, used by the report side.
#[derive(Debug, Clone)]
pub struct DayEntry {
    pub date: NaiveDate,
    pub status: Status,
    pub hard_topic: String,
}

impl DayEntry {
    /// Whether the hard-topic cell names an actual topic (non-empty and not
    /// the "None" sentinel).
    pub fn has_topic(&self) -> bool {
        !self.hard_topic.trim().is_empty() && !self.hard_topic.trim().eq_ignore_ascii_case(NO_TOPIC)
    }
}

/// One table: row 0 is the header, rows 1..=7 are days.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlanTable {
    pub rows: Vec<Vec<String>>,
}

/// The whole plan document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlanDocument {
    pub tables: Vec<PlanTable>,
}

impl PlanDocument {
    /// Open a plan document from disk.
    pub fn open(path: &Path) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the document atomically: write a temp file, then rename over the
    /// original so a crash mid-write never leaves a truncated document.
    pub fn save(&self, path: &Path) -> Result<(), PlanError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Resolve a column index by case-insensitive, whitespace-trimmed match
    /// against the table's header row.
    pub fn resolve_header(&self, table: usize, column: &str) -> Option<usize> {
        let header = self.tables.get(table)?.rows.first()?;
        header
            .iter()
            .position(|cell| cell.trim().eq_ignore_ascii_case(column))
    }

    /// Read a cell by (table, row, column-name).
    pub fn read_cell(&self, table: usize, row: usize, column: &str) -> Option<&str> {
        let col = self.resolve_header(table, column)?;
        self.tables
            .get(table)?
            .rows
            .get(row)?
            .get(col)
            .map(|s| s.as_str())
    }

    /// Write a cell by (table, row, column-name).
    pub fn write_cell(
        &mut self,
        table: usize,
        row: usize,
        column: &str,
        value: &str,
    ) -> Result<(), PlanError> {
        let col = self
            .resolve_header(table, column)
            .ok_or_else(|| match self.tables.get(table) {
                Some(_) => PlanError::NoColumn(column.to_string()),
                None => PlanError::NoTable { table },
            })?;
        let t = self
            .tables
            .get_mut(table)
            .ok_or(PlanError::NoTable { table })?;
        let r = t.rows.get_mut(row).ok_or(PlanError::NoRow { table, row })?;
        if r.len() <= col {
            r.resize(col + 1, String::new());
        }
        r[col] = value.to_string();
        Ok(())
    }

    /// Startup validation: at least one table, and the required columns
    /// present in the first table's header.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.tables.is_empty() {
            return Err(PlanError::Structural("plan has zero tables".to_string()));
        }
        for required in [STATUS_COLUMN, HARD_TOPIC_COLUMN] {
            if self.resolve_header(0, required).is_none() {
                return Err(PlanError::NoColumn(required.to_string()));
            }
        }
        Ok(())
    }

    /// Parse all data rows into day entries, in document order.
    ///
    /// Headers are resolved per table; rows without a parseable date are
    /// skipped.
    pub fn entries(&self) -> Vec<DayEntry> {
        let mut out = Vec::new();
        for (ti, table) in self.tables.iter().enumerate() {
            let date_col = self.resolve_header(ti, DATE_COLUMN);
            let status_col = self.resolve_header(ti, STATUS_COLUMN);
            let topic_col = self.resolve_header(ti, HARD_TOPIC_COLUMN);
            let (Some(date_col), Some(status_col), Some(topic_col)) =
                (date_col, status_col, topic_col)
            else {
                tracing::warn!("table {ti} is missing required columns, skipping");
                continue;
            };

            for row in table.rows.iter().skip(1) {
                let raw_date = row.get(date_col).map(|s| s.trim()).unwrap_or_default();
                let Ok(date) = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") else {
                    continue;
                };
                let status = Status::from_cell(row.get(status_col).map(String::as_str).unwrap_or(""));
                let hard_topic = row.get(topic_col).cloned().unwrap_or_default();
                out.push(DayEntry {
                    date,
                    status,
                    hard_topic,
                });
            }
        }
        out
    }
}
