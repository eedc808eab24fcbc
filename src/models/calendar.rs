//! Calendar grid: (day, time, court) cells holding at most one match each.

use crate::models::bracket::{BracketMatchId, Round};
use crate::models::entrant::PoolId;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Court number, starting at 1.
pub type Court = u8;

/// Address of one calendar cell.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct CellKey {
    pub day: String,
    pub time: NaiveTime,
    pub court: Court,
}

impl CellKey {
    pub fn new(day: impl Into<String>, time: NaiveTime, court: Court) -> Self {
        Self {
            day: day.into(),
            time,
            court,
        }
    }
}

/// Round-robin match placed in the calendar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupStageEntry {
    pub category: String,
    pub pool_id: PoolId,
    pub match_number: u8,
    pub first: String,
    pub second: String,
    pub pool_score: f64,
}

/// Knockout match placed in the calendar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BracketEntry {
    pub category: String,
    pub match_id: BracketMatchId,
    pub round: Round,
    pub number: u8,
    pub first: String,
    pub second: String,
    pub winner: Option<String>,
}

/// What occupies a calendar cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalendarEntry {
    GroupStage(GroupStageEntry),
    Bracket(BracketEntry),
}

/// Flat form of a cell, used for serialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarCell {
    pub day: String,
    pub time: NaiveTime,
    pub court: Court,
    pub entry: CalendarEntry,
}

/// Occupied cells of the court grid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<CalendarCell>", from = "Vec<CalendarCell>")]
pub struct Calendar {
    cells: BTreeMap<CellKey, CalendarEntry>,
}

impl Calendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_free(&self, key: &CellKey) -> bool {
        !self.cells.contains_key(key)
    }

    /// Place an entry in a free cell. Returns `false` and leaves the cell untouched when occupied.
    pub fn insert(&mut self, key: CellKey, entry: CalendarEntry) -> bool {
        if !self.is_free(&key) {
            return false;
        }
        self.cells.insert(key, entry);
        true
    }

    pub fn get(&self, key: &CellKey) -> Option<&CalendarEntry> {
        self.cells.get(key)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in (day, time, court) order.
    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &CalendarEntry)> {
        self.cells.iter()
    }

    /// Cells of one day in (time, court) order.
    pub fn day<'a>(&'a self, day: &'a str) -> impl Iterator<Item = (&'a CellKey, &'a CalendarEntry)> + 'a {
        self.cells.iter().filter(move |(k, _)| k.day == day)
    }
}

impl From<Calendar> for Vec<CalendarCell> {
    fn from(calendar: Calendar) -> Self {
        calendar
            .cells
            .into_iter()
            .map(|(key, entry)| CalendarCell {
                day: key.day,
                time: key.time,
                court: key.court,
                entry,
            })
            .collect()
    }
}

impl From<Vec<CalendarCell>> for Calendar {
    fn from(cells: Vec<CalendarCell>) -> Self {
        let mut calendar = Calendar::new();
        for cell in cells {
            calendar.insert(CellKey::new(cell.day, cell.time, cell.court), cell.entry);
        }
        calendar
    }
}
