//! Static tournament configuration: categories, courts, slot table and bracket-day tracks.

use crate::models::EngineError;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Named availability slot and the clock hours it occupies.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Label entrants declare, e.g. "Thursday 18:00".
    pub label: String,
    pub day: String,
    /// Consecutive hour starts, in order.
    pub hours: Vec<NaiveTime>,
}

impl TimeSlot {
    /// Slot of three consecutive hours starting at `start_hour` on `day`.
    pub fn three_hours(day: &str, start_hour: u32) -> Self {
        Self {
            label: format!("{} {:02}:00", day, start_hour),
            day: day.to_string(),
            hours: (start_hour..start_hour + 3).map(hour).collect(),
        }
    }
}

/// Stretch of the bracket day cut into match blocks.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub start: NaiveTime,
    /// No block may end after this time.
    pub end: NaiveTime,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentConfig {
    /// Category labels, highest scheduling priority first.
    pub categories: Vec<String>,
    pub courts: u8,
    pub time_slots: Vec<TimeSlot>,
    /// Day the knockout matches are played.
    pub bracket_day: String,
    pub bracket_tracks: Vec<Track>,
    pub match_minutes: u32,
    /// Minutes between the end of one match and the start of the next on a court.
    pub changeover_minutes: u32,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            categories: ["Fourth", "Fifth", "Sixth", "Seventh"]
                .into_iter()
                .map(String::from)
                .collect(),
            courts: 2,
            time_slots: vec![
                TimeSlot::three_hours("Thursday", 18),
                TimeSlot::three_hours("Thursday", 20),
                TimeSlot::three_hours("Friday", 18),
                TimeSlot::three_hours("Friday", 21),
                TimeSlot::three_hours("Saturday", 9),
                TimeSlot::three_hours("Saturday", 12),
                TimeSlot::three_hours("Saturday", 16),
                TimeSlot::three_hours("Saturday", 19),
            ],
            bracket_day: "Sunday".to_string(),
            bracket_tracks: vec![
                Track {
                    name: "morning".to_string(),
                    start: hour(9),
                    end: hour(15),
                },
                Track {
                    name: "evening".to_string(),
                    start: hour(15),
                    end: hour(23),
                },
            ],
            match_minutes: 60,
            changeover_minutes: 10,
        }
    }
}

impl TournamentConfig {
    /// Read a JSON config file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| EngineError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.courts == 0 {
            return Err(EngineError::InvalidConfig("at least one court is required".into()));
        }
        if let Some(slot) = self.time_slots.iter().find(|s| s.hours.is_empty()) {
            return Err(EngineError::InvalidConfig(format!(
                "time slot {:?} has no hours",
                slot.label
            )));
        }
        if self.match_minutes == 0 {
            return Err(EngineError::InvalidConfig("match length must be positive".into()));
        }
        if let Some(track) = self.bracket_tracks.iter().find(|t| t.end <= t.start) {
            return Err(EngineError::InvalidConfig(format!(
                "track {:?} ends before it starts",
                track.name
            )));
        }
        Ok(())
    }

    /// Look up a slot by label.
    pub fn time_slot(&self, label: &str) -> Result<&TimeSlot, EngineError> {
        self.time_slots
            .iter()
            .find(|s| s.label == label)
            .ok_or_else(|| EngineError::UnknownTimeSlot(label.to_string()))
    }

    pub fn is_known_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    /// Scheduling rank of a category; unknown categories sort last.
    pub fn category_priority(&self, category: &str) -> usize {
        self.categories
            .iter()
            .position(|c| c == category)
            .unwrap_or(self.categories.len())
    }
}

fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h % 24, 0, 0).unwrap_or_default()
}
