//! Entrant (a doubles pair) and its pool standing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unique identifier for an entrant, assigned at intake.
pub type EntrantId = u32;

/// Unique identifier for a pool.
pub type PoolId = u32;

/// Final rank of an entrant inside its pool.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    First,
    Second,
    Third,
}

impl Standing {
    /// Standings in rank order.
    pub const ALL: [Standing; 3] = [Standing::First, Standing::Second, Standing::Third];

    /// 1-based rank number.
    pub fn rank(self) -> u8 {
        match self {
            Standing::First => 1,
            Standing::Second => 2,
            Standing::Third => 3,
        }
    }

    /// Standing for a zero-based position in a ranked list.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn ordinal(self) -> &'static str {
        match self {
            Standing::First => "1st",
            Standing::Second => "2nd",
            Standing::Third => "3rd",
        }
    }
}

/// A competing doubles pair.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Entrant {
    pub id: EntrantId,
    pub name: String,
    #[serde(default)]
    pub contact: String,
    pub category: String,
    /// Time-slot labels this pair can play in, e.g. "Thursday 18:00".
    pub availability: BTreeSet<String>,
    #[serde(default)]
    pub assigned_pool: Option<PoolId>,
    #[serde(default)]
    pub standing: Option<Standing>,
}

impl Entrant {
    /// Create an entrant with no pool and no standing.
    pub fn new(
        id: EntrantId,
        name: impl Into<String>,
        category: impl Into<String>,
        availability: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            contact: String::new(),
            category: category.into(),
            availability: availability.into_iter().map(Into::into).collect(),
            assigned_pool: None,
            standing: None,
        }
    }

    /// Builder-style contact setter.
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = contact.into();
        self
    }

    /// Whether the entrant lists this exact slot label.
    pub fn is_available(&self, slot: &str) -> bool {
        self.availability.contains(slot)
    }

    /// Whether the entrant lists any slot on the given day.
    pub fn plays_on_day(&self, day: &str) -> bool {
        self.availability.iter().any(|s| slot_day(s) == Some(day))
    }
}

/// Day part of a slot label ("Thursday 18:00" -> "Thursday"). Labels without a
/// space carry no day.
pub fn slot_day(label: &str) -> Option<&str> {
    label.split_once(' ').map(|(day, _)| day)
}
