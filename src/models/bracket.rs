//! Knockout bracket: rounds, matches, slots and the feed table between rounds.

use crate::models::entrant::{EntrantId, Standing};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a bracket match, e.g. `"Fifth-qf-2"`.
pub type BracketMatchId = String;

/// Knockout round, ordered from earliest to latest.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Round {
    RoundOf16,
    Quarterfinal,
    Semifinal,
    Final,
}

impl Round {
    pub const ALL: [Round; 4] = [Round::RoundOf16, Round::Quarterfinal, Round::Semifinal, Round::Final];

    /// Matches the round holds in a full bracket.
    pub fn size(self) -> usize {
        match self {
            Round::RoundOf16 => 8,
            Round::Quarterfinal => 4,
            Round::Semifinal => 2,
            Round::Final => 1,
        }
    }

    /// Short key used in match ids.
    pub fn key(self) -> &'static str {
        match self {
            Round::RoundOf16 => "r16",
            Round::Quarterfinal => "qf",
            Round::Semifinal => "sf",
            Round::Final => "final",
        }
    }

    /// Round the winners of this one advance to.
    pub fn next(self) -> Option<Round> {
        match self {
            Round::RoundOf16 => Some(Round::Quarterfinal),
            Round::Quarterfinal => Some(Round::Semifinal),
            Round::Semifinal => Some(Round::Final),
            Round::Final => None,
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Round::RoundOf16 => "Round of 16",
            Round::Quarterfinal => "Quarterfinal",
            Round::Semifinal => "Semifinal",
            Round::Final => "Final",
        };
        f.write_str(label)
    }
}

/// One of the two positions in a bracket match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    One,
    Two,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::One => 0,
            Side::Two => 1,
        }
    }

    /// Side fed by the winner of a 1-based match number: odd numbers go to One.
    pub fn for_match_number(number: u8) -> Self {
        if number % 2 == 1 {
            Side::One
        } else {
            Side::Two
        }
    }
}

/// Entrant occupying a bracket slot; the name is carried for display.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Contender {
    pub id: EntrantId,
    pub name: String,
}

/// Content of a bracket slot.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Slot {
    /// Nothing will ever arrive here.
    #[default]
    Empty,
    /// Waiting on upstream data, e.g. "1st of Pool B".
    Placeholder(String),
    Filled(Contender),
}

impl Slot {
    pub fn contender(&self) -> Option<&Contender> {
        match self {
            Slot::Filled(c) => Some(c),
            _ => None,
        }
    }

    pub fn entrant_id(&self) -> Option<EntrantId> {
        self.contender().map(|c| c.id)
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Slot::Filled(_))
    }

    /// Text to show for the slot.
    pub fn label(&self) -> String {
        match self {
            Slot::Empty => "-".to_string(),
            Slot::Placeholder(text) => text.clone(),
            Slot::Filled(c) => c.name.clone(),
        }
    }
}

/// Progress of a single bracket match.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    /// At least one slot is not yet a concrete entrant.
    Pending,
    /// Both slots filled, no winner yet.
    Ready,
    Decided,
}

/// A match in a knockout round.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketMatch {
    pub id: BracketMatchId,
    pub round: Round,
    /// 1-based position within the round.
    pub number: u8,
    pub slots: [Slot; 2],
    /// Always one of the filled slots.
    pub winner: Option<EntrantId>,
}

impl BracketMatch {
    pub fn new(category: &str, round: Round, number: u8) -> Self {
        Self {
            id: match_id(category, round, number),
            round,
            number,
            slots: [Slot::Empty, Slot::Empty],
            winner: None,
        }
    }

    pub fn slot(&self, side: Side) -> &Slot {
        &self.slots[side.index()]
    }

    pub fn state(&self) -> MatchState {
        if self.winner.is_some() {
            MatchState::Decided
        } else if self.slots.iter().all(Slot::is_filled) {
            MatchState::Ready
        } else {
            MatchState::Pending
        }
    }

    /// Contender in a filled slot with this id.
    pub fn contender(&self, id: EntrantId) -> Option<&Contender> {
        self.slots
            .iter()
            .filter_map(Slot::contender)
            .find(|c| c.id == id)
    }

    /// Both slots empty: the match can never be played.
    pub fn is_void(&self) -> bool {
        self.slots.iter().all(|s| *s == Slot::Empty)
    }

    /// One side can never be filled, so the other advances without playing.
    pub fn is_walkover(&self) -> bool {
        self.slots.iter().filter(|s| **s == Slot::Empty).count() == 1
    }

    /// Human label such as "Quarterfinal 2".
    pub fn title(&self) -> String {
        if self.round == Round::Final {
            self.round.to_string()
        } else {
            format!("{} {}", self.round, self.number)
        }
    }
}

/// Builds the id of a bracket match.
pub fn match_id(category: &str, round: Round, number: u8) -> BracketMatchId {
    format!("{}-{}-{}", category, round.key(), number)
}

/// Winner of `from` advances into `side` of `to`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub from: BracketMatchId,
    pub to: BracketMatchId,
    pub side: Side,
}

/// Slot seeded straight from a pool standing.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeedSource {
    pub match_id: BracketMatchId,
    pub side: Side,
    /// Index of the pool in the category's pool order (0 = Pool A).
    pub pool_index: usize,
    pub standing: Standing,
}

impl SeedSource {
    /// Placeholder text such as "1st of Pool B".
    pub fn description(&self) -> String {
        format!("{} of Pool {}", self.standing.ordinal(), pool_letter(self.pool_index))
    }
}

/// Letter naming the pool at `index` ("A", "B", ...); falls back to a number past "Z".
pub fn pool_letter(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => (index + 1).to_string(),
    }
}

/// Single-elimination bracket of one category.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub category: String,
    /// Pools the topology was chosen for.
    pub pool_count: usize,
    /// Ordered by round, then match number.
    pub matches: Vec<BracketMatch>,
    pub feeds: Vec<Feed>,
    pub seeds: Vec<SeedSource>,
}

impl Bracket {
    pub fn get(&self, id: &str) -> Option<&BracketMatch> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut BracketMatch> {
        self.matches.iter_mut().find(|m| m.id == id)
    }

    /// Matches of one round in number order.
    pub fn round(&self, round: Round) -> impl Iterator<Item = &BracketMatch> {
        self.matches.iter().filter(move |m| m.round == round)
    }

    /// Rounds present in this bracket, earliest first.
    pub fn rounds(&self) -> Vec<Round> {
        Round::ALL
            .into_iter()
            .filter(|r| self.matches.iter().any(|m| m.round == *r))
            .collect()
    }

    pub fn final_match(&self) -> Option<&BracketMatch> {
        self.round(Round::Final).next()
    }

    /// Winner of the final, once decided.
    pub fn champion(&self) -> Option<EntrantId> {
        self.final_match().and_then(|m| m.winner)
    }

    pub fn is_complete(&self) -> bool {
        self.champion().is_some()
    }

    /// Where the winner of `match_id` goes next.
    pub fn feed_from(&self, match_id: &str) -> Option<&Feed> {
        self.feeds.iter().find(|f| f.from == match_id)
    }

    /// Matches whose winners advance into `match_id`.
    pub fn feeders_of<'a>(&'a self, match_id: &'a str) -> impl Iterator<Item = &'a Feed> + 'a {
        self.feeds.iter().filter(move |f| f.to == match_id)
    }
}
