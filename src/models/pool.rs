//! Pool (round-robin group of three), its matches and recorded results.

use crate::models::entrant::{Entrant, EntrantId, PoolId};
use crate::models::tournament::EngineError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Entrants per full pool.
pub const POOL_SIZE: usize = 3;

/// Games (or tiebreak points) won by each side of a match.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SetScore {
    pub first: u32,
    pub second: u32,
}

impl SetScore {
    pub fn new(first: u32, second: u32) -> Self {
        Self { first, second }
    }

    /// A set level on games has no winner.
    pub fn is_decided(&self) -> bool {
        self.first != self.second
    }
}

/// Unordered pair of entrant ids, stored smallest first.
///
/// Serialized as `"3-7"` so it can key a JSON object.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PairKey(EntrantId, EntrantId);

impl PairKey {
    pub fn new(a: EntrantId, b: EntrantId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn contains(&self, id: EntrantId) -> bool {
        self.0 == id || self.1 == id
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

impl From<PairKey> for String {
    fn from(key: PairKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for PairKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (a, b) = value
            .split_once('-')
            .ok_or_else(|| format!("invalid pair key {value:?}"))?;
        let a = a.trim().parse().map_err(|_| format!("invalid pair key {value:?}"))?;
        let b = b.trim().parse().map_err(|_| format!("invalid pair key {value:?}"))?;
        Ok(Self::new(a, b))
    }
}

/// One of the three round-robin matches of a full pool.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundRobinMatch {
    /// 1-based order of play inside the pool.
    pub number: u8,
    pub first: EntrantId,
    pub second: EntrantId,
}

impl RoundRobinMatch {
    pub fn key(&self) -> PairKey {
        PairKey::new(self.first, self.second)
    }
}

/// Recorded result of a best-of-two-sets match with a super tiebreak on a 1-1 split.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub first: EntrantId,
    pub second: EntrantId,
    pub first_sets: u8,
    pub second_sets: u8,
    /// Game counts of the two regular sets, `None` until played.
    pub sets: [Option<SetScore>; 2],
    /// Super-tiebreak points, only meaningful on a 1-1 split.
    #[serde(default)]
    pub tiebreak: Option<SetScore>,
}

impl MatchResult {
    /// Build a result from set game counts; sets won are derived from them.
    pub fn from_sets(
        first: EntrantId,
        second: EntrantId,
        sets: [Option<SetScore>; 2],
        tiebreak: Option<SetScore>,
    ) -> Self {
        let mut first_sets = 0;
        let mut second_sets = 0;
        for set in sets.iter().flatten() {
            match set.first.cmp(&set.second) {
                Ordering::Greater => first_sets += 1,
                Ordering::Less => second_sets += 1,
                Ordering::Equal => {}
            }
        }
        Self {
            first,
            second,
            first_sets,
            second_sets,
            sets,
            tiebreak,
        }
    }

    pub fn key(&self) -> PairKey {
        PairKey::new(self.first, self.second)
    }

    pub fn involves(&self, id: EntrantId) -> bool {
        self.first == id || self.second == id
    }

    /// Sets split one apiece, so the super tiebreak decides.
    pub fn is_split(&self) -> bool {
        self.first_sets == 1 && self.second_sets == 1
    }

    /// Both regular sets are recorded and decided and, on a split, the tiebreak too.
    pub fn is_complete(&self) -> bool {
        self.sets.iter().all(|s| s.is_some_and(|s| s.is_decided()))
            && (!self.is_split() || self.tiebreak.is_some())
    }

    /// Winner of a complete result.
    pub fn winner(&self) -> Result<EntrantId, EngineError> {
        if !self.is_complete() {
            return Err(EngineError::IncompleteResult(self.key()));
        }
        if self.first_sets == 2 {
            return Ok(self.first);
        }
        if self.second_sets == 2 {
            return Ok(self.second);
        }
        match self.tiebreak {
            Some(tb) if tb.first > tb.second => Ok(self.first),
            Some(tb) if tb.second > tb.first => Ok(self.second),
            _ => Err(EngineError::UndecidedTiebreak(self.key())),
        }
    }

    /// Games won by `id` over the regular sets. Tiebreak points are not games.
    pub fn games_for(&self, id: EntrantId) -> u32 {
        self.sets
            .iter()
            .flatten()
            .map(|s| if id == self.first { s.first } else if id == self.second { s.second } else { 0 })
            .sum()
    }

    pub fn sets_for(&self, id: EntrantId) -> u8 {
        if id == self.first {
            self.first_sets
        } else if id == self.second {
            self.second_sets
        } else {
            0
        }
    }
}

/// A round-robin group of up to three entrants in one category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub category: String,
    pub entrants: Vec<Entrant>,
    /// Time-slot label the pool plays in.
    pub time_slot: Option<String>,
    /// Compatibility score, 0.0 to 3.0.
    pub score: f64,
    /// Empty until the pool is full.
    pub matches: Vec<RoundRobinMatch>,
    pub results: BTreeMap<PairKey, MatchResult>,
}

impl Pool {
    /// Create an empty pool.
    pub fn new(id: PoolId, category: impl Into<String>) -> Self {
        Self {
            id,
            category: category.into(),
            entrants: Vec::new(),
            time_slot: None,
            score: 0.0,
            matches: Vec::new(),
            results: BTreeMap::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.entrants.len() == POOL_SIZE
    }

    pub fn entrant(&self, id: EntrantId) -> Option<&Entrant> {
        self.entrants.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntrantId) -> bool {
        self.entrant(id).is_some()
    }

    /// Add an entrant. The pool must have room and share the entrant's category.
    pub fn add_entrant(&mut self, mut entrant: Entrant) -> Result<(), EngineError> {
        if self.is_full() {
            return Err(EngineError::PoolFull(self.id));
        }
        if entrant.category != self.category {
            return Err(EngineError::CategoryMismatch {
                expected: self.category.clone(),
                found: entrant.category,
            });
        }
        if self.contains(entrant.id) {
            return Ok(());
        }
        entrant.assigned_pool = Some(self.id);
        self.entrants.push(entrant);
        self.generate_matches();
        Ok(())
    }

    /// Remove an entrant, dropping its results and the pool's fixtures.
    pub fn remove_entrant(&mut self, id: EntrantId) -> Result<Entrant, EngineError> {
        let idx = self
            .entrants
            .iter()
            .position(|e| e.id == id)
            .ok_or(EngineError::EntrantNotFound(id))?;
        let mut entrant = self.entrants.remove(idx);
        entrant.assigned_pool = None;
        entrant.standing = None;
        self.results.retain(|key, _| !key.contains(id));
        for e in &mut self.entrants {
            e.standing = None;
        }
        self.generate_matches();
        Ok(entrant)
    }

    /// (Re)build the three round-robin fixtures; clears them unless the pool is full.
    pub fn generate_matches(&mut self) {
        self.matches.clear();
        if !self.is_full() {
            return;
        }
        let e = &self.entrants;
        let pairings = [(0, 1), (0, 2), (1, 2)];
        self.matches = pairings
            .iter()
            .zip(1..)
            .map(|(&(a, b), number)| RoundRobinMatch {
                number,
                first: e[a].id,
                second: e[b].id,
            })
            .collect();
    }

    /// Store or replace the result for one of the pool's pairings.
    ///
    /// Partial results are accepted; a complete result must name a winner and
    /// no recorded set may be level.
    pub fn record_result(&mut self, result: MatchResult) -> Result<(), EngineError> {
        let key = result.key();
        if result.first == result.second || !self.matches.iter().any(|m| m.key() == key) {
            return Err(EngineError::ResultNotInPool {
                pool: self.id,
                pair: key,
            });
        }
        if result.sets.iter().flatten().any(|s| !s.is_decided()) {
            return Err(EngineError::IncompleteResult(key));
        }
        if result.is_complete() {
            result.winner()?;
        }
        self.results.insert(key, result);
        Ok(())
    }

    pub fn result_for(&self, a: EntrantId, b: EntrantId) -> Option<&MatchResult> {
        self.results.get(&PairKey::new(a, b))
    }

    /// Full pool with a complete, decided result for every fixture.
    pub fn all_results_complete(&self) -> bool {
        self.is_full()
            && self.matches.iter().all(|m| {
                self.results
                    .get(&m.key())
                    .is_some_and(|r| r.is_complete() && r.winner().is_ok())
            })
    }
}
