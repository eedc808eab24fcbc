//! Tournament snapshot and engine errors.

use crate::config::TournamentConfig;
use crate::models::bracket::{Bracket, BracketMatchId};
use crate::models::entrant::{Entrant, EntrantId, PoolId};
use crate::models::pool::{PairKey, Pool};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// Errors returned by engine operations. All are recoverable input problems.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EngineError {
    /// A regular set or the needed tiebreak has no score yet.
    IncompleteResult(PairKey),
    /// Sets split 1-1 and the tiebreak points are equal.
    UndecidedTiebreak(PairKey),
    /// Slot label not present in the configured slot table.
    UnknownTimeSlot(String),
    /// Winner reported for an entrant not playing the match.
    EntrantNotInMatch { match_id: BracketMatchId, entrant: EntrantId },
    MatchNotFound(BracketMatchId),
    /// Opponent not known yet.
    MatchNotReady(BracketMatchId),
    PoolNotFound(PoolId),
    /// Pool already holds three entrants.
    PoolFull(PoolId),
    EntrantNotFound(EntrantId),
    /// Two entrants share an id at intake.
    DuplicateEntrant(EntrantId),
    CategoryMismatch { expected: String, found: String },
    /// Result names a pairing that is not one of the pool's fixtures.
    ResultNotInPool { pool: PoolId, pair: PairKey },
    BracketNotFound(String),
    /// Pools were edited while a formation run was in progress.
    PoolsChanged,
    InvalidConfig(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::IncompleteResult(pair) => write!(f, "Result for {} is incomplete", pair),
            EngineError::UndecidedTiebreak(pair) => {
                write!(f, "Tiebreak points for {} are equal, no winner can be determined", pair)
            }
            EngineError::UnknownTimeSlot(label) => write!(f, "Unknown time slot {:?}", label),
            EngineError::EntrantNotInMatch { match_id, entrant } => {
                write!(f, "Entrant {} is not playing match {}", entrant, match_id)
            }
            EngineError::MatchNotFound(id) => write!(f, "Match {} not found", id),
            EngineError::MatchNotReady(id) => write!(f, "Match {} does not have both entrants yet", id),
            EngineError::PoolNotFound(id) => write!(f, "Pool {} not found", id),
            EngineError::PoolFull(id) => write!(f, "Pool {} already has 3 entrants", id),
            EngineError::EntrantNotFound(id) => write!(f, "Entrant {} not found", id),
            EngineError::DuplicateEntrant(id) => write!(f, "Entrant id {} is used more than once", id),
            EngineError::CategoryMismatch { expected, found } => {
                write!(f, "Entrant is in category {} but the pool is {}", found, expected)
            }
            EngineError::ResultNotInPool { pool, pair } => {
                write!(f, "Pairing {} is not a match of pool {}", pair, pool)
            }
            EngineError::BracketNotFound(category) => {
                write!(f, "No bracket for category {}", category)
            }
            EngineError::PoolsChanged => {
                write!(f, "Pools were edited while groups were being formed, run formation again")
            }
            EngineError::InvalidConfig(reason) => write!(f, "Invalid configuration: {}", reason),
        }
    }
}

impl std::error::Error for EngineError {}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Summary of a formation run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormationStatistics {
    pub total_entrants: usize,
    pub assigned_entrants: usize,
    pub leftover_entrants: usize,
    /// Share of entrants placed in a pool, 0 to 100.
    pub assigned_percentage: f64,
    pub total_pools: usize,
    pub pools_per_category: BTreeMap<String, usize>,
    pub entrants_per_category: BTreeMap<String, usize>,
    pub average_score: f64,
    /// Pools scoring 3.0.
    pub perfect_pools: usize,
    /// Pools scoring at least 2.0 but below 3.0.
    pub partial_pools: usize,
}

/// Everything a caller needs to persist between engine calls.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub config: TournamentConfig,
    /// Entrants as received at intake.
    pub entrants: Vec<Entrant>,
    /// Pools by category, in formation order.
    pub pools: BTreeMap<String, Vec<Pool>>,
    /// Entrants no pool could take.
    pub leftover: Vec<Entrant>,
    pub statistics: Option<FormationStatistics>,
    pub brackets: BTreeMap<String, Bracket>,
}

impl Tournament {
    /// Create a tournament from intake entrants. Ids must be unique and every
    /// availability label must be a configured slot.
    pub fn new(config: TournamentConfig, entrants: Vec<Entrant>) -> Result<Self, EngineError> {
        config.validate()?;
        let mut seen = HashSet::new();
        for e in &entrants {
            if !seen.insert(e.id) {
                return Err(EngineError::DuplicateEntrant(e.id));
            }
            for label in &e.availability {
                config.time_slot(label)?;
            }
        }
        Ok(Self {
            id: Uuid::new_v4(),
            config,
            entrants,
            pools: BTreeMap::new(),
            leftover: Vec::new(),
            statistics: None,
            brackets: BTreeMap::new(),
        })
    }

    /// All pools across categories.
    pub fn all_pools(&self) -> impl Iterator<Item = &Pool> {
        self.pools.values().flatten()
    }

    pub fn pool(&self, id: PoolId) -> Result<&Pool, EngineError> {
        self.all_pools()
            .find(|p| p.id == id)
            .ok_or(EngineError::PoolNotFound(id))
    }

    pub fn pool_mut(&mut self, id: PoolId) -> Result<&mut Pool, EngineError> {
        self.pools
            .values_mut()
            .flatten()
            .find(|p| p.id == id)
            .ok_or(EngineError::PoolNotFound(id))
    }

    pub fn bracket_mut(&mut self, category: &str) -> Result<&mut Bracket, EngineError> {
        self.brackets
            .get_mut(category)
            .ok_or_else(|| EngineError::BracketNotFound(category.to_string()))
    }

    /// Highest pool id in use, so manual pools can continue the sequence.
    pub fn last_pool_id(&self) -> PoolId {
        self.all_pools().map(|p| p.id).max().unwrap_or(0)
    }
}
