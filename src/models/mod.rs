//! Data structures for the tournament: entrants, pools, brackets, calendar, tournament snapshot.

mod bracket;
mod calendar;
mod entrant;
mod pool;
mod tournament;

pub use bracket::{
    match_id, pool_letter, Bracket, BracketMatch, BracketMatchId, Contender, Feed, MatchState,
    Round, SeedSource, Side, Slot,
};
pub use calendar::{
    BracketEntry, Calendar, CalendarCell, CalendarEntry, CellKey, Court, GroupStageEntry,
};
pub use entrant::{slot_day, Entrant, EntrantId, PoolId, Standing};
pub use pool::{MatchResult, PairKey, Pool, RoundRobinMatch, SetScore, POOL_SIZE};
pub use tournament::{EngineError, FormationStatistics, Tournament, TournamentId};
