//! Doubles tournament engine: pool formation, standings, knockout brackets and court calendars.

pub mod config;
pub mod logic;
pub mod models;

pub use config::{TimeSlot, TournamentConfig, Track};
pub use logic::{
    build_tournament_brackets, form_all_groups, form_tournament_groups, generate_bracket,
    record_bracket_winner, record_pool_result, record_winner, schedule_bracket_day,
    schedule_group_stage, score_triple, FormationOptions,
};
pub use models::{
    Bracket, BracketMatch, Calendar, EngineError, Entrant, EntrantId, MatchResult, Pool, PoolId,
    Round, SetScore, Slot, Standing, Tournament, TournamentId,
};
