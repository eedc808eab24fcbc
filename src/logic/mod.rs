//! Tournament logic: pool formation, standings, brackets, propagation, scheduling.

mod bracket;
mod compatibility;
mod formation;
mod propagation;
mod schedule;
mod standings;

pub use bracket::{build_tournament_brackets, generate_bracket, refresh_bracket};
pub use compatibility::{score_entrants, score_triple, Compatibility, PERFECT_SCORE};
pub use formation::{
    add_to_pool, apply_formation, create_pool, form_all_groups, form_groups, form_groups_greedy,
    form_groups_optimal, form_groups_with, form_tournament_groups, formation_statistics,
    move_entrant, release_entrant, remove_from_pool, rescore_pool, Formation, FormationOptions,
    FormationReport, PoolIdSequence, PoolLayout,
};
pub use propagation::{clear_winner, ready_matches, record_bracket_winner, record_winner};
pub use schedule::{
    bracket_day_blocks, schedule_bracket_day, schedule_group_stage, BracketDaySchedule,
    CourtConflict, GroupStageSchedule, TimeBlock, UnplacedMatch, UnplacedReason,
    UnscheduledMatch,
};
pub use standings::{
    assign_standings, compute_standings, pool_records, ranked_records, record_pool_result,
    standings_table, EntrantRecord, StandingRow,
};
