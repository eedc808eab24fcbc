//! Pool standings from recorded round-robin results.

use crate::models::{
    EngineError, EntrantId, MatchResult, Pool, PoolId, Standing, Tournament,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate of one entrant's completed pool matches.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct EntrantRecord {
    pub entrant_id: EntrantId,
    pub name: String,
    pub played: u32,
    pub won: u32,
    pub lost: u32,
    pub sets_won: u32,
    pub sets_lost: u32,
    /// Regular-set games only; tiebreak points are not games.
    pub games_won: u32,
    pub games_lost: u32,
}

impl EntrantRecord {
    pub fn set_difference(&self) -> i64 {
        i64::from(self.sets_won) - i64::from(self.sets_lost)
    }

    pub fn game_difference(&self) -> i64 {
        i64::from(self.games_won) - i64::from(self.games_lost)
    }

    /// Ranking key: matches won, then sets won, then games won (raw totals).
    fn rank_key(&self) -> (u32, u32, u32) {
        (self.won, self.sets_won, self.games_won)
    }
}

/// Row of a pool's standings table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StandingRow {
    /// 1-based position in the current order.
    pub position: u8,
    #[serde(flatten)]
    pub record: EntrantRecord,
    pub set_difference: i64,
    pub game_difference: i64,
}

/// Aggregate every complete, decided result of the pool, in pool entrant order.
pub fn pool_records(pool: &Pool) -> Vec<EntrantRecord> {
    let mut records: Vec<EntrantRecord> = pool
        .entrants
        .iter()
        .map(|e| EntrantRecord {
            entrant_id: e.id,
            name: e.name.clone(),
            ..EntrantRecord::default()
        })
        .collect();

    for result in pool.results.values() {
        let Ok(winner) = result.winner() else {
            continue;
        };
        for record in records.iter_mut() {
            if result.involves(record.entrant_id) {
                apply_result(record, result, winner);
            }
        }
    }
    records
}

fn apply_result(record: &mut EntrantRecord, result: &MatchResult, winner: EntrantId) {
    let id = record.entrant_id;
    let opponent = if result.first == id { result.second } else { result.first };
    record.played += 1;
    if winner == id {
        record.won += 1;
    } else {
        record.lost += 1;
    }
    record.sets_won += u32::from(result.sets_for(id));
    record.sets_lost += u32::from(result.sets_for(opponent));
    record.games_won += result.games_for(id);
    record.games_lost += result.games_for(opponent);
}

/// Records sorted best first. Full ties keep pool order.
pub fn ranked_records(pool: &Pool) -> Vec<EntrantRecord> {
    let mut records = pool_records(pool);
    records.sort_by(|a, b| b.rank_key().cmp(&a.rank_key()));
    records
}

/// Standing of each entrant, or an empty map until all three results are complete.
pub fn compute_standings(pool: &Pool) -> BTreeMap<EntrantId, Standing> {
    if !pool.all_results_complete() {
        return BTreeMap::new();
    }
    ranked_records(pool)
        .into_iter()
        .enumerate()
        .filter_map(|(i, r)| Standing::from_index(i).map(|s| (r.entrant_id, s)))
        .collect()
}

/// Current table of a pool, available while results are still coming in.
pub fn standings_table(pool: &Pool) -> Vec<StandingRow> {
    ranked_records(pool)
        .into_iter()
        .zip(1..)
        .map(|(record, position)| StandingRow {
            position,
            set_difference: record.set_difference(),
            game_difference: record.game_difference(),
            record,
        })
        .collect()
}

/// Write computed standings onto the pool's entrants. Returns whether standings are final.
pub fn assign_standings(pool: &mut Pool) -> bool {
    let standings = compute_standings(pool);
    for e in &mut pool.entrants {
        e.standing = standings.get(&e.id).copied();
    }
    !standings.is_empty()
}

/// Record a result in a tournament pool and refresh its standings.
///
/// Returns the pool's standings, empty while results are missing.
pub fn record_pool_result(
    tournament: &mut Tournament,
    pool_id: PoolId,
    result: MatchResult,
) -> Result<BTreeMap<EntrantId, Standing>, EngineError> {
    let pool = tournament.pool_mut(pool_id)?;
    pool.record_result(result)?;
    if assign_standings(pool) {
        log::info!("Pool {} ({}) standings are final", pool.id, pool.category);
    }
    Ok(compute_standings(pool))
}
