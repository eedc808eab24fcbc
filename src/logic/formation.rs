//! Pool formation: split a category's entrants into compatible groups of three.
//!
//! Small categories (2 to 6 possible pools) get a pruned backtracking search
//! for the highest total score; anything else uses a greedy pass that keeps
//! taking the best remaining triple.

use crate::config::TournamentConfig;
use crate::logic::compatibility::{score_entrants, score_triple, PERFECT_SCORE};
use crate::models::{
    EngineError, Entrant, EntrantId, FormationStatistics, Pool, PoolId, Tournament, POOL_SIZE,
};
use std::collections::BTreeMap;
use std::time::Instant;

/// Hands out increasing pool ids.
#[derive(Clone, Debug)]
pub struct PoolIdSequence {
    next: PoolId,
}

impl PoolIdSequence {
    /// Sequence whose first id is `first`.
    pub fn new(first: PoolId) -> Self {
        Self { next: first }
    }

    /// Sequence continuing after an existing id.
    pub fn after(last: PoolId) -> Self {
        Self::new(last + 1)
    }

    pub fn next_id(&mut self) -> PoolId {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for PoolIdSequence {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Tuning for a formation run.
#[derive(Clone, Copy, Debug, Default)]
pub struct FormationOptions {
    /// Stop the search at this instant and keep the best configuration found.
    pub deadline: Option<Instant>,
}

/// Pools formed for one category and the entrants left out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Formation {
    pub pools: Vec<Pool>,
    pub leftover: Vec<Entrant>,
}

impl Formation {
    /// Sum of pool scores.
    pub fn total_score(&self) -> f64 {
        self.pools.iter().map(|p| p.score).sum()
    }
}

/// Formation of every configured category.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormationReport {
    pub pools: BTreeMap<String, Vec<Pool>>,
    pub leftover: Vec<Entrant>,
    pub statistics: FormationStatistics,
}

/// Candidate triple, by index into the entrant slice.
#[derive(Clone, Debug)]
struct Candidate {
    members: [usize; POOL_SIZE],
    score: f64,
    slot: Option<String>,
}

/// Smallest and largest pool counts the exhaustive search handles.
const OPTIMAL_POOL_RANGE: std::ops::RangeInclusive<usize> = 2..=6;

/// Form pools from the entrants of one category.
pub fn form_groups(entrants: &[Entrant], ids: &mut PoolIdSequence) -> Formation {
    form_groups_with(entrants, ids, FormationOptions::default())
}

/// [`form_groups`] with explicit options.
pub fn form_groups_with(
    entrants: &[Entrant],
    ids: &mut PoolIdSequence,
    options: FormationOptions,
) -> Formation {
    if entrants.len() < POOL_SIZE {
        return build_formation(entrants, Vec::new(), ids);
    }
    let max_pools = entrants.len() / POOL_SIZE;
    let picks = if OPTIMAL_POOL_RANGE.contains(&max_pools) {
        optimal_picks(entrants, options).unwrap_or_else(|| greedy_picks(entrants))
    } else {
        greedy_picks(entrants)
    };
    build_formation(entrants, picks, ids)
}

/// Backtracking search only, whatever the category size.
pub fn form_groups_optimal(entrants: &[Entrant], ids: &mut PoolIdSequence) -> Formation {
    let picks = optimal_picks(entrants, FormationOptions::default()).unwrap_or_default();
    build_formation(entrants, picks, ids)
}

/// Greedy pass only, whatever the category size.
pub fn form_groups_greedy(entrants: &[Entrant], ids: &mut PoolIdSequence) -> Formation {
    build_formation(entrants, greedy_picks(entrants), ids)
}

/// Best configuration found so far, shared across the whole search tree.
struct SearchContext<'a> {
    entrants: &'a [Entrant],
    pool_cap: usize,
    deadline: Option<Instant>,
    best_score: f64,
    best: Vec<Candidate>,
    nodes: usize,
    interrupted: bool,
}

impl<'a> SearchContext<'a> {
    fn new(entrants: &'a [Entrant], deadline: Option<Instant>) -> Self {
        Self {
            entrants,
            pool_cap: entrants.len() / POOL_SIZE,
            deadline,
            best_score: -1.0,
            best: Vec::new(),
            nodes: 0,
            interrupted: false,
        }
    }

    fn record(&mut self, current: &[Candidate], score: f64) {
        if score > self.best_score {
            self.best_score = score;
            self.best = current.to_vec();
        }
    }

    fn expired(&mut self) -> bool {
        if !self.interrupted {
            self.interrupted = self.deadline.is_some_and(|d| Instant::now() >= d);
        }
        self.interrupted
    }

    fn search(&mut self, remaining: &[usize], current: &mut Vec<Candidate>, score: f64) {
        self.nodes += 1;
        if remaining.len() < POOL_SIZE || current.len() >= self.pool_cap {
            self.record(current, score);
            return;
        }

        let bound = score + PERFECT_SCORE * (remaining.len() / POOL_SIZE) as f64;
        if bound <= self.best_score {
            return;
        }

        let mut candidates: Vec<Candidate> = triples(self.entrants, remaining)
            .into_iter()
            .filter(|c| c.score > 0.0)
            .collect();
        // Nobody left can form a positive pool: the pools picked so far are a
        // finished configuration and the rest become leftover.
        if candidates.is_empty() {
            self.record(current, score);
            return;
        }
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

        let width = match remaining.len() {
            0..=9 => candidates.len(),
            10..=12 => 20,
            _ => 15,
        };
        for candidate in candidates.into_iter().take(width) {
            if self.expired() {
                return;
            }
            let rest: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|i| !candidate.members.contains(i))
                .collect();
            let next_score = score + candidate.score;
            current.push(candidate);
            self.search(&rest, current, next_score);
            current.pop();
        }
    }
}

/// Run the backtracking search. `None` when it was interrupted before recording anything.
fn optimal_picks(entrants: &[Entrant], options: FormationOptions) -> Option<Vec<Candidate>> {
    let mut ctx = SearchContext::new(entrants, options.deadline);
    let all: Vec<usize> = (0..entrants.len()).collect();
    ctx.search(&all, &mut Vec::new(), 0.0);
    log::debug!(
        "Pool search over {} entrants visited {} nodes, best total {:.1}{}",
        entrants.len(),
        ctx.nodes,
        ctx.best_score,
        if ctx.interrupted { " (interrupted)" } else { "" }
    );
    if ctx.best_score < 0.0 {
        return None;
    }
    Some(ctx.best)
}

/// Repeatedly take the best-scoring triple; stop when nothing scores above zero.
fn greedy_picks(entrants: &[Entrant]) -> Vec<Candidate> {
    let mut available: Vec<usize> = (0..entrants.len()).collect();
    let mut picks = Vec::new();
    while available.len() >= POOL_SIZE {
        let mut best: Option<Candidate> = None;
        for candidate in triples(entrants, &available) {
            if best.as_ref().map_or(true, |b| candidate.score > b.score) {
                best = Some(candidate);
            }
        }
        match best {
            Some(c) if c.score > 0.0 => {
                available.retain(|i| !c.members.contains(i));
                picks.push(c);
            }
            _ => break,
        }
    }
    picks
}

/// Every triple of `indices`, in index order, with its score.
fn triples(entrants: &[Entrant], indices: &[usize]) -> Vec<Candidate> {
    let n = indices.len();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) * n.saturating_sub(2) / 6);
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                let members = [indices[i], indices[j], indices[k]];
                let c = score_triple(
                    &entrants[members[0]],
                    &entrants[members[1]],
                    &entrants[members[2]],
                );
                out.push(Candidate {
                    members,
                    score: c.score,
                    slot: c.slot,
                });
            }
        }
    }
    out
}

fn build_formation(entrants: &[Entrant], picks: Vec<Candidate>, ids: &mut PoolIdSequence) -> Formation {
    let mut used = vec![false; entrants.len()];
    let pools: Vec<Pool> = picks
        .into_iter()
        .map(|pick| {
            let id = ids.next_id();
            let mut pool = Pool::new(id, entrants[pick.members[0]].category.clone());
            pool.time_slot = pick.slot;
            pool.score = pick.score;
            for &i in &pick.members {
                used[i] = true;
                let mut e = entrants[i].clone();
                e.assigned_pool = Some(id);
                e.standing = None;
                pool.entrants.push(e);
            }
            pool.generate_matches();
            pool
        })
        .collect();
    let leftover: Vec<Entrant> = entrants
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(e, _)| {
            let mut e = e.clone();
            e.assigned_pool = None;
            e
        })
        .collect();
    Formation { pools, leftover }
}

/// Form pools for every configured category with one shared id sequence.
///
/// Entrants in categories the config does not know are left over.
pub fn form_all_groups(
    entrants: &[Entrant],
    config: &TournamentConfig,
    options: FormationOptions,
) -> FormationReport {
    let mut ids = PoolIdSequence::default();
    let mut report = FormationReport::default();

    for category in &config.categories {
        let members: Vec<Entrant> = entrants
            .iter()
            .filter(|e| &e.category == category)
            .cloned()
            .collect();
        if members.is_empty() {
            continue;
        }
        let formation = form_groups_with(&members, &mut ids, options);
        log::info!(
            "Category {}: {} entrants, {} pools, {} left over",
            category,
            members.len(),
            formation.pools.len(),
            formation.leftover.len()
        );
        report.leftover.extend(formation.leftover);
        report.pools.insert(category.clone(), formation.pools);
    }

    for e in entrants.iter().filter(|e| !config.is_known_category(&e.category)) {
        log::warn!("Entrant {} has unknown category {:?}", e.id, e.category);
        let mut e = e.clone();
        e.assigned_pool = None;
        report.leftover.push(e);
    }

    report.statistics = formation_statistics(entrants.len(), &report.pools, report.leftover.len());
    report
}

/// Totals and score distribution of a set of pools.
pub fn formation_statistics(
    total_entrants: usize,
    pools: &BTreeMap<String, Vec<Pool>>,
    leftover: usize,
) -> FormationStatistics {
    let scores: Vec<f64> = pools.values().flatten().map(|p| p.score).collect();
    let assigned = total_entrants.saturating_sub(leftover);
    FormationStatistics {
        total_entrants,
        assigned_entrants: assigned,
        leftover_entrants: leftover,
        assigned_percentage: if total_entrants > 0 {
            assigned as f64 / total_entrants as f64 * 100.0
        } else {
            0.0
        },
        total_pools: scores.len(),
        pools_per_category: pools.iter().map(|(c, p)| (c.clone(), p.len())).collect(),
        entrants_per_category: pools
            .iter()
            .map(|(c, p)| (c.clone(), p.iter().map(|p| p.entrants.len()).sum()))
            .collect(),
        average_score: if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        },
        perfect_pools: scores.iter().filter(|s| **s >= PERFECT_SCORE).count(),
        partial_pools: scores.iter().filter(|s| (2.0..PERFECT_SCORE).contains(*s)).count(),
    }
}

/// Replace the tournament's pools with a fresh formation. Existing brackets are dropped.
pub fn form_tournament_groups(tournament: &mut Tournament, options: FormationOptions) {
    let report = form_all_groups(&tournament.entrants, &tournament.config, options);
    install_formation(tournament, report);
}

/// Pools and leftover a formation run was started from.
#[derive(Clone, Debug, PartialEq)]
pub struct PoolLayout {
    pools: BTreeMap<String, Vec<Pool>>,
    leftover: Vec<Entrant>,
}

impl PoolLayout {
    pub fn of(tournament: &Tournament) -> Self {
        Self {
            pools: tournament.pools.clone(),
            leftover: tournament.leftover.clone(),
        }
    }
}

/// Install a formation computed away from the tournament.
///
/// Fails with [`EngineError::PoolsChanged`], leaving the tournament as it is,
/// when its pools or leftover no longer match `started_from`.
pub fn apply_formation(
    tournament: &mut Tournament,
    report: FormationReport,
    started_from: &PoolLayout,
) -> Result<(), EngineError> {
    if tournament.pools != started_from.pools || tournament.leftover != started_from.leftover {
        log::warn!("Pools of tournament {} changed during formation", tournament.id);
        return Err(EngineError::PoolsChanged);
    }
    install_formation(tournament, report);
    Ok(())
}

fn install_formation(tournament: &mut Tournament, report: FormationReport) {
    tournament.pools = report.pools;
    tournament.leftover = report.leftover;
    tournament.statistics = Some(report.statistics);
    tournament.brackets.clear();
}

/// Recompute a pool's score and slot after its membership changed.
pub fn rescore_pool(pool: &mut Pool) {
    let c = score_entrants(&pool.entrants);
    pool.score = c.score;
    pool.time_slot = c.slot;
}

/// Add an entrant to a pool by hand and rescore it.
pub fn add_to_pool(pool: &mut Pool, entrant: Entrant) -> Result<(), EngineError> {
    pool.add_entrant(entrant)?;
    rescore_pool(pool);
    Ok(())
}

/// Take an entrant out of a pool by hand and rescore it.
pub fn remove_from_pool(pool: &mut Pool, entrant_id: EntrantId) -> Result<Entrant, EngineError> {
    let entrant = pool.remove_entrant(entrant_id)?;
    rescore_pool(pool);
    Ok(entrant)
}

/// Move an entrant (pooled or left over) into another pool of its category.
pub fn move_entrant(
    tournament: &mut Tournament,
    entrant_id: EntrantId,
    to_pool: PoolId,
) -> Result<(), EngineError> {
    let target = tournament.pool(to_pool)?;
    if target.contains(entrant_id) {
        return Ok(());
    }
    if target.is_full() {
        return Err(EngineError::PoolFull(to_pool));
    }
    let target_category = target.category.clone();

    let source = tournament
        .all_pools()
        .find(|p| p.contains(entrant_id))
        .map(|p| p.id);
    let category = match source {
        Some(pool_id) => tournament.pool(pool_id)?.entrant(entrant_id).map(|e| e.category.clone()),
        None => tournament
            .leftover
            .iter()
            .find(|e| e.id == entrant_id)
            .map(|e| e.category.clone()),
    }
    .ok_or(EngineError::EntrantNotFound(entrant_id))?;
    if category != target_category {
        return Err(EngineError::CategoryMismatch {
            expected: target_category,
            found: category,
        });
    }

    let entrant = match source {
        Some(pool_id) => remove_from_pool(tournament.pool_mut(pool_id)?, entrant_id)?,
        None => {
            let idx = tournament
                .leftover
                .iter()
                .position(|e| e.id == entrant_id)
                .ok_or(EngineError::EntrantNotFound(entrant_id))?;
            tournament.leftover.remove(idx)
        }
    };
    add_to_pool(tournament.pool_mut(to_pool)?, entrant)
}

/// Take an entrant out of its pool and put it back among the leftover.
pub fn release_entrant(tournament: &mut Tournament, entrant_id: EntrantId) -> Result<(), EngineError> {
    let pool_id = tournament
        .all_pools()
        .find(|p| p.contains(entrant_id))
        .map(|p| p.id)
        .ok_or(EngineError::EntrantNotFound(entrant_id))?;
    let entrant = remove_from_pool(tournament.pool_mut(pool_id)?, entrant_id)?;
    tournament.leftover.push(entrant);
    Ok(())
}

/// Open an empty pool in a category, continuing the id sequence.
pub fn create_pool(tournament: &mut Tournament, category: &str) -> Result<PoolId, EngineError> {
    if !tournament.config.is_known_category(category) {
        return Err(EngineError::CategoryMismatch {
            expected: tournament.config.categories.join("/"),
            found: category.to_string(),
        });
    }
    let id = PoolIdSequence::after(tournament.last_pool_id()).next_id();
    tournament
        .pools
        .entry(category.to_string())
        .or_default()
        .push(Pool::new(id, category));
    Ok(id)
}
