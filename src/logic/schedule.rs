//! Court scheduling for the group stage and the bracket day.

use crate::config::TournamentConfig;
use crate::models::{
    Bracket, BracketEntry, BracketMatch, BracketMatchId, Calendar, CalendarEntry, CellKey, Court,
    EngineError, GroupStageEntry, Pool, PoolId, Round,
};
use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A pool had to share court hours with an earlier pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CourtConflict {
    pub pool_id: PoolId,
    pub court: Court,
    pub day: String,
    /// Hours already reserved on that court.
    pub hours: Vec<NaiveTime>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnplacedReason {
    /// The cell already holds another match.
    CellTaken { cell: CellKey },
    /// The pool has more matches than its slot has hours.
    NoHourLeft,
}

/// Group-stage match that did not make it into the calendar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnplacedMatch {
    pub pool_id: PoolId,
    pub match_number: u8,
    #[serde(flatten)]
    pub reason: UnplacedReason,
}

/// Result of placing the round-robin matches.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupStageSchedule {
    pub calendar: Calendar,
    pub conflicts: Vec<CourtConflict>,
    pub unplaced: Vec<UnplacedMatch>,
    /// Pools with no time slot, left out of the calendar.
    pub unassigned_pools: Vec<PoolId>,
}

/// Place every pool's round-robin matches on `courts` courts.
///
/// Pools are taken slot by slot in configuration order. A pool gets the first
/// court whose hours for its slot are all free, or else the court with the
/// fewest clashing hours. Its matches then fill the slot's hours in order.
pub fn schedule_group_stage<'a, I>(
    pools: I,
    courts: Court,
    config: &TournamentConfig,
) -> Result<GroupStageSchedule, EngineError>
where
    I: IntoIterator<Item = &'a Pool>,
{
    if courts == 0 {
        return Err(EngineError::InvalidConfig("at least one court is required".into()));
    }
    let pools: Vec<&Pool> = pools.into_iter().collect();
    let mut schedule = GroupStageSchedule::default();

    for pool in &pools {
        match &pool.time_slot {
            Some(label) => {
                config.time_slot(label)?;
            }
            None => schedule.unassigned_pools.push(pool.id),
        }
    }

    // Reserved (day, hour) pairs per court.
    let mut reserved: HashMap<Court, BTreeSet<(String, NaiveTime)>> = HashMap::new();

    for slot in &config.time_slots {
        for pool in pools.iter().filter(|p| p.time_slot.as_deref() == Some(slot.label.as_str())) {
            let wanted: Vec<(String, NaiveTime)> =
                slot.hours.iter().map(|h| (slot.day.clone(), *h)).collect();
            let clashes = |court: Court| -> Vec<NaiveTime> {
                let taken = reserved.get(&court);
                wanted
                    .iter()
                    .filter(|w| taken.is_some_and(|t| t.contains(*w)))
                    .map(|(_, h)| *h)
                    .collect()
            };

            let mut court = 1;
            let mut fewest = usize::MAX;
            let mut clashing = Vec::new();
            for c in 1..=courts {
                let hits = clashes(c);
                if hits.len() < fewest {
                    fewest = hits.len();
                    court = c;
                    clashing = hits;
                }
                if fewest == 0 {
                    break;
                }
            }
            if !clashing.is_empty() {
                log::warn!(
                    "Pool {} ({}) overlaps {} hour(s) on court {} at {}",
                    pool.id,
                    pool.category,
                    clashing.len(),
                    court,
                    slot.label
                );
                schedule.conflicts.push(CourtConflict {
                    pool_id: pool.id,
                    court,
                    day: slot.day.clone(),
                    hours: clashing,
                });
            }
            reserved.entry(court).or_default().extend(wanted);

            for (i, m) in pool.matches.iter().enumerate() {
                let Some(hour) = slot.hours.get(i) else {
                    log::warn!("Pool {} match {} has no hour left in {}", pool.id, m.number, slot.label);
                    schedule.unplaced.push(UnplacedMatch {
                        pool_id: pool.id,
                        match_number: m.number,
                        reason: UnplacedReason::NoHourLeft,
                    });
                    continue;
                };
                let name = |id| pool.entrant(id).map(|e| e.name.clone()).unwrap_or_default();
                let key = CellKey::new(slot.day.clone(), *hour, court);
                let entry = CalendarEntry::GroupStage(GroupStageEntry {
                    category: pool.category.clone(),
                    pool_id: pool.id,
                    match_number: m.number,
                    first: name(m.first),
                    second: name(m.second),
                    pool_score: pool.score,
                });
                if !schedule.calendar.insert(key.clone(), entry) {
                    schedule.unplaced.push(UnplacedMatch {
                        pool_id: pool.id,
                        match_number: m.number,
                        reason: UnplacedReason::CellTaken { cell: key },
                    });
                }
            }
        }
    }

    log::info!(
        "Group stage: {} matches placed, {} conflicts, {} unplaced",
        schedule.calendar.len(),
        schedule.conflicts.len(),
        schedule.unplaced.len()
    );
    Ok(schedule)
}

/// One playing block of the bracket day.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TimeBlock {
    pub track: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Blocks of every track: back-to-back units of play time plus changeover,
/// each ending no later than its track.
pub fn bracket_day_blocks(config: &TournamentConfig) -> Vec<TimeBlock> {
    let play = Duration::minutes(i64::from(config.match_minutes));
    let step = Duration::minutes(i64::from(config.match_minutes + config.changeover_minutes));
    let mut blocks = Vec::new();
    if config.match_minutes == 0 {
        return blocks;
    }
    for track in &config.bracket_tracks {
        let mut start = track.start;
        loop {
            let (end, wrapped) = start.overflowing_add_signed(play);
            if wrapped != 0 || end > track.end {
                break;
            }
            blocks.push(TimeBlock {
                track: track.name.clone(),
                start,
                end,
            });
            let (next, wrapped) = start.overflowing_add_signed(step);
            if wrapped != 0 {
                break;
            }
            start = next;
        }
    }
    blocks.sort_by_key(|b| b.start);
    blocks
}

/// Bracket match left without a block.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct UnscheduledMatch {
    pub category: String,
    pub match_id: BracketMatchId,
    pub round: Round,
    pub number: u8,
}

/// Result of placing the knockout matches.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BracketDaySchedule {
    pub calendar: Calendar,
    pub blocks: Vec<TimeBlock>,
    pub unscheduled: Vec<UnscheduledMatch>,
}

/// Place the knockout matches of every bracket on the bracket day.
///
/// Matches run round by round across all categories, categories in priority
/// order inside a round. Every court of a block is used before the next
/// block, and no match starts in the same block as a match feeding it.
/// Matches that can never be played, and walkovers, are skipped.
pub fn schedule_bracket_day<'a, I>(brackets: I, config: &TournamentConfig) -> BracketDaySchedule
where
    I: IntoIterator<Item = &'a Bracket>,
{
    let blocks = bracket_day_blocks(config);
    let brackets: Vec<&Bracket> = brackets.into_iter().collect();

    let mut queue: Vec<(&Bracket, &BracketMatch)> = brackets
        .iter()
        .flat_map(|b| b.matches.iter().filter(|m| !m.is_void()).map(move |m| (*b, m)))
        .collect();
    queue.sort_by(|(ba, a), (bb, b)| {
        (a.round, config.category_priority(&ba.category), &ba.category, a.number).cmp(&(
            b.round,
            config.category_priority(&bb.category),
            &bb.category,
            b.number,
        ))
    });

    let cells: Vec<(usize, Court)> = (0..blocks.len())
        .flat_map(|b| (1..=config.courts).map(move |c| (b, c)))
        .collect();
    // First block a match's dependents may use.
    let mut clear_from: HashMap<&str, usize> = HashMap::new();
    let mut cursor = 0;
    let mut schedule = BracketDaySchedule::default();

    for (bracket, m) in queue {
        let earliest = bracket
            .feeders_of(&m.id)
            .filter_map(|f| clear_from.get(f.from.as_str()))
            .max()
            .copied()
            .unwrap_or(0);
        if m.is_walkover() {
            clear_from.insert(m.id.as_str(), earliest);
            continue;
        }
        while cursor < cells.len() && cells[cursor].0 < earliest {
            cursor += 1;
        }
        let Some(&(block, court)) = cells.get(cursor) else {
            schedule.unscheduled.push(UnscheduledMatch {
                category: bracket.category.clone(),
                match_id: m.id.clone(),
                round: m.round,
                number: m.number,
            });
            continue;
        };
        cursor += 1;
        clear_from.insert(m.id.as_str(), block + 1);

        let winner = m
            .winner
            .and_then(|id| m.contender(id))
            .map(|c| c.name.clone());
        let entry = CalendarEntry::Bracket(BracketEntry {
            category: bracket.category.clone(),
            match_id: m.id.clone(),
            round: m.round,
            number: m.number,
            first: m.slots[0].label(),
            second: m.slots[1].label(),
            winner,
        });
        schedule
            .calendar
            .insert(CellKey::new(config.bracket_day.clone(), blocks[block].start, court), entry);
    }

    if !schedule.unscheduled.is_empty() {
        log::warn!(
            "Bracket day: {} match(es) did not fit in {} blocks",
            schedule.unscheduled.len(),
            blocks.len()
        );
    }
    schedule.blocks = blocks;
    schedule
}
