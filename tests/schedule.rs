//! Integration tests for the group-stage and bracket-day calendars.

use chrono::NaiveTime;
use doubles_tournament::logic::{
    bracket_day_blocks, generate_bracket, schedule_bracket_day, schedule_group_stage,
    UnplacedReason,
};
use doubles_tournament::models::{CalendarEntry, CellKey};
use doubles_tournament::{
    Bracket, EngineError, Entrant, Pool, TimeSlot, TournamentConfig, Track,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn pool(id: u32, category: &str, slot: Option<&str>) -> Pool {
    let mut pool = Pool::new(id, category);
    for n in 1..=3 {
        let entrant_id = id * 10 + n;
        pool.add_entrant(Entrant::new(
            entrant_id,
            format!("P{entrant_id}"),
            category,
            slot.into_iter(),
        ))
        .unwrap();
    }
    pool.time_slot = slot.map(String::from);
    pool.score = 3.0;
    pool
}

#[test]
fn pools_sharing_a_slot_spread_over_courts() {
    let config = TournamentConfig::default();
    let pools = vec![
        pool(1, "Fifth", Some("Thursday 18:00")),
        pool(2, "Fifth", Some("Thursday 18:00")),
    ];
    let schedule = schedule_group_stage(&pools, 2, &config).unwrap();

    assert_eq!(schedule.calendar.len(), 6);
    assert!(schedule.conflicts.is_empty());
    assert!(schedule.unplaced.is_empty());
    match schedule.calendar.get(&CellKey::new("Thursday", time(19, 0), 2)) {
        Some(CalendarEntry::GroupStage(e)) => {
            assert_eq!(e.pool_id, 2);
            assert_eq!(e.match_number, 2);
            assert_eq!((e.first.as_str(), e.second.as_str()), ("P21", "P23"));
        }
        other => panic!("unexpected cell {other:?}"),
    }
}

#[test]
fn a_third_pool_on_two_courts_is_a_conflict() {
    let config = TournamentConfig::default();
    let pools: Vec<Pool> = (1..=3).map(|id| pool(id, "Fifth", Some("Thursday 18:00"))).collect();
    let schedule = schedule_group_stage(&pools, 2, &config).unwrap();

    assert_eq!(schedule.calendar.len(), 6);
    assert_eq!(schedule.conflicts.len(), 1);
    let conflict = &schedule.conflicts[0];
    assert_eq!(conflict.pool_id, 3);
    assert_eq!(conflict.court, 1);
    assert_eq!(conflict.hours, vec![time(18, 0), time(19, 0), time(20, 0)]);

    assert_eq!(schedule.unplaced.len(), 3);
    assert!(schedule.unplaced.iter().all(|u| u.pool_id == 3
        && matches!(u.reason, UnplacedReason::CellTaken { .. })));
}

#[test]
fn overlapping_slots_lose_only_the_shared_hour() {
    let config = TournamentConfig::default();
    // Thursday 18:00 covers 18-20, Thursday 20:00 covers 20-22.
    let pools = vec![
        pool(1, "Fourth", Some("Thursday 20:00")),
        pool(2, "Fifth", Some("Thursday 18:00")),
    ];
    let schedule = schedule_group_stage(&pools, 1, &config).unwrap();

    // The 18:00 slot comes first in the slot table, so pool 2 keeps 20:00.
    match schedule.calendar.get(&CellKey::new("Thursday", time(20, 0), 1)) {
        Some(CalendarEntry::GroupStage(e)) => assert_eq!(e.pool_id, 2),
        other => panic!("unexpected cell {other:?}"),
    }
    assert_eq!(schedule.conflicts.len(), 1);
    assert_eq!(schedule.conflicts[0].hours, vec![time(20, 0)]);
    assert_eq!(schedule.unplaced.len(), 1);
    assert_eq!(schedule.unplaced[0].pool_id, 1);
    assert_eq!(schedule.unplaced[0].match_number, 1);
    assert_eq!(schedule.calendar.len(), 5);
}

#[test]
fn unknown_slot_label_is_an_error() {
    let config = TournamentConfig::default();
    let pools = vec![pool(1, "Fifth", Some("Monday 10:00"))];
    assert_eq!(
        schedule_group_stage(&pools, 2, &config),
        Err(EngineError::UnknownTimeSlot("Monday 10:00".into()))
    );
}

#[test]
fn pools_without_a_slot_are_reported() {
    let config = TournamentConfig::default();
    let pools = vec![pool(1, "Fifth", None), pool(2, "Fifth", Some("Friday 18:00"))];
    let schedule = schedule_group_stage(&pools, 2, &config).unwrap();
    assert_eq!(schedule.unassigned_pools, vec![1]);
    assert_eq!(schedule.calendar.len(), 3);
}

#[test]
fn short_slots_leave_matches_unplaced() {
    let config = TournamentConfig {
        time_slots: vec![TimeSlot {
            label: "Friday 19:00".into(),
            day: "Friday".into(),
            hours: vec![time(19, 0), time(20, 0)],
        }],
        ..TournamentConfig::default()
    };
    let pools = vec![pool(1, "Fifth", Some("Friday 19:00"))];
    let schedule = schedule_group_stage(&pools, 1, &config).unwrap();
    assert_eq!(schedule.calendar.len(), 2);
    assert_eq!(schedule.unplaced.len(), 1);
    assert_eq!(schedule.unplaced[0].match_number, 3);
    assert_eq!(schedule.unplaced[0].reason, UnplacedReason::NoHourLeft);
}

#[test]
fn every_match_is_placed_once_or_reported() {
    let config = TournamentConfig::default();
    let mut rng = StdRng::seed_from_u64(5);
    let pools: Vec<Pool> = (1..=30)
        .map(|id| {
            let slot = &config.time_slots[rng.gen_range(0..config.time_slots.len())];
            pool(id, "Sixth", Some(slot.label.as_str()))
        })
        .collect();
    let schedule = schedule_group_stage(&pools, 3, &config).unwrap();
    assert_eq!(schedule.calendar.len() + schedule.unplaced.len(), 90);

    let mut seen = std::collections::HashSet::new();
    for (_, entry) in schedule.calendar.iter() {
        if let CalendarEntry::GroupStage(e) = entry {
            assert!(seen.insert((e.pool_id, e.match_number)));
        }
    }
}

#[test]
fn default_bracket_day_has_twelve_blocks() {
    let blocks = bracket_day_blocks(&TournamentConfig::default());
    let starts: Vec<NaiveTime> = blocks.iter().map(|b| b.start).collect();
    assert_eq!(
        starts,
        vec![
            time(9, 0),
            time(10, 10),
            time(11, 20),
            time(12, 30),
            time(13, 40),
            time(15, 0),
            time(16, 10),
            time(17, 20),
            time(18, 30),
            time(19, 40),
            time(20, 50),
            time(22, 0),
        ]
    );
    assert!(blocks.iter().all(|b| b.end == b.start + chrono::Duration::minutes(60)));
}

fn open_bracket(category: &str, pool_count: u32, first_id: u32) -> Bracket {
    let pools: Vec<Pool> = (0..pool_count)
        .map(|i| pool(first_id + i, category, Some("Saturday 09:00")))
        .collect();
    generate_bracket(category, &pools)
}

fn block_of(schedule: &doubles_tournament::logic::BracketDaySchedule, match_id: &str) -> NaiveTime {
    schedule
        .calendar
        .iter()
        .find_map(|(key, entry)| match entry {
            CalendarEntry::Bracket(e) if e.match_id == match_id => Some(key.time),
            _ => None,
        })
        .unwrap()
}

#[test]
fn bracket_day_runs_rounds_in_order_and_after_feeders() {
    let config = TournamentConfig::default();
    let brackets = vec![open_bracket("Fifth", 4, 10), open_bracket("Fourth", 4, 20)];
    let schedule = schedule_bracket_day(&brackets, &config);

    assert_eq!(schedule.calendar.len(), 14);
    assert!(schedule.unscheduled.is_empty());

    // Fourth has priority over Fifth within a round.
    assert_eq!(block_of(&schedule, "Fourth-qf-1"), time(9, 0));
    assert_eq!(block_of(&schedule, "Fifth-qf-1"), time(11, 20));
    assert_eq!(block_of(&schedule, "Fourth-sf-1"), time(13, 40));
    assert_eq!(block_of(&schedule, "Fifth-final-1"), time(16, 10));

    for bracket in &brackets {
        for feed in &bracket.feeds {
            assert!(block_of(&schedule, &feed.from) < block_of(&schedule, &feed.to));
        }
    }
}

#[test]
fn bracket_day_skips_matches_nobody_plays() {
    let config = TournamentConfig::default();
    let brackets = vec![open_bracket("Fifth", 2, 1)];
    let schedule = schedule_bracket_day(&brackets, &config);
    let ids: Vec<String> = schedule
        .calendar
        .iter()
        .filter_map(|(_, entry)| match entry {
            CalendarEntry::Bracket(e) => Some(e.match_id.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(ids, vec!["Fifth-qf-1", "Fifth-qf-2", "Fifth-sf-1"]);
}

#[test]
fn matches_past_the_last_block_are_unscheduled() {
    let config = TournamentConfig {
        courts: 1,
        bracket_tracks: vec![Track {
            name: "morning".into(),
            start: time(9, 0),
            end: time(11, 0),
        }],
        ..TournamentConfig::default()
    };
    let brackets = vec![open_bracket("Fifth", 2, 1)];
    let schedule = schedule_bracket_day(&brackets, &config);

    assert_eq!(schedule.blocks.len(), 1);
    assert_eq!(schedule.calendar.len(), 1);
    let unscheduled: Vec<&str> = schedule.unscheduled.iter().map(|u| u.match_id.as_str()).collect();
    assert_eq!(unscheduled, vec!["Fifth-qf-2", "Fifth-sf-1"]);
}
