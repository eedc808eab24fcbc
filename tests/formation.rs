//! Integration tests for pool formation: partitioning, search quality and manual edits.

use doubles_tournament::logic::{
    apply_formation, create_pool, form_all_groups, form_groups, form_groups_greedy, form_groups_with,
    form_tournament_groups, move_entrant, release_entrant, score_triple, FormationOptions,
    PoolIdSequence, PoolLayout,
};
use doubles_tournament::{EngineError, Entrant, Tournament, TournamentConfig};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::time::Instant;

const SLOTS: [&str; 8] = [
    "Thursday 18:00",
    "Thursday 20:00",
    "Friday 18:00",
    "Friday 21:00",
    "Saturday 09:00",
    "Saturday 12:00",
    "Saturday 16:00",
    "Saturday 19:00",
];

fn entrant(id: u32, category: &str, slots: &[&str]) -> Entrant {
    Entrant::new(id, format!("Pair {id}"), category, slots.iter().copied())
}

fn random_entrants(rng: &mut StdRng, n: u32) -> Vec<Entrant> {
    (1..=n)
        .map(|id| {
            let k = rng.gen_range(1..=3);
            let slots: Vec<&str> = SLOTS.choose_multiple(rng, k).copied().collect();
            entrant(id, "Fifth", &slots)
        })
        .collect()
}

/// Best total over every set of disjoint positive-scoring triples.
fn brute_force_best(entrants: &[Entrant], remaining: &[usize]) -> f64 {
    let mut best = 0.0_f64;
    let n = remaining.len();
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                let (a, b, c) = (remaining[i], remaining[j], remaining[k]);
                let score = score_triple(&entrants[a], &entrants[b], &entrants[c]).score;
                if score <= 0.0 {
                    continue;
                }
                let rest: Vec<usize> = remaining
                    .iter()
                    .copied()
                    .filter(|x| *x != a && *x != b && *x != c)
                    .collect();
                best = best.max(score + brute_force_best(entrants, &rest));
            }
        }
    }
    best
}

fn assert_partition(entrants: &[Entrant], pools: &[doubles_tournament::Pool], leftover: &[Entrant]) {
    let mut seen = HashSet::new();
    for pool in pools {
        assert_eq!(pool.entrants.len(), 3);
        assert_eq!(pool.matches.len(), 3);
        for e in &pool.entrants {
            assert!(seen.insert(e.id), "entrant {} placed twice", e.id);
            assert_eq!(e.assigned_pool, Some(pool.id));
        }
    }
    for e in leftover {
        assert!(seen.insert(e.id), "entrant {} both pooled and left over", e.id);
        assert_eq!(e.assigned_pool, None);
    }
    assert_eq!(seen.len(), entrants.len());
}

#[test]
fn nine_entrants_with_three_shared_slots_form_three_perfect_pools() {
    let entrants = vec![
        entrant(1, "Fifth", &["Thursday 18:00", "Friday 21:00"]),
        entrant(2, "Fifth", &["Saturday 09:00"]),
        entrant(3, "Fifth", &["Friday 18:00"]),
        entrant(4, "Fifth", &["Saturday 09:00", "Saturday 12:00"]),
        entrant(5, "Fifth", &["Thursday 18:00"]),
        entrant(6, "Fifth", &["Friday 18:00", "Saturday 19:00"]),
        entrant(7, "Fifth", &["Saturday 09:00"]),
        entrant(8, "Fifth", &["Friday 18:00"]),
        entrant(9, "Fifth", &["Thursday 18:00"]),
    ];
    let formation = form_groups(&entrants, &mut PoolIdSequence::default());

    assert_eq!(formation.pools.len(), 3);
    assert!(formation.leftover.is_empty());
    assert_eq!(formation.total_score(), 9.0);
    assert_partition(&entrants, &formation.pools, &formation.leftover);

    let mut slots: Vec<&str> = formation
        .pools
        .iter()
        .filter_map(|p| p.time_slot.as_deref())
        .collect();
    slots.sort();
    assert_eq!(slots, vec!["Friday 18:00", "Saturday 09:00", "Thursday 18:00"]);
}

#[test]
fn search_matches_brute_force_on_small_categories() {
    let mut rng = StdRng::seed_from_u64(7);
    for round in 0..40 {
        let n = rng.gen_range(6..=9);
        let entrants = random_entrants(&mut rng, n);
        let formation = form_groups(&entrants, &mut PoolIdSequence::default());
        let all: Vec<usize> = (0..entrants.len()).collect();
        let best = brute_force_best(&entrants, &all);

        assert_partition(&entrants, &formation.pools, &formation.leftover);
        assert!(
            (formation.total_score() - best).abs() < 1e-9,
            "round {round}: search found {} but best is {}",
            formation.total_score(),
            best
        );
    }
}

#[test]
fn large_categories_use_greedy_and_still_partition() {
    // 24 entrants, 8 possible pools: outside the exhaustive range.
    let entrants: Vec<Entrant> = (0..24u32)
        .map(|i| entrant(i + 1, "Fourth", &[SLOTS[(i / 3) as usize]]))
        .collect();
    let formation = form_groups(&entrants, &mut PoolIdSequence::default());

    assert_eq!(formation.pools.len(), 8);
    assert!(formation.leftover.is_empty());
    assert_eq!(formation.total_score(), 24.0);
    assert_eq!(formation, form_groups_greedy(&entrants, &mut PoolIdSequence::default()));
}

#[test]
fn entrants_with_no_shared_day_are_left_over() {
    let entrants = vec![
        entrant(1, "Sixth", &["Thursday 18:00"]),
        entrant(2, "Sixth", &["Friday 18:00"]),
        entrant(3, "Sixth", &["Saturday 09:00"]),
    ];
    let formation = form_groups(&entrants, &mut PoolIdSequence::default());
    assert!(formation.pools.is_empty());
    assert_eq!(formation.leftover.len(), 3);
}

#[test]
fn unpoolable_entrants_stay_left_over_beside_the_best_pool() {
    let entrants = vec![
        entrant(1, "Fifth", &["Friday 18:00"]),
        entrant(2, "Fifth", &["Friday 18:00"]),
        entrant(3, "Fifth", &["Friday 18:00"]),
        entrant(4, "Fifth", &["Thursday 18:00"]),
        entrant(5, "Fifth", &["Saturday 09:00"]),
        entrant(6, "Fifth", &[]),
    ];
    let formation = form_groups(&entrants, &mut PoolIdSequence::default());
    assert_partition(&entrants, &formation.pools, &formation.leftover);
    assert_eq!(formation.pools.len(), 1);
    assert_eq!(formation.total_score(), 3.0);

    let mut leftover: Vec<u32> = formation.leftover.iter().map(|e| e.id).collect();
    leftover.sort();
    assert_eq!(leftover, vec![4, 5, 6]);
}

#[test]
fn fewer_than_three_entrants_form_nothing() {
    let entrants = vec![
        entrant(1, "Sixth", &["Thursday 18:00"]),
        entrant(2, "Sixth", &["Thursday 18:00"]),
    ];
    let formation = form_groups(&entrants, &mut PoolIdSequence::default());
    assert!(formation.pools.is_empty());
    assert_eq!(formation.leftover.len(), 2);
}

#[test]
fn expired_deadline_falls_back_to_greedy() {
    let mut rng = StdRng::seed_from_u64(11);
    let entrants = random_entrants(&mut rng, 9);
    let options = FormationOptions {
        deadline: Some(Instant::now()),
    };
    let formation = form_groups_with(&entrants, &mut PoolIdSequence::default(), options);
    assert_partition(&entrants, &formation.pools, &formation.leftover);
    assert_eq!(formation, form_groups_greedy(&entrants, &mut PoolIdSequence::default()));
}

#[test]
fn scorer_ignores_entrant_order() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..50 {
        let e = random_entrants(&mut rng, 3);
        let reference = score_triple(&e[0], &e[1], &e[2]);
        assert_eq!(score_triple(&e[2], &e[0], &e[1]), reference);
        assert_eq!(score_triple(&e[1], &e[2], &e[0]), reference);
        assert_eq!(score_triple(&e[0], &e[2], &e[1]), reference);
        assert!(reference.score == 0.0 || reference.score > 1.0);
        assert!(reference.score <= 3.0);
    }
}

#[test]
fn pool_ids_are_consecutive_across_categories() {
    let config = TournamentConfig::default();
    let mut entrants = Vec::new();
    for (c, category) in ["Fourth", "Fifth"].iter().enumerate() {
        for i in 0..6u32 {
            let id = c as u32 * 10 + i + 1;
            entrants.push(entrant(id, category, &[SLOTS[(i / 3) as usize]]));
        }
    }
    entrants.push(entrant(99, "Open", &["Thursday 18:00"]));

    let report = form_all_groups(&entrants, &config, FormationOptions::default());
    let ids: Vec<u32> = report.pools.values().flatten().map(|p| p.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(sorted, vec![1, 2, 3, 4]);

    assert_eq!(report.leftover.len(), 1);
    assert_eq!(report.leftover[0].id, 99);
    assert_eq!(report.statistics.total_entrants, 13);
    assert_eq!(report.statistics.assigned_entrants, 12);
    assert_eq!(report.statistics.perfect_pools, 4);
    assert_eq!(report.statistics.pools_per_category.get("Fifth"), Some(&2));
}

fn small_tournament() -> Tournament {
    let entrants = vec![
        entrant(1, "Fifth", &["Friday 18:00"]),
        entrant(2, "Fifth", &["Friday 18:00"]),
        entrant(3, "Fifth", &["Friday 18:00"]),
        entrant(4, "Fifth", &["Saturday 09:00"]),
        entrant(5, "Fifth", &["Saturday 09:00"]),
        entrant(6, "Fifth", &["Saturday 09:00"]),
        entrant(7, "Fifth", &["Thursday 18:00"]),
    ];
    let mut t = Tournament::new(TournamentConfig::default(), entrants).unwrap();
    form_tournament_groups(&mut t, FormationOptions::default());
    t
}

#[test]
fn manual_moves_rescore_pools() {
    let mut t = small_tournament();
    assert_eq!(t.leftover.len(), 1);
    let friday = t.all_pools().find(|p| p.contains(1)).unwrap().id;

    release_entrant(&mut t, 1).unwrap();
    let pool = t.pool(friday).unwrap();
    assert_eq!(pool.entrants.len(), 2);
    assert!(pool.matches.is_empty());
    assert_eq!(pool.score, 2.0);
    assert_eq!(t.leftover.len(), 2);

    move_entrant(&mut t, 7, friday).unwrap();
    let pool = t.pool(friday).unwrap();
    assert!(pool.is_full());
    assert_eq!(pool.matches.len(), 3);
    // Two exact matches on Friday 18:00, the newcomer plays another day.
    assert_eq!(pool.score, 2.0);
    assert_eq!(pool.time_slot.as_deref(), Some("Friday 18:00"));
    assert!(t.leftover.iter().all(|e| e.id != 7));
}

#[test]
fn moving_into_a_full_pool_fails() {
    let mut t = small_tournament();
    let saturday = t.all_pools().find(|p| p.contains(4)).unwrap().id;
    assert_eq!(move_entrant(&mut t, 7, saturday), Err(EngineError::PoolFull(saturday)));
}

#[test]
fn created_pools_continue_the_id_sequence() {
    let mut t = small_tournament();
    let last = t.last_pool_id();
    let id = create_pool(&mut t, "Fifth").unwrap();
    assert_eq!(id, last + 1);
    assert!(matches!(
        create_pool(&mut t, "Open"),
        Err(EngineError::CategoryMismatch { .. })
    ));
}

#[test]
fn formation_is_applied_only_over_the_pools_it_started_from() {
    let mut t = small_tournament();
    let started_from = PoolLayout::of(&t);
    let report = form_all_groups(&t.entrants, &t.config, FormationOptions::default());
    apply_formation(&mut t, report, &started_from).unwrap();
    assert_eq!(t.all_pools().count(), 2);

    // A pool edit lands between the search and the write-back.
    let started_from = PoolLayout::of(&t);
    let report = form_all_groups(&t.entrants, &t.config, FormationOptions::default());
    release_entrant(&mut t, 1).unwrap();
    let edited = PoolLayout::of(&t);

    assert_eq!(
        apply_formation(&mut t, report, &started_from),
        Err(EngineError::PoolsChanged)
    );
    assert_eq!(PoolLayout::of(&t), edited);
    assert!(t.leftover.iter().any(|e| e.id == 1));
}
