//! Compatibility of a candidate pool: how well the entrants' availability lines up.

use crate::models::{slot_day, Entrant};
use std::collections::BTreeSet;

/// Score of a pool whose three entrants all list the same slot.
pub const PERFECT_SCORE: f64 = 3.0;

/// Score and best slot of a candidate pool.
#[derive(Clone, Debug, PartialEq)]
pub struct Compatibility {
    pub score: f64,
    pub slot: Option<String>,
}

impl Compatibility {
    fn none() -> Self {
        Self {
            score: 0.0,
            slot: None,
        }
    }
}

/// Score three entrants.
///
/// A slot all three list scores 3.0. Otherwise every slot any of them lists is
/// tried: each entrant adds 1.0 if it lists the slot and 0.5 if it only plays
/// that day. The best slot wins, earliest label first on ties. If no two
/// entrants share a day the score is 0.0 with no slot.
pub fn score_triple(a: &Entrant, b: &Entrant, c: &Entrant) -> Compatibility {
    let common = a
        .availability
        .iter()
        .find(|s| b.is_available(s) && c.is_available(s));
    if let Some(slot) = common {
        return Compatibility {
            score: PERFECT_SCORE,
            slot: Some(slot.clone()),
        };
    }

    let trio = [a, b, c];
    let union: BTreeSet<&String> = trio.iter().flat_map(|e| e.availability.iter()).collect();

    let mut best = Compatibility::none();
    for slot in union {
        let day = slot_day(slot);
        let score: f64 = trio
            .iter()
            .map(|e| {
                if e.is_available(slot) {
                    1.0
                } else if day.is_some_and(|d| e.plays_on_day(d)) {
                    0.5
                } else {
                    0.0
                }
            })
            .sum();
        if score > best.score {
            best = Compatibility {
                score,
                slot: Some(slot.clone()),
            };
        }
    }

    // A lone entrant's own slot is not a shared one.
    if best.score <= 1.0 {
        return Compatibility::none();
    }
    best
}

/// Score a pool of any size up to three.
///
/// Pools being edited by hand may hold fewer entrants: two entrants score 2.0
/// when they share an exact slot, fewer than two score 0.0.
pub fn score_entrants(entrants: &[Entrant]) -> Compatibility {
    match entrants {
        [a, b, c] => score_triple(a, b, c),
        [a, b] => a
            .availability
            .iter()
            .find(|s| b.is_available(s))
            .map(|slot| Compatibility {
                score: 2.0,
                slot: Some(slot.clone()),
            })
            .unwrap_or_else(Compatibility::none),
        _ => Compatibility::none(),
    }
}
