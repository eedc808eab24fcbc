//! Knockout bracket generation from pool standings.
//!
//! The shape depends only on how many pools the category has. Each shape is
//! one entry of [`topology`]: the round play starts in, who is seeded where,
//! and how winners feed forward. Slots whose pool is not finished get a
//! placeholder and are filled in by [`refresh_bracket`].

use crate::logic::standings::compute_standings;
use crate::models::{
    match_id, Bracket, BracketMatch, Contender, Feed, Pool, Round, SeedSource, Side, Slot,
    Standing, Tournament,
};

/// Pool position seeded into a slot.
#[derive(Clone, Copy, Debug)]
struct Seed {
    standing: Standing,
    pool: usize,
}

const fn first(pool: usize) -> Seed {
    Seed {
        standing: Standing::First,
        pool,
    }
}

const fn second(pool: usize) -> Seed {
    Seed {
        standing: Standing::Second,
        pool,
    }
}

const fn third(pool: usize) -> Seed {
    Seed {
        standing: Standing::Third,
        pool,
    }
}

/// Bracket shape for a pool count.
struct Topology {
    first_round: Round,
    /// First-round pairings by match; `None` leaves the match empty.
    pairings: Vec<Option<[Seed; 2]>>,
    /// Seeds placed directly into a later round.
    byes: Vec<(Round, u8, Side, Seed)>,
    /// Feeds replacing the standard odd/even rule: (round, number) -> destination, `None` drops the feed.
    feed_overrides: Vec<((Round, u8), Option<(Round, u8, Side)>)>,
}

impl Topology {
    fn new(first_round: Round, pairings: Vec<Option<[Seed; 2]>>) -> Self {
        Self {
            first_round,
            pairings,
            byes: Vec::new(),
            feed_overrides: Vec::new(),
        }
    }

    fn rounds(&self) -> impl Iterator<Item = Round> + '_ {
        Round::ALL.into_iter().filter(move |r| *r >= self.first_round)
    }

    /// Destination of the winner of `(round, number)`.
    fn destination(&self, round: Round, number: u8) -> Option<(Round, u8, Side)> {
        if let Some((_, dest)) = self.feed_overrides.iter().find(|(src, _)| *src == (round, number)) {
            return *dest;
        }
        let next = round.next()?;
        Some((next, (number - 1) / 2 + 1, Side::for_match_number(number)))
    }
}

fn topology(pool_count: usize) -> Topology {
    match pool_count {
        0 => Topology::new(Round::Semifinal, vec![None, None]),
        1 => {
            // 1st has a bye to the semifinal and meets the winner of 2nd vs 3rd.
            let mut t = Topology::new(
                Round::Quarterfinal,
                vec![Some([second(0), third(0)]), None, None, None],
            );
            t.byes.push((Round::Semifinal, 1, Side::One, first(0)));
            t.feed_overrides = vec![
                ((Round::Quarterfinal, 1), Some((Round::Semifinal, 1, Side::Two))),
                ((Round::Quarterfinal, 2), None),
            ];
            t
        }
        2 => Topology::new(
            Round::Quarterfinal,
            vec![
                Some([first(0), second(1)]),
                Some([first(1), second(0)]),
                None,
                None,
            ],
        ),
        3 => Topology::new(
            Round::Quarterfinal,
            vec![
                Some([first(0), second(1)]),
                Some([first(1), second(2)]),
                Some([first(2), second(0)]),
                None,
            ],
        ),
        4..=7 => Topology::new(
            Round::Quarterfinal,
            // Pools A and B sit in opposite halves so their winners can only meet in the final.
            vec![
                Some([first(0), second(2)]),
                Some([first(3), second(1)]),
                Some([first(1), second(3)]),
                Some([first(2), second(0)]),
            ],
        ),
        _ => Topology::new(
            Round::RoundOf16,
            (0..8).map(|i| Some([first(i), second(i)])).collect(),
        ),
    }
}

/// Pools of `category`, in the given order.
fn category_pools<'a>(category: &str, pools: &'a [Pool]) -> Vec<&'a Pool> {
    pools.iter().filter(|p| p.category == category).collect()
}

/// Entrant holding `seed`, or the placeholder naming it.
fn resolve(seed: &SeedSource, pools: &[&Pool]) -> Slot {
    let contender = pools.get(seed.pool_index).and_then(|pool| {
        compute_standings(pool)
            .into_iter()
            .find(|(_, s)| *s == seed.standing)
            .and_then(|(id, _)| pool.entrant(id))
            .map(|e| Contender {
                id: e.id,
                name: e.name.clone(),
            })
    });
    match contender {
        Some(c) => Slot::Filled(c),
        None => Slot::Placeholder(seed.description()),
    }
}

/// Build the full bracket for a category from its pools.
pub fn generate_bracket(category: &str, pools: &[Pool]) -> Bracket {
    let pools = category_pools(category, pools);
    let topology = topology(pools.len());

    let mut matches: Vec<BracketMatch> = topology
        .rounds()
        .flat_map(|round| (1..=round.size() as u8).map(move |n| BracketMatch::new(category, round, n)))
        .collect();

    let mut seeds = Vec::new();
    for (number, pairing) in (1u8..).zip(&topology.pairings) {
        if let Some(pair) = pairing {
            for (side, seed) in [Side::One, Side::Two].into_iter().zip(pair) {
                seeds.push(SeedSource {
                    match_id: match_id(category, topology.first_round, number),
                    side,
                    pool_index: seed.pool,
                    standing: seed.standing,
                });
            }
        }
    }
    for (round, number, side, seed) in &topology.byes {
        seeds.push(SeedSource {
            match_id: match_id(category, *round, *number),
            side: *side,
            pool_index: seed.pool,
            standing: seed.standing,
        });
    }
    for seed in &seeds {
        if let Some(m) = matches.iter_mut().find(|m| m.id == seed.match_id) {
            m.slots[seed.side.index()] = resolve(seed, &pools);
        }
    }

    let feeds: Vec<Feed> = matches
        .iter()
        .filter_map(|m| {
            topology
                .destination(m.round, m.number)
                .map(|(round, number, side)| Feed {
                    from: m.id.clone(),
                    to: match_id(category, round, number),
                    side,
                })
        })
        .collect();

    // Matches are in round order, so a source's slots are final before it feeds on.
    for i in 0..matches.len() {
        if matches[i].is_void() {
            continue;
        }
        let Some(feed) = feeds.iter().find(|f| f.from == matches[i].id) else {
            continue;
        };
        let placeholder = format!("Winner of {}", matches[i].title());
        if let Some(dest) = matches.iter_mut().find(|m| m.id == feed.to) {
            let slot = &mut dest.slots[feed.side.index()];
            if *slot == Slot::Empty {
                *slot = Slot::Placeholder(placeholder);
            }
        }
    }

    log::info!(
        "Generated {} bracket from {} pools, starting at {}",
        category,
        pools.len(),
        topology.first_round
    );

    Bracket {
        category: category.to_string(),
        pool_count: pools.len(),
        matches,
        feeds,
        seeds,
    }
}

/// Fill seeded slots from newer pool standings, keeping recorded winners.
///
/// Seeded slots of undecided matches are re-resolved; propagated slots and
/// winners are left alone. If the category's pool count changed the shape no
/// longer fits, and the bracket is rebuilt from scratch.
pub fn refresh_bracket(bracket: &mut Bracket, pools: &[Pool]) {
    let pools = category_pools(&bracket.category, pools);
    if pools.len() != bracket.pool_count {
        log::warn!(
            "{} bracket was built for {} pools, now {}; rebuilding",
            bracket.category,
            bracket.pool_count,
            pools.len()
        );
        let owned: Vec<Pool> = pools.into_iter().cloned().collect();
        *bracket = generate_bracket(&bracket.category, &owned);
        return;
    }

    let updates: Vec<(usize, Side, Slot)> = bracket
        .seeds
        .iter()
        .filter_map(|seed| {
            let idx = bracket.matches.iter().position(|m| m.id == seed.match_id)?;
            if bracket.matches[idx].winner.is_some() {
                return None;
            }
            Some((idx, seed.side, resolve(seed, &pools)))
        })
        .collect();
    for (idx, side, slot) in updates {
        bracket.matches[idx].slots[side.index()] = slot;
    }
}

/// Generate missing brackets and refresh existing ones for every category with pools.
pub fn build_tournament_brackets(tournament: &mut Tournament) {
    for (category, pools) in &tournament.pools {
        match tournament.brackets.get_mut(category) {
            Some(bracket) => refresh_bracket(bracket, pools),
            None => {
                tournament
                    .brackets
                    .insert(category.clone(), generate_bracket(category, pools));
            }
        }
    }
}
