//! Winner propagation through a bracket's feed table.

use crate::models::{
    Bracket, BracketMatch, EngineError, EntrantId, Feed, MatchState, Slot, Tournament,
};

/// Record the winner of a bracket match and advance it into the next round.
///
/// Recording the current winner again changes nothing. Replacing a winner
/// replaces the advanced entrant; later results that depended on the old one
/// are withdrawn. An entrant advanced into a match whose other side can never
/// be filled goes through on a walkover; after [`clear_winner`] that entrant
/// can be recorded again by hand.
pub fn record_winner(
    bracket: &mut Bracket,
    match_id: &str,
    entrant_id: EntrantId,
) -> Result<(), EngineError> {
    let m = bracket
        .get(match_id)
        .ok_or_else(|| EngineError::MatchNotFound(match_id.to_string()))?;
    let contender = m
        .contender(entrant_id)
        .cloned()
        .ok_or_else(|| EngineError::EntrantNotInMatch {
            match_id: match_id.to_string(),
            entrant: entrant_id,
        })?;
    if m.winner == Some(entrant_id) {
        return Ok(());
    }
    if !m.slots.iter().all(Slot::is_filled) && !m.is_walkover() {
        return Err(EngineError::MatchNotReady(match_id.to_string()));
    }
    if let Some(previous) = m.winner {
        log::info!(
            "{}: winner of {} changed from {} to {}",
            bracket.category,
            match_id,
            previous,
            entrant_id
        );
    }

    if let Some(m) = bracket.get_mut(match_id) {
        m.winner = Some(entrant_id);
    }
    if let Some(feed) = bracket.feed_from(match_id).cloned() {
        place(bracket, &feed, Slot::Filled(contender));
    }
    if bracket.final_match().is_some_and(|f| f.id == match_id) {
        log::info!("{}: bracket complete, champion {}", bracket.category, entrant_id);
    }
    Ok(())
}

/// Remove a recorded winner and withdraw it from later rounds.
pub fn clear_winner(bracket: &mut Bracket, match_id: &str) -> Result<(), EngineError> {
    if bracket.get(match_id).is_none() {
        return Err(EngineError::MatchNotFound(match_id.to_string()));
    }
    retract(bracket, match_id);
    Ok(())
}

/// Put `slot` into the feed's destination, withdrawing a downstream winner it displaces.
fn place(bracket: &mut Bracket, feed: &Feed, slot: Slot) {
    let new_id = slot.entrant_id();
    let Some(dest) = bracket.get_mut(&feed.to) else {
        return;
    };
    let old = std::mem::replace(&mut dest.slots[feed.side.index()], slot);
    let displaced = old.entrant_id().filter(|id| Some(*id) != new_id);
    if displaced.is_some() && dest.winner == displaced {
        retract(bracket, &feed.to);
    }
    advance_walkover(bracket, &feed.to);
}

/// A contender facing a slot nobody can reach advances straight away.
fn advance_walkover(bracket: &mut Bracket, match_id: &str) {
    let Some(m) = bracket.get(match_id) else {
        return;
    };
    if m.winner.is_some() {
        return;
    }
    let contender = match &m.slots {
        [Slot::Filled(c), Slot::Empty] | [Slot::Empty, Slot::Filled(c)] => c.clone(),
        _ => return,
    };
    log::info!(
        "{}: {} advances from {} on a walkover",
        bracket.category,
        contender.name,
        m.title()
    );
    if let Some(m) = bracket.get_mut(match_id) {
        m.winner = Some(contender.id);
    }
    if let Some(feed) = bracket.feed_from(match_id).cloned() {
        place(bracket, &feed, Slot::Filled(contender));
    }
}

fn retract(bracket: &mut Bracket, match_id: &str) {
    let Some(m) = bracket.get_mut(match_id) else {
        return;
    };
    if m.winner.take().is_none() {
        return;
    }
    let placeholder = format!("Winner of {}", m.title());
    if let Some(feed) = bracket.feed_from(match_id).cloned() {
        place(bracket, &feed, Slot::Placeholder(placeholder));
    }
}

/// Matches with both entrants known and no winner yet.
pub fn ready_matches(bracket: &Bracket) -> impl Iterator<Item = &BracketMatch> {
    bracket
        .matches
        .iter()
        .filter(|m| m.state() == MatchState::Ready)
}

/// [`record_winner`] on a tournament's bracket for `category`.
pub fn record_bracket_winner(
    tournament: &mut Tournament,
    category: &str,
    match_id: &str,
    entrant_id: EntrantId,
) -> Result<(), EngineError> {
    record_winner(tournament.bracket_mut(category)?, match_id, entrant_id)
}
