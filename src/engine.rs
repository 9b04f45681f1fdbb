use std::collections::HashSet;

use crate::bracket::{feed_target, BracketData, Player};
use crate::error::PicksError;
use crate::types::TBD_NAME;

// ── Random source ──────────────────────────────────────────────────────

/// Seedable xorshift source backing auto-pick. Injectable so tests can pin
/// outcomes instead of going through a global RNG.
#[derive(Clone, Debug)]
pub struct PickRng {
  state: u64,
}

impl PickRng {
  pub fn new(seed: u64) -> Self {
    let mut state = seed;
    if state == 0 {
      state = 0x9E37_79B9_7F4A_7C15;
    }
    PickRng { state }
  }

  fn next_u64(&mut self) -> u64 {
    let mut x = self.state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    self.state = x;
    x
  }

  pub fn next_f64(&mut self) -> f64 {
    let v = self.next_u64() >> 11;
    (v as f64) / ((1u64 << 53) as f64)
  }
}

// ── Selection propagation ──────────────────────────────────────────────

/// Apply a winner pick to a match and return the resulting bracket.
///
/// The input bracket is never touched: the pick lands on a deep copy, the
/// selected player advances into the fed slot of the next round, and any
/// downstream state that depended on the displaced occupant is cleared back
/// to TBD. Validation failures reject before any copy is made.
pub fn apply_selection(
  bracket: &BracketData,
  round_index: usize,
  match_id: &str,
  selected_name: &str,
) -> Result<BracketData, PicksError> {
  if bracket.locked() {
    return Err(PicksError::SessionLocked);
  }
  let round = bracket.rounds.get(round_index).ok_or_else(|| {
    PicksError::InvalidSelection(format!("round {round_index} is out of range"))
  })?;
  let match_index = round
    .matches
    .iter()
    .position(|m| m.id == match_id)
    .ok_or_else(|| {
      PicksError::InvalidSelection(format!("match {match_id} not found in round {round_index}"))
    })?;
  let picked_match = &round.matches[match_index];
  if selected_name == TBD_NAME {
    return Err(PicksError::InvalidSelection(
      "cannot select an undecided slot".to_string(),
    ));
  }
  if picked_match.player1.is_tbd() || picked_match.player2.is_tbd() {
    return Err(PicksError::InvalidSelection(format!(
      "match {match_id} is not ready for a pick"
    )));
  }
  let (selected, other) = if picked_match.player1.name == selected_name {
    (picked_match.player1.clone(), picked_match.player2.clone())
  } else if picked_match.player2.name == selected_name {
    (picked_match.player2.clone(), picked_match.player1.clone())
  } else {
    return Err(PicksError::InvalidSelection(format!(
      "{selected_name} is not playing match {match_id}"
    )));
  };
  let previous = picked_match.selected_player.clone();

  let mut next = bracket.clone();
  next.rounds[round_index].matches[match_index].selected_player = Some(selected.clone());

  // The final round has nothing downstream.
  if round_index + 1 < next.rounds.len() {
    let (target_index, side) = feed_target(match_index);
    *next.rounds[round_index + 1].matches[target_index].side_mut(side) = selected.clone();

    // Names whose advancement past the fed match is no longer justified:
    // the superseded pick, the opponent that just lost the slot, and stale
    // copies of the new pick itself.
    let mut stale: HashSet<&str> = HashSet::new();
    stale.insert(other.name.as_str());
    stale.insert(selected.name.as_str());
    if let Some(prev) = &previous {
      stale.insert(prev.name.as_str());
    }

    for round in next.rounds.iter_mut().skip(round_index + 2) {
      for m in &mut round.matches {
        if stale.contains(m.player1.name.as_str()) {
          m.player1 = Player::tbd();
        }
        if stale.contains(m.player2.name.as_str()) {
          m.player2 = Player::tbd();
        }
      }
    }

    // A selection may only point at a player still occupying one of the
    // match's slots.
    for round in next.rounds.iter_mut().skip(round_index + 1) {
      for m in &mut round.matches {
        let dangling = m
          .selected_player
          .as_ref()
          .is_some_and(|sel| !m.has_player(&sel.name));
        if dangling {
          m.selected_player = None;
        }
      }
    }
  }

  Ok(next)
}

// ── Auto-pick ──────────────────────────────────────────────────────────

/// Re-seed from the initial bracket and pick a random eligible winner for
/// every match, building strictly forward round by round. Per-pick
/// invalidation is unnecessary here because nothing downstream exists yet
/// when a round is filled.
pub fn auto_pick(seed: &BracketData, rng: &mut PickRng) -> BracketData {
  let mut bracket = seed.clone();
  for round_index in 0..bracket.rounds.len() {
    for match_index in 0..bracket.rounds[round_index].matches.len() {
      let pick = {
        let m = &bracket.rounds[round_index].matches[match_index];
        if m.player1.is_tbd() && m.player2.is_tbd() {
          continue;
        }
        if m.player1.is_tbd() {
          m.player2.clone()
        } else if m.player2.is_tbd() {
          m.player1.clone()
        } else if rng.next_f64() < 0.5 {
          m.player1.clone()
        } else {
          m.player2.clone()
        }
      };
      bracket.rounds[round_index].matches[match_index].selected_player = Some(pick.clone());
      if round_index + 1 < bracket.rounds.len() {
        let (target_index, side) = feed_target(match_index);
        if let Some(target) = bracket.rounds[round_index + 1].matches.get_mut(target_index) {
          *target.side_mut(side) = pick;
        }
      }
    }
  }
  bracket
}

// ── Completion ─────────────────────────────────────────────────────────

/// A bracket is complete when every match has a selection and every round
/// past the seeded first one has both sides resolved.
pub fn is_bracket_complete(bracket: &BracketData) -> bool {
  for (round_index, round) in bracket.rounds.iter().enumerate() {
    for m in &round.matches {
      if round_index > 0 && (m.player1.is_tbd() || m.player2.is_tbd()) {
        return false;
      }
      if m.selected_player.is_none() {
        return false;
      }
    }
  }
  true
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bracket::Player;
  use crate::seed::seed_bracket;

  fn entrants(count: usize) -> Vec<Player> {
    (0..count)
      .map(|i| Player::seeded(&format!("Player {}", i + 1), "FR"))
      .collect()
  }

  fn make_bracket(draw: usize) -> BracketData {
    seed_bracket("Test Open", "Testville", "2025", entrants(draw)).unwrap()
  }

  #[test]
  fn test_selection_advances_into_next_round() {
    let bracket = make_bracket(4);
    let next = apply_selection(&bracket, 0, "1", "Player 1").unwrap();
    assert_eq!(
      next.rounds[0].matches[0].selected_player.as_ref().unwrap().name,
      "Player 1"
    );
    assert_eq!(next.rounds[1].matches[0].player1.name, "Player 1");
    assert!(next.rounds[1].matches[0].player2.is_tbd());

    let next = apply_selection(&next, 0, "2", "Player 4").unwrap();
    assert_eq!(next.rounds[1].matches[0].player2.name, "Player 4");
  }

  #[test]
  fn test_selection_does_not_mutate_input() {
    let bracket = make_bracket(4);
    let before = bracket.clone();
    let _ = apply_selection(&bracket, 0, "1", "Player 2").unwrap();
    assert_eq!(bracket, before);

    // Failures leave the input untouched too.
    let _ = apply_selection(&bracket, 0, "1", "Nobody").unwrap_err();
    assert_eq!(bracket, before);
  }

  #[test]
  fn test_invalid_selections_rejected() {
    let bracket = make_bracket(4);
    assert!(matches!(
      apply_selection(&bracket, 5, "1", "Player 1"),
      Err(PicksError::InvalidSelection(_))
    ));
    assert!(matches!(
      apply_selection(&bracket, 0, "99", "Player 1"),
      Err(PicksError::InvalidSelection(_))
    ));
    assert!(matches!(
      apply_selection(&bracket, 0, "1", "Player 3"),
      Err(PicksError::InvalidSelection(_))
    ));
    // TBD can never be selected, and an unresolved match takes no pick.
    assert!(matches!(
      apply_selection(&bracket, 1, "3", "TBD"),
      Err(PicksError::InvalidSelection(_))
    ));
    assert!(matches!(
      apply_selection(&bracket, 1, "3", "Player 1"),
      Err(PicksError::InvalidSelection(_))
    ));
  }

  #[test]
  fn test_locked_bracket_rejects_selection() {
    let mut bracket = make_bracket(4);
    bracket.is_locked = Some(true);
    assert!(matches!(
      apply_selection(&bracket, 0, "1", "Player 1"),
      Err(PicksError::SessionLocked)
    ));
  }

  #[test]
  fn test_reselection_is_idempotent() {
    let bracket = make_bracket(8);
    let once = apply_selection(&bracket, 0, "2", "Player 3").unwrap();
    let twice = apply_selection(&once, 0, "2", "Player 3").unwrap();
    assert_eq!(once, twice);
  }

  #[test]
  fn test_changed_pick_clears_downstream_lineage() {
    // Fill everything, then flip the round-0 pick in match "1".
    let seed = make_bracket(8);
    let mut rng = PickRng::new(7);
    let mut bracket = auto_pick(&seed, &mut rng);

    // Force Player 1 through to the title so the lineage is known.
    bracket = apply_selection(&bracket, 0, "1", "Player 1").unwrap();
    bracket = apply_selection(&bracket, 1, "5", "Player 1").unwrap();
    bracket = apply_selection(&bracket, 2, "7", "Player 1").unwrap();
    assert!(is_bracket_complete(&bracket));

    let flipped = apply_selection(&bracket, 0, "1", "Player 2").unwrap();

    // Player 2 replaces Player 1 in the fed slot.
    assert_eq!(flipped.rounds[1].matches[0].player1.name, "Player 2");
    // Every later appearance of Player 1 is cleared, selections included.
    assert!(flipped.rounds[2].matches[0].player1.is_tbd());
    assert!(flipped.rounds[1].matches[0].selected_player.is_none());
    assert!(flipped.rounds[2].matches[0].selected_player.is_none());
    assert!(!is_bracket_complete(&flipped));

    // The other half of the draw is untouched.
    assert_eq!(flipped.rounds[1].matches[1], bracket.rounds[1].matches[1]);
    assert_eq!(
      flipped.rounds[2].matches[0].player2,
      bracket.rounds[2].matches[0].player2
    );
  }

  #[test]
  fn test_final_round_pick_has_no_propagation() {
    let seed = make_bracket(4);
    let mut bracket = apply_selection(&seed, 0, "1", "Player 1").unwrap();
    bracket = apply_selection(&bracket, 0, "2", "Player 3").unwrap();
    let done = apply_selection(&bracket, 1, "3", "Player 3").unwrap();
    assert_eq!(
      done.rounds[1].matches[0].selected_player.as_ref().unwrap().name,
      "Player 3"
    );
    assert!(is_bracket_complete(&done));
  }

  #[test]
  fn test_completion_requires_round_zero_selections() {
    let seed = make_bracket(4);
    assert!(!is_bracket_complete(&seed));

    // Both finalists resolved but no final pick yet.
    let mut bracket = apply_selection(&seed, 0, "1", "Player 2").unwrap();
    bracket = apply_selection(&bracket, 0, "2", "Player 4").unwrap();
    assert!(!is_bracket_complete(&bracket));
  }

  #[test]
  fn test_completion_rejects_unresolved_slots() {
    let seed = make_bracket(4);
    // Hand-fill selections without propagating the second semifinalist.
    let mut bracket = apply_selection(&seed, 0, "1", "Player 1").unwrap();
    bracket.rounds[0].matches[1].selected_player = Some(Player::seeded("Player 3", "FR"));
    bracket.rounds[1].matches[0].selected_player = Some(Player::seeded("Player 1", "FR"));
    assert!(!is_bracket_complete(&bracket));
  }

  #[test]
  fn test_auto_pick_fills_every_round() {
    let seed = make_bracket(32);
    let mut rng = PickRng::new(1337);
    let bracket = auto_pick(&seed, &mut rng);
    assert!(is_bracket_complete(&bracket));
    for round in &bracket.rounds {
      for m in &round.matches {
        assert!(!m.player1.is_tbd());
        assert!(!m.player2.is_tbd());
        let sel = m.selected_player.as_ref().expect("auto-pick selects every match");
        assert!(m.has_player(&sel.name));
      }
    }
    // The seed itself is untouched.
    assert!(seed.rounds[1].matches[0].player1.is_tbd());
  }

  #[test]
  fn test_auto_pick_is_deterministic_per_seed() {
    let seed = make_bracket(8);
    let a = auto_pick(&seed, &mut PickRng::new(42));
    let b = auto_pick(&seed, &mut PickRng::new(42));
    let c = auto_pick(&seed, &mut PickRng::new(43));
    assert_eq!(a, b);
    // Different seeds almost surely disagree somewhere across 7 matches.
    assert_ne!(a, c);
  }
}
