use std::fs;
use std::path::Path;

use crate::bracket::{BracketData, Match, Player, Round};
use crate::error::PicksError;

/// Human label for a round entered by `players_left` players.
pub fn round_name(players_left: usize) -> String {
  match players_left {
    2 => "Final".to_string(),
    4 => "Semifinals".to_string(),
    8 => "Quarterfinals".to_string(),
    n => format!("Round of {n}"),
  }
}

/// Build a well-formed seed bracket from a first-round draw. Entrants pair
/// up in order; every later round starts fully TBD with sequential match
/// ids continuing the first round's numbering.
pub fn seed_bracket(
  tournament_name: &str,
  tournament_location: &str,
  tournament_date: &str,
  entrants: Vec<Player>,
) -> Result<BracketData, PicksError> {
  let count = entrants.len();
  if count < 2 || !count.is_power_of_two() {
    return Err(PicksError::InvalidBracket(format!(
      "first round needs a power-of-two draw of at least 2, got {count} players"
    )));
  }
  if entrants.iter().any(|p| p.is_tbd()) {
    return Err(PicksError::InvalidBracket(
      "seeded draw cannot contain TBD players".to_string(),
    ));
  }

  let mut rounds = Vec::new();
  let mut next_id = 1usize;
  let mut size = count / 2;
  let mut seeded = true;
  while size >= 1 {
    let mut matches = Vec::with_capacity(size);
    for k in 0..size {
      let (player1, player2) = if seeded {
        (entrants[2 * k].clone(), entrants[2 * k + 1].clone())
      } else {
        (Player::tbd(), Player::tbd())
      };
      matches.push(Match {
        id: next_id.to_string(),
        player1,
        player2,
        selected_player: None,
      });
      next_id += 1;
    }
    rounds.push(Round {
      name: round_name(size * 2),
      matches,
    });
    if size == 1 {
      break;
    }
    size /= 2;
    seeded = false;
  }

  Ok(BracketData {
    tournament_name: tournament_name.to_string(),
    tournament_location: tournament_location.to_string(),
    tournament_date: tournament_date.to_string(),
    rounds,
    is_locked: None,
  })
}

/// Shape invariants every seed bracket must satisfy: rounds halve down to a
/// single final match and the first round is fully seeded.
pub fn validate_shape(bracket: &BracketData) -> Result<(), PicksError> {
  if bracket.rounds.is_empty() {
    return Err(PicksError::InvalidBracket("bracket has no rounds".to_string()));
  }
  for window in bracket.rounds.windows(2) {
    let expected = window[0].matches.len().div_ceil(2);
    if window[1].matches.len() != expected {
      return Err(PicksError::InvalidBracket(format!(
        "round {:?} should have {expected} matches, found {}",
        window[1].name,
        window[1].matches.len()
      )));
    }
  }
  let last = &bracket.rounds[bracket.rounds.len() - 1];
  if last.matches.len() != 1 {
    return Err(PicksError::InvalidBracket(format!(
      "final round {:?} must have exactly one match",
      last.name
    )));
  }
  if bracket.rounds[0]
    .matches
    .iter()
    .any(|m| m.player1.is_tbd() || m.player2.is_tbd())
  {
    return Err(PicksError::InvalidBracket(
      "first round is not fully seeded".to_string(),
    ));
  }
  Ok(())
}

/// Load a seed bracket fixture from disk and check its shape.
pub fn load_seed_bracket(path: &Path) -> Result<BracketData, PicksError> {
  let data = fs::read_to_string(path)
    .map_err(|e| PicksError::InvalidBracket(format!("read seed bracket {}: {e}", path.display())))?;
  let bracket = serde_json::from_str::<BracketData>(&data)
    .map_err(|e| PicksError::InvalidBracket(format!("parse seed bracket {}: {e}", path.display())))?;
  validate_shape(&bracket)?;
  Ok(bracket)
}

/// The embedded demo fixture: the 2025 Monte-Carlo Masters draw, Round of
/// 64 through the Final.
pub fn monte_carlo_seed() -> BracketData {
  serde_json::from_str(include_str!("../fixtures/monte_carlo_2025.json"))
    .expect("embedded Monte-Carlo fixture is valid JSON")
}
