use serde::{Deserialize, Serialize};

use crate::types::TBD_NAME;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetScore {
  pub games_won: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tiebreak_points_won: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
  pub name: String,
  #[serde(default)]
  pub country: String,
  #[serde(default)]
  pub score: Vec<SetScore>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub retired: Option<bool>,
}

impl Player {
  pub fn seeded(name: &str, country: &str) -> Self {
    Player {
      name: name.to_string(),
      country: country.to_string(),
      score: Vec::new(),
      retired: None,
    }
  }

  /// The unresolved-slot sentinel. TBD players carry no country and no score.
  pub fn tbd() -> Self {
    Player {
      name: TBD_NAME.to_string(),
      country: String::new(),
      score: Vec::new(),
      retired: None,
    }
  }

  pub fn is_tbd(&self) -> bool {
    self.name == TBD_NAME
  }
}

/// Which side of a match a feeding winner lands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
  Player1,
  Player2,
}

/// Match `k` of a round feeds match `k / 2` of the next round; even `k`
/// fills `player1`, odd `k` fills `player2`. Fixed for the lifetime of a
/// bracket.
pub fn feed_target(match_index: usize) -> (usize, Side) {
  let side = if match_index % 2 == 0 {
    Side::Player1
  } else {
    Side::Player2
  };
  (match_index / 2, side)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
  pub id: String,
  pub player1: Player,
  pub player2: Player,
  #[serde(default)]
  pub selected_player: Option<Player>,
}

impl Match {
  pub fn side(&self, side: Side) -> &Player {
    match side {
      Side::Player1 => &self.player1,
      Side::Player2 => &self.player2,
    }
  }

  pub fn side_mut(&mut self, side: Side) -> &mut Player {
    match side {
      Side::Player1 => &mut self.player1,
      Side::Player2 => &mut self.player2,
    }
  }

  pub fn has_player(&self, name: &str) -> bool {
    self.player1.name == name || self.player2.name == name
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
  pub name: String,
  pub matches: Vec<Match>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketData {
  pub tournament_name: String,
  pub tournament_location: String,
  pub tournament_date: String,
  pub rounds: Vec<Round>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_locked: Option<bool>,
}

impl BracketData {
  pub fn locked(&self) -> bool {
    self.is_locked.unwrap_or(false)
  }

  /// Position of a match within its round, by id.
  pub fn match_position(&self, round_index: usize, match_id: &str) -> Option<usize> {
    self
      .rounds
      .get(round_index)?
      .matches
      .iter()
      .position(|m| m.id == match_id)
  }

  pub fn get_match(&self, round_index: usize, match_id: &str) -> Option<&Match> {
    let position = self.match_position(round_index, match_id)?;
    self.rounds[round_index].matches.get(position)
  }
}
