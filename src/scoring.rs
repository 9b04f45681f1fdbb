use crate::bracket::Player;

/// Number of sets needed to take a best-of-N match.
pub fn sets_to_win(best_of: u32) -> u32 {
  (best_of + 1) / 2
}

/// A set is won outright at six games with a two-game margin, or 7-6 via a
/// tiebreak. At most one side can win a given set.
pub fn set_won(games_won: u32, opponent_games_won: u32) -> bool {
  if games_won >= 6 && games_won >= opponent_games_won + 2 {
    return true;
  }
  games_won == 7 && opponent_games_won == 6
}

/// Walk the recorded sets index by index (a missing index counts as zero
/// games) and return the first player to reach the set threshold. A player
/// cannot win retroactively after the deciding set, so this short-circuits.
///
/// Retirement is informational only; completion stays score-literal.
pub fn match_winner<'a>(player1: &'a Player, player2: &'a Player, best_of: u32) -> Option<&'a Player> {
  let needed = sets_to_win(best_of);
  let set_count = player1.score.len().max(player2.score.len());
  let mut sets_won1 = 0u32;
  let mut sets_won2 = 0u32;
  for idx in 0..set_count {
    let games1 = player1.score.get(idx).map(|s| s.games_won).unwrap_or(0);
    let games2 = player2.score.get(idx).map(|s| s.games_won).unwrap_or(0);
    if set_won(games1, games2) {
      sets_won1 += 1;
    } else if set_won(games2, games1) {
      sets_won2 += 1;
    }
    if sets_won1 >= needed {
      return Some(player1);
    }
    if sets_won2 >= needed {
      return Some(player2);
    }
  }
  None
}

pub fn is_match_complete(player1: &Player, player2: &Player, best_of: u32) -> bool {
  match_winner(player1, player2, best_of).is_some()
}
