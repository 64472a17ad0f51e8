//! Pure state transitions of a single game.
//!
//! Each function takes the current row and returns the next one (or an
//! error); nothing here touches storage. `updated_at` is stamped on every
//! returned row.

use chrono::Utc;

use crate::common::GameError;
use crate::config::FLEET_SIZE;
use crate::domain::{Game, GameStatus, PlayerId};

/// `waiting -> active`: seat `player` as player 2. The turn stays unset
/// until both fleets are down.
pub fn join(game: &Game, player: PlayerId) -> Result<Game, GameError> {
    if game.status != GameStatus::Waiting {
        return Err(GameError::InvalidState {
            status: game.status,
        });
    }
    if game.player1 == player {
        return Err(GameError::SelfJoin);
    }
    let mut next = game.clone();
    next.player2 = Some(player);
    next.status = GameStatus::Active;
    next.current_turn = None;
    next.updated_at = Utc::now();
    Ok(next)
}

/// Assign the first turn to the creator once both players have a full fleet
/// on record. Returns `None` when the battle cannot start yet or has already
/// started.
pub fn activate_battle(game: &Game, player1_ships: usize, player2_ships: usize) -> Option<Game> {
    if game.status != GameStatus::Active
        || game.player2.is_none()
        || game.current_turn.is_some()
        || player1_ships != FLEET_SIZE
        || player2_ships != FLEET_SIZE
    {
        return None;
    }
    let mut next = game.clone();
    next.current_turn = Some(game.player1);
    next.updated_at = Utc::now();
    Some(next)
}

/// Check that `player` may fire now and return their opponent.
pub fn check_turn(game: &Game, player: PlayerId) -> Result<PlayerId, GameError> {
    if game.status != GameStatus::Active {
        return Err(GameError::InvalidState {
            status: game.status,
        });
    }
    let opponent = game.opponent_of(player).ok_or(GameError::NotParticipant)?;
    if game.current_turn != Some(player) {
        return Err(GameError::NotYourTurn);
    }
    Ok(opponent)
}

/// `active -> active` after a shot that did not end the game. A hit keeps
/// the turn with the shooter.
pub fn next_turn(game: &Game, shooter: PlayerId, opponent: PlayerId, hit: bool) -> Game {
    let mut next = game.clone();
    next.current_turn = Some(if hit { shooter } else { opponent });
    next.updated_at = Utc::now();
    next
}

/// `active -> finished` with `winner` recorded. The turn is cleared.
pub fn finish(game: &Game, winner: PlayerId) -> Game {
    let mut next = game.clone();
    next.status = GameStatus::Finished;
    next.winner = Some(winner);
    next.current_turn = None;
    next.updated_at = Utc::now();
    next
}

/// A ship is sunk once the distinct opposing hits on its span reach its size.
pub fn is_sunk(distinct_hits: usize, size: u8) -> bool {
    distinct_hits >= size as usize
}
