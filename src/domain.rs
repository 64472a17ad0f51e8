//! Persisted records produced by the engine and read by outer layers.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::Coord;
use crate::ship::ShipPlacement;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(v: u64) -> Self {
                $name(v)
            }
        }
    };
}

id_type!(GameId);
id_type!(
    /// Identity of an authenticated player. Issued by an outer layer.
    PlayerId
);
id_type!(ShipId);
id_type!(MoveId);
id_type!(ChatId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Active,
    Finished,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Active => "active",
            GameStatus::Finished => "finished",
        })
    }
}

/// One match between two players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    #[serde(rename = "player1_id")]
    pub player1: PlayerId,
    #[serde(rename = "player2_id")]
    pub player2: Option<PlayerId>,
    pub status: GameStatus,
    pub current_turn: Option<PlayerId>,
    #[serde(rename = "winner_id")]
    pub winner: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    pub fn is_participant(&self, player: PlayerId) -> bool {
        self.player1 == player || self.player2 == Some(player)
    }

    /// The other player, if `player` is in this game and the seat is filled.
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        if player == self.player1 {
            self.player2
        } else if self.player2 == Some(player) {
            Some(self.player1)
        } else {
            None
        }
    }

    /// Checks the status/seat/turn/winner invariants of the data model.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            GameStatus::Waiting => {
                self.player2.is_none() && self.current_turn.is_none() && self.winner.is_none()
            }
            GameStatus::Active => self.player2.is_some() && self.winner.is_none(),
            GameStatus::Finished => self.winner.is_some(),
        }
    }
}

/// A ship owned by one player in one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    pub id: ShipId,
    pub game_id: GameId,
    #[serde(rename = "player_id")]
    pub owner: PlayerId,
    #[serde(flatten)]
    pub placement: ShipPlacement,
    #[serde(rename = "is_sunk")]
    pub sunk: bool,
}

/// One shot. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub id: MoveId,
    pub game_id: GameId,
    #[serde(rename = "player_id")]
    pub player: PlayerId,
    #[serde(flatten)]
    pub target: Coord,
    #[serde(rename = "is_hit")]
    pub hit: bool,
    pub ship_id: Option<ShipId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub player_id: PlayerId,
    pub wins: i64,
    pub losses: i64,
    pub hits: i64,
    pub misses: i64,
    pub points: i64,
}

impl Score {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            ..Default::default()
        }
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        PlayerId(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: ChatId,
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Whether both fleets are in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readiness {
    pub ready: bool,
    pub player1_ships: usize,
    pub player2_ships: usize,
    #[serde(rename = "game_status")]
    pub status: GameStatus,
}
