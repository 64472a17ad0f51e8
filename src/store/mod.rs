//! Persistence contract consumed by the engine.
//!
//! Reads are individual calls. Every write an engine operation makes goes
//! into one [`Changeset`] handed to [`GameStore::commit`], which must apply
//! all of it or none of it.

use crate::common::StoreError;
use crate::domain::{
    ChatMessage, Game, GameId, Move, PlayerId, Score, Ship, ShipId,
};
use crate::geometry::Coord;
use crate::ship::ShipPlacement;

pub mod memory;

pub use memory::MemoryStore;

/// A ship to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShip {
    pub game_id: GameId,
    pub owner: PlayerId,
    pub placement: ShipPlacement,
}

/// A move to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMove {
    pub game_id: GameId,
    pub player: PlayerId,
    pub target: Coord,
    pub hit: bool,
    pub ship_id: Option<ShipId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChat {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub message: String,
}

/// Increment applied to one player's score at the end of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreChange {
    pub player: PlayerId,
    pub won: bool,
    pub hits: i64,
    pub misses: i64,
}

/// Writes of one engine operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    pub game: Option<Game>,
    pub ships: Vec<NewShip>,
    pub mv: Option<NewMove>,
    pub sunk: Vec<ShipId>,
    pub scores: Vec<ScoreChange>,
    pub chat: Option<NewChat>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored game row with `game`.
    pub fn update_game(mut self, game: Game) -> Self {
        self.game = Some(game);
        self
    }

    pub fn insert_ships(mut self, ships: impl IntoIterator<Item = NewShip>) -> Self {
        self.ships.extend(ships);
        self
    }

    pub fn insert_move(mut self, mv: NewMove) -> Self {
        self.mv = Some(mv);
        self
    }

    pub fn mark_sunk(mut self, ship: ShipId) -> Self {
        self.sunk.push(ship);
        self
    }

    pub fn change_score(mut self, change: ScoreChange) -> Self {
        self.scores.push(change);
        self
    }

    pub fn insert_chat(mut self, chat: NewChat) -> Self {
        self.chat = Some(chat);
        self
    }
}

/// Records created by a commit, with their store-assigned ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applied {
    pub ships: Vec<Ship>,
    pub mv: Option<Move>,
    pub chat: Option<ChatMessage>,
}

#[async_trait::async_trait]
pub trait GameStore: Send + Sync {
    /// Insert a new game in `waiting` with `player1` as creator.
    async fn create_game(&self, player1: PlayerId) -> Result<Game, StoreError>;

    async fn game(&self, id: GameId) -> Result<Option<Game>, StoreError>;

    /// Games in `waiting` whose creator is not `player`, newest first.
    async fn open_games(&self, player: PlayerId) -> Result<Vec<Game>, StoreError>;

    async fn count_ships(&self, game: GameId, owner: PlayerId) -> Result<usize, StoreError>;

    async fn ships(&self, game: GameId, owner: PlayerId) -> Result<Vec<Ship>, StoreError>;

    /// Every ship in the game, both fleets.
    async fn all_ships(&self, game: GameId) -> Result<Vec<Ship>, StoreError>;

    async fn ship(&self, id: ShipId) -> Result<Option<Ship>, StoreError>;

    /// Prior moves by `player` at `target` in `game`.
    async fn count_moves_at(
        &self,
        game: GameId,
        player: PlayerId,
        target: Coord,
    ) -> Result<usize, StoreError>;

    /// Number of distinct `cells` carrying a recorded hit by someone other
    /// than `owner`.
    async fn hits_on_span(
        &self,
        game: GameId,
        owner: PlayerId,
        cells: &[Coord],
    ) -> Result<usize, StoreError>;

    /// All moves of the game in insertion order.
    async fn moves(&self, game: GameId) -> Result<Vec<Move>, StoreError>;

    /// A player's score; all zeros if the player never finished a game.
    async fn score(&self, player: PlayerId) -> Result<Score, StoreError>;

    async fn chat_messages(&self, game: GameId) -> Result<Vec<ChatMessage>, StoreError>;

    /// Apply every write in `changes` atomically.
    async fn commit(&self, changes: Changeset) -> Result<Applied, StoreError>;
}
