use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::common::StoreError;
use crate::domain::{
    ChatId, ChatMessage, Game, GameId, GameStatus, Move, MoveId, PlayerId, Score, Ship, ShipId,
};
use crate::geometry::Coord;
use crate::store::{Applied, Changeset, GameStore};

#[derive(Default)]
struct Tables {
    next_id: u64,
    games: BTreeMap<GameId, Game>,
    ships: BTreeMap<ShipId, Ship>,
    moves: BTreeMap<MoveId, Move>,
    chat: BTreeMap<ChatId, ChatMessage>,
    scores: HashMap<PlayerId, Score>,
}

impl Tables {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn moves_in(&self, game: GameId) -> impl Iterator<Item = &Move> {
        self.moves.values().filter(move |m| m.game_id == game)
    }

    fn ships_in(&self, game: GameId) -> impl Iterator<Item = &Ship> {
        self.ships.values().filter(move |s| s.game_id == game)
    }

    /// Reject a changeset that refers to rows that do not exist, before
    /// anything is written.
    fn check(&self, changes: &Changeset) -> Result<(), StoreError> {
        if let Some(game) = &changes.game {
            if !self.games.contains_key(&game.id) {
                return Err(StoreError::new(format!("update of unknown game {}", game.id)));
            }
        }
        for ship in &changes.ships {
            if !self.games.contains_key(&ship.game_id) {
                return Err(StoreError::new(format!("ship for unknown game {}", ship.game_id)));
            }
        }
        if let Some(mv) = &changes.mv {
            if !self.games.contains_key(&mv.game_id) {
                return Err(StoreError::new(format!("move for unknown game {}", mv.game_id)));
            }
        }
        for id in &changes.sunk {
            if !self.ships.contains_key(id) {
                return Err(StoreError::new(format!("sinking unknown ship {}", id)));
            }
        }
        if let Some(chat) = &changes.chat {
            if !self.games.contains_key(&chat.game_id) {
                return Err(StoreError::new(format!("chat for unknown game {}", chat.game_id)));
            }
        }
        Ok(())
    }
}

/// Process-local [`GameStore`] backed by mutex-guarded tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::new("memory store lock poisoned"))
    }
}

#[async_trait::async_trait]
impl GameStore for MemoryStore {
    async fn create_game(&self, player1: PlayerId) -> Result<Game, StoreError> {
        let mut t = self.tables()?;
        let id = GameId(t.allocate());
        let now = Utc::now();
        let game = Game {
            id,
            player1,
            player2: None,
            status: GameStatus::Waiting,
            current_turn: None,
            winner: None,
            created_at: now,
            updated_at: now,
        };
        t.games.insert(id, game.clone());
        Ok(game)
    }

    async fn game(&self, id: GameId) -> Result<Option<Game>, StoreError> {
        Ok(self.tables()?.games.get(&id).cloned())
    }

    async fn open_games(&self, player: PlayerId) -> Result<Vec<Game>, StoreError> {
        let t = self.tables()?;
        Ok(t.games
            .values()
            .rev()
            .filter(|g| g.status == GameStatus::Waiting && g.player2.is_none() && g.player1 != player)
            .cloned()
            .collect())
    }

    async fn count_ships(&self, game: GameId, owner: PlayerId) -> Result<usize, StoreError> {
        let t = self.tables()?;
        Ok(t.ships_in(game).filter(|s| s.owner == owner).count())
    }

    async fn ships(&self, game: GameId, owner: PlayerId) -> Result<Vec<Ship>, StoreError> {
        let t = self.tables()?;
        Ok(t.ships_in(game).filter(|s| s.owner == owner).cloned().collect())
    }

    async fn all_ships(&self, game: GameId) -> Result<Vec<Ship>, StoreError> {
        let t = self.tables()?;
        Ok(t.ships_in(game).cloned().collect())
    }

    async fn ship(&self, id: ShipId) -> Result<Option<Ship>, StoreError> {
        Ok(self.tables()?.ships.get(&id).cloned())
    }

    async fn count_moves_at(
        &self,
        game: GameId,
        player: PlayerId,
        target: Coord,
    ) -> Result<usize, StoreError> {
        let t = self.tables()?;
        Ok(t.moves_in(game)
            .filter(|m| m.player == player && m.target == target)
            .count())
    }

    async fn hits_on_span(
        &self,
        game: GameId,
        owner: PlayerId,
        cells: &[Coord],
    ) -> Result<usize, StoreError> {
        let t = self.tables()?;
        let hit: HashSet<Coord> = t
            .moves_in(game)
            .filter(|m| m.hit && m.player != owner)
            .map(|m| m.target)
            .collect();
        let distinct: HashSet<&Coord> = cells.iter().collect();
        Ok(distinct.into_iter().filter(|c| hit.contains(c)).count())
    }

    async fn moves(&self, game: GameId) -> Result<Vec<Move>, StoreError> {
        let t = self.tables()?;
        Ok(t.moves_in(game).cloned().collect())
    }

    async fn score(&self, player: PlayerId) -> Result<Score, StoreError> {
        let t = self.tables()?;
        Ok(t.scores
            .get(&player)
            .cloned()
            .unwrap_or_else(|| Score::new(player)))
    }

    async fn chat_messages(&self, game: GameId) -> Result<Vec<ChatMessage>, StoreError> {
        let t = self.tables()?;
        Ok(t.chat.values().filter(|c| c.game_id == game).cloned().collect())
    }

    async fn commit(&self, changes: Changeset) -> Result<Applied, StoreError> {
        let mut t = self.tables()?;
        t.check(&changes)?;

        let now = Utc::now();
        let mut applied = Applied::default();

        if let Some(game) = changes.game {
            t.games.insert(game.id, game);
        }
        for new in changes.ships {
            let id = ShipId(t.allocate());
            let ship = Ship {
                id,
                game_id: new.game_id,
                owner: new.owner,
                placement: new.placement,
                sunk: false,
            };
            t.ships.insert(id, ship.clone());
            applied.ships.push(ship);
        }
        if let Some(new) = changes.mv {
            let id = MoveId(t.allocate());
            let mv = Move {
                id,
                game_id: new.game_id,
                player: new.player,
                target: new.target,
                hit: new.hit,
                ship_id: new.ship_id,
                created_at: now,
            };
            t.moves.insert(id, mv.clone());
            applied.mv = Some(mv);
        }
        for id in changes.sunk {
            if let Some(ship) = t.ships.get_mut(&id) {
                ship.sunk = true;
            }
        }
        for change in changes.scores {
            let score = t
                .scores
                .entry(change.player)
                .or_insert_with(|| Score::new(change.player));
            if change.won {
                score.wins += 1;
                score.points += crate::config::WIN_POINTS;
            } else {
                score.losses += 1;
            }
            score.hits += change.hits;
            score.misses += change.misses;
        }
        if let Some(new) = changes.chat {
            let id = ChatId(t.allocate());
            let chat = ChatMessage {
                id,
                game_id: new.game_id,
                player_id: new.player_id,
                message: new.message,
                created_at: now,
            };
            t.chat.insert(id, chat.clone());
            applied.chat = Some(chat);
        }
        Ok(applied)
    }
}
