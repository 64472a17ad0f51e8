//! The game engine: validates commands against the per-game state machine,
//! persists their effects and reports what happened as [`DomainEvent`]s.
//!
//! Commands touching the same game are serialized by a per-game async mutex;
//! different games never wait on each other.

pub mod rules;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::board::validate_fleet;
use crate::common::{Entity, GameError, StoreError};
use crate::config::{FLEET_SIZE, MAX_CHAT_LEN};
use crate::domain::{
    ChatMessage, Game, GameId, GameStatus, Move, PlayerId, Readiness, Score, Ship, ShipId,
};
use crate::geometry::{self, Coord};
use crate::protocol::DomainEvent;
use crate::ship::ShipPlacement;
use crate::store::{Changeset, GameStore, MemoryStore, NewChat, NewMove, NewShip, ScoreChange};

/// Result of a successful command: the new state plus the events to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub value: T,
    pub events: Vec<DomainEvent>,
}

impl<T> Outcome<T> {
    fn new(value: T, events: Vec<DomainEvent>) -> Self {
        Self { value, events }
    }
}

/// What a single shot did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    pub mv: Move,
    /// Game row after the shot.
    pub game: Game,
    /// The struck ship, if this shot sank it.
    pub sunk: Option<Ship>,
    pub finished: bool,
}

pub struct GameEngine {
    store: Arc<dyn GameStore>,
    locks: Mutex<HashMap<GameId, Arc<AsyncMutex<()>>>>,
}

/// Exclusive access to one game for the lifetime of the guard. Also held
/// while waiting, so a cancelled caller still cleans up its entry.
struct GameGuard<'a> {
    engine: &'a GameEngine,
    game: GameId,
    lock: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for GameGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.engine.lock_table();
        // the table and this guard hold the only references
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.game);
        }
    }
}

impl GameEngine {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Engine over a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Serialize mutations of one game. The entry is created on demand and
    /// removed by the last guard to leave, so the map only holds games with
    /// a call in flight.
    async fn lock(&self, game: GameId) -> GameGuard<'_> {
        let lock = self.lock_table().entry(game).or_default().clone();
        let mut held = GameGuard {
            engine: self,
            game,
            lock,
            guard: None,
        };
        held.guard = Some(held.lock.clone().lock_owned().await);
        held
    }

    fn lock_table(&self) -> MutexGuard<'_, HashMap<GameId, Arc<AsyncMutex<()>>>> {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn load(&self, id: GameId) -> Result<Game, GameError> {
        self.store
            .game(id)
            .await?
            .ok_or(GameError::NotFound(Entity::Game(id)))
    }

    /// Open a new game in `waiting` with `player` in the first seat.
    pub async fn create_game(&self, player: PlayerId) -> Result<Outcome<Game>, GameError> {
        let game = self.store.create_game(player).await?;
        info!("game {} created by player {}", game.id, player);
        let events = vec![DomainEvent::GameCreated { game: game.clone() }];
        Ok(Outcome::new(game, events))
    }

    /// Take the second seat of a waiting game.
    pub async fn join_game(&self, id: GameId, player: PlayerId) -> Result<Outcome<Game>, GameError> {
        let _guard = self.lock(id).await;
        let game = self.load(id).await?;
        let next = rules::join(&game, player)?;
        self.store
            .commit(Changeset::new().update_game(next.clone()))
            .await?;
        info!("player {} joined game {}", player, id);
        let events = vec![DomainEvent::PlayerJoined { game: next.clone() }];
        Ok(Outcome::new(next, events))
    }

    /// Record `player`'s whole fleet. The fleet is validated as a unit; when
    /// it completes the second fleet the first turn goes to the creator in
    /// the same commit.
    pub async fn place_ships(
        &self,
        id: GameId,
        player: PlayerId,
        ships: &[ShipPlacement],
    ) -> Result<Outcome<Vec<Ship>>, GameError> {
        validate_fleet(ships)?;

        let _guard = self.lock(id).await;
        let game = self.load(id).await?;
        if !game.is_participant(player) {
            return Err(GameError::NotParticipant);
        }
        if game.status == GameStatus::Finished {
            return Err(GameError::InvalidState {
                status: game.status,
            });
        }
        if self.store.count_ships(id, player).await? > 0 {
            return Err(GameError::AlreadyPlaced);
        }

        let p1_ships = if game.player1 == player {
            ships.len()
        } else {
            self.store.count_ships(id, game.player1).await?
        };
        let p2_ships = match game.player2 {
            Some(p2) if p2 == player => ships.len(),
            Some(p2) => self.store.count_ships(id, p2).await?,
            None => 0,
        };
        let started = rules::activate_battle(&game, p1_ships, p2_ships);

        let mut changes = Changeset::new().insert_ships(ships.iter().map(|s| NewShip {
            game_id: id,
            owner: player,
            placement: *s,
        }));
        if let Some(next) = &started {
            changes = changes.update_game(next.clone());
        }
        let applied = self.store.commit(changes).await?;

        let battle_started = started.is_some();
        let game = started.unwrap_or(game);
        if battle_started {
            info!("game {}: both fleets placed, player {} fires first", id, game.player1);
        } else {
            debug!("game {}: player {} placed fleet", id, player);
        }
        let events = vec![DomainEvent::FleetPlaced {
            game,
            player,
            battle_started,
        }];
        Ok(Outcome::new(applied.ships, events))
    }

    /// Fire at `target` on the opponent's grid.
    pub async fn make_move(
        &self,
        id: GameId,
        player: PlayerId,
        target: Coord,
    ) -> Result<Outcome<MoveReport>, GameError> {
        if !geometry::in_bounds(target) {
            return Err(GameError::OutOfBounds(target));
        }

        let _guard = self.lock(id).await;
        let game = self.load(id).await?;
        let opponent = rules::check_turn(&game, player)?;
        if self.store.count_moves_at(id, player, target).await? > 0 {
            return Err(GameError::DuplicateTarget(target));
        }

        let fleet = self.store.ships(id, opponent).await?;
        let struck = fleet
            .iter()
            .find(|s| geometry::contains(&s.placement, target.x, target.y));
        let hit = struck.is_some();

        // the pending move is not in the log yet, hence the +1
        let mut sunk = None;
        if let Some(ship) = struck {
            let cells = geometry::span_cells(&ship.placement);
            let hits = self.store.hits_on_span(id, opponent, &cells).await? + 1;
            if !ship.sunk && rules::is_sunk(hits, ship.placement.size) {
                let mut ship = ship.clone();
                ship.sunk = true;
                sunk = Some(ship);
            }
        }

        let sunk_id = sunk.as_ref().map(|s| s.id);
        let fleet_down = hit
            && !fleet.is_empty()
            && fleet.iter().all(|s| s.sunk || Some(s.id) == sunk_id);

        let mut changes = Changeset::new().insert_move(NewMove {
            game_id: id,
            player,
            target,
            hit,
            ship_id: struck.map(|s| s.id),
        });
        if let Some(ship) = sunk_id {
            changes = changes.mark_sunk(ship);
        }

        let next = if fleet_down {
            let (winner, loser) = self.tallies(id, player, opponent, hit).await?;
            changes = changes.change_score(winner).change_score(loser);
            rules::finish(&game, player)
        } else {
            rules::next_turn(&game, player, opponent, hit)
        };
        changes = changes.update_game(next.clone());

        let applied = self.store.commit(changes).await?;
        let mv = applied
            .mv
            .ok_or_else(|| StoreError::new("commit did not return the move"))?;

        debug!(
            "game {}: player {} fired at {} ({})",
            id,
            player,
            target,
            if hit { "hit" } else { "miss" }
        );
        let mut events = vec![DomainEvent::MoveApplied {
            game: next.clone(),
            mv: mv.clone(),
            sunk: sunk.clone(),
        }];
        if fleet_down {
            info!("game {} finished, winner {}", id, player);
            events.push(DomainEvent::GameEnded {
                game: next.clone(),
                winner: player,
                loser: opponent,
            });
        }

        let report = MoveReport {
            mv,
            game: next,
            sunk,
            finished: fleet_down,
        };
        Ok(Outcome::new(report, events))
    }

    /// Score changes for both players at the end of a game, counting the
    /// shot that ended it.
    async fn tallies(
        &self,
        id: GameId,
        winner: PlayerId,
        loser: PlayerId,
        last_hit: bool,
    ) -> Result<(ScoreChange, ScoreChange), GameError> {
        let mut win = ScoreChange {
            player: winner,
            won: true,
            hits: 0,
            misses: 0,
        };
        let mut lose = ScoreChange {
            player: loser,
            won: false,
            hits: 0,
            misses: 0,
        };
        for mv in self.store.moves(id).await? {
            let change = if mv.player == winner { &mut win } else { &mut lose };
            if mv.hit {
                change.hits += 1;
            } else {
                change.misses += 1;
            }
        }
        if last_hit {
            win.hits += 1;
        } else {
            win.misses += 1;
        }
        Ok((win, lose))
    }

    /// Post a chat line to a game room. Only the game's players may talk.
    pub async fn post_chat(
        &self,
        id: GameId,
        player: PlayerId,
        text: &str,
    ) -> Result<Outcome<ChatMessage>, GameError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GameError::InvalidMessage("message is empty".into()));
        }
        if text.chars().count() > MAX_CHAT_LEN {
            return Err(GameError::InvalidMessage(format!(
                "message longer than {} characters",
                MAX_CHAT_LEN
            )));
        }

        let game = self.load(id).await?;
        if !game.is_participant(player) {
            return Err(GameError::NotParticipant);
        }
        let applied = self
            .store
            .commit(Changeset::new().insert_chat(NewChat {
                game_id: id,
                player_id: player,
                message: text.to_string(),
            }))
            .await?;
        let message = applied
            .chat
            .ok_or_else(|| StoreError::new("commit did not return the message"))?;
        let events = vec![DomainEvent::Chat {
            message: message.clone(),
        }];
        Ok(Outcome::new(message, events))
    }

    pub async fn game(&self, id: GameId) -> Result<Game, GameError> {
        self.load(id).await
    }

    pub async fn ship(&self, id: ShipId) -> Result<Ship, GameError> {
        self.store
            .ship(id)
            .await?
            .ok_or(GameError::NotFound(Entity::Ship(id)))
    }

    /// Whether both fleets are down.
    pub async fn readiness(&self, id: GameId) -> Result<Readiness, GameError> {
        let game = self.load(id).await?;
        let player1_ships = self.store.count_ships(id, game.player1).await?;
        let player2_ships = match game.player2 {
            Some(p2) => self.store.count_ships(id, p2).await?,
            None => 0,
        };
        Ok(Readiness {
            ready: game.player2.is_some()
                && player1_ships == FLEET_SIZE
                && player2_ships == FLEET_SIZE,
            player1_ships,
            player2_ships,
            status: game.status,
        })
    }

    /// A player's own fleet in a game.
    pub async fn ships(&self, id: GameId, player: PlayerId) -> Result<Vec<Ship>, GameError> {
        self.load(id).await?;
        Ok(self.store.ships(id, player).await?)
    }

    /// Ships of either fleet that have gone down.
    pub async fn sunk_ships(&self, id: GameId) -> Result<Vec<Ship>, GameError> {
        self.load(id).await?;
        let ships = self.store.all_ships(id).await?;
        Ok(ships.into_iter().filter(|s| s.sunk).collect())
    }

    /// Every shot of the game, oldest first.
    pub async fn moves(&self, id: GameId) -> Result<Vec<Move>, GameError> {
        self.load(id).await?;
        Ok(self.store.moves(id).await?)
    }

    pub async fn chat_history(&self, id: GameId) -> Result<Vec<ChatMessage>, GameError> {
        self.load(id).await?;
        Ok(self.store.chat_messages(id).await?)
    }

    pub async fn score(&self, player: PlayerId) -> Result<Score, GameError> {
        Ok(self.store.score(player).await?)
    }

    /// Waiting games `player` could join.
    pub async fn open_games(&self, player: PlayerId) -> Result<Vec<Game>, GameError> {
        Ok(self.store.open_games(player).await?)
    }
}
