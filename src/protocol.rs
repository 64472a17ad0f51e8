//! Wire vocabulary: domain events produced by the engine, the JSON envelope
//! they travel in, and the commands clients send.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, Game, GameId, Move, PlayerId, Ship};
use crate::geometry::Coord;
use crate::ship::ShipPlacement;

/// Pre-serialized bytes handed to the hub. Cloning shares the buffer.
pub type Payload = Arc<[u8]>;

/// Something that happened to a game, emitted by the engine on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    GameCreated {
        game: Game,
    },
    PlayerJoined {
        game: Game,
    },
    /// `battle_started` is set when this placement completed both fleets and
    /// the first turn was assigned.
    FleetPlaced {
        game: Game,
        player: PlayerId,
        battle_started: bool,
    },
    MoveApplied {
        game: Game,
        mv: Move,
        sunk: Option<Ship>,
    },
    GameEnded {
        game: Game,
        winner: PlayerId,
        loser: PlayerId,
    },
    Chat {
        message: ChatMessage,
    },
}

/// Who receives an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    Game(GameId),
    Player(PlayerId),
}

impl DomainEvent {
    pub fn audience(&self) -> Audience {
        match self {
            DomainEvent::GameCreated { .. } => Audience::Everyone,
            DomainEvent::PlayerJoined { game }
            | DomainEvent::FleetPlaced { game, .. }
            | DomainEvent::MoveApplied { game, .. }
            | DomainEvent::GameEnded { game, .. } => Audience::Game(game.id),
            DomainEvent::Chat { message } => Audience::Game(message.game_id),
        }
    }

    pub fn to_envelope(&self) -> Result<Envelope, serde_json::Error> {
        let env = match self {
            DomainEvent::GameCreated { game } => Envelope {
                kind: EventKind::NewGameCreated,
                game_id: Some(game.id),
                user_id: Some(game.player1),
                data: Some(serde_json::to_value(game)?),
                message: Some("new_game_available".into()),
            },
            DomainEvent::PlayerJoined { game } => Envelope {
                kind: EventKind::PlayerJoined,
                game_id: Some(game.id),
                user_id: game.player2,
                data: Some(serde_json::to_value(game)?),
                message: Some("player_joined".into()),
            },
            DomainEvent::FleetPlaced {
                game,
                player,
                battle_started,
            } => Envelope {
                kind: EventKind::ShipsPlaced,
                game_id: Some(game.id),
                user_id: Some(*player),
                data: Some(serde_json::to_value(game)?),
                message: Some(if *battle_started { "battle_started" } else { "ships_placed" }.into()),
            },
            DomainEvent::MoveApplied { game, mv, sunk } => {
                let outcome = match (mv.hit, sunk) {
                    (_, Some(ship)) => format!("sunk:{}", ship.placement.kind),
                    (true, None) => "hit".to_string(),
                    (false, None) => "miss".to_string(),
                };
                Envelope {
                    kind: EventKind::GameUpdate,
                    game_id: Some(game.id),
                    user_id: Some(mv.player),
                    data: Some(serde_json::to_value(mv)?),
                    message: Some(outcome),
                }
            }
            DomainEvent::GameEnded { game, winner, .. } => Envelope {
                kind: EventKind::GameUpdate,
                game_id: Some(game.id),
                user_id: Some(*winner),
                data: Some(serde_json::to_value(game)?),
                message: Some("game_over".into()),
            },
            DomainEvent::Chat { message } => Envelope {
                kind: EventKind::Chat,
                game_id: Some(message.game_id),
                user_id: Some(message.player_id),
                data: Some(serde_json::to_value(message)?),
                message: None,
            },
        };
        Ok(env)
    }

    pub fn encode(&self) -> Result<Payload, serde_json::Error> {
        self.to_envelope()?.encode()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NewGameCreated,
    PlayerJoined,
    ShipsPlaced,
    GameUpdate,
    Chat,
    Ack,
    Error,
}

/// Outbound JSON shape: `{type, game_id?, user_id?, data?, message?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<GameId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    pub fn ack(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Ack,
            game_id: None,
            user_id: None,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Error,
            game_id: None,
            user_id: None,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn with_game(mut self, game: GameId) -> Self {
        self.game_id = Some(game);
        self
    }

    pub fn with_user(mut self, user: PlayerId) -> Self {
        self.user_id = Some(user);
        self
    }

    pub fn encode(&self) -> Result<Payload, serde_json::Error> {
        Ok(Arc::from(serde_json::to_vec(self)?))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Commands a client sends: `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Bind this connection to a player identity.
    Identify(PlayerId),
    /// Subscribe this connection to a game room.
    JoinGame(GameId),
    LeaveGame,
    CreateGame,
    /// Take the second seat of a waiting game.
    TakeSeat(GameId),
    PlaceShips(Vec<ShipPlacement>),
    Move(Coord),
    Chat(String),
}

impl ClientMessage {
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
