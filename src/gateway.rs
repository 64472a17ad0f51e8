//! Turns client frames into engine calls and engine events into hub
//! deliveries. The engine never sees the hub; this is the only place the two
//! meet.

use std::sync::Arc;

use log::{debug, warn};
use serde_json::json;

use crate::common::GameError;
use crate::domain::{GameId, PlayerId};
use crate::game::GameEngine;
use crate::geometry;
use crate::hub::{ConnectionId, Hub};
use crate::protocol::{ClientMessage, DomainEvent, Envelope};

/// What the gateway knows about one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionState {
    pub id: ConnectionId,
    pub player: Option<PlayerId>,
    pub game: Option<GameId>,
}

impl ConnectionState {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            player: None,
            game: None,
        }
    }

    fn player(&self) -> Result<PlayerId, GameError> {
        self.player
            .ok_or_else(|| GameError::InvalidMessage("identify before playing".into()))
    }

    fn game(&self) -> Result<GameId, GameError> {
        self.game
            .ok_or_else(|| GameError::InvalidMessage("join a game first".into()))
    }
}

pub struct Gateway {
    engine: Arc<GameEngine>,
    hub: Hub,
}

impl Gateway {
    pub fn new(engine: Arc<GameEngine>, hub: Hub) -> Self {
        Self { engine, hub }
    }

    pub fn engine(&self) -> &Arc<GameEngine> {
        &self.engine
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Encode each event once and hand it to the hub for its audience.
    pub fn publish(&self, events: &[DomainEvent]) {
        for event in events {
            match event.encode() {
                Ok(payload) => self.hub.deliver(event.audience().into(), payload),
                Err(e) => warn!("dropping event that failed to encode: {}", e),
            }
        }
    }

    fn reply(&self, conn: &ConnectionState, envelope: &Envelope) {
        match envelope.encode() {
            Ok(payload) => self.hub.send_to_connection(conn.id, payload),
            Err(e) => warn!("dropping reply to {} that failed to encode: {}", conn.id, e),
        }
    }

    /// Handle one inbound frame. Every frame is answered on the same
    /// connection with either an `ack` or an `error`; nothing here closes the
    /// connection.
    pub async fn handle_frame(&self, conn: &mut ConnectionState, frame: &[u8]) {
        let msg = match ClientMessage::decode(frame) {
            Ok(msg) => msg,
            Err(e) => {
                debug!("connection {}: malformed frame: {}", conn.id, e);
                self.reply(conn, &Envelope::error(format!("malformed message: {}", e)));
                return;
            }
        };
        match self.dispatch(conn, msg).await {
            Ok(ack) => self.reply(conn, &ack),
            Err(e) => {
                debug!("connection {}: rejected: {}", conn.id, e);
                let mut envelope = Envelope::error(e.to_string());
                envelope.game_id = conn.game;
                envelope.data = Some(json!({ "code": e.code() }));
                self.reply(conn, &envelope);
            }
        }
    }

    /// Apply one command on behalf of `conn` and return the acknowledgement.
    pub async fn dispatch(
        &self,
        conn: &mut ConnectionState,
        msg: ClientMessage,
    ) -> Result<Envelope, GameError> {
        match msg {
            ClientMessage::Identify(player) => {
                conn.player = Some(player);
                self.hub.identify(conn.id, player);
                Ok(Envelope::ack("identified").with_user(player))
            }
            ClientMessage::JoinGame(game) => {
                self.engine.game(game).await?;
                self.subscribe(conn, Some(game));
                Ok(Envelope::ack("subscribed").with_game(game))
            }
            ClientMessage::LeaveGame => {
                self.subscribe(conn, None);
                Ok(Envelope::ack("unsubscribed"))
            }
            ClientMessage::CreateGame => {
                let player = conn.player()?;
                let outcome = self.engine.create_game(player).await?;
                let game = outcome.value.id;
                self.subscribe(conn, Some(game));
                self.publish(&outcome.events);
                Ok(Envelope::ack("game_created").with_game(game))
            }
            ClientMessage::TakeSeat(game) => {
                let player = conn.player()?;
                let outcome = self.engine.join_game(game, player).await?;
                self.subscribe(conn, Some(game));
                self.publish(&outcome.events);
                Ok(Envelope::ack("seat_taken").with_game(game))
            }
            ClientMessage::PlaceShips(ships) => {
                let player = conn.player()?;
                let game = conn.game()?;
                let outcome = self.engine.place_ships(game, player, &ships).await?;
                self.publish(&outcome.events);
                Ok(Envelope::ack("ships_placed").with_game(game))
            }
            ClientMessage::Move(target) => {
                let player = conn.player()?;
                let game = conn.game()?;
                if !geometry::in_bounds(target) {
                    return Err(GameError::OutOfBounds(target));
                }
                let outcome = self.engine.make_move(game, player, target).await?;
                self.publish(&outcome.events);
                let result = if outcome.value.mv.hit { "hit" } else { "miss" };
                Ok(Envelope::ack(result).with_game(game))
            }
            ClientMessage::Chat(text) => {
                let player = conn.player()?;
                let game = conn.game()?;
                let outcome = self.engine.post_chat(game, player, &text).await?;
                self.publish(&outcome.events);
                Ok(Envelope::ack("sent").with_game(game))
            }
        }
    }

    fn subscribe(&self, conn: &mut ConnectionState, game: Option<GameId>) {
        conn.game = game;
        self.hub.change_subscription(conn.id, game);
    }
}
