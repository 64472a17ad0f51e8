//! Process-wide registry of live connections, grouped into game rooms.
//!
//! The registry is owned by a single task; [`Hub`] handles only send it
//! commands over a channel, so every register/unregister/broadcast is applied
//! in the order it was issued. Each connection has a bounded outbound queue.
//! Delivery never waits: a full or closed queue gets the connection dropped.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use core::fmt;

use log::{debug, warn};
use tokio::sync::{mpsc, oneshot};

use crate::domain::{GameId, PlayerId};
use crate::protocol::{Audience, Payload};

/// Identity of one live session, unique for the lifetime of a [`Hub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who a payload goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    All,
    Game(GameId),
    Player(PlayerId),
    Connection(ConnectionId),
}

impl From<Audience> for Target {
    fn from(audience: Audience) -> Self {
        match audience {
            Audience::Everyone => Target::All,
            Audience::Game(id) => Target::Game(id),
            Audience::Player(id) => Target::Player(id),
        }
    }
}

struct Connection {
    player: Option<PlayerId>,
    game: Option<GameId>,
    outbound: mpsc::Sender<Payload>,
}

/// Snapshot of the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    pub connections: usize,
    pub identified: usize,
    pub rooms: usize,
}

/// The connection tables. Not synchronized; lives inside the hub task.
#[derive(Default)]
pub struct Registry {
    connections: HashMap<ConnectionId, Connection>,
    rooms: HashMap<GameId, HashSet<ConnectionId>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: ConnectionId,
        player: Option<PlayerId>,
        game: Option<GameId>,
        outbound: mpsc::Sender<Payload>,
    ) {
        if let Some(game) = game {
            self.rooms.entry(game).or_default().insert(id);
        }
        self.connections.insert(
            id,
            Connection {
                player,
                game,
                outbound,
            },
        );
        debug!("connection {} registered (player {:?}, game {:?})", id, player, game);
    }

    /// Remove a connection everywhere. Dropping its queue sender ends the
    /// connection's writer. Returns `false` if it was already gone.
    pub fn unregister(&mut self, id: ConnectionId) -> bool {
        let Some(conn) = self.connections.remove(&id) else {
            return false;
        };
        if let Some(game) = conn.game {
            self.leave_room(id, game);
        }
        debug!("connection {} unregistered", id);
        true
    }

    fn leave_room(&mut self, id: ConnectionId, game: GameId) {
        if let Some(room) = self.rooms.get_mut(&game) {
            room.remove(&id);
            if room.is_empty() {
                self.rooms.remove(&game);
            }
        }
    }

    /// Move a connection into `game`'s room, or out of any room with `None`.
    pub fn change_subscription(&mut self, id: ConnectionId, game: Option<GameId>) -> bool {
        let Some(prior) = self.connections.get(&id).map(|c| c.game) else {
            return false;
        };
        if prior == game {
            return true;
        }
        if let Some(prior) = prior {
            self.leave_room(id, prior);
        }
        if let Some(game) = game {
            self.rooms.entry(game).or_default().insert(id);
        }
        if let Some(conn) = self.connections.get_mut(&id) {
            conn.game = game;
        }
        true
    }

    pub fn identify(&mut self, id: ConnectionId, player: PlayerId) -> bool {
        match self.connections.get_mut(&id) {
            Some(conn) => {
                conn.player = Some(player);
                true
            }
            None => false,
        }
    }

    fn targets(&self, target: Target) -> Vec<ConnectionId> {
        match target {
            Target::All => self.connections.keys().copied().collect(),
            Target::Game(game) => self
                .rooms
                .get(&game)
                .map(|room| room.iter().copied().collect())
                .unwrap_or_default(),
            Target::Player(player) => self
                .connections
                .iter()
                .filter(|(_, c)| c.player == Some(player))
                .map(|(id, _)| *id)
                .collect(),
            Target::Connection(id) => {
                if self.connections.contains_key(&id) {
                    vec![id]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Queue `payload` for every connection in `target` without waiting.
    /// Connections whose queue is full or closed are unregistered. Returns
    /// how many connections accepted the payload.
    pub fn deliver(&mut self, target: Target, payload: &Payload) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();
        for id in self.targets(target) {
            let Some(conn) = self.connections.get(&id) else {
                continue;
            };
            match conn.outbound.try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("connection {} outbound queue full, dropping it", id);
                    dead.push(id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("connection {} already closed", id);
                    dead.push(id);
                }
            }
        }
        for id in dead {
            self.unregister(id);
        }
        delivered
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Members of a game room, in id order.
    pub fn room_members(&self, game: GameId) -> Vec<ConnectionId> {
        let mut members: Vec<_> = self
            .rooms
            .get(&game)
            .map(|room| room.iter().copied().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            connections: self.connections.len(),
            identified: self.connections.values().filter(|c| c.player.is_some()).count(),
            rooms: self.rooms.len(),
        }
    }
}

enum Command {
    Register {
        id: ConnectionId,
        player: Option<PlayerId>,
        game: Option<GameId>,
        outbound: mpsc::Sender<Payload>,
    },
    Unregister(ConnectionId),
    Subscribe {
        id: ConnectionId,
        game: Option<GameId>,
    },
    Identify {
        id: ConnectionId,
        player: PlayerId,
    },
    Deliver {
        target: Target,
        payload: Payload,
    },
    Stats(oneshot::Sender<HubStats>),
    Members {
        game: GameId,
        reply: oneshot::Sender<Vec<ConnectionId>>,
    },
}

/// A freshly registered connection: its id and the receiving end of its
/// outbound queue. The queue closes when the hub drops the connection.
#[derive(Debug)]
pub struct Subscription {
    pub id: ConnectionId,
    pub rx: mpsc::Receiver<Payload>,
}

/// Cloneable handle to the hub task. The task exits once every handle is
/// dropped.
#[derive(Clone)]
pub struct Hub {
    commands: mpsc::UnboundedSender<Command>,
    next_id: Arc<AtomicU64>,
}

impl Hub {
    /// Start the hub task on the current tokio runtime.
    pub fn spawn() -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(Registry::new(), rx));
        Self {
            commands,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("hub task is gone, command dropped");
        }
    }

    /// Register a new connection with an outbound queue of `capacity` slots.
    pub fn open(
        &self,
        player: Option<PlayerId>,
        game: Option<GameId>,
        capacity: usize,
    ) -> Subscription {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        self.send(Command::Register {
            id,
            player,
            game,
            outbound,
        });
        Subscription { id, rx }
    }

    /// Safe to call more than once.
    pub fn unregister(&self, id: ConnectionId) {
        self.send(Command::Unregister(id));
    }

    pub fn change_subscription(&self, id: ConnectionId, game: Option<GameId>) {
        self.send(Command::Subscribe { id, game });
    }

    pub fn identify(&self, id: ConnectionId, player: PlayerId) {
        self.send(Command::Identify { id, player });
    }

    pub fn broadcast_to_game(&self, game: GameId, payload: Payload) {
        self.deliver(Target::Game(game), payload);
    }

    pub fn broadcast_to_all(&self, payload: Payload) {
        self.deliver(Target::All, payload);
    }

    /// Every live session authenticated as `player`.
    pub fn send_to_user(&self, player: PlayerId, payload: Payload) {
        self.deliver(Target::Player(player), payload);
    }

    pub fn send_to_connection(&self, id: ConnectionId, payload: Payload) {
        self.deliver(Target::Connection(id), payload);
    }

    pub fn deliver(&self, target: Target, payload: Payload) {
        self.send(Command::Deliver { target, payload });
    }

    /// Registry snapshot, taken after every command sent before it.
    pub async fn stats(&self) -> HubStats {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stats(reply));
        rx.await.unwrap_or_default()
    }

    pub async fn room_members(&self, game: GameId) -> Vec<ConnectionId> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Members { game, reply });
        rx.await.unwrap_or_default()
    }
}

async fn run(mut registry: Registry, mut commands: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = commands.recv().await {
        match command {
            Command::Register {
                id,
                player,
                game,
                outbound,
            } => registry.register(id, player, game, outbound),
            Command::Unregister(id) => {
                registry.unregister(id);
            }
            Command::Subscribe { id, game } => {
                registry.change_subscription(id, game);
            }
            Command::Identify { id, player } => {
                registry.identify(id, player);
            }
            Command::Deliver { target, payload } => {
                registry.deliver(target, &payload);
            }
            Command::Stats(reply) => {
                let _ = reply.send(registry.stats());
            }
            Command::Members { game, reply } => {
                let _ = reply.send(registry.room_members(game));
            }
        }
    }
    debug!("hub task stopped");
}
