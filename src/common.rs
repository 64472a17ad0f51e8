//! Common error types: fleet validation, persistence and engine failures.

use core::fmt;

use crate::domain::{GameId, GameStatus, ShipId};
use crate::geometry::Coord;
use crate::ship::ShipKind;

/// Why a submitted fleet was rejected. Placement is all-or-nothing, so the
/// first problem found rejects the whole submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleetError {
    /// The submission did not contain exactly five ships.
    WrongShipCount(usize),
    /// Declared size differs from the catalogue size of the type.
    SizeMismatch { kind: ShipKind, size: u8 },
    /// The same type appears more than once.
    DuplicateKind(ShipKind),
    /// A catalogue type is absent.
    MissingKind(ShipKind),
    /// Start and end cells do not describe a straight span of the declared size.
    MalformedSpan(ShipKind),
    /// Some cell of the span lies outside the grid.
    OutOfBounds(ShipKind),
    /// Two ships share a cell.
    Overlap(ShipKind, ShipKind),
    /// Random placement gave up.
    UnableToPlace(ShipKind),
}

impl fmt::Display for FleetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FleetError::WrongShipCount(n) => write!(f, "must place exactly 5 ships, got {}", n),
            FleetError::SizeMismatch { kind, size } => write!(
                f,
                "invalid ship type or size: {} must have size {}, got {}",
                kind,
                kind.size(),
                size
            ),
            FleetError::DuplicateKind(kind) => write!(f, "incorrect number of {} ships", kind),
            FleetError::MissingKind(kind) => write!(f, "missing {} ship", kind),
            FleetError::MalformedSpan(kind) => {
                write!(f, "{} span does not match its size and orientation", kind)
            }
            FleetError::OutOfBounds(kind) => write!(f, "{} position out of bounds", kind),
            FleetError::Overlap(a, b) => write!(f, "ships cannot overlap: {} and {}", a, b),
            FleetError::UnableToPlace(kind) => write!(f, "unable to place {}", kind),
        }
    }
}

impl std::error::Error for FleetError {}

/// Failure reported by a [`crate::store::GameStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "storage fault: {}", self.message)
    }
}

impl std::error::Error for StoreError {}

/// Entity named by a `NotFound` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Game(GameId),
    Ship(ShipId),
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Game(id) => write!(f, "game {}", id),
            Entity::Ship(id) => write!(f, "ship {}", id),
        }
    }
}

/// Errors returned by [`crate::GameEngine`] operations. Never retried by the
/// engine; the `Display` text is the reason shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    NotFound(Entity),
    /// Operation not legal while the game is in `status`.
    InvalidState { status: GameStatus },
    InvalidFleet(FleetError),
    AlreadyPlaced,
    SelfJoin,
    NotYourTurn,
    DuplicateTarget(Coord),
    /// Caller is not one of the game's players.
    NotParticipant,
    OutOfBounds(Coord),
    InvalidMessage(String),
    StorageFault(StoreError),
}

impl GameError {
    /// Short machine-readable code for the error.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::NotFound(_) => "not_found",
            GameError::InvalidState { .. } => "invalid_state",
            GameError::InvalidFleet(_) => "invalid_fleet",
            GameError::AlreadyPlaced => "already_placed",
            GameError::SelfJoin => "self_join",
            GameError::NotYourTurn => "not_your_turn",
            GameError::DuplicateTarget(_) => "duplicate_target",
            GameError::NotParticipant => "not_participant",
            GameError::OutOfBounds(_) => "out_of_bounds",
            GameError::InvalidMessage(_) => "invalid_message",
            GameError::StorageFault(_) => "storage_fault",
        }
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::NotFound(entity) => write!(f, "{} not found", entity),
            GameError::InvalidState { status } => write!(f, "game is {}", status),
            GameError::InvalidFleet(reason) => write!(f, "invalid fleet: {}", reason),
            GameError::AlreadyPlaced => write!(f, "ships already placed"),
            GameError::SelfJoin => write!(f, "cannot join your own game"),
            GameError::NotYourTurn => write!(f, "not your turn"),
            GameError::DuplicateTarget(c) => write!(f, "position {} already targeted", c),
            GameError::NotParticipant => write!(f, "you are not a player in this game"),
            GameError::OutOfBounds(c) => write!(f, "position {} is off the board", c),
            GameError::InvalidMessage(reason) => write!(f, "invalid message: {}", reason),
            GameError::StorageFault(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::InvalidFleet(e) => Some(e),
            GameError::StorageFault(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FleetError> for GameError {
    fn from(err: FleetError) -> Self {
        GameError::InvalidFleet(err)
    }
}

impl From<StoreError> for GameError {
    fn from(err: StoreError) -> Self {
        GameError::StorageFault(err)
    }
}
