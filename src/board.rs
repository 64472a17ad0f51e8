//! Fleet assembly and validation.

use rand::Rng;

use crate::common::FleetError;
use crate::config::{BOARD_SIZE, FLEET, FLEET_SIZE};
use crate::geometry::{self, Coord};
use crate::ship::{Orientation, ShipKind, ShipPlacement};

/// A fleet under construction. Ships are accepted one at a time, each
/// checked against the catalogue, the grid and the ships already placed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    ships: Vec<ShipPlacement>,
}

impl Board {
    /// Create an empty board (no ships placed).
    pub fn new() -> Self {
        Self::default()
    }

    /// Ships placed so far, in placement order.
    pub fn ships(&self) -> &[ShipPlacement] {
        &self.ships
    }

    /// `true` once every catalogue type has been placed.
    pub fn is_complete(&self) -> bool {
        self.ships.len() == FLEET_SIZE
    }

    /// Add one ship after checking it against everything placed so far.
    pub fn place(&mut self, ship: ShipPlacement) -> Result<(), FleetError> {
        if ship.size != ship.kind.size() {
            return Err(FleetError::SizeMismatch {
                kind: ship.kind,
                size: ship.size,
            });
        }
        if self.ships.iter().any(|s| s.kind == ship.kind) {
            return Err(FleetError::DuplicateKind(ship.kind));
        }
        if !geometry::is_well_formed(&ship) {
            return Err(FleetError::MalformedSpan(ship.kind));
        }
        if !geometry::in_bounds(ship.start) || !geometry::in_bounds(ship.end) {
            return Err(FleetError::OutOfBounds(ship.kind));
        }
        // cell by cell against every ship already down
        if let Some(other) = self.ships.iter().find(|s| geometry::overlaps(s, &ship)) {
            return Err(FleetError::Overlap(other.kind, ship.kind));
        }
        self.ships.push(ship);
        Ok(())
    }

    /// Finish the board, failing if any catalogue type is missing.
    pub fn into_fleet(self) -> Result<Vec<ShipPlacement>, FleetError> {
        if let Some(kind) = FLEET.iter().find(|k| !self.ships.iter().any(|s| s.kind == **k)) {
            return Err(FleetError::MissingKind(*kind));
        }
        Ok(self.ships)
    }

    /// Returns a random placement of `kind` that fits the grid and does not
    /// overlap anything already placed.
    pub fn random_placement<R: Rng>(
        &self,
        rng: &mut R,
        kind: ShipKind,
    ) -> Result<ShipPlacement, FleetError> {
        let len = kind.size();
        for _ in 0..100 {
            let orientation = if rng.random() {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let (max_x, max_y) = match orientation {
                Orientation::Horizontal => (BOARD_SIZE - len, BOARD_SIZE - 1),
                Orientation::Vertical => (BOARD_SIZE - 1, BOARD_SIZE - len),
            };
            let x = rng.random_range(0..=max_x) as i32;
            let y = rng.random_range(0..=max_y) as i32;
            let ship = ShipPlacement::new(kind, Coord::new(x, y), orientation);
            if !self.ships.iter().any(|s| geometry::overlaps(s, &ship)) {
                return Ok(ship);
            }
        }
        Err(FleetError::UnableToPlace(kind))
    }
}

/// Check a complete fleet submission. Exactly five ships, one per catalogue
/// type, sizes matching types, fully on the grid and pairwise disjoint.
pub fn validate_fleet(ships: &[ShipPlacement]) -> Result<(), FleetError> {
    if ships.len() != FLEET_SIZE {
        return Err(FleetError::WrongShipCount(ships.len()));
    }
    let mut board = Board::new();
    for ship in ships {
        board.place(*ship)?;
    }
    board.into_fleet().map(|_| ())
}

/// A random legal fleet.
pub fn random_fleet<R: Rng>(rng: &mut R) -> Result<Vec<ShipPlacement>, FleetError> {
    let mut board = Board::new();
    for kind in FLEET {
        let ship = board.random_placement(rng, kind)?;
        board.place(ship)?;
    }
    board.into_fleet()
}
