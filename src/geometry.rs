//! Pure grid geometry over ship spans.
//!
//! A span is walked from the ship's start cell along its orientation for
//! `size` cells. Whether the declared end cell agrees with that walk is a
//! fleet-validation concern ([`is_well_formed`]), not something these
//! functions assume.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::config::BOARD_SIZE;
use crate::ship::{Orientation, ShipPlacement};

/// A grid cell. Coordinates are signed so that out-of-range input survives
/// decoding and can be rejected with a proper reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// `true` iff `0 <= x, y <= 9`.
pub fn in_bounds(coord: Coord) -> bool {
    let max = BOARD_SIZE as i32;
    (0..max).contains(&coord.x) && (0..max).contains(&coord.y)
}

/// Ordered cells covered by `ship`, starting at its start cell. Cells that
/// would lie past `i32::MAX` are left out.
pub fn span_cells(ship: &ShipPlacement) -> Vec<Coord> {
    (0..ship.size as i32)
        .map_while(|i| match ship.orientation {
            Orientation::Horizontal => Some(Coord::new(ship.start.x.checked_add(i)?, ship.start.y)),
            Orientation::Vertical => Some(Coord::new(ship.start.x, ship.start.y.checked_add(i)?)),
        })
        .collect()
}

/// `true` iff `(x, y)` lies on the ship's span.
pub fn contains(ship: &ShipPlacement, x: i32, y: i32) -> bool {
    let (offset, aligned) = match ship.orientation {
        Orientation::Horizontal => (x.checked_sub(ship.start.x), y == ship.start.y),
        Orientation::Vertical => (y.checked_sub(ship.start.y), x == ship.start.x),
    };
    aligned && matches!(offset, Some(d) if (0..ship.size as i32).contains(&d))
}

/// `true` iff the two spans share at least one cell.
pub fn overlaps(a: &ShipPlacement, b: &ShipPlacement) -> bool {
    span_cells(a).iter().any(|c| contains(b, c.x, c.y))
}

/// Number of cells between the declared start and end inclusive, or `None`
/// when the end does not lie on the start's row/column in the direction of
/// the orientation or the distance does not fit an `i32`.
pub fn declared_length(ship: &ShipPlacement) -> Option<usize> {
    let (along, across) = match ship.orientation {
        Orientation::Horizontal => (
            ship.end.x.checked_sub(ship.start.x)?,
            ship.end.y.checked_sub(ship.start.y)?,
        ),
        Orientation::Vertical => (
            ship.end.y.checked_sub(ship.start.y)?,
            ship.end.x.checked_sub(ship.start.x)?,
        ),
    };
    if across != 0 || along < 0 {
        return None;
    }
    usize::try_from(along).ok()?.checked_add(1)
}

/// `true` when the declared end cell is exactly where a walk of `size` cells
/// from the start ends.
pub fn is_well_formed(ship: &ShipPlacement) -> bool {
    ship.size > 0 && declared_length(ship) == Some(ship.size as usize)
}
