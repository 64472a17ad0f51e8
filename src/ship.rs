//! Ship catalogue and placement descriptions.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Coord;

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn is_vertical(self) -> bool {
        self == Orientation::Vertical
    }

    pub fn from_vertical(vertical: bool) -> Self {
        if vertical {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        }
    }
}

/// Type of ship in the fixed fleet catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipKind {
    Carrier,
    Battleship,
    Cruiser,
    Submarine,
    Destroyer,
}

impl ShipKind {
    /// Ship's name as used on the wire.
    pub const fn name(self) -> &'static str {
        match self {
            ShipKind::Carrier => "carrier",
            ShipKind::Battleship => "battleship",
            ShipKind::Cruiser => "cruiser",
            ShipKind::Submarine => "submarine",
            ShipKind::Destroyer => "destroyer",
        }
    }

    /// Number of cells a ship of this kind occupies.
    pub const fn size(self) -> u8 {
        match self {
            ShipKind::Carrier => 5,
            ShipKind::Battleship => 4,
            ShipKind::Cruiser => 3,
            ShipKind::Submarine => 3,
            ShipKind::Destroyer => 2,
        }
    }
}

impl fmt::Display for ShipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A ship as submitted by a player: declared type and size plus the two end
/// cells of its straight-line span.
///
/// Nothing here is validated; see [`crate::board::validate_fleet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "PlacementWire", into = "PlacementWire")]
pub struct ShipPlacement {
    pub kind: ShipKind,
    pub size: u8,
    pub start: Coord,
    pub end: Coord,
    pub orientation: Orientation,
}

impl ShipPlacement {
    /// Build a well-formed placement of `kind` starting at `start`.
    pub fn new(kind: ShipKind, start: Coord, orientation: Orientation) -> Self {
        let len = kind.size() as i32 - 1;
        let end = match orientation {
            Orientation::Horizontal => Coord::new(start.x + len, start.y),
            Orientation::Vertical => Coord::new(start.x, start.y + len),
        };
        Self {
            kind,
            size: kind.size(),
            start,
            end,
            orientation,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct PlacementWire {
    #[serde(rename = "type")]
    kind: ShipKind,
    size: u8,
    start_x: i32,
    start_y: i32,
    end_x: i32,
    end_y: i32,
    is_vertical: bool,
}

impl From<PlacementWire> for ShipPlacement {
    fn from(w: PlacementWire) -> Self {
        ShipPlacement {
            kind: w.kind,
            size: w.size,
            start: Coord::new(w.start_x, w.start_y),
            end: Coord::new(w.end_x, w.end_y),
            orientation: Orientation::from_vertical(w.is_vertical),
        }
    }
}

impl From<ShipPlacement> for PlacementWire {
    fn from(p: ShipPlacement) -> Self {
        PlacementWire {
            kind: p.kind,
            size: p.size,
            start_x: p.start.x,
            start_y: p.start.y,
            end_x: p.end.x,
            end_y: p.end.y,
            is_vertical: p.orientation.is_vertical(),
        }
    }
}
