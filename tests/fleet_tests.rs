use std::collections::HashSet;

use battleship_hub::{
    in_bounds, random_fleet, span_cells, validate_fleet, Coord, FleetError, Orientation, ShipKind,
    ShipPlacement, FLEET, TOTAL_SHIP_CELLS,
};
use proptest::prelude::*;
use rand::{rngs::SmallRng, SeedableRng};

fn fleet() -> Vec<ShipPlacement> {
    vec![
        ShipPlacement::new(ShipKind::Carrier, Coord::new(0, 0), Orientation::Horizontal),
        ShipPlacement::new(ShipKind::Battleship, Coord::new(0, 2), Orientation::Horizontal),
        ShipPlacement::new(ShipKind::Cruiser, Coord::new(0, 4), Orientation::Horizontal),
        ShipPlacement::new(ShipKind::Submarine, Coord::new(0, 6), Orientation::Horizontal),
        ShipPlacement::new(ShipKind::Destroyer, Coord::new(0, 8), Orientation::Horizontal),
    ]
}

#[test]
fn test_valid_fleet_accepted() {
    assert_eq!(validate_fleet(&fleet()), Ok(()));
}

#[test]
fn test_wrong_ship_count() {
    let mut ships = fleet();
    ships.pop();
    assert_eq!(validate_fleet(&ships), Err(FleetError::WrongShipCount(4)));
    assert_eq!(validate_fleet(&[]), Err(FleetError::WrongShipCount(0)));
}

#[test]
fn test_duplicate_type_rejected() {
    let mut ships = fleet();
    ships[4] = ShipPlacement::new(ShipKind::Cruiser, Coord::new(5, 8), Orientation::Horizontal);
    assert_eq!(
        validate_fleet(&ships),
        Err(FleetError::DuplicateKind(ShipKind::Cruiser))
    );
}

#[test]
fn test_size_must_match_type() {
    let mut ships = fleet();
    ships[4].size = 3;
    ships[4].end = Coord::new(2, 8);
    assert_eq!(
        validate_fleet(&ships),
        Err(FleetError::SizeMismatch {
            kind: ShipKind::Destroyer,
            size: 3
        })
    );
}

#[test]
fn test_span_must_match_size() {
    let mut ships = fleet();
    // declared size 2 but end cell three apart
    ships[4].end = Coord::new(2, 8);
    assert_eq!(
        validate_fleet(&ships),
        Err(FleetError::MalformedSpan(ShipKind::Destroyer))
    );
}

#[test]
fn test_out_of_bounds_rejected() {
    let mut ships = fleet();
    ships[0] = ShipPlacement::new(ShipKind::Carrier, Coord::new(7, 0), Orientation::Horizontal);
    assert_eq!(
        validate_fleet(&ships),
        Err(FleetError::OutOfBounds(ShipKind::Carrier))
    );
}

#[test]
fn test_overlap_rejected() {
    let mut ships = fleet();
    ships[3] = ShipPlacement::new(ShipKind::Submarine, Coord::new(1, 3), Orientation::Vertical);
    assert_eq!(
        validate_fleet(&ships),
        Err(FleetError::Overlap(ShipKind::Cruiser, ShipKind::Submarine))
    );
}

#[test]
fn test_extreme_coordinates_are_rejected_not_overflowed() {
    let carrier: ShipPlacement = serde_json::from_value(serde_json::json!({
        "type": "carrier", "size": 5,
        "start_x": i32::MIN, "start_y": 0, "end_x": i32::MAX, "end_y": 0,
        "is_vertical": false
    }))
    .unwrap();
    let mut ships = fleet();
    ships[0] = carrier;
    assert_eq!(
        validate_fleet(&ships),
        Err(FleetError::MalformedSpan(ShipKind::Carrier))
    );

    // a well-formed span at the very edge of i32 is simply off the grid
    let edge = ShipPlacement::new(ShipKind::Carrier, Coord::new(i32::MAX - 4, 0), Orientation::Horizontal);
    assert_eq!(span_cells(&edge).len(), 5);
    ships[0] = edge;
    assert_eq!(
        validate_fleet(&ships),
        Err(FleetError::OutOfBounds(ShipKind::Carrier))
    );
}

#[test]
fn test_reason_strings() {
    assert_eq!(
        FleetError::WrongShipCount(3).to_string(),
        "must place exactly 5 ships, got 3"
    );
    assert_eq!(
        FleetError::Overlap(ShipKind::Carrier, ShipKind::Destroyer).to_string(),
        "ships cannot overlap: carrier and destroyer"
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_fleet_is_legal(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let ships = random_fleet(&mut rng).unwrap();
        prop_assert_eq!(validate_fleet(&ships), Ok(()));

        let kinds: HashSet<ShipKind> = ships.iter().map(|s| s.kind).collect();
        prop_assert_eq!(kinds, FLEET.iter().copied().collect::<HashSet<_>>());

        let cells: Vec<Coord> = ships.iter().flat_map(|s| span_cells(s)).collect();
        prop_assert_eq!(cells.len(), TOTAL_SHIP_CELLS);
        prop_assert!(cells.iter().all(|c| in_bounds(*c)));
        let distinct: HashSet<Coord> = cells.iter().copied().collect();
        prop_assert_eq!(distinct.len(), TOTAL_SHIP_CELLS);
    }

    #[test]
    fn shifted_fleet_rejected_when_off_grid(dx in 6..20i32) {
        let mut ships = fleet();
        for ship in ships.iter_mut() {
            ship.start.x += dx;
            ship.end.x += dx;
        }
        prop_assert!(matches!(validate_fleet(&ships), Err(FleetError::OutOfBounds(_))));
    }
}
