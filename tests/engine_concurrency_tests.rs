use std::sync::Arc;

use battleship_hub::{
    Coord, GameEngine, GameError, GameId, GameStatus, Orientation, PlayerId, ShipKind,
    ShipPlacement,
};

const P1: PlayerId = PlayerId(1);
const P2: PlayerId = PlayerId(2);

fn fleet() -> Vec<ShipPlacement> {
    vec![
        ShipPlacement::new(ShipKind::Carrier, Coord::new(0, 0), Orientation::Horizontal),
        ShipPlacement::new(ShipKind::Battleship, Coord::new(0, 2), Orientation::Horizontal),
        ShipPlacement::new(ShipKind::Cruiser, Coord::new(0, 4), Orientation::Horizontal),
        ShipPlacement::new(ShipKind::Submarine, Coord::new(0, 6), Orientation::Horizontal),
        ShipPlacement::new(ShipKind::Destroyer, Coord::new(0, 8), Orientation::Horizontal),
    ]
}

async fn started(engine: &GameEngine, p1: PlayerId, p2: PlayerId) -> GameId {
    let id = engine.create_game(p1).await.unwrap().value.id;
    engine.join_game(id, p2).await.unwrap();
    engine.place_ships(id, p1, &fleet()).await.unwrap();
    engine.place_ships(id, p2, &fleet()).await.unwrap();
    id
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_apply_once() {
    let engine = Arc::new(GameEngine::in_memory());
    let id = started(&engine, P1, P2).await;

    // ten different open-water cells, all fired for the same turn
    let handles: Vec<_> = (0..10)
        .map(|x| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.make_move(id, P1, Coord::new(x, 9)).await })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(e) => assert_eq!(e, GameError::NotYourTurn),
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(engine.moves(id).await.unwrap().len(), 1);
    assert_eq!(engine.game(id).await.unwrap().current_turn, Some(P2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_target_recorded_once() {
    let engine = Arc::new(GameEngine::in_memory());
    let id = started(&engine, P1, P2).await;

    // a hit keeps the turn, so every loser must see the duplicate
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.make_move(id, P1, Coord::new(0, 0)).await })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(outcome) => {
                assert!(outcome.value.mv.hit);
                accepted += 1;
            }
            Err(e) => assert_eq!(e, GameError::DuplicateTarget(Coord::new(0, 0))),
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(engine.moves(id).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_seat_one_player() {
    let engine = Arc::new(GameEngine::in_memory());
    let id = engine.create_game(P1).await.unwrap().value.id;

    let handles: Vec<_> = (2..10)
        .map(|p| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.join_game(id, PlayerId(p)).await })
        })
        .collect();

    let mut seated = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(outcome) => seated.push(outcome.value.player2.unwrap()),
            Err(e) => assert_eq!(
                e,
                GameError::InvalidState {
                    status: GameStatus::Active
                }
            ),
        }
    }
    assert_eq!(seated.len(), 1);
    assert_eq!(engine.game(id).await.unwrap().player2, Some(seated[0]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_placement_is_one_shot() {
    let engine = Arc::new(GameEngine::in_memory());
    let id = engine.create_game(P1).await.unwrap().value.id;
    engine.join_game(id, P2).await.unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.place_ships(id, P2, &fleet()).await })
        })
        .collect();

    let mut placed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(e) => assert_eq!(e, GameError::AlreadyPlaced),
        }
    }
    assert_eq!(placed, 1);
    assert_eq!(engine.ships(id, P2).await.unwrap().len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_games_progress_independently() {
    let engine = Arc::new(GameEngine::in_memory());
    let cells: Vec<Coord> = fleet()
        .iter()
        .flat_map(battleship_hub::span_cells)
        .collect();

    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            let engine = engine.clone();
            let cells = cells.clone();
            tokio::spawn(async move {
                let (a, b) = (PlayerId(100 + 2 * i), PlayerId(101 + 2 * i));
                let id = started(&engine, a, b).await;
                for cell in cells {
                    engine.make_move(id, a, cell).await.unwrap();
                }
                engine.game(id).await.unwrap()
            })
        })
        .collect();

    for handle in handles {
        let game = handle.await.unwrap();
        assert_eq!(game.status, GameStatus::Finished);
        assert_eq!(game.winner, Some(game.player1));
    }
}
