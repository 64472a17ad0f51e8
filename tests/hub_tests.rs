use std::sync::Arc;

use battleship_hub::{GameId, Hub, HubStats, Payload, PlayerId};
use tokio::sync::mpsc::error::TryRecvError;

fn payload(text: &str) -> Payload {
    Arc::from(text.as_bytes())
}

fn drain(rx: &mut tokio::sync::mpsc::Receiver<Payload>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(p) = rx.try_recv() {
        out.push(String::from_utf8(p.to_vec()).unwrap());
    }
    out
}

#[tokio::test]
async fn test_broadcast_to_game_reaches_room_only() {
    let hub = Hub::spawn();
    let mut a = hub.open(None, Some(GameId(1)), 8);
    let mut b = hub.open(None, Some(GameId(1)), 8);
    let mut c = hub.open(None, Some(GameId(2)), 8);
    let mut lobby = hub.open(None, None, 8);

    hub.broadcast_to_game(GameId(1), payload("move"));
    hub.broadcast_to_game(GameId(3), payload("nobody"));
    hub.stats().await;

    assert_eq!(drain(&mut a.rx), vec!["move"]);
    assert_eq!(drain(&mut b.rx), vec!["move"]);
    assert!(drain(&mut c.rx).is_empty());
    assert!(drain(&mut lobby.rx).is_empty());
}

#[tokio::test]
async fn test_broadcast_to_all_and_send_to_user() {
    let hub = Hub::spawn();
    let mut a = hub.open(Some(PlayerId(7)), Some(GameId(1)), 8);
    let mut b = hub.open(None, None, 8);
    let mut c = hub.open(Some(PlayerId(8)), None, 8);
    hub.identify(b.id, PlayerId(7));

    hub.broadcast_to_all(payload("lobby"));
    hub.send_to_user(PlayerId(7), payload("private"));
    let stats = hub.stats().await;
    assert_eq!(
        stats,
        HubStats {
            connections: 3,
            identified: 3,
            rooms: 1
        }
    );

    assert_eq!(drain(&mut a.rx), vec!["lobby", "private"]);
    assert_eq!(drain(&mut b.rx), vec!["lobby", "private"]);
    assert_eq!(drain(&mut c.rx), vec!["lobby"]);
}

#[tokio::test]
async fn test_change_subscription_moves_rooms() {
    let hub = Hub::spawn();
    let mut a = hub.open(None, None, 8);
    hub.change_subscription(a.id, Some(GameId(4)));
    hub.broadcast_to_game(GameId(4), payload("first"));
    hub.change_subscription(a.id, Some(GameId(5)));
    hub.broadcast_to_game(GameId(4), payload("missed"));
    hub.broadcast_to_game(GameId(5), payload("second"));

    assert!(hub.room_members(GameId(4)).await.is_empty());
    assert_eq!(hub.room_members(GameId(5)).await, vec![a.id]);
    assert_eq!(drain(&mut a.rx), vec!["first", "second"]);
}

#[tokio::test]
async fn test_unregister_stops_delivery_and_closes_queue() {
    let hub = Hub::spawn();
    let mut a = hub.open(None, Some(GameId(1)), 8);
    let mut b = hub.open(None, Some(GameId(1)), 8);

    hub.broadcast_to_game(GameId(1), payload("before"));
    hub.unregister(a.id);
    hub.unregister(a.id);
    hub.broadcast_to_game(GameId(1), payload("after"));

    assert_eq!(hub.room_members(GameId(1)).await, vec![b.id]);
    assert_eq!(a.rx.recv().await.as_deref(), Some(&b"before"[..]));
    assert_eq!(a.rx.recv().await, None);
    assert_eq!(drain(&mut b.rx), vec!["before", "after"]);

    hub.unregister(b.id);
    assert_eq!(hub.stats().await, HubStats::default());
}

#[tokio::test]
async fn test_full_queue_disconnects_slow_consumer() {
    let hub = Hub::spawn();
    let mut slow = hub.open(None, Some(GameId(9)), 1);
    let mut fast = hub.open(None, Some(GameId(9)), 16);

    hub.broadcast_to_game(GameId(9), payload("one"));
    hub.broadcast_to_game(GameId(9), payload("two"));
    hub.broadcast_to_game(GameId(9), payload("three"));

    assert_eq!(hub.room_members(GameId(9)).await, vec![fast.id]);
    assert_eq!(hub.stats().await.connections, 1);

    assert_eq!(slow.rx.recv().await.as_deref(), Some(&b"one"[..]));
    assert_eq!(slow.rx.try_recv().unwrap_err(), TryRecvError::Disconnected);
    assert_eq!(drain(&mut fast.rx), vec!["one", "two", "three"]);
}

#[tokio::test]
async fn test_dropped_receiver_is_pruned() {
    let hub = Hub::spawn();
    let a = hub.open(None, Some(GameId(1)), 4);
    let mut b = hub.open(None, Some(GameId(1)), 4);
    drop(a.rx);

    hub.broadcast_to_game(GameId(1), payload("x"));
    assert_eq!(hub.room_members(GameId(1)).await, vec![b.id]);
    assert_eq!(drain(&mut b.rx), vec!["x"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_broadcasters_never_block() {
    let hub = Hub::spawn();
    let mut reader = hub.open(None, Some(GameId(1)), 1024);
    // never drained; dropped on the first overflow
    let _stuck = hub.open(None, Some(GameId(1)), 1);

    let tasks: Vec<_> = (0..8)
        .map(|t| {
            let hub = hub.clone();
            tokio::spawn(async move {
                for i in 0..50 {
                    hub.broadcast_to_game(GameId(1), payload(&format!("{}-{}", t, i)));
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(hub.room_members(GameId(1)).await, vec![reader.id]);
    assert_eq!(drain(&mut reader.rx).len(), 400);
}
