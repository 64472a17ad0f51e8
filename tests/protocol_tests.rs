use battleship_hub::{
    Audience, ClientMessage, Coord, DomainEvent, Envelope, EventKind, GameEngine, GameId,
    Orientation, PlayerId, ShipKind, ShipPlacement,
};
use serde_json::{json, Value};

fn fleet() -> Vec<ShipPlacement> {
    vec![
        ShipPlacement::new(ShipKind::Carrier, Coord::new(0, 0), Orientation::Horizontal),
        ShipPlacement::new(ShipKind::Battleship, Coord::new(0, 2), Orientation::Horizontal),
        ShipPlacement::new(ShipKind::Cruiser, Coord::new(0, 4), Orientation::Horizontal),
        ShipPlacement::new(ShipKind::Submarine, Coord::new(0, 6), Orientation::Horizontal),
        ShipPlacement::new(ShipKind::Destroyer, Coord::new(0, 8), Orientation::Vertical),
    ]
}

fn to_json(event: &DomainEvent) -> Value {
    serde_json::from_slice(&event.encode().unwrap()).unwrap()
}

#[test]
fn test_decode_inbound_commands() {
    let cases = [
        (json!({"type": "move", "data": {"x": 3, "y": 4}}), ClientMessage::Move(Coord::new(3, 4))),
        (json!({"type": "join_game", "data": 12}), ClientMessage::JoinGame(GameId(12))),
        (json!({"type": "chat", "data": "hello"}), ClientMessage::Chat("hello".into())),
        (json!({"type": "identify", "data": 5}), ClientMessage::Identify(PlayerId(5))),
        (json!({"type": "take_seat", "data": 3}), ClientMessage::TakeSeat(GameId(3))),
        (json!({"type": "create_game"}), ClientMessage::CreateGame),
        (json!({"type": "leave_game"}), ClientMessage::LeaveGame),
    ];
    for (raw, expected) in cases {
        let bytes = serde_json::to_vec(&raw).unwrap();
        assert_eq!(ClientMessage::decode(&bytes).unwrap(), expected);
    }
}

#[test]
fn test_decode_ship_wire_format() {
    let raw = json!({
        "type": "place_ships",
        "data": [{
            "type": "submarine", "size": 3,
            "start_x": 4, "start_y": 1, "end_x": 4, "end_y": 3,
            "is_vertical": true
        }]
    });
    let msg = ClientMessage::decode(&serde_json::to_vec(&raw).unwrap()).unwrap();
    assert_eq!(
        msg,
        ClientMessage::PlaceShips(vec![ShipPlacement::new(
            ShipKind::Submarine,
            Coord::new(4, 1),
            Orientation::Vertical
        )])
    );
}

#[test]
fn test_reject_unknown_or_malformed() {
    assert!(ClientMessage::decode(br#"{"type":"teleport","data":1}"#).is_err());
    assert!(ClientMessage::decode(br#"{"type":"move","data":{"x":"a"}}"#).is_err());
    assert!(ClientMessage::decode(b"not json").is_err());
}

#[test]
fn test_error_envelope_omits_absent_fields() {
    let bytes = Envelope::error("not your turn").encode().unwrap();
    let v: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v, json!({"type": "error", "message": "not your turn"}));

    let decoded = Envelope::decode(&bytes).unwrap();
    assert_eq!(decoded.kind, EventKind::Error);
    assert_eq!(decoded.game_id, None);
}

#[tokio::test]
async fn test_event_envelopes_follow_wire_shape() {
    let engine = GameEngine::in_memory();
    let (p1, p2) = (PlayerId(1), PlayerId(2));

    let created = engine.create_game(p1).await.unwrap();
    let id = created.value.id;
    let event = &created.events[0];
    assert_eq!(event.audience(), Audience::Everyone);
    let v = to_json(event);
    assert_eq!(v["type"], "new_game_created");
    assert_eq!(v["game_id"], id.0);
    assert_eq!(v["data"]["player1_id"], 1);
    assert_eq!(v["data"]["status"], "waiting");
    assert_eq!(v["data"]["player2_id"], Value::Null);

    let joined = engine.join_game(id, p2).await.unwrap();
    assert_eq!(joined.events[0].audience(), Audience::Game(id));
    assert_eq!(to_json(&joined.events[0])["type"], "player_joined");

    engine.place_ships(id, p1, &fleet()).await.unwrap();
    let placed = engine.place_ships(id, p2, &fleet()).await.unwrap();
    let v = to_json(&placed.events[0]);
    assert_eq!(v["type"], "ships_placed");
    assert_eq!(v["message"], "battle_started");
    assert_eq!(v["data"]["current_turn"], 1);

    let shot = engine.make_move(id, p1, Coord::new(0, 8)).await.unwrap();
    let v = to_json(&shot.events[0]);
    assert_eq!(v["type"], "game_update");
    assert_eq!(v["user_id"], 1);
    assert_eq!(v["message"], "hit");
    assert_eq!(v["data"]["x"], 0);
    assert_eq!(v["data"]["y"], 8);
    assert_eq!(v["data"]["is_hit"], true);

    let shot = engine.make_move(id, p1, Coord::new(0, 9)).await.unwrap();
    assert_eq!(to_json(&shot.events[0])["message"], "sunk:destroyer");

    let chat = engine.post_chat(id, p2, "nice").await.unwrap();
    let v = to_json(&chat.events[0]);
    assert_eq!(v["type"], "chat");
    assert_eq!(v["data"]["message"], "nice");
    assert_eq!(v["data"]["player_id"], 2);
}

#[tokio::test]
async fn test_ship_record_serializes_flat() {
    let engine = GameEngine::in_memory();
    let id = engine.create_game(PlayerId(1)).await.unwrap().value.id;
    let ships = engine.place_ships(id, PlayerId(1), &fleet()).await.unwrap().value;
    let v = serde_json::to_value(&ships[0]).unwrap();
    assert_eq!(v["type"], "carrier");
    assert_eq!(v["size"], 5);
    assert_eq!(v["end_x"], 4);
    assert_eq!(v["is_vertical"], false);
    assert_eq!(v["is_sunk"], false);
    assert_eq!(v["player_id"], 1);
}
