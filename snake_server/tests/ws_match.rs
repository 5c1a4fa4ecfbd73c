mod support;

use serde_json::json;
use support::{create_room, recv, recv_type, send};

#[tokio::test]
async fn create_join_play_and_disconnect() {
    let (mut alice, code) = create_room("alice").await;
    assert_eq!(code.len(), 6);

    let mut bob = support::connect().await;
    send(&mut bob, "join_room", json!({ "room": code, "name": "bob" })).await;
    let joined = recv(&mut bob).await;
    assert_eq!(joined["type"], "room_joined");
    assert_eq!(joined["data"]["snake_id"], 2);
    assert_eq!(joined["data"]["name"], "bob");

    recv_type(&mut alice, "start_game").await;
    recv_type(&mut bob, "start_game").await;

    // Steer off the shared row so the snakes cannot meet early.
    send(&mut alice, "change_direction", json!({ "room": code, "direction": "UP" })).await;
    send(&mut bob, "change_direction", json!({ "room": code, "direction": "DOWN" })).await;

    let update = recv_type(&mut alice, "game_update").await;
    let data = &update["data"];
    assert!(data["snakes"]["1"].is_array());
    assert!(data["snakes"]["2"].is_array());
    assert_eq!(data["names"]["1"], "alice");
    assert_eq!(data["names"]["2"], "bob");
    assert!(data["time_left"].as_f64().expect("seconds") > 0.0);

    drop(bob);

    let notice = recv_type(&mut alice, "player_disconnected").await;
    assert_eq!(notice["data"]["message"], "Player disconnected");
    assert_eq!(notice["data"]["winner"], "alice");
}

#[tokio::test]
async fn third_player_is_turned_away() {
    let (_alice, code) = create_room("alice").await;

    let mut bob = support::connect().await;
    send(&mut bob, "join_room", json!({ "room": code, "name": "bob" })).await;
    recv_type(&mut bob, "room_joined").await;

    let mut carol = support::connect().await;
    send(&mut carol, "join_room", json!({ "room": code, "name": "carol" })).await;
    let reply = recv(&mut carol).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["data"]["message"], "Room not found or full");
}

#[tokio::test]
async fn unknown_room_is_rejected() {
    let mut ws = support::connect().await;
    send(&mut ws, "join_room", json!({ "room": "NOPE00", "name": "dave" })).await;
    let reply = recv(&mut ws).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["data"]["message"], "Room not found or full");
}

#[tokio::test]
async fn one_live_room_per_connection() {
    let (mut alice, _code) = create_room("alice").await;
    send(&mut alice, "create_room", json!({ "name": "alice" })).await;
    let reply = recv(&mut alice).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["data"]["message"], "Already in a room");
}

#[tokio::test]
async fn missing_name_defaults_to_player() {
    let mut ws = support::connect().await;
    send(&mut ws, "create_room", json!({})).await;
    let reply = recv(&mut ws).await;
    assert_eq!(reply["type"], "room_created");
    assert_eq!(reply["data"]["name"], "Player");
    assert_eq!(reply["data"]["snake_id"], 1);
}
