//! Tests for the backend contracts using the in-memory backend.

mod common;

use common::{LABYRINTH, corridor};
use labyrinth_sync::{
    Endpoint, EventMessage, LobbyBackend, LocalHub, MemoryBackend, Operation, Orientation, Role,
    RpcError, EventTransport, TransportEvent,
};

#[test]
fn test_status_causes_are_endpoint_specific() {
    assert_eq!(Endpoint::JoinLobby.describe_status(409), "Lobby is full");
    assert_eq!(Endpoint::JoinLobby.describe_status(404), "Lobby not found");
    assert_eq!(Endpoint::SelectRole.describe_status(409), "Role already taken");
    assert_eq!(
        Endpoint::SaveLabyrinth.describe_status(409),
        "Labyrinth name already taken"
    );
    assert_eq!(Endpoint::SaveLabyrinth.describe_status(400), "Labyrinth is invalid");
    assert!(Endpoint::LobbyUsers.describe_status(503).contains("Backend unavailable"));
    assert!(Endpoint::LobbyUsers.describe_status(418).contains("418"));
}

#[test]
fn test_status_error_keeps_status_and_cause() {
    let err = RpcError::status(Endpoint::SelectRole, 409);

    assert_eq!(err.status, Some(409));
    assert_eq!(err.cause(), "Role already taken");
    assert!(err.to_string().starts_with("RPC error: Role already taken"));
}

#[tokio::test]
async fn test_third_member_is_turned_away() {
    let backend = MemoryBackend::new();
    let key = backend.create_lobby("alice").await.expect("Created");
    backend.join_lobby(&key, "bob").await.expect("Joined");

    let err = backend.join_lobby(&key, "carol").await.expect_err("Full");

    assert_eq!(err.status, Some(409));
    assert_eq!(
        backend.lobby_users(&key).await.expect("Roster"),
        vec!["alice".to_string(), "bob".to_string()]
    );
}

#[tokio::test]
async fn test_taken_role_is_refused() {
    let backend = MemoryBackend::new();
    let key = backend.create_lobby("alice").await.expect("Created");
    backend.join_lobby(&key, "bob").await.expect("Joined");

    backend
        .select_role(&EventMessage::role_pick(&key, "alice", Role::Mage))
        .await
        .expect("Free role");
    let err = backend
        .select_role(&EventMessage::role_pick(&key, "bob", Role::Mage))
        .await
        .expect_err("Taken");

    assert_eq!(err.cause(), "Role already taken");
    let roles = backend.lobby_roles(&key).await.expect("Roles");
    assert_eq!(roles.get("alice").map(String::as_str), Some("MAGE"));
    assert!(!roles.contains_key("bob"));
}

#[tokio::test]
async fn test_saving_checks_name_and_structure() {
    let backend = MemoryBackend::new();
    let document = corridor().to_document();

    backend.save_labyrinth(&document).await.expect("Saved");
    let duplicate = backend.save_labyrinth(&document).await.expect_err("Duplicate");
    assert_eq!(duplicate.status, Some(409));

    let mut broken = document.clone();
    broken.labyrinth_name = "Broken".to_string();
    broken.end_tile_key = 99;
    let invalid = backend.save_labyrinth(&broken).await.expect_err("Invalid");
    assert_eq!(invalid.status, Some(400));

    assert_eq!(
        backend.labyrinth_names().await.expect("Names"),
        vec![LABYRINTH.to_string()]
    );
}

#[tokio::test]
async fn test_upload_reads_a_document_file() {
    let backend = MemoryBackend::new();
    let bytes = serde_json::to_vec(&corridor().to_document()).expect("JSON");

    backend
        .upload_labyrinth("corridor.json", bytes)
        .await
        .expect("Uploaded");
    let fetched = backend.fetch_labyrinth(LABYRINTH).await.expect("Stored");
    assert_eq!(fetched.tile_map.len(), 8);

    let err = backend
        .upload_labyrinth("notes.txt", b"not json".to_vec())
        .await
        .expect_err("Unreadable");
    assert!(err.cause().contains("notes.txt"));
}

#[tokio::test]
async fn test_injected_failure_and_recovery() {
    let backend = MemoryBackend::new();
    backend.fail(Endpoint::LabyrinthNames).await;
    assert_eq!(
        backend.labyrinth_names().await.expect_err("Injected").status,
        Some(500)
    );

    backend.recover(Endpoint::LabyrinthNames).await;
    assert!(backend.labyrinth_names().await.is_ok());
    assert_eq!(
        backend.calls().await,
        vec![Endpoint::LabyrinthNames, Endpoint::LabyrinthNames]
    );
}

#[tokio::test]
async fn test_ready_echo_once_everyone_is_ready() {
    let hub = LocalHub::new();
    let mut events = hub.subscribe("labyrinth").await.expect("Subscribed");
    assert_eq!(events.recv().await, Some(TransportEvent::Connected));
    let backend = MemoryBackend::with_hub(hub.clone());
    backend.insert_labyrinth(corridor().to_document()).await;
    let key = backend.create_lobby("alice").await.expect("Created");
    backend.join_lobby(&key, "bob").await.expect("Joined");

    backend.submit_ready(&key, "alice", LABYRINTH).await.expect("Ready");
    backend.submit_ready(&key, "bob", LABYRINTH).await.expect("Ready");

    let mut operations = Vec::new();
    while let Ok(Some(TransportEvent::Frame(frame))) =
        tokio::time::timeout(std::time::Duration::from_millis(200), events.recv()).await
    {
        let message = EventMessage::parse(&frame).expect("Valid frame");
        operations.push((message.operation, message.data));
    }

    assert_eq!(
        operations,
        vec![
            (Operation::Join, String::new()),
            (Operation::Join, String::new()),
            (Operation::Ready, "READY".to_string()),
        ]
    );
    let document = backend.lobby_labyrinth(&key).await.expect("Agreed labyrinth");
    assert_eq!(document.labyrinth_name, LABYRINTH);
}

#[tokio::test]
async fn test_movement_is_relayed_as_the_destination_tile() {
    let backend = MemoryBackend::with_hub(LocalHub::new());
    backend.insert_labyrinth(corridor().to_document()).await;
    let key = backend.create_lobby("alice").await.expect("Created");
    backend.join_lobby(&key, "bob").await.expect("Joined");
    for (username, role) in [("alice", Role::Knight), ("bob", Role::Mage)] {
        backend
            .select_role(&EventMessage::role_pick(&key, username, role))
            .await
            .expect("Role");
        backend.submit_ready(&key, username, LABYRINTH).await.expect("Ready");
    }
    let mut events = backend.subscribe("labyrinth").await.expect("Subscribed");
    assert_eq!(events.recv().await, Some(TransportEvent::Connected));

    for _ in 0..2 {
        backend
            .publish(&EventMessage::movement(&key, "bob", Orientation::East))
            .await
            .expect("Open passage");
    }
    let closed = backend
        .publish(&EventMessage::movement(&key, "bob", Orientation::East))
        .await
        .expect_err("Tile 4 admits knights only");
    assert_eq!(closed.message, "Tile 4 is closed to MAGE");
    let wall = backend
        .publish(&EventMessage::movement(&key, "alice", Orientation::North))
        .await
        .expect_err("Corridor has no north side");
    assert!(wall.message.starts_with("No passage"));

    let mut moves = Vec::new();
    while let Ok(Some(TransportEvent::Frame(frame))) =
        tokio::time::timeout(std::time::Duration::from_millis(200), events.recv()).await
    {
        let message = EventMessage::parse(&frame).expect("Valid frame");
        moves.push((message.operation, message.username, message.data));
    }
    assert_eq!(
        moves,
        vec![
            (Operation::Movement, "bob".to_string(), "2".to_string()),
            (Operation::Movement, "bob".to_string(), "3".to_string()),
        ]
    );
}
