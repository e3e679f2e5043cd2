//! Tests for the event message wire shape.

use labyrinth_sync::{
    EventMessage, Item, Operation, Orientation, Role, SessionCommand, WILDCARD_LOBBY,
};
use strum::IntoEnumIterator;

#[test]
fn test_message_parses_from_wire() {
    let raw = r#"{"operation":"MOVEMENT","lobbyKey":"AB12","username":"alice","data":"7"}"#;

    let message = EventMessage::parse(raw).expect("Valid message");

    assert_eq!(message.operation, Operation::Movement);
    assert_eq!(message.lobby_key, "AB12");
    assert_eq!(message.username, "alice");
    assert_eq!(message.data, "7");
}

#[test]
fn test_missing_data_defaults_to_empty() {
    let raw = r#"{"operation":"JOIN","lobbyKey":"AB12","username":"bob"}"#;

    let message = EventMessage::parse(raw).expect("Valid message");

    assert_eq!(message.data, "");
}

#[test]
fn test_unknown_operation_is_a_protocol_error() {
    let raw = r#"{"operation":"TELEPORT","lobbyKey":"AB12","username":"bob","data":""}"#;

    let err = EventMessage::parse(raw).expect_err("Unknown operation");

    assert!(err.message.contains("Malformed event message"));
}

#[test]
fn test_serializes_camel_case_fields() {
    let message = EventMessage::role_pick("AB12", "alice", Role::Knight);

    let json: serde_json::Value =
        serde_json::from_str(&message.to_json().expect("Serializable")).expect("JSON");

    assert_eq!(json["operation"], "ROLE_PICK");
    assert_eq!(json["lobbyKey"], "AB12");
    assert_eq!(json["data"], "KNIGHT");
}

#[test]
fn test_operation_names_match_the_taxonomy() {
    let names: Vec<String> = Operation::iter().map(|op| op.to_string()).collect();

    assert_eq!(
        names,
        [
            "MOVEMENT",
            "CLICK",
            "CHAT",
            "TRADE",
            "ROLE_PICK",
            "LABYRINTH_PICK",
            "READY",
            "JOIN",
            "UPLOAD",
            "ACCESS",
            "CONVERSATION",
            "COLLECT",
            "CHECK_END",
            "DELETE",
        ]
    );
}

#[test]
fn test_lobby_filter() {
    let scoped = EventMessage::chat("AB12", "alice", "hi");
    let global = EventMessage::chat(WILDCARD_LOBBY, "server", "hi");

    assert!(scoped.is_for_lobby(Some("AB12")));
    assert!(!scoped.is_for_lobby(Some("CD34")));
    assert!(!scoped.is_for_lobby(None));
    assert!(global.is_for_lobby(Some("CD34")));
    assert!(global.is_for_lobby(None));
}

#[test]
fn test_outbound_builders() {
    assert_eq!(
        EventMessage::movement("AB12", "alice", Orientation::South).data,
        "SOUTH"
    );
    assert_eq!(EventMessage::collect("AB12", "alice", 42).data, "42");
    assert_eq!(
        EventMessage::labyrinth_pick("AB12", "alice", "Corridor").operation,
        Operation::LabyrinthPick
    );

    let item = Item::new(3, "torch", vec![Orientation::North, Orientation::East]);
    let trade = EventMessage::trade("AB12", "alice", &item).expect("Serializable item");
    let back: Item = serde_json::from_str(&trade.data).expect("Item JSON");
    assert_eq!(back, item);
}

#[test]
fn test_play_lines_parse_into_commands() {
    assert_eq!(
        "move north".parse::<SessionCommand>(),
        Ok(SessionCommand::Move(Orientation::North))
    );
    assert_eq!(
        "role mage".parse::<SessionCommand>(),
        Ok(SessionCommand::SelectRole(Role::Mage))
    );
    assert_eq!(
        "chat see you at the gate".parse::<SessionCommand>(),
        Ok(SessionCommand::Chat("see you at the gate".to_string()))
    );
    assert_eq!(
        "pick Corridor".parse::<SessionCommand>(),
        Ok(SessionCommand::PickLabyrinth("Corridor".to_string()))
    );
    assert_eq!(
        "collect 5".parse::<SessionCommand>(),
        Ok(SessionCommand::Collect(5))
    );
    assert_eq!("ready".parse::<SessionCommand>(), Ok(SessionCommand::SubmitReady));
    assert!("move up".parse::<SessionCommand>().is_err());
    assert!("collect lever".parse::<SessionCommand>().is_err());
    assert!("dance".parse::<SessionCommand>().is_err());
}
