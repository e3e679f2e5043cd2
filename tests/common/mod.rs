//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use labyrinth_sync::{
    EventMessage, GameSetup, Item, Labyrinth, Operation, Orientation, PhaseController,
    RelationMap, Role, Tile,
};

pub const LOBBY: &str = "AB12";
pub const LABYRINTH: &str = "Corridor";

/// Eight rooms in a row, 1 in the west to 8 in the east.
///
/// Tile 2 is closed to knights, tile 4 to mages. Tile 3 holds a lever
/// (item 5) and tile 1 a key (item 6). Starts are 3 and 1, the end is 8.
pub fn corridor() -> Labyrinth {
    let tiles = (1..=8)
        .map(|key| {
            let mut relations = RelationMap::new();
            if key > 1 {
                relations = relations.with(Orientation::West, key - 1);
            }
            if key < 8 {
                relations = relations.with(Orientation::East, key + 1);
            }
            let tile = Tile::new(key).with_relations(relations);
            match key {
                1 => tile.with_item(Item::new(
                    6,
                    "key",
                    vec![Orientation::North, Orientation::West],
                )),
                2 => tile.with_restriction(Role::Knight),
                3 => tile.with_item(Item::new(
                    5,
                    "lever",
                    vec![Orientation::North, Orientation::West],
                )),
                4 => tile.with_restriction(Role::Mage),
                _ => tile,
            }
        })
        .collect();
    Labyrinth::new(LABYRINTH, tiles, 8, vec![3, 1]).expect("Valid corridor")
}

/// alice (knight) and bob (mage), in that roster order.
pub fn setup() -> GameSetup {
    let roles = BTreeMap::from([
        ("alice".to_string(), Role::Knight),
        ("bob".to_string(), Role::Mage),
    ]);
    GameSetup::new(
        LOBBY,
        vec!["alice".to_string(), "bob".to_string()],
        roles,
        corridor(),
    )
}

/// A controller for `local` that reached the ready check in [`LOBBY`].
pub fn ready_controller(local: &str) -> PhaseController {
    let role = if local == "alice" {
        Role::Knight
    } else {
        Role::Mage
    };
    let mut controller = PhaseController::new(local);
    assert!(controller.on_lobby_joined(LOBBY));
    controller.on_role_confirmed(role);
    controller.on_labyrinth_picked(LABYRINTH);
    controller.submit_ready().expect("Ready check submitted");
    controller
}

/// A controller for `local` with the corridor game running.
pub fn playing(local: &str) -> PhaseController {
    let mut controller = ready_controller(local);
    assert!(controller.apply_game_setup(setup()));
    controller
}

pub fn message(operation: Operation, username: &str, data: &str) -> EventMessage {
    EventMessage::new(
        operation,
        LOBBY.to_string(),
        username.to_string(),
        data.to_string(),
    )
}
