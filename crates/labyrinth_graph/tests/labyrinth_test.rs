//! Tests for the labyrinth graph model and its wire form.

use labyrinth_graph::{
    Item, Labyrinth, LabyrinthDocument, Orientation, RelationMap, Role, Tile, ValidationError,
};

/// A 2x2 ring: 1-2 across the top, 3-4 across the bottom, 1-3 and 2-4 down.
fn ring_tiles() -> Vec<Tile> {
    vec![
        Tile::new(1).with_relations(
            RelationMap::new()
                .with(Orientation::East, 2)
                .with(Orientation::South, 3),
        ),
        Tile::new(2)
            .with_relations(
                RelationMap::new()
                    .with(Orientation::West, 1)
                    .with(Orientation::South, 4),
            )
            .with_restriction(Role::Mage)
            .with_item(Item::new(7, "lever", vec![Orientation::North])),
        Tile::new(3).with_relations(
            RelationMap::new()
                .with(Orientation::North, 1)
                .with(Orientation::East, 4),
        ),
        Tile::new(4).with_relations(
            RelationMap::new()
                .with(Orientation::North, 2)
                .with(Orientation::West, 3),
        ),
    ]
}

fn ring() -> Labyrinth {
    Labyrinth::new("Ring", ring_tiles(), 4, vec![1, 3]).expect("Valid ring")
}

const DOCUMENT: &str = r#"{
    "labyrinthName": "Hall",
    "endTileKey": 3,
    "playerStartTileKeys": [1, 2],
    "tileMap": {
        "1": {
            "tileId": 1,
            "objectsInRoom": [],
            "restrictions": [],
            "tileRelationMap": {"NORTH": null, "EAST": 2, "SOUTH": null, "WEST": null}
        },
        "2": {
            "tileId": 2,
            "objectsInRoom": [{"id": 5, "modelName": "torch", "orientations": ["SOUTH", "EAST"]}],
            "restrictions": [],
            "tileRelationMap": {"NORTH": null, "EAST": 3, "SOUTH": null, "WEST": 1}
        },
        "3": {
            "tileId": 3,
            "objectsInRoom": [],
            "restrictions": [],
            "tileRelationMap": {"WEST": 2}
        }
    }
}"#;

#[test]
fn test_relation_map_always_has_four_entries() {
    let labyrinth = ring();
    for tile in labyrinth.tiles().values() {
        assert_eq!(tile.relations().iter().count(), 4);
    }
    assert_eq!(labyrinth.tile(1).expect("Tile").relation(Orientation::North), None);
}

#[test]
fn test_structural_queries() {
    let labyrinth = ring();
    assert_eq!(labyrinth.neighbor_of(1, Orientation::East).map(Tile::key), Some(2));
    assert!(labyrinth.neighbor_of(1, Orientation::West).is_none());
    assert!(labyrinth.neighbor_of(99, Orientation::East).is_none());

    assert!(labyrinth.is_restricted_for(2, Role::Mage));
    assert!(!labyrinth.is_restricted_for(2, Role::Knight));
    assert!(!labyrinth.is_restricted_for(99, Role::Mage));

    assert_eq!(labyrinth.items_at(2).len(), 1);
    assert!(labyrinth.items_at(1).is_empty());
    assert!(labyrinth.items_at(99).is_empty());
}

#[test]
fn test_dangling_relation_rejected() {
    let mut tiles = ring_tiles();
    tiles[0].set_relation(Orientation::North, Some(42));
    let err = Labyrinth::new("Broken", tiles, 4, vec![1, 3]).unwrap_err();
    assert_eq!(
        err,
        ValidationError::DanglingRelation {
            tile: 1,
            orientation: Orientation::North,
            target: 42
        }
    );
}

#[test]
fn test_start_and_end_references_checked() {
    assert_eq!(
        Labyrinth::new("X", ring_tiles(), 9, vec![1, 3]).unwrap_err(),
        ValidationError::UnknownEndTile(9)
    );
    assert_eq!(
        Labyrinth::new("X", ring_tiles(), 4, vec![1, 9]).unwrap_err(),
        ValidationError::UnknownStartTile(9)
    );
    assert_eq!(
        Labyrinth::new("X", ring_tiles(), 4, vec![1, 4]).unwrap_err(),
        ValidationError::StartIsEnd(4)
    );
    assert_eq!(
        Labyrinth::new("X", ring_tiles(), 4, vec![1, 1]).unwrap_err(),
        ValidationError::DuplicateStartTile(1)
    );
    assert_eq!(
        Labyrinth::new("X", ring_tiles(), 4, vec![1]).unwrap_err(),
        ValidationError::StartTileCount {
            expected: 2,
            found: 1
        }
    );
}

#[test]
fn test_restricted_start_or_end_rejected() {
    assert_eq!(
        Labyrinth::new("X", ring_tiles(), 4, vec![1, 2]).unwrap_err(),
        ValidationError::RestrictedStartTile(2)
    );
    assert_eq!(
        Labyrinth::new("X", ring_tiles(), 2, vec![1, 3]).unwrap_err(),
        ValidationError::RestrictedEndTile(2)
    );
}

#[test]
fn test_empty_labyrinth_rejected() {
    assert_eq!(
        Labyrinth::new("X", Vec::new(), 1, vec![1, 2]).unwrap_err(),
        ValidationError::EmptyTileMap
    );
}

#[test]
fn test_item_without_orientation_rejected() {
    let mut tiles = ring_tiles();
    tiles[2] = tiles[2].clone().with_item(Item::new(8, "rug", Vec::new()));
    assert_eq!(
        Labyrinth::new("X", tiles, 4, vec![1, 3]).unwrap_err(),
        ValidationError::ItemOrientations { tile: 3, item: 8 }
    );
}

#[test]
fn test_reachability_honors_restrictions() {
    let labyrinth = ring();
    assert_eq!(labyrinth.reachable_from(1, Role::Knight).len(), 4);

    let mage = labyrinth.reachable_from(1, Role::Mage);
    assert!(!mage.contains(&2));
    assert!(mage.contains(&4), "Mage goes round through 3");
    assert!(labyrinth.reachable_from(2, Role::Mage).is_empty());
}

#[test]
fn test_take_item_removes_from_room() {
    let mut labyrinth = ring();
    assert!(labyrinth.take_item(2, 8).is_none());
    let item = labyrinth.take_item(2, 7).expect("Lever present");
    assert_eq!(item.model_name(), "lever");
    assert!(labyrinth.items_at(2).is_empty());
}

#[test]
fn test_document_parses_into_graph() {
    let document: LabyrinthDocument = serde_json::from_str(DOCUMENT).expect("Valid JSON");
    let labyrinth = Labyrinth::from_document(&document).expect("Valid graph");

    assert_eq!(labyrinth.name(), "Hall");
    assert_eq!(labyrinth.player_start_tile_keys(), &[1, 2]);
    assert_eq!(labyrinth.neighbor_of(3, Orientation::West).map(Tile::key), Some(2));
    assert_eq!(labyrinth.tile(3).expect("Tile").relation(Orientation::North), None);
    assert_eq!(labyrinth.items_at(2)[0].orientations(), &vec![Orientation::South, Orientation::East]);
}

#[test]
fn test_document_round_trips_through_graph() {
    let labyrinth = ring();
    let json = serde_json::to_value(labyrinth.to_document()).expect("Serializable");

    assert_eq!(json["labyrinthName"], "Ring");
    assert_eq!(json["tileMap"]["2"]["restrictions"][0], "MAGE");
    assert!(json["tileMap"]["1"]["tileRelationMap"]["NORTH"].is_null());
    assert_eq!(json["tileMap"]["1"]["tileRelationMap"]["EAST"], 2);

    let parsed: LabyrinthDocument = serde_json::from_value(json).expect("Parsable");
    assert_eq!(Labyrinth::from_document(&parsed).expect("Valid"), labyrinth);
}

#[test]
fn test_document_with_bad_names_rejected() {
    let mut document: LabyrinthDocument = serde_json::from_str(DOCUMENT).expect("Valid JSON");
    let tile = document.tile_map.get_mut("1").expect("Tile");
    tile.restrictions.push("DRAGON".to_string());
    assert!(matches!(
        Labyrinth::from_document(&document),
        Err(ValidationError::UnknownRole { tile: 1, .. })
    ));

    let mut document: LabyrinthDocument = serde_json::from_str(DOCUMENT).expect("Valid JSON");
    let tile = document.tile_map.remove("1").expect("Tile");
    document.tile_map.insert("one".to_string(), tile);
    assert!(matches!(
        Labyrinth::from_document(&document),
        Err(ValidationError::MalformedTileKey(_))
    ));
}

#[test]
fn test_validation_error_is_a_leaf_error() {
    let err = Labyrinth::new("Loop", ring_tiles(), 3, vec![1, 3]).expect_err("Start is end");

    assert_eq!(err, ValidationError::StartIsEnd(3));
    let err: Box<dyn std::error::Error + Send + Sync> = Box::new(err);
    assert!(err.source().is_none());
    assert_eq!(err.to_string(), "Tile 3 is both a start and the end tile");
}
