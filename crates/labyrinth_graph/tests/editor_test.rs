//! Tests for the grid-based construction engine.

use labyrinth_graph::{
    AuthoringStep, EditorLimits, GridPosition, ItemOption, LabyrinthEditor, Orientation, Role,
};

fn pos(row: usize, column: usize) -> GridPosition {
    GridPosition::new(row, column)
}

fn editor() -> LabyrinthEditor {
    LabyrinthEditor::new(3, 3, EditorLimits::default()).expect("Valid grid")
}

/// Builds an L-shaped corridor: (0,0)=1, (0,1)=2, (0,2)=3, (1,2)=4.
fn corridor() -> LabyrinthEditor {
    let mut editor = editor();
    for p in [pos(0, 0), pos(0, 1), pos(0, 2), pos(1, 2)] {
        editor.select(p).expect("Selectable");
    }
    editor
}

/// A corridor with starts, end and name in place.
fn complete() -> LabyrinthEditor {
    let mut editor = corridor();
    assert!(editor.add_start_tile(pos(0, 0)));
    assert!(editor.add_start_tile(pos(0, 1)));
    assert!(editor.add_end_tile(pos(1, 2)));
    editor.set_name("Corridor");
    editor
}

#[test]
fn test_grid_size_bounded_by_limits() {
    assert!(LabyrinthEditor::new(0, 3, EditorLimits::default()).is_err());
    let failure = LabyrinthEditor::new(11, 3, EditorLimits::default()).unwrap_err();
    assert_eq!(failure.step, AuthoringStep::Tiles);
    assert!(LabyrinthEditor::new(10, 10, EditorLimits::default()).is_ok());
}

#[test]
fn test_every_cell_selectable_before_seed() {
    let editor = editor();
    assert!(editor.cells().iter().all(|c| c.is_selectable()));
}

#[test]
fn test_selectability_follows_selected_neighbors() {
    let mut editor = editor();
    assert_eq!(editor.select(pos(1, 1)), Some(1));

    assert!(!editor.is_selectable(pos(1, 1)), "Selected cell is not selectable");
    for p in [pos(0, 1), pos(1, 0), pos(1, 2), pos(2, 1)] {
        assert!(editor.is_selectable(p), "{p} should be selectable");
    }
    for p in [pos(0, 0), pos(0, 2), pos(2, 0), pos(2, 2)] {
        assert!(!editor.is_selectable(p), "{p} is only diagonal");
    }
    assert_eq!(editor.select(pos(2, 2)), None);
}

#[test]
fn test_relation_keys_are_sequential_and_never_reused() {
    let mut editor = editor();
    assert_eq!(editor.select(pos(0, 0)), Some(1));
    assert_eq!(editor.select(pos(0, 1)), Some(2));
    assert!(editor.remove(pos(0, 1)));
    assert_eq!(editor.select(pos(1, 0)), Some(3));
    assert_eq!(editor.select(pos(0, 1)), Some(4));
}

#[test]
fn test_seed_cannot_be_removed_while_others_remain() {
    let mut editor = editor();
    assert_eq!(editor.select(pos(0, 0)), Some(1));
    assert_eq!(editor.select(pos(0, 1)), Some(2));

    assert!(!editor.remove(pos(0, 0)), "Removing key 1 would strand key 2");
    assert!(editor.remove(pos(0, 1)));
    assert!(editor.remove(pos(0, 0)));
    assert_eq!(editor.selected_count(), 0);

    // An empty grid accepts a new seed anywhere.
    assert_eq!(editor.select(pos(2, 2)), Some(3));
}

#[test]
fn test_cell_with_two_selected_neighbors_cannot_be_removed() {
    let mut editor = corridor();
    assert!(!editor.remove(pos(0, 1)));
    assert!(!editor.remove(pos(0, 2)));
    assert!(editor.remove(pos(1, 2)));
    assert!(editor.is_connected());
}

#[test]
fn test_annotated_cell_must_be_cleared_before_removal() {
    let mut editor = corridor();
    assert!(editor.add_end_tile(pos(1, 2)));
    assert!(!editor.remove(pos(1, 2)));
    assert!(editor.remove_end_tile(pos(1, 2)));
    assert!(editor.remove(pos(1, 2)));

    assert!(editor.restrict(pos(0, 2), Role::Mage));
    assert!(!editor.restrict(pos(0, 2), Role::Mage), "Already restricted");
    assert!(editor.clear_restriction(pos(0, 2), Role::Mage));
    assert!(editor.remove(pos(0, 2)));
}

#[test]
fn test_start_tiles_capped_and_exclusive_with_end() {
    let mut editor = corridor();
    assert!(editor.add_end_tile(pos(1, 2)));
    assert!(!editor.add_start_tile(pos(1, 2)), "End tile cannot start");
    assert!(!editor.add_start_tile(pos(2, 2)), "Unselected cell cannot start");

    assert!(editor.add_start_tile(pos(0, 0)));
    assert!(!editor.add_start_tile(pos(0, 0)), "Already a start");
    assert!(editor.add_start_tile(pos(0, 1)));
    assert!(!editor.add_start_tile(pos(0, 2)), "Start positions exhausted");
    assert_eq!(editor.start_positions(), &[pos(0, 0), pos(0, 1)]);

    assert!(editor.remove_start_tile(pos(0, 1)));
    assert!(editor.add_start_tile(pos(0, 2)));
}

#[test]
fn test_restricted_cell_cannot_start() {
    let mut editor = corridor();
    assert!(editor.restrict(pos(0, 1), Role::Knight));
    assert!(!editor.add_start_tile(pos(0, 1)));
}

#[test]
fn test_end_tile_requires_dead_end_and_is_unique() {
    let mut editor = corridor();
    assert!(!editor.add_end_tile(pos(0, 1)), "Two selected neighbors");
    assert!(editor.add_end_tile(pos(0, 0)));
    assert!(editor.add_end_tile(pos(1, 2)));
    assert_eq!(editor.end_position(), Some(pos(1, 2)));
    assert!(!editor.is_end(pos(0, 0)));

    assert!(editor.add_start_tile(pos(0, 0)));
    assert!(!editor.add_end_tile(pos(0, 0)), "Start tile cannot end");
    assert_eq!(editor.end_position(), Some(pos(1, 2)));
}

#[test]
fn test_restriction_rejected_on_start_and_end() {
    let mut editor = corridor();
    assert!(editor.add_start_tile(pos(0, 0)));
    assert!(editor.add_end_tile(pos(1, 2)));
    assert!(!editor.restrict(pos(0, 0), Role::Knight));
    assert!(!editor.restrict(pos(1, 2), Role::Mage));
    assert!(!editor.restrict(pos(2, 0), Role::Mage), "Unselected cell");
}

#[test]
fn test_cell_cannot_forbid_both_roles() {
    let mut editor = corridor();
    assert!(editor.restrict(pos(0, 2), Role::Knight));
    assert!(!editor.restrict(pos(0, 2), Role::Mage));
}

#[test]
fn test_exclusive_item_must_agree_with_restriction() {
    let options = vec![
        ItemOption::exclusive("sword", Role::Knight),
        ItemOption::exclusive("shield", Role::Knight),
        ItemOption::exclusive("helmet", Role::Knight),
    ];
    let mut editor = corridor().with_item_options(options);

    assert!(editor.restrict(pos(0, 1), Role::Knight));
    assert!(editor.restrict(pos(0, 2), Role::Mage));

    assert_eq!(editor.add_item(pos(0, 1), 0), None, "Knight cannot reach its own item");
    assert!(editor.add_item(pos(0, 2), 0).is_some(), "Restricted to the other role");
    assert!(editor.add_item(pos(0, 0), 0).is_some(), "Unrestricted tile");
    assert_eq!(editor.item_options().len(), 1);
}

#[test]
fn test_restriction_rejected_when_it_locks_out_item_owner() {
    let mut editor = corridor().with_item_options(vec![ItemOption::exclusive("staff", Role::Mage)]);
    assert!(editor.add_item(pos(0, 2), 0).is_some());
    assert!(!editor.restrict(pos(0, 2), Role::Mage));
    assert!(editor.restrict(pos(0, 2), Role::Knight));
}

#[test]
fn test_item_placement_limits() {
    let options = (0..6).map(|i| ItemOption::shared(format!("crate_{i}"))).collect();
    let mut editor = corridor().with_item_options(options);
    assert!(editor.add_end_tile(pos(1, 2)));

    assert_eq!(editor.add_item(pos(1, 2), 0), None, "End tile holds no items");
    assert_eq!(editor.add_item(pos(2, 0), 0), None, "Unselected cell");
    assert_eq!(editor.add_item(pos(0, 0), 99), None, "No such option");

    for _ in 0..4 {
        assert!(editor.add_item(pos(0, 0), 0).is_some());
    }
    assert_eq!(editor.add_item(pos(0, 0), 0), None, "Tile is full");
    assert_eq!(editor.item_options().len(), 2);
}

#[test]
fn test_removed_item_returns_to_pool_and_frees_slot() {
    let options = vec![ItemOption::shared("lamp"), ItemOption::shared("key")];
    let mut editor = corridor().with_item_options(options);

    let lamp = editor.add_item(pos(0, 0), 0).expect("Placed");
    let key = editor.add_item(pos(0, 0), 0).expect("Placed");
    assert_ne!(lamp, key);
    assert!(editor.item_options().is_empty());

    assert!(editor.remove_item(pos(0, 0), lamp));
    assert!(!editor.remove_item(pos(0, 0), lamp));
    assert_eq!(editor.item_options()[0].model_name, "lamp");

    let again = editor.add_item(pos(0, 0), 0).expect("Placed");
    let slots: Vec<usize> = editor
        .cell(pos(0, 0))
        .expect("Cell")
        .items()
        .iter()
        .map(|i| i.slot())
        .collect();
    assert!(again > key, "Item ids are not reused");
    assert_eq!(slots, vec![1, 0]);
}

#[test]
fn test_validation_reports_step_to_return_to() {
    let mut editor = editor();
    assert_eq!(editor.validate().unwrap_err().step, AuthoringStep::Tiles);

    for p in [pos(0, 0), pos(0, 1), pos(0, 2), pos(1, 2)] {
        editor.select(p);
    }
    assert_eq!(editor.validate().unwrap_err().step, AuthoringStep::StartPositions);

    editor.add_start_tile(pos(0, 0));
    editor.add_start_tile(pos(0, 1));
    assert_eq!(editor.validate().unwrap_err().step, AuthoringStep::EndTile);

    editor.add_end_tile(pos(1, 2));
    assert_eq!(editor.validate().unwrap_err().step, AuthoringStep::Name);

    editor.set_name("   ");
    assert_eq!(editor.validate().unwrap_err().step, AuthoringStep::Name);

    editor.set_name("Corridor");
    assert!(editor.validate().is_ok());
}

#[test]
fn test_unplaced_item_options_fail_validation() {
    let mut editor = complete().with_item_options(vec![ItemOption::shared("chest")]);
    assert_eq!(editor.validate().unwrap_err().step, AuthoringStep::Items);
    editor.add_item(pos(0, 2), 0).expect("Placed");
    assert!(editor.validate().is_ok());
}

#[test]
fn test_end_tile_that_stops_being_dead_end_fails_validation() {
    let mut editor = complete();
    editor.select(pos(2, 2)).expect("Adjacent to end");
    assert_eq!(editor.validate().unwrap_err().step, AuthoringStep::EndTile);
}

#[test]
fn test_document_has_symmetric_relations() {
    let document = complete().to_document().expect("Valid");

    assert_eq!(document.labyrinth_name, "Corridor");
    assert_eq!(document.end_tile_key, 4);
    assert_eq!(document.player_start_tile_keys, vec![1, 2]);
    assert_eq!(document.tile_map.len(), 4);

    let tile_two = &document.tile_map["2"];
    assert_eq!(tile_two.tile_relation_map["WEST"], Some(1));
    assert_eq!(tile_two.tile_relation_map["EAST"], Some(3));
    assert_eq!(tile_two.tile_relation_map["NORTH"], None);
    assert_eq!(tile_two.tile_relation_map["SOUTH"], None);

    for (key, tile) in &document.tile_map {
        for (name, target) in &tile.tile_relation_map {
            let Some(target) = target else { continue };
            let back = Orientation::parse(name).expect("Known").opposite().to_string();
            assert_eq!(
                document.tile_map[&target.to_string()].tile_relation_map[&back],
                Some(key.parse().expect("Numeric key"))
            );
        }
    }
}

#[test]
fn test_document_carries_restrictions_and_item_corners() {
    let mut editor = complete().with_item_options(vec![
        ItemOption::exclusive("wand", Role::Mage),
        ItemOption::shared("chest"),
    ]);
    assert!(editor.restrict(pos(0, 2), Role::Knight));
    editor.add_item(pos(0, 2), 0).expect("Placed");
    editor.add_item(pos(0, 2), 0).expect("Placed");

    let document = editor.to_document().expect("Valid");
    let tile = &document.tile_map["3"];
    assert_eq!(tile.restrictions, vec!["KNIGHT".to_string()]);
    assert_eq!(tile.objects_in_room.len(), 2);
    assert_eq!(tile.objects_in_room[0].model_name(), "wand");
    assert_eq!(
        tile.objects_in_room[0].orientations(),
        &vec![Orientation::North, Orientation::West]
    );
    assert_eq!(
        tile.objects_in_room[1].orientations(),
        &vec![Orientation::North, Orientation::East]
    );
}

#[test]
fn test_build_produces_valid_labyrinth() {
    let labyrinth = complete().build().expect("Valid");
    assert_eq!(labyrinth.name(), "Corridor");
    assert_eq!(labyrinth.end_tile_key(), 4);
    assert_eq!(labyrinth.neighbor_of(3, Orientation::South).map(|t| t.key()), Some(4));
    for start in labyrinth.player_start_tile_keys() {
        assert!(labyrinth.contains(*start));
        assert_ne!(*start, labyrinth.end_tile_key());
    }
}
