//! Property tests for construction engine invariants.

use std::collections::{BTreeSet, VecDeque};

use labyrinth_graph::{EditorLimits, GridPosition, Labyrinth, LabyrinthEditor, Orientation};
use proptest::prelude::*;

const SIDE: usize = 4;

#[derive(Debug, Clone, Copy)]
enum Edit {
    Select(usize, usize),
    Remove(usize, usize),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0..SIDE, 0..SIDE).prop_map(|(r, c)| Edit::Select(r, c)),
        (0..SIDE, 0..SIDE).prop_map(|(r, c)| Edit::Remove(r, c)),
    ]
}

#[derive(Debug, Clone, Copy)]
enum Mark {
    Select(usize, usize),
    Remove(usize, usize),
    Start(usize, usize),
    End(usize, usize),
}

fn mark() -> impl Strategy<Value = Mark> {
    let cell = || (0..3usize, 0..3usize);
    prop_oneof![
        3 => cell().prop_map(|(r, c)| Mark::Select(r, c)),
        1 => cell().prop_map(|(r, c)| Mark::Remove(r, c)),
        2 => cell().prop_map(|(r, c)| Mark::Start(r, c)),
        2 => cell().prop_map(|(r, c)| Mark::End(r, c)),
    ]
}

/// Breadth-first walk over the relation maps of the current selection.
fn connected(editor: &LabyrinthEditor) -> bool {
    let graph = editor.relation_map();
    let Some(&first) = graph.keys().next() else {
        return true;
    };
    let mut seen = BTreeSet::from([first]);
    let mut queue = VecDeque::from([first]);
    while let Some(key) = queue.pop_front() {
        for next in graph[&key].neighbors() {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen.len() == graph.len()
}

fn symmetric(editor: &LabyrinthEditor) -> bool {
    let graph = editor.relation_map();
    graph.iter().all(|(key, relations)| {
        relations.iter().all(|(orientation, target)| match target {
            Some(target) => graph[&target].get(orientation.opposite()) == Some(*key),
            None => true,
        })
    })
}

proptest! {
    #[test]
    fn selection_stays_connected(edits in prop::collection::vec(edit(), 1..60)) {
        let mut editor = LabyrinthEditor::new(SIDE, SIDE, EditorLimits::default()).unwrap();
        for edit in edits {
            match edit {
                Edit::Select(r, c) => { editor.select(GridPosition::new(r, c)); }
                Edit::Remove(r, c) => { editor.remove(GridPosition::new(r, c)); }
            }
            prop_assert!(connected(&editor));
            prop_assert!(symmetric(&editor));
        }
    }

    #[test]
    fn relation_keys_strictly_increase(edits in prop::collection::vec(edit(), 1..60)) {
        let mut editor = LabyrinthEditor::new(SIDE, SIDE, EditorLimits::default()).unwrap();
        let mut last = 0;
        for edit in edits {
            match edit {
                Edit::Select(r, c) => {
                    if let Some(key) = editor.select(GridPosition::new(r, c)) {
                        prop_assert!(key > last);
                        last = key;
                    }
                }
                Edit::Remove(r, c) => { editor.remove(GridPosition::new(r, c)); }
            }
        }
    }

    #[test]
    fn at_most_one_end_tile(ends in prop::collection::vec((0..SIDE, 0..SIDE), 1..30)) {
        let mut editor = LabyrinthEditor::new(SIDE, SIDE, EditorLimits::default()).unwrap();
        // A comb: the top row with teeth under columns 0 and 2.
        for c in 0..SIDE {
            editor.select(GridPosition::new(0, c));
        }
        editor.select(GridPosition::new(1, 0));
        editor.select(GridPosition::new(1, 2));

        let mut expected = None;
        for (r, c) in ends {
            let position = GridPosition::new(r, c);
            if editor.add_end_tile(position) {
                expected = Some(position);
            }
            let ends = editor.cells().iter().filter(|cell| editor.is_end(cell.position())).count();
            prop_assert!(ends <= 1);
            prop_assert_eq!(editor.end_position(), expected);
        }
    }

    #[test]
    fn validated_documents_reference_real_tiles(marks in prop::collection::vec(mark(), 1..80)) {
        let mut editor = LabyrinthEditor::new(3, 3, EditorLimits::default()).unwrap();
        editor.set_name("Random");
        for mark in marks {
            match mark {
                Mark::Select(r, c) => { editor.select(GridPosition::new(r, c)); }
                Mark::Remove(r, c) => { editor.remove(GridPosition::new(r, c)); }
                Mark::Start(r, c) => { editor.add_start_tile(GridPosition::new(r, c)); }
                Mark::End(r, c) => { editor.add_end_tile(GridPosition::new(r, c)); }
            }
        }
        if editor.validate().is_ok() {
            let document = editor.to_document().unwrap();
            let exists = |key: u32| document.tile_map.contains_key(&key.to_string());
            prop_assert!(exists(document.end_tile_key));
            prop_assert_eq!(document.player_start_tile_keys.len(), 2);
            for start in &document.player_start_tile_keys {
                prop_assert!(exists(*start));
                prop_assert_ne!(*start, document.end_tile_key);
            }
            prop_assert!(Labyrinth::from_document(&document).is_ok());
        } else {
            prop_assert!(editor.to_document().is_err());
        }
    }

    #[test]
    fn step_then_opposite_returns(r in 1..SIDE, c in 1..SIDE) {
        let origin = GridPosition::new(r, c);
        for orientation in Orientation::all() {
            let there = origin.step(orientation).unwrap();
            prop_assert_eq!(there.step(orientation.opposite()), Some(origin));
        }
    }
}
