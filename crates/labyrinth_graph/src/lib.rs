//! Labyrinth graph model and construction engine.
//!
//! # Architecture
//!
//! - **Graph model**: [`Tile`], [`RelationMap`], [`Item`] and [`Labyrinth`],
//!   pure data with read-only queries.
//! - **Construction engine**: [`LabyrinthEditor`] builds a graph from a
//!   rectangular grid under connectivity and placement rules.
//! - **Wire format**: [`LabyrinthDocument`], the serialized form the backend
//!   stores.
//!
//! # Example
//!
//! ```
//! use labyrinth_graph::{EditorLimits, GridPosition, LabyrinthEditor};
//!
//! let mut editor = LabyrinthEditor::new(3, 3, EditorLimits::default()).unwrap();
//! assert_eq!(editor.select(GridPosition::new(0, 0)), Some(1));
//! assert_eq!(editor.select(GridPosition::new(0, 1)), Some(2));
//! assert!(!editor.remove(GridPosition::new(0, 0)));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod editor;
mod error;
mod item;
mod labyrinth;
mod orientation;
mod role;
mod tile;
mod wire;

pub use editor::{
    AuthoringFailure, AuthoringStep, Cell, EditorLimits, GridPosition, ITEM_SLOTS, ItemOption,
    LabyrinthEditor, PlacedItem,
};
pub use error::ValidationError;
pub use item::{Item, ItemId};
pub use labyrinth::Labyrinth;
pub use orientation::Orientation;
pub use role::Role;
pub use tile::{RelationMap, Tile, TileKey};
pub use wire::{LabyrinthDocument, TileDocument};
