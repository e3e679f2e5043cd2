//! Per-position cell model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{ItemId, Orientation, Role, TileKey};

use super::ItemOption;

/// A row/column coordinate on the authoring grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    /// Zero-based row, growing southwards.
    pub row: usize,
    /// Zero-based column, growing eastwards.
    pub column: usize,
}

impl GridPosition {
    /// Creates a position.
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// The adjacent position in a direction, if it is non-negative.
    pub fn step(self, orientation: Orientation) -> Option<Self> {
        let (d_row, d_column) = orientation.grid_offset();
        Some(Self {
            row: self.row.checked_add_signed(d_row)?,
            column: self.column.checked_add_signed(d_column)?,
        })
    }
}

impl std::fmt::Display for GridPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// An item placed on a cell, remembering the option it consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedItem {
    pub(crate) id: ItemId,
    pub(crate) option: ItemOption,
    pub(crate) slot: usize,
}

impl PlacedItem {
    /// Item identity.
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// The option this item was created from.
    pub fn option(&self) -> &ItemOption {
        &self.option
    }

    /// Corner slot index inside the room.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// Editor state of one grid position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub(crate) position: GridPosition,
    pub(crate) relation_key: Option<TileKey>,
    pub(crate) selectable: bool,
    pub(crate) restrictions: BTreeSet<Role>,
    pub(crate) items: Vec<PlacedItem>,
}

impl Cell {
    pub(crate) fn new(position: GridPosition) -> Self {
        Self {
            position,
            relation_key: None,
            selectable: true,
            restrictions: BTreeSet::new(),
            items: Vec::new(),
        }
    }

    /// Grid coordinate.
    pub fn position(&self) -> GridPosition {
        self.position
    }

    /// Relation key, present once the cell is selected.
    pub fn relation_key(&self) -> Option<TileKey> {
        self.relation_key
    }

    /// True once the cell is part of the labyrinth.
    pub fn is_selected(&self) -> bool {
        self.relation_key.is_some()
    }

    /// True when the cell may be selected next.
    pub fn is_selectable(&self) -> bool {
        self.selectable
    }

    /// Roles forbidden from entering.
    pub fn restrictions(&self) -> &BTreeSet<Role> {
        &self.restrictions
    }

    /// Items in placement order.
    pub fn items(&self) -> &[PlacedItem] {
        &self.items
    }
}
