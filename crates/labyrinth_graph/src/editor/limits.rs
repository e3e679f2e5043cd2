//! Authoring limits.

use serde::{Deserialize, Serialize};

use crate::Role;

/// Number of corner slots an item can occupy inside a room.
pub const ITEM_SLOTS: usize = 4;

/// Bounds the editor enforces while building a labyrinth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorLimits {
    /// Largest grid height.
    pub max_rows: usize,
    /// Largest grid width.
    pub max_columns: usize,
    /// Fewest selected tiles a valid labyrinth may have.
    pub min_tiles: usize,
    /// Fewest start tiles a valid labyrinth may have.
    pub min_start_positions: usize,
    /// Most start tiles that may exist at once.
    pub max_start_positions: usize,
    /// Most items per tile, capped at [`ITEM_SLOTS`].
    pub max_items: usize,
}

impl EditorLimits {
    /// Items per tile after applying the slot cap.
    pub fn effective_max_items(&self) -> usize {
        self.max_items.min(ITEM_SLOTS)
    }
}

impl Default for EditorLimits {
    fn default() -> Self {
        Self {
            max_rows: 10,
            max_columns: 10,
            min_tiles: 3,
            min_start_positions: Role::count(),
            max_start_positions: Role::count(),
            max_items: ITEM_SLOTS,
        }
    }
}
