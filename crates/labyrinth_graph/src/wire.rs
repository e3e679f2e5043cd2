//! Serialized labyrinth document exchanged with the backend.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Item, Tile, TileKey};

/// Wire form of a labyrinth.
///
/// Tile keys are strings in `tileMap`; relation maps name every orientation
/// and use `null` for "no neighbor".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabyrinthDocument {
    /// Display name, unique per backend.
    pub labyrinth_name: String,
    /// Goal tile.
    pub end_tile_key: TileKey,
    /// Start tile per roster index.
    pub player_start_tile_keys: Vec<TileKey>,
    /// Tiles keyed by the decimal form of their key.
    pub tile_map: BTreeMap<String, TileDocument>,
}

/// Wire form of a single tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TileDocument {
    /// Tile key.
    pub tile_id: TileKey,
    /// Items in placement order.
    #[serde(default)]
    pub objects_in_room: Vec<Item>,
    /// Role names forbidden from entering.
    #[serde(default)]
    pub restrictions: Vec<String>,
    /// Orientation name to neighbor key, `null` when absent.
    #[serde(default)]
    pub tile_relation_map: BTreeMap<String, Option<TileKey>>,
}

impl TileDocument {
    pub(crate) fn from_tile(tile: &Tile) -> Self {
        Self {
            tile_id: tile.key(),
            objects_in_room: tile.items().to_vec(),
            restrictions: tile.restrictions().iter().map(ToString::to_string).collect(),
            tile_relation_map: tile
                .relations()
                .iter()
                .map(|(orientation, key)| (orientation.to_string(), key))
                .collect(),
        }
    }
}
