//! Structural validation errors for the tile graph.

use crate::{ItemId, Orientation, TileKey};

/// A labyrinth graph that violates a structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ValidationError {
    /// The tile map holds no tiles.
    #[display("Labyrinth has no tiles")]
    EmptyTileMap,

    /// A tile key on the wire is not a positive integer.
    #[display("Malformed tile key {:?}", _0)]
    MalformedTileKey(#[error(not(source))] String),

    /// A relation points at a tile that is not in the map.
    #[display("Tile {} links {} to missing tile {}", tile, orientation, target)]
    DanglingRelation {
        /// Tile holding the relation.
        tile: TileKey,
        /// Direction of the relation.
        orientation: Orientation,
        /// Key that could not be resolved.
        target: TileKey,
    },

    /// A relation map on the wire uses an unknown orientation name.
    #[display("Tile {} has unknown orientation {:?}", tile, name)]
    UnknownOrientation {
        /// Tile holding the relation.
        tile: TileKey,
        /// Offending name.
        name: String,
    },

    /// A restriction on the wire names an unknown role.
    #[display("Tile {} restricts unknown role {:?}", tile, name)]
    UnknownRole {
        /// Restricted tile.
        tile: TileKey,
        /// Offending name.
        name: String,
    },

    /// The end tile is not in the map.
    #[display("End tile {} does not exist", _0)]
    UnknownEndTile(#[error(not(source))] TileKey),

    /// A start tile is not in the map.
    #[display("Start tile {} does not exist", _0)]
    UnknownStartTile(#[error(not(source))] TileKey),

    /// A start tile doubles as the end tile.
    #[display("Tile {} is both a start and the end tile", _0)]
    StartIsEnd(#[error(not(source))] TileKey),

    /// The same tile is listed twice as a start tile.
    #[display("Tile {} is listed as a start tile more than once", _0)]
    DuplicateStartTile(#[error(not(source))] TileKey),

    /// A start tile forbids some role.
    #[display("Start tile {} carries a role restriction", _0)]
    RestrictedStartTile(#[error(not(source))] TileKey),

    /// The end tile forbids some role.
    #[display("End tile {} carries a role restriction", _0)]
    RestrictedEndTile(#[error(not(source))] TileKey),

    /// Start tile count does not match the number of roles.
    #[display("Expected {} start tiles, found {}", expected, found)]
    StartTileCount {
        /// Number of roles.
        expected: usize,
        /// Number of listed start tiles.
        found: usize,
    },

    /// An item names zero or more than two placement orientations.
    #[display("Item {} in tile {} must have one or two orientations", item, tile)]
    ItemOrientations {
        /// Tile holding the item.
        tile: TileKey,
        /// Offending item.
        item: ItemId,
    },
}
