//! The labyrinth graph and its read-only queries.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, instrument, warn};

use crate::wire::{LabyrinthDocument, TileDocument};
use crate::{Item, ItemId, Orientation, Role, Tile, TileKey, ValidationError};

/// A validated tile graph with designated start and end tiles.
///
/// Every relation resolves to a tile in the same map, the end tile and
/// each start tile exist, no start tile is the end tile, and neither carries
/// a role restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labyrinth {
    name: String,
    tiles: BTreeMap<TileKey, Tile>,
    end_tile_key: TileKey,
    player_start_tile_keys: Vec<TileKey>,
}

impl Labyrinth {
    /// Builds and validates a labyrinth.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if any structural invariant is violated.
    #[instrument(skip(tiles), fields(tile_count = tiles.len()))]
    pub fn new(
        name: impl Into<String> + std::fmt::Debug,
        tiles: Vec<Tile>,
        end_tile_key: TileKey,
        player_start_tile_keys: Vec<TileKey>,
    ) -> Result<Self, ValidationError> {
        let labyrinth = Self {
            name: name.into(),
            tiles: tiles.into_iter().map(|t| (t.key(), t)).collect(),
            end_tile_key,
            player_start_tile_keys,
        };
        labyrinth.validate()?;
        debug!(name = %labyrinth.name, "Labyrinth validated");
        Ok(labyrinth)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.tiles.is_empty() {
            return Err(ValidationError::EmptyTileMap);
        }

        for tile in self.tiles.values() {
            for (orientation, target) in tile.relations().iter() {
                if let Some(target) = target
                    && !self.tiles.contains_key(&target)
                {
                    return Err(ValidationError::DanglingRelation {
                        tile: tile.key(),
                        orientation,
                        target,
                    });
                }
            }
            if let Some(item) = tile.items().iter().find(|i| !i.has_valid_placement()) {
                return Err(ValidationError::ItemOrientations {
                    tile: tile.key(),
                    item: *item.id(),
                });
            }
        }

        let end = self
            .tiles
            .get(&self.end_tile_key)
            .ok_or(ValidationError::UnknownEndTile(self.end_tile_key))?;
        if end.is_restricted() {
            return Err(ValidationError::RestrictedEndTile(self.end_tile_key));
        }

        if self.player_start_tile_keys.len() != Role::count() {
            return Err(ValidationError::StartTileCount {
                expected: Role::count(),
                found: self.player_start_tile_keys.len(),
            });
        }

        let mut seen = BTreeSet::new();
        for &key in &self.player_start_tile_keys {
            let start = self
                .tiles
                .get(&key)
                .ok_or(ValidationError::UnknownStartTile(key))?;
            if key == self.end_tile_key {
                return Err(ValidationError::StartIsEnd(key));
            }
            if start.is_restricted() {
                return Err(ValidationError::RestrictedStartTile(key));
            }
            if !seen.insert(key) {
                return Err(ValidationError::DuplicateStartTile(key));
            }
        }

        Ok(())
    }

    /// Converts a wire document into a validated labyrinth.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for malformed keys, unknown names, or any
    /// structural violation.
    #[instrument(skip(document), fields(name = %document.labyrinth_name))]
    pub fn from_document(document: &LabyrinthDocument) -> Result<Self, ValidationError> {
        let mut tiles = Vec::with_capacity(document.tile_map.len());

        for (raw_key, tile_doc) in &document.tile_map {
            let key = parse_tile_key(raw_key)?;
            if tile_doc.tile_id != key {
                debug!(key, tile_id = tile_doc.tile_id, "Tile id differs from map key, using map key");
            }
            tiles.push(tile_from_document(key, tile_doc)?);
        }

        Self::new(
            document.labyrinth_name.clone(),
            tiles,
            document.end_tile_key,
            document.player_start_tile_keys.clone(),
        )
    }

    /// Converts into the wire document.
    #[instrument(skip(self), fields(name = %self.name))]
    pub fn to_document(&self) -> LabyrinthDocument {
        LabyrinthDocument {
            labyrinth_name: self.name.clone(),
            end_tile_key: self.end_tile_key,
            player_start_tile_keys: self.player_start_tile_keys.clone(),
            tile_map: self
                .tiles
                .values()
                .map(|tile| (tile.key().to_string(), TileDocument::from_tile(tile)))
                .collect(),
        }
    }

    /// Name of the labyrinth.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All tiles keyed by their key.
    pub fn tiles(&self) -> &BTreeMap<TileKey, Tile> {
        &self.tiles
    }

    /// Looks up a tile.
    pub fn tile(&self, key: TileKey) -> Option<&Tile> {
        self.tiles.get(&key)
    }

    /// True when a tile with this key exists.
    pub fn contains(&self, key: TileKey) -> bool {
        self.tiles.contains_key(&key)
    }

    /// The goal tile.
    pub fn end_tile_key(&self) -> TileKey {
        self.end_tile_key
    }

    /// Start tiles, one per role, in roster order.
    pub fn player_start_tile_keys(&self) -> &[TileKey] {
        &self.player_start_tile_keys
    }

    /// The tile reached by stepping from `key` towards `orientation`.
    pub fn neighbor_of(&self, key: TileKey, orientation: Orientation) -> Option<&Tile> {
        self.tiles
            .get(&key)
            .and_then(|tile| tile.relation(orientation))
            .and_then(|next| self.tiles.get(&next))
    }

    /// True when `role` may not enter the tile. Unknown tiles are unrestricted.
    pub fn is_restricted_for(&self, key: TileKey, role: Role) -> bool {
        self.tiles
            .get(&key)
            .is_some_and(|tile| tile.is_restricted_for(role))
    }

    /// Items in the tile, in placement order. Unknown tiles hold nothing.
    pub fn items_at(&self, key: TileKey) -> &[Item] {
        self.tiles.get(&key).map(Tile::items).unwrap_or(&[])
    }

    /// Removes an item from a room, returning it if it was there.
    #[instrument(skip(self))]
    pub fn take_item(&mut self, key: TileKey, item: ItemId) -> Option<Item> {
        let taken = self.tiles.get_mut(&key)?.take_item(item);
        if taken.is_none() {
            warn!(tile = key, item, "Item not present in tile");
        }
        taken
    }

    /// Tiles reachable from `start` by a player of the given role.
    ///
    /// Traversal follows relations and skips tiles restricted for `role`.
    #[instrument(skip(self))]
    pub fn reachable_from(&self, start: TileKey, role: Role) -> BTreeSet<TileKey> {
        let mut visited = BTreeSet::new();
        if self.tiles.get(&start).is_none_or(|t| t.is_restricted_for(role)) {
            return visited;
        }

        let mut queue = VecDeque::from([start]);
        visited.insert(start);
        while let Some(key) = queue.pop_front() {
            let Some(tile) = self.tiles.get(&key) else {
                continue;
            };
            for next in tile.relations().neighbors() {
                let passable = self
                    .tiles
                    .get(&next)
                    .is_some_and(|t| !t.is_restricted_for(role));
                if passable && visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        visited
    }
}

fn parse_tile_key(raw: &str) -> Result<TileKey, ValidationError> {
    match raw.trim().parse::<TileKey>() {
        Ok(key) if key > 0 => Ok(key),
        _ => Err(ValidationError::MalformedTileKey(raw.to_string())),
    }
}

fn tile_from_document(key: TileKey, doc: &TileDocument) -> Result<Tile, ValidationError> {
    let mut tile = Tile::new(key);

    for (name, target) in &doc.tile_relation_map {
        let orientation =
            Orientation::parse(name).ok_or_else(|| ValidationError::UnknownOrientation {
                tile: key,
                name: name.clone(),
            })?;
        tile.set_relation(orientation, *target);
    }

    for name in &doc.restrictions {
        let role = Role::parse(name).ok_or_else(|| ValidationError::UnknownRole {
            tile: key,
            name: name.clone(),
        })?;
        tile = tile.with_restriction(role);
    }

    for item in &doc.objects_in_room {
        tile = tile.with_item(item.clone());
    }

    Ok(tile)
}
