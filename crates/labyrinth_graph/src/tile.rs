//! Tiles and their directional relations.

use std::collections::BTreeSet;

use tracing::instrument;

use crate::{Item, ItemId, Orientation, Role};

/// Stable identity of a tile, assigned once during construction.
pub type TileKey = u32;

/// Neighbor links of a tile, exactly one slot per orientation.
///
/// An empty slot is a first-class "no neighbor" value rather than a
/// missing entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RelationMap([Option<TileKey>; 4]);

impl RelationMap {
    /// Creates a map with no neighbors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Neighbor key in the given direction.
    pub fn get(&self, orientation: Orientation) -> Option<TileKey> {
        self.0[orientation.index()]
    }

    /// Sets or clears the neighbor in the given direction.
    pub fn set(&mut self, orientation: Orientation, key: Option<TileKey>) {
        self.0[orientation.index()] = key;
    }

    /// Builder-style variant of [`RelationMap::set`].
    pub fn with(mut self, orientation: Orientation, key: TileKey) -> Self {
        self.set(orientation, Some(key));
        self
    }

    /// All four entries in NORTH, EAST, SOUTH, WEST order.
    pub fn iter(&self) -> impl Iterator<Item = (Orientation, Option<TileKey>)> + '_ {
        Orientation::all().map(|o| (o, self.get(o)))
    }

    /// Keys of the present neighbors.
    pub fn neighbors(&self) -> impl Iterator<Item = TileKey> + '_ {
        self.0.iter().flatten().copied()
    }
}

/// One room of the labyrinth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    key: TileKey,
    relations: RelationMap,
    items: Vec<Item>,
    restrictions: BTreeSet<Role>,
}

impl Tile {
    /// Creates a tile with no neighbors, items or restrictions.
    pub fn new(key: TileKey) -> Self {
        Self {
            key,
            relations: RelationMap::new(),
            items: Vec::new(),
            restrictions: BTreeSet::new(),
        }
    }

    /// Replaces the relation map.
    pub fn with_relations(mut self, relations: RelationMap) -> Self {
        self.relations = relations;
        self
    }

    /// Appends an item; insertion order is placement order.
    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Forbids the given role from entering.
    pub fn with_restriction(mut self, role: Role) -> Self {
        self.restrictions.insert(role);
        self
    }

    /// Sets a single relation. Used while loading or constructing a graph.
    #[instrument(skip(self), fields(tile = self.key))]
    pub fn set_relation(&mut self, orientation: Orientation, key: Option<TileKey>) {
        self.relations.set(orientation, key);
    }

    /// The tile's key.
    pub fn key(&self) -> TileKey {
        self.key
    }

    /// Neighbor key in the given direction.
    pub fn relation(&self, orientation: Orientation) -> Option<TileKey> {
        self.relations.get(orientation)
    }

    /// All four relations.
    pub fn relations(&self) -> &RelationMap {
        &self.relations
    }

    /// Items in placement order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Roles forbidden from entering.
    pub fn restrictions(&self) -> &BTreeSet<Role> {
        &self.restrictions
    }

    /// True when `role` may not enter this tile.
    pub fn is_restricted_for(&self, role: Role) -> bool {
        self.restrictions.contains(&role)
    }

    /// True when any role is forbidden.
    pub fn is_restricted(&self) -> bool {
        !self.restrictions.is_empty()
    }

    pub(crate) fn take_item(&mut self, id: ItemId) -> Option<Item> {
        let index = self.items.iter().position(|item| *item.id() == id)?;
        Some(self.items.remove(index))
    }
}
