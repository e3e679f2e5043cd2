//! Players taking part in a lobby.

use std::collections::BTreeMap;

use derive_getters::Getters;
use labyrinth_graph::{Item, ItemId, Role, TileKey};
use tracing::{debug, instrument};

/// Whether a player is driven by this client or mirrored from the partner's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seat {
    /// The player at this keyboard; owns an inventory.
    Local {
        /// Collected items keyed by id.
        inventory: BTreeMap<ItemId, Item>,
    },
    /// The partner, known only through broadcasts.
    Remote,
}

/// A player materialized at game setup.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Player {
    username: String,
    role: Role,
    active: bool,
    position: TileKey,
    seat: Seat,
}

impl Player {
    /// The player at this client, starting on `position`.
    pub fn local(username: impl Into<String>, role: Role, position: TileKey) -> Self {
        Self {
            username: username.into(),
            role,
            active: true,
            position,
            seat: Seat::Local {
                inventory: BTreeMap::new(),
            },
        }
    }

    /// The partner, starting on `position`.
    pub fn remote(username: impl Into<String>, role: Role, position: TileKey) -> Self {
        Self {
            username: username.into(),
            role,
            active: true,
            position,
            seat: Seat::Remote,
        }
    }

    /// True for the player at this client.
    pub fn is_local(&self) -> bool {
        matches!(self.seat, Seat::Local { .. })
    }

    /// Inventory of the local player; `None` for the partner.
    pub fn inventory(&self) -> Option<&BTreeMap<ItemId, Item>> {
        match &self.seat {
            Seat::Local { inventory } => Some(inventory),
            Seat::Remote => None,
        }
    }

    /// Overwrites the position. Callers pass absolute targets only.
    #[instrument(skip(self), fields(username = %self.username))]
    pub(crate) fn move_to(&mut self, position: TileKey) {
        debug!(from = self.position, to = position, "Player moved");
        self.position = position;
    }

    /// Adds to the inventory. Ignored for the partner.
    pub(crate) fn stash(&mut self, item: Item) -> bool {
        match &mut self.seat {
            Seat::Local { inventory } => {
                inventory.insert(*item.id(), item);
                true
            }
            Seat::Remote => false,
        }
    }

    /// Removes from the inventory.
    pub(crate) fn discard(&mut self, item: ItemId) -> Option<Item> {
        match &mut self.seat {
            Seat::Local { inventory } => inventory.remove(&item),
            Seat::Remote => None,
        }
    }
}
