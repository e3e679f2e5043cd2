//! Items placed inside rooms.

use derive_getters::Getters;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Orientation;

/// Identity of an item.
pub type ItemId = u32;

/// An interactable object inside a tile.
///
/// `model_name` is an opaque asset reference handed to the renderer.
/// `orientations` names the corner (two values) or edge (one value) of the
/// room the item sits against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Getters)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    id: ItemId,
    model_name: String,
    orientations: Vec<Orientation>,
}

impl Item {
    /// Creates an item.
    pub fn new(id: ItemId, model_name: impl Into<String>, orientations: Vec<Orientation>) -> Self {
        Self {
            id,
            model_name: model_name.into(),
            orientations,
        }
    }

    /// True when the item names one or two orientations.
    pub fn has_valid_placement(&self) -> bool {
        (1..=2).contains(&self.orientations.len())
    }
}
