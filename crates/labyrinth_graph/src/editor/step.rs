//! Authoring steps and validation failures.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// The authoring mode a failed validation sends the author back to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuthoringStep {
    /// Selecting and removing grid cells.
    #[default]
    Tiles,
    /// Placing start tiles.
    StartPositions,
    /// Placing the end tile.
    EndTile,
    /// Restricting roles on tiles.
    Restrictions,
    /// Placing items.
    Items,
    /// Naming the labyrinth.
    Name,
}

/// A labyrinth that is not yet complete enough to save.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("{} (return to {})", reason, step)]
pub struct AuthoringFailure {
    /// Step to return to.
    pub step: AuthoringStep,
    /// Human-readable cause.
    pub reason: String,
}

impl AuthoringFailure {
    /// Creates a failure tagged with the step to return to.
    pub fn new(step: AuthoringStep, reason: impl Into<String>) -> Self {
        Self {
            step,
            reason: reason.into(),
        }
    }
}
