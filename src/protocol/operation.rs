//! The fixed operation taxonomy.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Discriminant of an [`EventMessage`](super::EventMessage).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// A player moved; `data` is the destination tile key.
    Movement,
    /// A player interacted with something in view.
    Click,
    /// Free-text chat line.
    Chat,
    /// An item changed hands.
    Trade,
    /// A player picked a role.
    RolePick,
    /// A player picked a labyrinth.
    LabyrinthPick,
    /// Ready-check signal.
    Ready,
    /// Someone joined; re-fetch the roster.
    Join,
    /// A labyrinth was uploaded; re-fetch the names.
    Upload,
    /// Result of an access check.
    Access,
    /// Dialogue progressed.
    Conversation,
    /// A player picked up an item.
    Collect,
    /// End-game check result.
    CheckEnd,
    /// An item was consumed.
    Delete,
}
