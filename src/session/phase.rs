//! Lobby lifecycle phases.

use serde::Serialize;
use strum::{Display, EnumIter};

/// Where a lobby session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// No lobby joined yet.
    #[default]
    Created,
    /// Joined; choosing roles.
    RoleSelection,
    /// Role confirmed; choosing a labyrinth.
    LabyrinthSelection,
    /// Ready submitted; waiting for the partner.
    ReadyCheck,
    /// Game running.
    InProgress,
    /// Game over or lobby left.
    Finished,
}
