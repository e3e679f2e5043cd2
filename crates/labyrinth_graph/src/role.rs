//! Player archetypes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::instrument;

/// One of the two asymmetric player archetypes.
///
/// Roles gate tile traversal (restrictions) and item usability (exclusivity).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Heavy archetype.
    Knight,
    /// Arcane archetype.
    Mage,
}

impl Role {
    /// Parses a wire name, returning `None` for anything unrecognized.
    #[instrument]
    pub fn parse(name: &str) -> Option<Self> {
        name.trim().parse().ok()
    }

    /// The other role in a two-player lobby.
    pub fn partner(self) -> Self {
        match self {
            Self::Knight => Self::Mage,
            Self::Mage => Self::Knight,
        }
    }

    /// Number of roles, which is also the number of start tiles a game needs.
    pub fn count() -> usize {
        Self::iter().count()
    }
}
