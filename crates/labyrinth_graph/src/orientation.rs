//! Cardinal orientations used as relation keys and movement directions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::instrument;

/// One of the four cardinal directions.
///
/// Serialized as `NORTH`, `EAST`, `SOUTH`, `WEST` on the wire.
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
pub enum Orientation {
    /// Towards row zero.
    North,
    /// Towards the last column.
    East,
    /// Towards the last row.
    South,
    /// Towards column zero.
    West,
}

impl Orientation {
    /// Parses a wire name, returning `None` for anything unrecognized.
    #[instrument]
    pub fn parse(name: &str) -> Option<Self> {
        name.trim().parse().ok()
    }

    /// Returns the direction pointing back.
    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Returns the next direction clockwise.
    pub fn clockwise(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Row and column offset of one step in this direction.
    pub fn grid_offset(self) -> (isize, isize) {
        match self {
            Self::North => (-1, 0),
            Self::East => (0, 1),
            Self::South => (1, 0),
            Self::West => (0, -1),
        }
    }

    /// Dense index in NORTH, EAST, SOUTH, WEST order.
    pub(crate) fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    /// All four directions in NORTH, EAST, SOUTH, WEST order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}
