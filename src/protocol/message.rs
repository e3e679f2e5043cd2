//! The event message exchanged over the publish/subscribe channel.

use labyrinth_graph::{Item, ItemId, Orientation, Role};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{Operation, ProtocolError};

/// Identity of a lobby session.
pub type LobbyKey = String;

/// Lobby key accepted by every session.
pub const WILDCARD_LOBBY: &str = "*";

/// Payload of a READY message that starts the game.
pub const READY_PAYLOAD: &str = "READY";

/// One broadcast unit: `{operation, lobbyKey, username, data}`.
///
/// `data` is operation-specific and opaque at this level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, derive_new::new)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    /// Discriminant.
    pub operation: Operation,
    /// Lobby the message belongs to, or `*`.
    pub lobby_key: LobbyKey,
    /// Originating player.
    pub username: String,
    /// Operation-specific payload.
    #[serde(default)]
    pub data: String,
}

impl EventMessage {
    /// Parses a raw JSON frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] for malformed JSON or an unknown operation.
    #[instrument(skip(raw), fields(len = raw.len()))]
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Serializes into a JSON frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// True when the message addresses `lobby_key` or every lobby.
    pub fn is_for_lobby(&self, lobby_key: Option<&str>) -> bool {
        self.lobby_key == WILDCARD_LOBBY || lobby_key == Some(self.lobby_key.as_str())
    }

    /// MOVEMENT request carrying the direction to step in.
    pub fn movement(lobby_key: &str, username: &str, orientation: Orientation) -> Self {
        Self::new(
            Operation::Movement,
            lobby_key.to_string(),
            username.to_string(),
            orientation.to_string(),
        )
    }

    /// ROLE_PICK carrying the role name.
    pub fn role_pick(lobby_key: &str, username: &str, role: Role) -> Self {
        Self::new(
            Operation::RolePick,
            lobby_key.to_string(),
            username.to_string(),
            role.to_string(),
        )
    }

    /// LABYRINTH_PICK carrying the labyrinth name.
    pub fn labyrinth_pick(lobby_key: &str, username: &str, name: &str) -> Self {
        Self::new(
            Operation::LabyrinthPick,
            lobby_key.to_string(),
            username.to_string(),
            name.to_string(),
        )
    }

    /// CHAT carrying a line of text.
    pub fn chat(lobby_key: &str, username: &str, text: &str) -> Self {
        Self::new(
            Operation::Chat,
            lobby_key.to_string(),
            username.to_string(),
            text.to_string(),
        )
    }

    /// COLLECT carrying the item id.
    pub fn collect(lobby_key: &str, username: &str, item: ItemId) -> Self {
        Self::new(
            Operation::Collect,
            lobby_key.to_string(),
            username.to_string(),
            item.to_string(),
        )
    }

    /// TRADE carrying the item handed to the partner.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if the item cannot be serialized.
    pub fn trade(lobby_key: &str, username: &str, item: &Item) -> Result<Self, ProtocolError> {
        Ok(Self::new(
            Operation::Trade,
            lobby_key.to_string(),
            username.to_string(),
            serde_json::to_string(item)?,
        ))
    }
}
