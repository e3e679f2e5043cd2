//! Data gathered for the ReadyCheck → InProgress transition.

use std::collections::BTreeMap;

use derive_getters::Getters;
use labyrinth_graph::{Labyrinth, Role};
use tracing::{debug, instrument};

use super::Player;
use crate::backend::{LobbyBackend, RpcError};
use crate::protocol::LobbyKey;

/// Roster, confirmed roles and the authoritative labyrinth of one lobby.
#[derive(Debug, Clone, Getters)]
pub struct GameSetup {
    lobby_key: LobbyKey,
    roster: Vec<String>,
    roles: BTreeMap<String, Role>,
    labyrinth: Labyrinth,
}

impl GameSetup {
    /// Assembles a setup from already fetched parts.
    pub fn new(
        lobby_key: impl Into<LobbyKey>,
        roster: Vec<String>,
        roles: BTreeMap<String, Role>,
        labyrinth: Labyrinth,
    ) -> Self {
        Self {
            lobby_key: lobby_key.into(),
            roster,
            roles,
            labyrinth,
        }
    }

    /// Fetches roster, roles and labyrinth, in that order.
    ///
    /// The calls are sequential; the first failure aborts the whole fetch.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] if a call fails, a member has no confirmed role,
    /// or the labyrinth does not validate.
    #[instrument(skip(backend))]
    pub async fn fetch(backend: &dyn LobbyBackend, lobby_key: &str) -> Result<Self, RpcError> {
        let roster = backend.lobby_users(lobby_key).await?;
        debug!(members = roster.len(), "Roster fetched");

        let names = backend.lobby_roles(lobby_key).await?;
        let mut roles = BTreeMap::new();
        for username in &roster {
            let name = names
                .get(username)
                .ok_or_else(|| RpcError::new(format!("{} has not confirmed a role", username)))?;
            let role = Role::parse(name)
                .ok_or_else(|| RpcError::new(format!("Unknown role {} for {}", name, username)))?;
            roles.insert(username.clone(), role);
        }

        let document = backend.lobby_labyrinth(lobby_key).await?;
        let labyrinth = Labyrinth::from_document(&document)
            .map_err(|e| RpcError::new(format!("Labyrinth rejected: {}", e)))?;

        Ok(Self::new(lobby_key, roster, roles, labyrinth))
    }

    /// Materializes one player per roster member, placed on the start tile
    /// with the same index.
    ///
    /// # Errors
    ///
    /// Returns a message when the roster and start tiles do not line up or
    /// the roster lacks `local_username`.
    pub fn assign_players(&self, local_username: &str) -> Result<BTreeMap<String, Player>, String> {
        let starts = self.labyrinth.player_start_tile_keys();
        if self.roster.len() > starts.len() {
            return Err(format!(
                "{} players but only {} start tiles",
                self.roster.len(),
                starts.len()
            ));
        }
        if !self.roster.iter().any(|username| username == local_username) {
            return Err(format!("{} is not in the lobby roster", local_username));
        }

        let mut players = BTreeMap::new();
        for (username, start) in self.roster.iter().zip(starts) {
            let role = *self
                .roles
                .get(username)
                .ok_or_else(|| format!("{} has no role", username))?;
            let player = if username == local_username {
                Player::local(username.clone(), role, *start)
            } else {
                Player::remote(username.clone(), role, *start)
            };
            players.insert(username.clone(), player);
        }
        Ok(players)
    }

    pub(crate) fn into_labyrinth(self) -> Labyrinth {
        self.labyrinth
    }
}
