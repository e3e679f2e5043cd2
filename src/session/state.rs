//! The lobby and game state owned by the phase controller.

use std::collections::BTreeMap;

use derive_getters::Getters;
use labyrinth_graph::{Labyrinth, Role};

use super::{Phase, Player};
use crate::protocol::LobbyKey;

/// One chat line.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ChatLine {
    username: String,
    text: String,
}

impl ChatLine {
    pub(crate) fn new(username: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            text: text.into(),
        }
    }
}

/// Outcome of the last access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessCheck {
    /// Access granted.
    Granted,
    /// Access denied.
    Denied,
}

/// Snapshot of everything a renderer needs.
///
/// Mutated only through [`PhaseController`](super::PhaseController) and the
/// reducer it drives; everything else reads through the getters.
#[derive(Debug, Clone, Getters)]
pub struct LobbyState {
    /// Local player's name.
    username: String,
    /// Current lobby, if any.
    lobby_key: Option<LobbyKey>,
    /// Lifecycle phase.
    phase: Phase,
    /// Players keyed by username; empty until game setup.
    player_map: BTreeMap<String, Player>,
    /// Loaded labyrinth; present while a game runs.
    labyrinth: Option<Labyrinth>,
    /// Completed games.
    score: u32,
    /// Last error surfaced to the user.
    error_state: Option<String>,
    /// Role confirmed by the backend for the local player.
    selected_role: Option<Role>,
    /// Labyrinth picked by the local player.
    selected_labyrinth: Option<String>,
    /// Advisory role picks broadcast by lobby members.
    role_picks: BTreeMap<String, Role>,
    /// Advisory labyrinth picks broadcast by lobby members.
    labyrinth_picks: BTreeMap<String, String>,
    /// Lobby members in join order.
    roster: Vec<String>,
    /// Labyrinths available on the backend.
    labyrinth_names: Vec<String>,
    /// Chat log of the current lobby.
    chat: Vec<ChatLine>,
    /// Last interaction `(username, target)`.
    last_click: Option<(String, String)>,
    /// Last access check result.
    access: Option<AccessCheck>,
    /// Active dialogue node.
    dialogue_node: Option<String>,
    /// Event stream is up.
    connected: bool,
    /// False once the session has been shut down.
    active: bool,
}

impl LobbyState {
    /// Fresh state for `username`.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            lobby_key: None,
            phase: Phase::Created,
            player_map: BTreeMap::new(),
            labyrinth: None,
            score: 0,
            error_state: None,
            selected_role: None,
            selected_labyrinth: None,
            role_picks: BTreeMap::new(),
            labyrinth_picks: BTreeMap::new(),
            roster: Vec::new(),
            labyrinth_names: Vec::new(),
            chat: Vec::new(),
            last_click: None,
            access: None,
            dialogue_node: None,
            connected: false,
            active: true,
        }
    }

    /// Player by username.
    pub fn player(&self, username: &str) -> Option<&Player> {
        self.player_map.get(username)
    }

    /// The player at this client, once the game is set up.
    pub fn local_player(&self) -> Option<&Player> {
        self.player_map.get(&self.username)
    }

    pub(crate) fn player_mut(&mut self, username: &str) -> Option<&mut Player> {
        self.player_map.get_mut(username)
    }

    pub(crate) fn local_player_mut(&mut self) -> Option<&mut Player> {
        self.player_map.get_mut(&self.username)
    }

    pub(crate) fn labyrinth_mut(&mut self) -> Option<&mut Labyrinth> {
        self.labyrinth.as_mut()
    }

    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        self.error_state = Some(message.into());
    }

    pub(crate) fn clear_error(&mut self) {
        self.error_state = None;
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn set_lobby_key(&mut self, lobby_key: Option<LobbyKey>) {
        self.lobby_key = lobby_key;
    }

    pub(crate) fn set_selected_role(&mut self, role: Option<Role>) {
        self.selected_role = role;
    }

    pub(crate) fn set_selected_labyrinth(&mut self, name: Option<String>) {
        self.selected_labyrinth = name;
    }

    pub(crate) fn record_role_pick(&mut self, username: &str, role: Role) {
        self.role_picks.insert(username.to_string(), role);
    }

    pub(crate) fn record_labyrinth_pick(&mut self, username: &str, name: &str) {
        self.labyrinth_picks
            .insert(username.to_string(), name.to_string());
    }

    pub(crate) fn set_roster(&mut self, roster: Vec<String>) {
        self.roster = roster;
    }

    pub(crate) fn set_labyrinth_names(&mut self, names: Vec<String>) {
        self.labyrinth_names = names;
    }

    pub(crate) fn push_chat(&mut self, line: ChatLine) {
        self.chat.push(line);
    }

    pub(crate) fn set_last_click(&mut self, username: &str, target: &str) {
        self.last_click = Some((username.to_string(), target.to_string()));
    }

    pub(crate) fn set_access(&mut self, access: AccessCheck) {
        self.access = Some(access);
    }

    pub(crate) fn set_dialogue_node(&mut self, node: &str) {
        self.dialogue_node = Some(node.to_string());
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Installs the players and labyrinth of a freshly set up game.
    pub(crate) fn install_game(&mut self, players: BTreeMap<String, Player>, labyrinth: Labyrinth) {
        self.player_map = players;
        self.labyrinth = Some(labyrinth);
    }

    pub(crate) fn increment_score(&mut self) {
        self.score += 1;
    }

    /// Drops everything tied to the current lobby. Score and the error
    /// survive so the renderer can show how the session ended.
    pub(crate) fn clear_lobby(&mut self) {
        self.lobby_key = None;
        self.player_map.clear();
        self.labyrinth = None;
        self.selected_role = None;
        self.selected_labyrinth = None;
        self.role_picks.clear();
        self.labyrinth_picks.clear();
        self.roster.clear();
        self.chat.clear();
        self.last_click = None;
        self.access = None;
        self.dialogue_node = None;
    }
}
