//! The lobby/game phase state machine.

use labyrinth_graph::{ItemId, Orientation, Role};
use tracing::{debug, info, instrument, warn};

use super::{GameSetup, LobbyState, Phase};
use crate::backend::{LobbyBackend, RpcError};
use crate::protocol::{EventMessage, LobbyKey};
use crate::reducer::{self, Effect, Reduction};
use crate::transport::TransportError;

/// Arguments of a ready-check submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyRequest {
    /// Lobby being readied.
    pub lobby_key: LobbyKey,
    /// Local player.
    pub username: String,
    /// Labyrinth the local player picked.
    pub labyrinth_name: String,
}

/// Sole owner of [`LobbyState`].
///
/// Outbound requests are prepared here (`*_request`, [`submit_ready`]) and
/// their outcomes fed back through the `on_*` methods. Requests that are not
/// allowed in the current phase come back as `None`: a no-op, not an error.
///
/// [`submit_ready`]: PhaseController::submit_ready
#[derive(Debug, Clone)]
pub struct PhaseController {
    state: LobbyState,
}

impl PhaseController {
    /// Creates a controller for `username` in [`Phase::Created`].
    #[instrument]
    pub fn new(username: &str) -> Self {
        info!("Creating PhaseController");
        Self {
            state: LobbyState::new(username),
        }
    }

    /// Current state.
    pub fn state(&self) -> &LobbyState {
        &self.state
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        *self.state.phase()
    }

    fn transition(&mut self, to: Phase) {
        let from = *self.state.phase();
        info!(%from, %to, lobby_key = ?self.state.lobby_key(), "Phase transition");
        self.state.set_phase(to);
    }

    fn lobby_key(&self) -> Option<&str> {
        self.state.lobby_key().as_deref()
    }

    /// True while `origin` is still the current lobby.
    pub fn is_current(&self, origin: Option<&str>) -> bool {
        self.lobby_key() == origin
    }

    // ─────────────────────────────────────────────────────────────
    //  Transport
    // ─────────────────────────────────────────────────────────────

    /// The subscription is live.
    #[instrument(skip(self))]
    pub fn on_connected(&mut self) {
        debug!("Event stream connected");
        self.state.set_connected(true);
    }

    /// The subscription failed or ended. No retry happens here.
    #[instrument(skip(self))]
    pub fn on_transport_error(&mut self, message: &str) {
        warn!(%message, "Event stream lost");
        self.state.set_connected(false);
        self.state.set_error(format!("Connection lost: {}", message));
    }

    /// Parses and applies a raw frame; malformed frames land in the error
    /// state.
    pub fn apply_frame(&mut self, frame: &str) -> Reduction {
        match EventMessage::parse(frame) {
            Ok(message) => self.apply_event(&message),
            Err(e) => {
                warn!(error = %e, "Malformed event frame");
                self.state.set_error(e.message);
                Reduction::Rejected
            }
        }
    }

    /// Applies one inbound message.
    ///
    /// End-game confirmations are handled here. Other effects are returned
    /// for the caller to run. A READY outside the ready check is ignored.
    pub fn apply_event(&mut self, message: &EventMessage) -> Reduction {
        match reducer::reduce(&mut self.state, message) {
            Reduction::Effect(Effect::FinishGame) => {
                self.finish_game();
                Reduction::Applied
            }
            Reduction::Effect(Effect::BeginGameSetup) if self.phase() != Phase::ReadyCheck => {
                debug!(phase = %self.phase(), "READY outside the ready check");
                Reduction::Applied
            }
            other => other,
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Lobby membership
    // ─────────────────────────────────────────────────────────────

    /// Join RPC succeeded: Created → RoleSelection.
    #[instrument(skip(self))]
    pub fn on_lobby_joined(&mut self, lobby_key: &str) -> bool {
        if !matches!(self.phase(), Phase::Created | Phase::Finished) {
            debug!(phase = %self.phase(), "Already in a lobby");
            return false;
        }
        self.state.clear_lobby();
        self.state.set_lobby_key(Some(lobby_key.to_string()));
        self.state.clear_error();
        self.transition(Phase::RoleSelection);
        true
    }

    /// Leaves the lobby from any phase: → Finished with the lobby cleared.
    ///
    /// Returns the key that was left.
    #[instrument(skip(self))]
    pub fn leave(&mut self) -> Option<LobbyKey> {
        let left = self.state.lobby_key().clone()?;
        self.state.clear_lobby();
        self.transition(Phase::Finished);
        Some(left)
    }

    /// Fresh roster. During a game, a member missing from it means the
    /// partner left and the game ends.
    #[instrument(skip(self))]
    pub fn on_roster(&mut self, roster: Vec<String>) {
        let partner_left = self.phase() == Phase::InProgress
            && self
                .state
                .player_map()
                .keys()
                .any(|username| !roster.contains(username));
        self.state.set_roster(roster);
        if partner_left {
            info!("A player left the game");
            self.state.set_error("Your partner left the game");
            self.state.clear_lobby();
            self.transition(Phase::Finished);
        }
    }

    /// Fresh list of selectable labyrinths.
    pub fn on_labyrinth_names(&mut self, names: Vec<String>) {
        self.state.set_labyrinth_names(names);
    }

    // ─────────────────────────────────────────────────────────────
    //  Role and labyrinth selection
    // ─────────────────────────────────────────────────────────────

    /// ROLE_PICK to send with the select-role RPC.
    pub fn role_request(&self, role: Role) -> Option<EventMessage> {
        if !matches!(
            self.phase(),
            Phase::RoleSelection | Phase::LabyrinthSelection
        ) {
            return None;
        }
        let lobby_key = self.lobby_key()?;
        Some(EventMessage::role_pick(lobby_key, self.state.username(), role))
    }

    /// The backend accepted the role: RoleSelection → LabyrinthSelection.
    #[instrument(skip(self))]
    pub fn on_role_confirmed(&mut self, role: Role) {
        let username = self.state.username().clone();
        self.state.set_selected_role(Some(role));
        self.state.record_role_pick(&username, role);
        if self.phase() == Phase::RoleSelection {
            self.transition(Phase::LabyrinthSelection);
        }
    }

    /// LABYRINTH_PICK to send with the labyrinth-pick RPC.
    pub fn labyrinth_request(&self, name: &str) -> Option<EventMessage> {
        if self.phase() != Phase::LabyrinthSelection || name.trim().is_empty() {
            return None;
        }
        let lobby_key = self.lobby_key()?;
        Some(EventMessage::labyrinth_pick(
            lobby_key,
            self.state.username(),
            name.trim(),
        ))
    }

    /// The backend recorded the labyrinth pick.
    #[instrument(skip(self))]
    pub fn on_labyrinth_picked(&mut self, name: &str) {
        self.state.set_selected_labyrinth(Some(name.to_string()));
    }

    // ─────────────────────────────────────────────────────────────
    //  Ready check and game setup
    // ─────────────────────────────────────────────────────────────

    /// Submits the ready check: LabyrinthSelection → ReadyCheck.
    ///
    /// Needs both a role and a labyrinth; otherwise nothing happens.
    #[instrument(skip(self))]
    pub fn submit_ready(&mut self) -> Option<ReadyRequest> {
        if self.phase() != Phase::LabyrinthSelection {
            debug!(phase = %self.phase(), "Ready check not available");
            return None;
        }
        if self.state.selected_role().is_none() {
            debug!("No role selected");
            return None;
        }
        let labyrinth_name = self
            .state
            .selected_labyrinth()
            .clone()
            .filter(|name| !name.is_empty())?;
        let lobby_key = self.lobby_key()?.to_string();

        self.transition(Phase::ReadyCheck);
        Some(ReadyRequest {
            lobby_key,
            username: self.state.username().clone(),
            labyrinth_name,
        })
    }

    /// The ready RPC failed: back to LabyrinthSelection.
    #[instrument(skip(self, error))]
    pub fn on_ready_rejected(&mut self, error: &RpcError) {
        self.on_rpc_failure("Ready check", error);
        if self.phase() == Phase::ReadyCheck {
            self.transition(Phase::LabyrinthSelection);
        }
    }

    /// Installs a fetched setup: ReadyCheck → InProgress.
    ///
    /// Players are created and placed all at once. On any mismatch the
    /// phase stays at ReadyCheck with nothing applied.
    #[instrument(skip(self, setup), fields(lobby_key = %setup.lobby_key()))]
    pub fn apply_game_setup(&mut self, setup: GameSetup) -> bool {
        if self.phase() != Phase::ReadyCheck {
            debug!(phase = %self.phase(), "Game setup outside the ready check");
            return false;
        }
        if !self.is_current(Some(setup.lobby_key().as_str())) {
            debug!("Game setup for another lobby");
            return false;
        }
        let players = match setup.assign_players(self.state.username()) {
            Ok(players) => players,
            Err(reason) => {
                warn!(%reason, "Game setup rejected");
                self.state.set_error(reason);
                return false;
            }
        };

        self.state.install_game(players, setup.into_labyrinth());
        self.state.clear_error();
        self.transition(Phase::InProgress);
        true
    }

    /// Fetches the setup from `backend` and applies it.
    ///
    /// A failed fetch leaves the phase at ReadyCheck with the error set.
    pub async fn start_game(&mut self, backend: &dyn LobbyBackend) -> bool {
        if self.phase() != Phase::ReadyCheck {
            return false;
        }
        let Some(lobby_key) = self.lobby_key().map(str::to_string) else {
            return false;
        };
        match GameSetup::fetch(backend, &lobby_key).await {
            Ok(setup) => self.apply_game_setup(setup),
            Err(e) => {
                self.on_rpc_failure("Game setup", &e);
                false
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  In game
    // ─────────────────────────────────────────────────────────────

    /// MOVEMENT to publish for a step of the local player.
    ///
    /// Steps into walls or rooms closed to the player's role are refused.
    pub fn movement_request(&self, orientation: Orientation) -> Option<EventMessage> {
        if self.phase() != Phase::InProgress {
            return None;
        }
        let player = self.state.local_player()?;
        let labyrinth = self.state.labyrinth().as_ref()?;
        let target = labyrinth.neighbor_of(*player.position(), orientation)?;
        if target.is_restricted_for(*player.role()) {
            debug!(tile = target.key(), "Room closed to this role");
            return None;
        }
        Some(EventMessage::movement(
            self.lobby_key()?,
            self.state.username(),
            orientation,
        ))
    }

    /// CHAT to publish.
    pub fn chat_request(&self, text: &str) -> Option<EventMessage> {
        if text.trim().is_empty() {
            return None;
        }
        Some(EventMessage::chat(
            self.lobby_key()?,
            self.state.username(),
            text.trim(),
        ))
    }

    /// COLLECT to publish for an item in the local player's room.
    pub fn collect_request(&self, item: ItemId) -> Option<EventMessage> {
        if self.phase() != Phase::InProgress {
            return None;
        }
        let lobby_key = self.lobby_key()?;
        let player = self.state.local_player()?;
        let labyrinth = self.state.labyrinth().as_ref()?;
        let in_room = labyrinth
            .items_at(*player.position())
            .iter()
            .any(|candidate| *candidate.id() == item);
        if !in_room {
            debug!(item, "Item not in this room");
            return None;
        }
        Some(EventMessage::collect(lobby_key, self.state.username(), item))
    }

    /// End-game confirmation: InProgress → Finished, score + 1.
    #[instrument(skip(self))]
    pub fn finish_game(&mut self) -> bool {
        if self.phase() != Phase::InProgress {
            debug!(phase = %self.phase(), "No game to finish");
            return false;
        }
        self.state.increment_score();
        self.state.clear_lobby();
        self.transition(Phase::Finished);
        true
    }

    // ─────────────────────────────────────────────────────────────
    //  Failures and shutdown
    // ─────────────────────────────────────────────────────────────

    /// Records a failed RPC. The phase does not change.
    #[instrument(skip(self, error))]
    pub fn on_rpc_failure(&mut self, context: &str, error: &RpcError) {
        warn!(%context, error = %error, "Backend call failed");
        self.state.set_error(format!("{}: {}", context, error.cause()));
    }

    /// An outbound event could not be published.
    #[instrument(skip(self, error))]
    pub fn on_publish_failed(&mut self, error: &TransportError) {
        warn!(error = %error, "Publish failed");
        self.state.set_error(format!("Could not send: {}", error.message));
    }

    /// Marks the session inactive.
    pub fn shutdown(&mut self) {
        info!("Session shut down");
        self.state.set_connected(false);
        self.state.set_active(false);
    }
}
