//! In-memory backend for tests and offline play.

use std::collections::{BTreeMap, BTreeSet};

use labyrinth_graph::{Labyrinth, LabyrinthDocument, Orientation, Role, TileKey};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, instrument, warn};

use super::{Endpoint, LobbyBackend, RpcError};
use crate::protocol::{EventMessage, LobbyKey, Operation, READY_PAYLOAD};
use crate::transport::{EventTransport, LocalHub, TransportError, TransportEvent};

const LOBBY_CAPACITY: usize = 2;

#[derive(Debug, Default)]
struct MemoryLobby {
    users: Vec<String>,
    ready: Vec<String>,
    roles: BTreeMap<String, String>,
    labyrinth: Option<String>,
    positions: BTreeMap<String, TileKey>,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_lobby: u32,
    lobbies: BTreeMap<LobbyKey, MemoryLobby>,
    labyrinths: BTreeMap<String, LabyrinthDocument>,
    failing: BTreeSet<Endpoint>,
    calls: Vec<Endpoint>,
}

/// Keeps lobbies and labyrinths in process memory.
///
/// When given a [`LocalHub`] it broadcasts the same echoes the real backend
/// does: JOIN after a join, ROLE_PICK and LABYRINTH_PICK after the picks,
/// and READY once every member has submitted the ready check.
///
/// It is also an [`EventTransport`] over that hub. Published MOVEMENT
/// requests are checked against the lobby's labyrinth and relayed as the
/// destination tile key; everything else is relayed as sent.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    hub: Option<LocalHub>,
}

impl MemoryBackend {
    /// Creates a backend with no broadcast echo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that echoes on `hub`.
    pub fn with_hub(hub: LocalHub) -> Self {
        Self {
            state: Mutex::default(),
            hub: Some(hub),
        }
    }

    /// Stores a labyrinth under its own name.
    pub async fn insert_labyrinth(&self, document: LabyrinthDocument) {
        let mut state = self.state.lock().await;
        state
            .labyrinths
            .insert(document.labyrinth_name.clone(), document);
    }

    /// Makes every call to `endpoint` answer 500.
    pub async fn fail(&self, endpoint: Endpoint) {
        self.state.lock().await.failing.insert(endpoint);
    }

    /// Lets `endpoint` succeed again.
    pub async fn recover(&self, endpoint: Endpoint) {
        self.state.lock().await.failing.remove(&endpoint);
    }

    /// Endpoints called so far, in order.
    pub async fn calls(&self) -> Vec<Endpoint> {
        self.state.lock().await.calls.clone()
    }

    fn echo(&self, message: EventMessage) {
        if let Some(hub) = &self.hub
            && let Err(e) = hub.broadcast(&message)
        {
            warn!(error = %e, "Echo broadcast failed");
        }
    }

    /// Records the call and applies injected failures.
    async fn enter(&self, endpoint: Endpoint) -> Result<tokio::sync::MutexGuard<'_, MemoryState>, RpcError> {
        let mut state = self.state.lock().await;
        state.calls.push(endpoint);
        if state.failing.contains(&endpoint) {
            debug!(%endpoint, "Injected failure");
            return Err(RpcError::status(endpoint, 500));
        }
        Ok(state)
    }

    fn hub(&self) -> Result<&LocalHub, TransportError> {
        self.hub
            .as_ref()
            .ok_or_else(|| TransportError::new("No event hub attached"))
    }

    /// Steps the sender one tile and returns the MOVEMENT to broadcast.
    #[instrument(skip(self, message), fields(username = %message.username, direction = %message.data))]
    async fn resolve_movement(&self, message: &EventMessage) -> Result<EventMessage, TransportError> {
        let mut state = self.state.lock().await;
        let MemoryState {
            lobbies,
            labyrinths,
            ..
        } = &mut *state;
        let lobby = lobbies
            .get_mut(&message.lobby_key)
            .ok_or_else(|| TransportError::new(format!("Lobby {} not found", message.lobby_key)))?;
        let document = lobby
            .labyrinth
            .as_ref()
            .and_then(|name| labyrinths.get(name))
            .ok_or_else(|| TransportError::new("No game is running in this lobby"))?;
        let labyrinth = Labyrinth::from_document(document)
            .map_err(|e| TransportError::new(format!("Labyrinth rejected: {}", e)))?;

        let orientation = Orientation::parse(&message.data)
            .ok_or_else(|| TransportError::new(format!("Unknown direction: {}", message.data)))?;
        let role = lobby
            .roles
            .get(&message.username)
            .and_then(|name| Role::parse(name))
            .ok_or_else(|| TransportError::new(format!("{} has no role", message.username)))?;
        let from = match lobby.positions.get(&message.username) {
            Some(position) => *position,
            None => lobby
                .users
                .iter()
                .position(|u| u == &message.username)
                .and_then(|index| labyrinth.player_start_tile_keys().get(index).copied())
                .ok_or_else(|| {
                    TransportError::new(format!("{} is not playing", message.username))
                })?,
        };

        let target = labyrinth
            .neighbor_of(from, orientation)
            .ok_or_else(|| TransportError::new(format!("No passage {} of tile {}", orientation, from)))?;
        if target.is_restricted_for(role) {
            return Err(TransportError::new(format!(
                "Tile {} is closed to {}",
                target.key(),
                role
            )));
        }
        let to = target.key();
        lobby.positions.insert(message.username.clone(), to);
        debug!(from, to, "Movement resolved");

        Ok(EventMessage::new(
            Operation::Movement,
            message.lobby_key.clone(),
            message.username.clone(),
            to.to_string(),
        ))
    }
}

#[async_trait::async_trait]
impl EventTransport for MemoryBackend {
    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<TransportEvent>, TransportError> {
        self.hub()?.subscribe(topic).await
    }

    async fn publish(&self, message: &EventMessage) -> Result<(), TransportError> {
        let hub = self.hub()?;
        match message.operation {
            Operation::Movement => hub.broadcast(&self.resolve_movement(message).await?),
            _ => hub.broadcast(message),
        }
    }
}

fn lobby<'a>(
    state: &'a mut MemoryState,
    endpoint: Endpoint,
    lobby_key: &str,
) -> Result<&'a mut MemoryLobby, RpcError> {
    state
        .lobbies
        .get_mut(lobby_key)
        .ok_or_else(|| RpcError::status(endpoint, 404))
}

#[async_trait::async_trait]
impl LobbyBackend for MemoryBackend {
    #[instrument(skip(self))]
    async fn create_lobby(&self, username: &str) -> Result<LobbyKey, RpcError> {
        let mut state = self.enter(Endpoint::CreateLobby).await?;
        state.next_lobby += 1;
        let key = format!("L{:04}", state.next_lobby);
        let lobby = MemoryLobby {
            users: vec![username.to_string()],
            ..MemoryLobby::default()
        };
        state.lobbies.insert(key.clone(), lobby);
        drop(state);
        self.echo(EventMessage::new(
            Operation::Join,
            key.clone(),
            username.to_string(),
            String::new(),
        ));
        Ok(key)
    }

    #[instrument(skip(self))]
    async fn join_lobby(&self, lobby_key: &str, username: &str) -> Result<(), RpcError> {
        let mut state = self.enter(Endpoint::JoinLobby).await?;
        let lobby = lobby(&mut state, Endpoint::JoinLobby, lobby_key)?;
        if !lobby.users.iter().any(|u| u == username) {
            if lobby.users.len() >= LOBBY_CAPACITY {
                return Err(RpcError::status(Endpoint::JoinLobby, 409));
            }
            lobby.users.push(username.to_string());
        }
        drop(state);
        self.echo(EventMessage::new(
            Operation::Join,
            lobby_key.to_string(),
            username.to_string(),
            String::new(),
        ));
        Ok(())
    }

    #[instrument(skip(self))]
    async fn leave_lobby(&self, lobby_key: &str, username: &str) -> Result<(), RpcError> {
        let mut state = self.enter(Endpoint::LeaveLobby).await?;
        let lobby = lobby(&mut state, Endpoint::LeaveLobby, lobby_key)?;
        lobby.users.retain(|u| u != username);
        lobby.ready.retain(|u| u != username);
        lobby.roles.remove(username);
        drop(state);
        self.echo(EventMessage::new(
            Operation::Join,
            lobby_key.to_string(),
            username.to_string(),
            String::new(),
        ));
        Ok(())
    }

    async fn lobby_users(&self, lobby_key: &str) -> Result<Vec<String>, RpcError> {
        let mut state = self.enter(Endpoint::LobbyUsers).await?;
        Ok(lobby(&mut state, Endpoint::LobbyUsers, lobby_key)?.users.clone())
    }

    async fn ready_users(&self, lobby_key: &str) -> Result<Vec<String>, RpcError> {
        let mut state = self.enter(Endpoint::ReadyUsers).await?;
        Ok(lobby(&mut state, Endpoint::ReadyUsers, lobby_key)?.ready.clone())
    }

    async fn lobby_roles(&self, lobby_key: &str) -> Result<BTreeMap<String, String>, RpcError> {
        let mut state = self.enter(Endpoint::LobbyRoles).await?;
        Ok(lobby(&mut state, Endpoint::LobbyRoles, lobby_key)?.roles.clone())
    }

    #[instrument(skip(self, message), fields(username = %message.username, role = %message.data))]
    async fn select_role(&self, message: &EventMessage) -> Result<(), RpcError> {
        let mut state = self.enter(Endpoint::SelectRole).await?;
        let lobby = lobby(&mut state, Endpoint::SelectRole, &message.lobby_key)?;
        if Role::parse(&message.data).is_none() {
            return Err(RpcError::status(Endpoint::SelectRole, 400));
        }
        let taken = lobby
            .roles
            .iter()
            .any(|(user, role)| user != &message.username && role == &message.data);
        if taken {
            return Err(RpcError::status(Endpoint::SelectRole, 409));
        }
        lobby
            .roles
            .insert(message.username.clone(), message.data.clone());
        drop(state);
        self.echo(message.clone());
        Ok(())
    }

    async fn pick_labyrinth(&self, message: &EventMessage) -> Result<(), RpcError> {
        let mut state = self.enter(Endpoint::LabyrinthPick).await?;
        lobby(&mut state, Endpoint::LabyrinthPick, &message.lobby_key)?;
        drop(state);
        self.echo(message.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn submit_ready(
        &self,
        lobby_key: &str,
        username: &str,
        labyrinth_name: &str,
    ) -> Result<(), RpcError> {
        let mut state = self.enter(Endpoint::SubmitReady).await?;
        if !state.labyrinths.contains_key(labyrinth_name) {
            return Err(RpcError::status(Endpoint::SubmitReady, 404));
        }
        let lobby = lobby(&mut state, Endpoint::SubmitReady, lobby_key)?;
        if !lobby.ready.iter().any(|u| u == username) {
            lobby.ready.push(username.to_string());
        }
        // The last submission decides the labyrinth.
        lobby.labyrinth = Some(labyrinth_name.to_string());
        let everyone_ready = lobby.users.len() == LOBBY_CAPACITY
            && lobby.users.iter().all(|u| lobby.ready.contains(u));
        if everyone_ready {
            lobby.positions.clear();
        }
        drop(state);
        if everyone_ready {
            self.echo(EventMessage::new(
                Operation::Ready,
                lobby_key.to_string(),
                username.to_string(),
                READY_PAYLOAD.to_string(),
            ));
        }
        Ok(())
    }

    async fn labyrinth_names(&self) -> Result<Vec<String>, RpcError> {
        let state = self.enter(Endpoint::LabyrinthNames).await?;
        Ok(state.labyrinths.keys().cloned().collect())
    }

    async fn fetch_labyrinth(&self, name: &str) -> Result<LabyrinthDocument, RpcError> {
        let state = self.enter(Endpoint::FetchLabyrinth).await?;
        state
            .labyrinths
            .get(name)
            .cloned()
            .ok_or_else(|| RpcError::status(Endpoint::FetchLabyrinth, 404))
    }

    async fn lobby_labyrinth(&self, lobby_key: &str) -> Result<LabyrinthDocument, RpcError> {
        let mut state = self.enter(Endpoint::LobbyLabyrinth).await?;
        let name = lobby(&mut state, Endpoint::LobbyLabyrinth, lobby_key)?
            .labyrinth
            .clone()
            .ok_or_else(|| RpcError::status(Endpoint::LobbyLabyrinth, 404))?;
        state
            .labyrinths
            .get(&name)
            .cloned()
            .ok_or_else(|| RpcError::status(Endpoint::LobbyLabyrinth, 404))
    }

    #[instrument(skip(self, document), fields(name = %document.labyrinth_name))]
    async fn save_labyrinth(&self, document: &LabyrinthDocument) -> Result<(), RpcError> {
        let mut state = self.enter(Endpoint::SaveLabyrinth).await?;
        if state.labyrinths.contains_key(&document.labyrinth_name) {
            return Err(RpcError::status(Endpoint::SaveLabyrinth, 409));
        }
        if Labyrinth::from_document(document).is_err() {
            return Err(RpcError::status(Endpoint::SaveLabyrinth, 400));
        }
        state
            .labyrinths
            .insert(document.labyrinth_name.clone(), document.clone());
        drop(state);
        self.echo(EventMessage::new(
            Operation::Upload,
            crate::protocol::WILDCARD_LOBBY.to_string(),
            String::new(),
            document.labyrinth_name.clone(),
        ));
        Ok(())
    }

    #[instrument(skip(self, contents))]
    async fn upload_labyrinth(&self, file_name: &str, contents: Vec<u8>) -> Result<(), RpcError> {
        let document: LabyrinthDocument = {
            let _state = self.enter(Endpoint::ReadLabyrinth).await?;
            serde_json::from_slice(&contents).map_err(|e| {
                let mut err = RpcError::status(Endpoint::ReadLabyrinth, 400);
                err.message = format!("{} is not a labyrinth: {}", file_name, e);
                err
            })?
        };
        self.save_labyrinth(&document).await
    }
}
