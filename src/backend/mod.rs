//! The backend collaborator: lobby and labyrinth RPCs.

mod error;
mod memory;
mod rest;

use std::collections::BTreeMap;

use labyrinth_graph::LabyrinthDocument;

use crate::protocol::{EventMessage, LobbyKey};

pub use error::{Endpoint, RpcError};
pub use memory::MemoryBackend;
pub use rest::RestBackend;

/// Request/response contracts consumed from the backend.
///
/// Every call is a suspension point; failures carry a cause derived from
/// the status code.
#[async_trait::async_trait]
pub trait LobbyBackend: Send + Sync {
    /// Creates a lobby owned by `username` and returns its key.
    async fn create_lobby(&self, username: &str) -> Result<LobbyKey, RpcError>;

    /// Joins `lobby_key`.
    async fn join_lobby(&self, lobby_key: &str, username: &str) -> Result<(), RpcError>;

    /// Leaves `lobby_key`.
    async fn leave_lobby(&self, lobby_key: &str, username: &str) -> Result<(), RpcError>;

    /// Lobby members in join order.
    async fn lobby_users(&self, lobby_key: &str) -> Result<Vec<String>, RpcError>;

    /// Members that submitted the ready check.
    async fn ready_users(&self, lobby_key: &str) -> Result<Vec<String>, RpcError>;

    /// Confirmed role name per member.
    async fn lobby_roles(&self, lobby_key: &str) -> Result<BTreeMap<String, String>, RpcError>;

    /// Claims the role named in `message.data`.
    async fn select_role(&self, message: &EventMessage) -> Result<(), RpcError>;

    /// Records the labyrinth named in `message.data`.
    async fn pick_labyrinth(&self, message: &EventMessage) -> Result<(), RpcError>;

    /// Submits the ready check.
    async fn submit_ready(
        &self,
        lobby_key: &str,
        username: &str,
        labyrinth_name: &str,
    ) -> Result<(), RpcError>;

    /// Names of the stored labyrinths.
    async fn labyrinth_names(&self) -> Result<Vec<String>, RpcError>;

    /// A stored labyrinth by name.
    async fn fetch_labyrinth(&self, name: &str) -> Result<LabyrinthDocument, RpcError>;

    /// The labyrinth the lobby agreed on.
    async fn lobby_labyrinth(&self, lobby_key: &str) -> Result<LabyrinthDocument, RpcError>;

    /// Stores an authored labyrinth.
    async fn save_labyrinth(&self, document: &LabyrinthDocument) -> Result<(), RpcError>;

    /// Uploads a labyrinth file for the backend to parse.
    async fn upload_labyrinth(&self, file_name: &str, contents: Vec<u8>) -> Result<(), RpcError>;
}
