//! Backend RPC error types.

use derive_more::{Display, Error};
use strum::Display as StrumDisplay;
use tracing::instrument;

/// The backend operations, used to word status-code failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, StrumDisplay)]
#[strum(serialize_all = "kebab-case")]
pub enum Endpoint {
    /// `POST /lobby/create`
    CreateLobby,
    /// `POST /lobby/join/{key}`
    JoinLobby,
    /// `POST /lobby/leave/{key}`
    LeaveLobby,
    /// `GET /lobby/users/{key}`
    LobbyUsers,
    /// `GET /lobby/users/ready/{key}`
    ReadyUsers,
    /// `GET /lobby/users/roles/{key}`
    LobbyRoles,
    /// `POST /lobby/select-role`
    SelectRole,
    /// `POST /lobby/labyrinth-pick`
    LabyrinthPick,
    /// `POST /lobby/ready/{key}`
    SubmitReady,
    /// `GET /labyrinth/names`
    LabyrinthNames,
    /// `GET /labyrinth/{name}`
    FetchLabyrinth,
    /// `GET /lobby/labyrinth/{key}`
    LobbyLabyrinth,
    /// `POST /labyrinth/save`
    SaveLabyrinth,
    /// `POST /labyrinth/read`
    ReadLabyrinth,
}

impl Endpoint {
    /// Human-readable cause for a non-2xx status.
    pub fn describe_status(self, status: u16) -> String {
        match (self, status) {
            (Endpoint::JoinLobby, 409) => "Lobby is full".to_string(),
            (Endpoint::JoinLobby, 404) => "Lobby not found".to_string(),
            (Endpoint::SelectRole, 409) => "Role already taken".to_string(),
            (Endpoint::SaveLabyrinth, 409) => "Labyrinth name already taken".to_string(),
            (Endpoint::SaveLabyrinth, 400) => "Labyrinth is invalid".to_string(),
            (Endpoint::FetchLabyrinth | Endpoint::LobbyLabyrinth, 404) => {
                "Labyrinth not found".to_string()
            }
            (_, 400) => format!("Invalid request to {}", self),
            (_, 404) => format!("Not found: {}", self),
            (_, 409) => format!("Conflict on {}", self),
            (_, 500..=599) => format!("Backend unavailable ({}) on {}", status, self),
            _ => format!("Unexpected status {} from {}", status, self),
        }
    }
}

/// A failed backend call with caller location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("RPC error: {} at {}:{}", message, file, line)]
pub struct RpcError {
    /// Human-readable cause.
    pub message: String,
    /// HTTP status, when the backend answered.
    pub status: Option<u16>,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl RpcError {
    /// Creates a transport-level RPC error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            status: None,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Creates an error for a non-2xx answer from `endpoint`.
    #[track_caller]
    #[instrument]
    pub fn status(endpoint: Endpoint, status: u16) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: endpoint.describe_status(status),
            status: Some(status),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// The message shown to the user.
    pub fn cause(&self) -> &str {
        &self.message
    }
}

impl From<reqwest::Error> for RpcError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        Self::new(format!("Request failed: {}", err))
    }
}
