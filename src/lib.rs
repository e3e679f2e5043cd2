//! Labyrinth Sync - lobby and event synchronization for a two-player
//! cooperative labyrinth
//!
//! Two clients share one labyrinth. Each action (a step, a role pick, a
//! ready check, an item changing hands) is broadcast as an event; every
//! client folds the events it receives into its own copy of the lobby state.
//!
//! # Architecture
//!
//! - **Protocol**: the event message and its operation taxonomy
//! - **Reducer**: lobby filter plus one handler per operation
//! - **Session**: lobby state, players and the phase controller
//! - **Backend**: lobby/labyrinth RPCs (REST or in-memory)
//! - **Transport**: the event subscription (server-sent events or in-process)
//! - **Actor**: single-writer loop tying the above together
//!
//! Graph and editor types come from [`labyrinth_graph`] and are re-exported.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use labyrinth_sync::{LocalHub, MemoryBackend, SessionActor, SessionCommand, DEFAULT_TOPIC};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let hub = LocalHub::new();
//! let backend = Arc::new(MemoryBackend::with_hub(hub));
//! let (session, _task) = SessionActor::spawn("alice", DEFAULT_TOPIC, backend.clone(), backend);
//!
//! session.send(SessionCommand::CreateLobby).await?;
//! let state = session.wait_for(|s| s.lobby_key().is_some()).await?;
//! println!("Lobby {:?}", state.lobby_key());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod actor;
mod authoring;
mod backend;
mod config;
mod protocol;
mod reducer;
mod session;
mod transport;

// Crate-level exports - Configuration
pub use config::{BACKEND_URL_VAR, ClientConfig, ConfigError, EVENTS_URL_VAR};

// Crate-level exports - Authoring plans
pub use authoring::{AuthoringPlan, ItemPlan, RestrictionPlan};

// Crate-level exports - Protocol
pub use protocol::{
    EventMessage, LobbyKey, Operation, ProtocolError, READY_PAYLOAD, WILDCARD_LOBBY,
};

// Crate-level exports - Reducer outcomes
pub use reducer::{Effect, Reduction, UNKNOWN_USER};

// Crate-level exports - Session state
pub use session::{
    AccessCheck, ChatLine, GameSetup, LobbyState, Phase, PhaseController, Player, ReadyRequest,
    Seat,
};

// Crate-level exports - Backend
pub use backend::{Endpoint, LobbyBackend, MemoryBackend, RestBackend, RpcError};

// Crate-level exports - Transport
pub use transport::{
    DEFAULT_TOPIC, EventTransport, LocalHub, SseDecoder, SseTransport, TransportError,
    TransportEvent,
};

// Crate-level exports - Session actor
pub use actor::{Completion, SessionActor, SessionClosed, SessionCommand, SessionHandle, SessionInput};

// Crate-level exports - Graph model and construction engine
pub use labyrinth_graph::{
    AuthoringFailure, AuthoringStep, Cell, EditorLimits, GridPosition, ITEM_SLOTS, Item, ItemId,
    ItemOption, Labyrinth, LabyrinthDocument, LabyrinthEditor, Orientation, PlacedItem,
    RelationMap, Role, Tile, TileDocument, TileKey, ValidationError,
};
