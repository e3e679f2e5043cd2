//! Event protocol: operation taxonomy and message shape.

mod error;
mod message;
mod operation;

pub use error::ProtocolError;
pub use message::{EventMessage, LobbyKey, READY_PAYLOAD, WILDCARD_LOBBY};
pub use operation::Operation;
