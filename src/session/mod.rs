//! Lobby state, players and the phase controller that owns them.

mod controller;
mod phase;
mod player;
mod setup;
mod state;

pub use controller::{PhaseController, ReadyRequest};
pub use phase::Phase;
pub use player::{Player, Seat};
pub use setup::GameSetup;
pub use state::{AccessCheck, ChatLine, LobbyState};
