//! Applies inbound event messages to the lobby state.
//!
//! Messages go through a lobby filter first, then one handler per
//! operation. MOVEMENT payloads are absolute tile keys, so duplicate or
//! replayed messages converge on the same position.

use labyrinth_graph::{Item, ItemId, Role, TileKey};
use tracing::{debug, instrument, trace};

use crate::protocol::{EventMessage, Operation, READY_PAYLOAD};
use crate::session::{AccessCheck, ChatLine, LobbyState};

/// Error text for messages naming a player nobody knows.
pub const UNKNOWN_USER: &str = "No existing User";

/// Follow-up work a message asks of the phase controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Someone joined or left; fetch the roster again.
    RefreshRoster,
    /// A labyrinth was uploaded; fetch the names again.
    RefreshLabyrinthNames,
    /// Everyone is ready; run game setup.
    BeginGameSetup,
    /// The backend confirmed the end of the game.
    FinishGame,
}

/// What happened to one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Addressed to another lobby.
    Dropped,
    /// State updated.
    Applied,
    /// Unresolvable reference or bad payload; recorded in the error state.
    Rejected,
    /// Nothing mutated; the caller must act.
    Effect(Effect),
}

/// Filters `message` by lobby and dispatches it.
#[instrument(skip(state, message), fields(operation = %message.operation, username = %message.username))]
pub(crate) fn reduce(state: &mut LobbyState, message: &EventMessage) -> Reduction {
    if !message.is_for_lobby(state.lobby_key().as_deref()) {
        trace!(lobby_key = %message.lobby_key, "Message for another lobby");
        return Reduction::Dropped;
    }

    match message.operation {
        Operation::Movement => movement(state, message),
        Operation::RolePick => role_pick(state, message),
        Operation::LabyrinthPick => {
            state.record_labyrinth_pick(&message.username, &message.data);
            Reduction::Applied
        }
        Operation::Ready if message.data == READY_PAYLOAD => {
            Reduction::Effect(Effect::BeginGameSetup)
        }
        Operation::Ready => Reduction::Applied,
        Operation::Join => Reduction::Effect(Effect::RefreshRoster),
        Operation::Upload => Reduction::Effect(Effect::RefreshLabyrinthNames),
        Operation::Chat => {
            state.push_chat(ChatLine::new(&message.username, &message.data));
            Reduction::Applied
        }
        Operation::Click => {
            state.set_last_click(&message.username, &message.data);
            Reduction::Applied
        }
        Operation::Collect => collect(state, message),
        Operation::Delete => delete(state, message),
        Operation::Trade => trade(state, message),
        Operation::Access => access(state, message),
        Operation::Conversation => {
            state.set_dialogue_node(&message.data);
            Reduction::Applied
        }
        Operation::CheckEnd if message.data == "true" => Reduction::Effect(Effect::FinishGame),
        Operation::CheckEnd => Reduction::Applied,
    }
}

fn reject(state: &mut LobbyState, reason: impl Into<String>) -> Reduction {
    let reason = reason.into();
    debug!(%reason, "Message rejected");
    state.set_error(reason);
    Reduction::Rejected
}

fn parse_item_id(data: &str) -> Option<ItemId> {
    data.trim().parse().ok()
}

fn movement(state: &mut LobbyState, message: &EventMessage) -> Reduction {
    if state.player(&message.username).is_none() {
        return reject(state, UNKNOWN_USER);
    }
    let Ok(target) = message.data.trim().parse::<TileKey>() else {
        return reject(state, format!("Invalid movement target: {}", message.data));
    };
    if let Some(labyrinth) = state.labyrinth()
        && !labyrinth.contains(target)
    {
        return reject(state, format!("Unknown tile {}", target));
    }

    if let Some(player) = state.player_mut(&message.username) {
        player.move_to(target);
    }
    Reduction::Applied
}

fn role_pick(state: &mut LobbyState, message: &EventMessage) -> Reduction {
    match Role::parse(&message.data) {
        Some(role) => {
            state.record_role_pick(&message.username, role);
            Reduction::Applied
        }
        None => reject(state, format!("Unknown role: {}", message.data)),
    }
}

fn collect(state: &mut LobbyState, message: &EventMessage) -> Reduction {
    let Some(item_id) = parse_item_id(&message.data) else {
        return reject(state, format!("Invalid item: {}", message.data));
    };
    let Some(player) = state.player(&message.username) else {
        return reject(state, UNKNOWN_USER);
    };
    let position = *player.position();
    let is_local = player.is_local();

    let taken = state
        .labyrinth_mut()
        .and_then(|labyrinth| labyrinth.take_item(position, item_id));
    let Some(item) = taken else {
        return reject(state, format!("No item {} on tile {}", item_id, position));
    };

    if is_local && let Some(player) = state.local_player_mut() {
        player.stash(item);
    }
    Reduction::Applied
}

fn delete(state: &mut LobbyState, message: &EventMessage) -> Reduction {
    let Some(item_id) = parse_item_id(&message.data) else {
        return reject(state, format!("Invalid item: {}", message.data));
    };
    if &message.username != state.username() {
        return Reduction::Applied;
    }
    match state.local_player_mut() {
        Some(player) => {
            if player.discard(item_id).is_none() {
                debug!(item_id, "Deleted item was not in the inventory");
            }
            Reduction::Applied
        }
        None => reject(state, UNKNOWN_USER),
    }
}

fn trade(state: &mut LobbyState, message: &EventMessage) -> Reduction {
    let item: Item = match serde_json::from_str(&message.data) {
        Ok(item) => item,
        Err(e) => return reject(state, format!("Invalid traded item: {}", e)),
    };
    let from_local = &message.username == state.username();
    if !from_local && state.player(&message.username).is_none() {
        return reject(state, UNKNOWN_USER);
    }
    let Some(player) = state.local_player_mut() else {
        return reject(state, UNKNOWN_USER);
    };

    if from_local {
        player.discard(*item.id());
    } else {
        player.stash(item);
    }
    Reduction::Applied
}

fn access(state: &mut LobbyState, message: &EventMessage) -> Reduction {
    let check = match message.data.trim() {
        "GRANTED" => AccessCheck::Granted,
        "DENIED" => AccessCheck::Denied,
        other => return reject(state, format!("Invalid access result: {}", other)),
    };
    state.set_access(check);
    Reduction::Applied
}
