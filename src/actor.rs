//! Single-writer session loop.
//!
//! Every mutation of the lobby state happens on the actor task. Transport
//! events, user commands and RPC completions all arrive on one channel;
//! RPCs run on spawned tasks and report back tagged with the lobby they
//! were issued for, so results for a lobby that has since been left are
//! dropped.

use std::future::Future;
use std::sync::Arc;

use labyrinth_graph::{ItemId, Orientation, Role};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::backend::{LobbyBackend, RpcError};
use crate::protocol::{EventMessage, LobbyKey};
use crate::reducer::{Effect, Reduction};
use crate::session::{GameSetup, LobbyState, PhaseController};
use crate::transport::{EventTransport, TransportError, TransportEvent};

const INPUT_BUFFER: usize = 128;

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Create a lobby and join it.
    CreateLobby,
    /// Join an existing lobby.
    JoinLobby(LobbyKey),
    /// Claim a role.
    SelectRole(Role),
    /// Pick a labyrinth.
    PickLabyrinth(String),
    /// Submit the ready check.
    SubmitReady,
    /// Step in a direction.
    Move(Orientation),
    /// Say something.
    Chat(String),
    /// Pick up an item in the current room.
    Collect(ItemId),
    /// Fetch the labyrinth names again.
    RefreshLabyrinthNames,
    /// Resubscribe after the stream was lost.
    Reconnect,
    /// Leave the lobby.
    Leave,
}

impl std::str::FromStr for SessionCommand {
    type Err = String;

    /// Parses a play-mode line such as `move NORTH` or `chat hello there`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match word.to_ascii_lowercase().as_str() {
            "create" => Ok(Self::CreateLobby),
            "join" if !rest.is_empty() => Ok(Self::JoinLobby(rest.to_string())),
            "role" => Role::parse(&rest.to_ascii_uppercase())
                .map(Self::SelectRole)
                .ok_or_else(|| format!("Unknown role: {}", rest)),
            "pick" if !rest.is_empty() => Ok(Self::PickLabyrinth(rest.to_string())),
            "ready" => Ok(Self::SubmitReady),
            "move" => Orientation::parse(&rest.to_ascii_uppercase())
                .map(Self::Move)
                .ok_or_else(|| format!("Unknown direction: {}", rest)),
            "chat" if !rest.is_empty() => Ok(Self::Chat(rest.to_string())),
            "collect" => rest
                .parse()
                .map(Self::Collect)
                .map_err(|_| format!("Invalid item id: {}", rest)),
            "names" => Ok(Self::RefreshLabyrinthNames),
            "reconnect" => Ok(Self::Reconnect),
            "leave" => Ok(Self::Leave),
            _ => Err(format!("Unrecognized command: {}", line)),
        }
    }
}

/// Result of a spawned RPC.
#[derive(Debug)]
pub enum Completion {
    /// Create or join succeeded.
    LobbyJoined(LobbyKey),
    /// Role accepted.
    RoleConfirmed(Role),
    /// Labyrinth pick recorded.
    LabyrinthPicked(String),
    /// Ready check accepted.
    ReadyAccepted,
    /// Ready check refused.
    ReadyRejected(RpcError),
    /// Fresh roster.
    Roster(Vec<String>),
    /// Fresh labyrinth names.
    LabyrinthNames(Vec<String>),
    /// Game setup fetched.
    GameReady(Box<GameSetup>),
    /// Leave acknowledged.
    Left,
    /// Any other failed call.
    Failed {
        /// What was being done.
        context: &'static str,
        /// Why it failed.
        error: RpcError,
    },
    /// An outbound event was not delivered.
    PublishFailed(TransportError),
}

/// Everything the actor consumes.
#[derive(Debug)]
pub enum SessionInput {
    /// From the user.
    Command(SessionCommand),
    /// From the subscription.
    Transport(TransportEvent),
    /// From a spawned RPC, tagged with the lobby it was issued for.
    Completed {
        /// Lobby current when the call was issued.
        origin: Option<LobbyKey>,
        /// The outcome.
        completion: Completion,
    },
}

/// Returned when the actor has stopped.
#[derive(Debug, Clone, Copy, derive_more::Display, derive_more::Error)]
#[display("Session has stopped")]
pub struct SessionClosed;

/// Cloneable front end of a running [`SessionActor`].
///
/// Dropping every handle stops the actor.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inputs: mpsc::Sender<SessionInput>,
    snapshots: watch::Receiver<LobbyState>,
}

impl SessionHandle {
    /// Queues a command.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the actor is gone.
    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.inputs
            .send(SessionInput::Command(command))
            .await
            .map_err(|_| SessionClosed)
    }

    /// Latest state snapshot.
    pub fn state(&self) -> LobbyState {
        self.snapshots.borrow().clone()
    }

    /// A receiver notified on every snapshot.
    pub fn watch(&self) -> watch::Receiver<LobbyState> {
        self.snapshots.clone()
    }

    /// Waits until a snapshot satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the actor stops first.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&LobbyState) -> bool,
    ) -> Result<LobbyState, SessionClosed> {
        let mut receiver = self.snapshots.clone();
        let state = receiver
            .wait_for(|state| predicate(state))
            .await
            .map_err(|_| SessionClosed)?;
        Ok(state.clone())
    }
}

/// Owns the [`PhaseController`] and serializes every input to it.
pub struct SessionActor {
    controller: PhaseController,
    backend: Arc<dyn LobbyBackend>,
    transport: Arc<dyn EventTransport>,
    topic: String,
    inputs: mpsc::Receiver<SessionInput>,
    loopback: mpsc::WeakSender<SessionInput>,
    snapshots: watch::Sender<LobbyState>,
    deferred: Vec<SessionCommand>,
    forwarder: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SessionActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionActor")
            .field("controller", &self.controller)
            .field("topic", &self.topic)
            .field("deferred", &self.deferred)
            .field("subscribed", &self.forwarder.is_some())
            .finish_non_exhaustive()
    }
}

impl SessionActor {
    /// Starts an actor for `username` on the current runtime.
    ///
    /// The join handle yields the final state once every handle is dropped.
    #[instrument(skip(backend, transport))]
    pub fn spawn(
        username: &str,
        topic: &str,
        backend: Arc<dyn LobbyBackend>,
        transport: Arc<dyn EventTransport>,
    ) -> (SessionHandle, JoinHandle<LobbyState>) {
        let controller = PhaseController::new(username);
        let (inputs_tx, inputs) = mpsc::channel(INPUT_BUFFER);
        let (snapshots, snapshot_rx) = watch::channel(controller.state().clone());

        let actor = Self {
            controller,
            backend,
            transport,
            topic: topic.to_string(),
            inputs,
            loopback: inputs_tx.downgrade(),
            snapshots,
            deferred: Vec::new(),
            forwarder: None,
        };
        let task = tokio::spawn(actor.run());

        let handle = SessionHandle {
            inputs: inputs_tx,
            snapshots: snapshot_rx,
        };
        (handle, task)
    }

    /// Runs until every handle is dropped.
    #[instrument(skip(self), fields(username = %self.controller.state().username()))]
    pub async fn run(mut self) -> LobbyState {
        info!("Session started");
        self.subscribe().await;
        self.publish_snapshot();

        while let Some(input) = self.inputs.recv().await {
            self.handle(input).await;
            self.publish_snapshot();
        }

        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
        self.controller.shutdown();
        self.publish_snapshot();
        self.controller.state().clone()
    }

    fn publish_snapshot(&self) {
        self.snapshots.send_replace(self.controller.state().clone());
    }

    fn origin(&self) -> Option<LobbyKey> {
        self.controller.state().lobby_key().clone()
    }

    /// Opens the subscription, replacing any earlier one so each frame is
    /// applied once.
    async fn subscribe(&mut self) {
        if let Some(previous) = self.forwarder.take() {
            debug!("Dropping the previous subscription");
            previous.abort();
        }
        let mut events = match self.transport.subscribe(&self.topic).await {
            Ok(events) => events,
            Err(e) => {
                self.controller.on_transport_error(&e.message);
                return;
            }
        };

        let loopback = self.loopback.clone();
        self.forwarder = Some(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(inputs) = loopback.upgrade() else {
                    break;
                };
                if inputs.send(SessionInput::Transport(event)).await.is_err() {
                    break;
                }
            }
        }));
    }

    /// Runs `call` on its own task and feeds its completion back.
    fn spawn_rpc<F, Fut>(&self, origin: Option<LobbyKey>, call: F)
    where
        F: FnOnce(Arc<dyn LobbyBackend>) -> Fut + Send + 'static,
        Fut: Future<Output = Completion> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            let completion = call(backend).await;
            if let Some(inputs) = loopback.upgrade() {
                let _ = inputs
                    .send(SessionInput::Completed { origin, completion })
                    .await;
            }
        });
    }

    fn spawn_publish(&self, message: EventMessage) {
        let transport = Arc::clone(&self.transport);
        let loopback = self.loopback.clone();
        let origin = self.origin();
        tokio::spawn(async move {
            if let Err(e) = transport.publish(&message).await
                && let Some(inputs) = loopback.upgrade()
            {
                let completion = Completion::PublishFailed(e);
                let _ = inputs
                    .send(SessionInput::Completed { origin, completion })
                    .await;
            }
        });
    }

    async fn handle(&mut self, input: SessionInput) {
        match input {
            SessionInput::Command(command) => self.handle_command(command).await,
            SessionInput::Transport(event) => self.handle_transport(event),
            SessionInput::Completed { origin, completion } => {
                if !self.controller.is_current(origin.as_deref()) {
                    debug!(?origin, "Stale completion discarded");
                    return;
                }
                self.handle_completion(completion);
            }
        }
    }

    fn handle_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                self.controller.on_connected();
                for command in std::mem::take(&mut self.deferred) {
                    debug!(?command, "Replaying deferred command");
                    self.run_command(command);
                }
            }
            TransportEvent::Frame(frame) => {
                if let Reduction::Effect(effect) = self.controller.apply_frame(&frame) {
                    self.run_effect(effect);
                }
            }
            TransportEvent::Error(message) => self.controller.on_transport_error(&message),
            TransportEvent::Closed => self.controller.on_transport_error("event stream closed"),
        }
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Reconnect if !*self.controller.state().connected() => {
                self.subscribe().await;
            }
            SessionCommand::Reconnect => debug!("Already connected"),
            // These depend on their own JOIN echo, so they wait for the stream.
            SessionCommand::CreateLobby | SessionCommand::JoinLobby(_)
                if !*self.controller.state().connected() =>
            {
                debug!(?command, "Deferred until the event stream is up");
                self.deferred.push(command);
            }
            command => self.run_command(command),
        }
    }

    fn run_command(&mut self, command: SessionCommand) {
        let username = self.controller.state().username().clone();
        match command {
            SessionCommand::CreateLobby => {
                self.spawn_rpc(self.origin(), move |backend| async move {
                    match backend.create_lobby(&username).await {
                        Ok(key) => Completion::LobbyJoined(key),
                        Err(error) => Completion::Failed {
                            context: "Create lobby",
                            error,
                        },
                    }
                });
            }
            SessionCommand::JoinLobby(key) => {
                self.spawn_rpc(self.origin(), move |backend| async move {
                    match backend.join_lobby(&key, &username).await {
                        Ok(()) => Completion::LobbyJoined(key),
                        Err(error) => Completion::Failed {
                            context: "Join lobby",
                            error,
                        },
                    }
                });
            }
            SessionCommand::SelectRole(role) => {
                let Some(message) = self.controller.role_request(role) else {
                    debug!(%role, "Role selection not available");
                    return;
                };
                self.spawn_rpc(self.origin(), move |backend| async move {
                    match backend.select_role(&message).await {
                        Ok(()) => Completion::RoleConfirmed(role),
                        Err(error) => Completion::Failed {
                            context: "Role selection",
                            error,
                        },
                    }
                });
            }
            SessionCommand::PickLabyrinth(name) => {
                let Some(message) = self.controller.labyrinth_request(&name) else {
                    debug!(%name, "Labyrinth pick not available");
                    return;
                };
                self.spawn_rpc(self.origin(), move |backend| async move {
                    match backend.pick_labyrinth(&message).await {
                        Ok(()) => Completion::LabyrinthPicked(message.data),
                        Err(error) => Completion::Failed {
                            context: "Labyrinth pick",
                            error,
                        },
                    }
                });
            }
            SessionCommand::SubmitReady => {
                let Some(request) = self.controller.submit_ready() else {
                    return;
                };
                self.spawn_rpc(self.origin(), move |backend| async move {
                    let result = backend
                        .submit_ready(
                            &request.lobby_key,
                            &request.username,
                            &request.labyrinth_name,
                        )
                        .await;
                    match result {
                        Ok(()) => Completion::ReadyAccepted,
                        Err(error) => Completion::ReadyRejected(error),
                    }
                });
            }
            SessionCommand::Move(orientation) => {
                match self.controller.movement_request(orientation) {
                    Some(message) => self.spawn_publish(message),
                    None => debug!(%orientation, "Move not possible"),
                }
            }
            SessionCommand::Chat(text) => {
                if let Some(message) = self.controller.chat_request(&text) {
                    self.spawn_publish(message);
                }
            }
            SessionCommand::Collect(item) => match self.controller.collect_request(item) {
                Some(message) => self.spawn_publish(message),
                None => debug!(item, "Nothing to collect"),
            },
            SessionCommand::RefreshLabyrinthNames => self.run_effect(Effect::RefreshLabyrinthNames),
            SessionCommand::Reconnect => {}
            SessionCommand::Leave => {
                let Some(key) = self.controller.leave() else {
                    debug!("Not in a lobby");
                    return;
                };
                self.spawn_rpc(None, move |backend| async move {
                    match backend.leave_lobby(&key, &username).await {
                        Ok(()) => Completion::Left,
                        Err(error) => Completion::Failed {
                            context: "Leave lobby",
                            error,
                        },
                    }
                });
            }
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        let origin = self.origin();
        match effect {
            Effect::RefreshRoster => {
                let Some(key) = origin.clone() else {
                    return;
                };
                self.spawn_rpc(origin, move |backend| async move {
                    match backend.lobby_users(&key).await {
                        Ok(users) => Completion::Roster(users),
                        Err(error) => Completion::Failed {
                            context: "Roster",
                            error,
                        },
                    }
                });
            }
            Effect::RefreshLabyrinthNames => {
                self.spawn_rpc(origin, move |backend| async move {
                    match backend.labyrinth_names().await {
                        Ok(names) => Completion::LabyrinthNames(names),
                        Err(error) => Completion::Failed {
                            context: "Labyrinth names",
                            error,
                        },
                    }
                });
            }
            Effect::BeginGameSetup => {
                let Some(key) = origin.clone() else {
                    return;
                };
                info!(lobby_key = %key, "Everyone is ready, setting up the game");
                self.spawn_rpc(origin, move |backend| async move {
                    match GameSetup::fetch(backend.as_ref(), &key).await {
                        Ok(setup) => Completion::GameReady(Box::new(setup)),
                        Err(error) => Completion::Failed {
                            context: "Game setup",
                            error,
                        },
                    }
                });
            }
            Effect::FinishGame => {
                self.controller.finish_game();
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::LobbyJoined(key) => {
                if self.controller.on_lobby_joined(&key) {
                    self.run_effect(Effect::RefreshRoster);
                    self.run_effect(Effect::RefreshLabyrinthNames);
                }
            }
            Completion::RoleConfirmed(role) => self.controller.on_role_confirmed(role),
            Completion::LabyrinthPicked(name) => self.controller.on_labyrinth_picked(&name),
            Completion::ReadyAccepted => debug!("Ready check accepted"),
            Completion::ReadyRejected(error) => self.controller.on_ready_rejected(&error),
            Completion::Roster(users) => self.controller.on_roster(users),
            Completion::LabyrinthNames(names) => self.controller.on_labyrinth_names(names),
            Completion::GameReady(setup) => {
                if !self.controller.apply_game_setup(*setup) {
                    warn!("Game setup could not be applied");
                }
            }
            Completion::Left => debug!("Left the lobby"),
            Completion::Failed { context, error } => {
                self.controller.on_rpc_failure(context, &error)
            }
            Completion::PublishFailed(error) => self.controller.on_publish_failed(&error),
        }
    }
}
