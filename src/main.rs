//! Labyrinth - unified CLI
//!
//! Validates and authors labyrinths, talks to the backend, and plays a
//! lobby session from the terminal.

#![warn(missing_docs)]

mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Command};
use labyrinth_sync::{
    AuthoringPlan, ClientConfig, DEFAULT_TOPIC, EventMessage, Labyrinth, LabyrinthDocument,
    LobbyBackend, LobbyState, RestBackend, Role, SessionActor, SessionCommand, SseTransport,
};
use strum::IntoEnumIterator;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Validate { file } => validate(&file),
        Command::Author { plan, out, upload } => {
            author(&config, &plan, out.as_deref(), upload).await
        }
        Command::Names => names(&config).await,
        Command::Upload { file } => upload(&config, &file).await,
        Command::Play { lobby, username } => play(&config, lobby, username).await,
        Command::Schema => schema(),
    }
}

fn rest_backend(config: &ClientConfig) -> Result<RestBackend> {
    Ok(RestBackend::new(config.backend_url(), config.request_timeout())?)
}

/// Parse a labyrinth document, validate it and print a summary
#[instrument]
fn validate(file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document: LabyrinthDocument =
        serde_json::from_str(&content).context("Not a labyrinth document")?;
    let labyrinth = Labyrinth::from_document(&document)?;

    println!("{}", labyrinth.name());
    println!("  tiles:  {}", labyrinth.tiles().len());
    println!("  starts: {:?}", labyrinth.player_start_tile_keys());
    println!("  end:    {}", labyrinth.end_tile_key());

    for start in labyrinth.player_start_tile_keys() {
        for role in Role::iter() {
            let reachable = labyrinth.reachable_from(*start, role);
            if !reachable.contains(&labyrinth.end_tile_key()) {
                warn!(start, %role, "End tile unreachable");
                println!("  warning: {} cannot reach the end from tile {}", role, start);
            }
        }
    }
    Ok(())
}

/// Replay an authoring plan and emit the document
#[instrument(skip(config))]
async fn author(config: &ClientConfig, plan: &Path, out: Option<&Path>, upload: bool) -> Result<()> {
    let plan = AuthoringPlan::from_file(plan)?;
    let document = plan.author(*config.editor())?;
    let json = serde_json::to_string_pretty(&document)?;

    match out {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Document written");
        }
        None => println!("{}", json),
    }

    if upload {
        rest_backend(config)?.save_labyrinth(&document).await?;
        info!(name = %document.labyrinth_name, "Labyrinth saved on the backend");
    }
    Ok(())
}

/// List stored labyrinths
async fn names(config: &ClientConfig) -> Result<()> {
    for name in rest_backend(config)?.labyrinth_names().await? {
        println!("{}", name);
    }
    Ok(())
}

/// Upload a labyrinth file
#[instrument(skip(config))]
async fn upload(config: &ClientConfig, file: &Path) -> Result<()> {
    let contents =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "labyrinth.json".to_string());
    rest_backend(config)?
        .upload_labyrinth(&file_name, contents)
        .await?;
    println!("Uploaded {}", file_name);
    Ok(())
}

/// Print the JSON schemas of the wire formats
fn schema() -> Result<()> {
    let labyrinth = schemars::schema_for!(LabyrinthDocument);
    let event = schemars::schema_for!(EventMessage);
    println!("{}", serde_json::to_string_pretty(&labyrinth)?);
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}

fn print_state(state: &LobbyState) {
    println!(
        "[{}] lobby={} role={} labyrinth={} score={}",
        state.phase(),
        state.lobby_key().as_deref().unwrap_or("-"),
        state
            .selected_role()
            .as_ref()
            .map(|role| role.to_string())
            .unwrap_or_else(|| "-".to_string()),
        state.selected_labyrinth().as_deref().unwrap_or("-"),
        state.score(),
    );
    if let Some(player) = state.local_player() {
        println!("  at tile {}", player.position());
        if let Some(labyrinth) = state.labyrinth() {
            for item in labyrinth.items_at(*player.position()) {
                println!("  item {}: {}", item.id(), item.model_name());
            }
        }
    }
    if let Some(error) = state.error_state() {
        println!("  error: {}", error);
    }
}

/// Play a lobby session from stdin
#[instrument(skip(config))]
async fn play(config: &ClientConfig, lobby: Option<String>, username: Option<String>) -> Result<()> {
    let Some(username) = username.or_else(|| config.username().clone()) else {
        bail!("A username is required (--username or `username` in the config file)");
    };

    let backend: Arc<dyn LobbyBackend> = Arc::new(rest_backend(config)?);
    let transport = Arc::new(SseTransport::new(
        reqwest::Client::new(),
        config.events_url(),
        DEFAULT_TOPIC,
    ));
    let (session, task) =
        SessionActor::spawn(&username, DEFAULT_TOPIC, Arc::clone(&backend), transport);

    let first = match lobby {
        Some(key) => SessionCommand::JoinLobby(key),
        None => SessionCommand::CreateLobby,
    };
    session.send(first).await?;

    let mut updates = session.watch();
    let printer = tokio::spawn(async move {
        let mut last_phase = None;
        let mut last_error = None;
        let mut last_lobby = None;
        let mut seen_chat = 0;
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            // The chat log restarts with every lobby.
            if last_lobby != *state.lobby_key() {
                last_lobby = state.lobby_key().clone();
                seen_chat = 0;
            }
            if last_phase != Some(*state.phase()) || last_error != *state.error_state() {
                print_state(&state);
                last_phase = Some(*state.phase());
                last_error = state.error_state().clone();
            }
            for line in state.chat().iter().skip(seen_chat) {
                println!("<{}> {}", line.username(), line.text());
            }
            seen_chat = state.chat().len();
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "state" => print_state(&session.state()),
            text => match text.parse::<SessionCommand>() {
                Ok(command) => session.send(command).await?,
                Err(message) => println!("{}", message),
            },
        }
    }

    // Spawned calls die with the runtime, so leave from here.
    let lobby_key = session.state().lobby_key().clone();
    drop(session);
    let final_state = task.await?;
    printer.abort();
    if let Some(key) = lobby_key
        && let Err(e) = backend.leave_lobby(&key, &username).await
    {
        warn!(error = %e, lobby_key = %key, "Could not leave the lobby");
    }
    info!(score = final_state.score(), "Session ended");
    Ok(())
}
