//! Command-line interface for labyrinth_sync.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Labyrinth - author, validate and play cooperative labyrinths
#[derive(Parser, Debug)]
#[command(name = "labyrinth")]
#[command(about = "Author, validate and play cooperative labyrinths", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a client config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a labyrinth document
    Validate {
        /// Labyrinth JSON file
        file: PathBuf,
    },

    /// Replay an authoring plan into a labyrinth document
    Author {
        /// Plan TOML file
        plan: PathBuf,

        /// Where to write the document (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Save the result on the backend
        #[arg(long)]
        upload: bool,
    },

    /// List the labyrinths stored on the backend
    Names,

    /// Upload a labyrinth file for the backend to read
    Upload {
        /// Labyrinth file
        file: PathBuf,
    },

    /// Join or create a lobby and play from stdin
    Play {
        /// Lobby to join; a new one is created if omitted
        #[arg(long)]
        lobby: Option<String>,

        /// Player name (falls back to the config file)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Print JSON schemas of the wire formats
    Schema,
}
