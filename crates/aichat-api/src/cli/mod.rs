//! CLI command definitions for the `aichat` binary.
//!
//! `serve` runs the relay server. The remaining commands are the terminal
//! client: a demo login, profile editing and an interactive chat that talks
//! to a running relay.

pub mod chat;
pub mod profile;
pub mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with Gemini through a local streaming relay.
#[derive(Parser)]
#[command(name = "aichat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat relay server.
    Serve {
        /// Port to listen on (defaults to `server.port` in config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to `server.host` in config.toml).
        #[arg(long)]
        host: Option<String>,
    },

    /// Sign in with the demo account.
    Login {
        /// Account email.
        #[arg(short, long)]
        email: Option<String>,

        /// Account password (prompted when omitted).
        #[arg(long, env = "AICHAT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out. The saved profile is kept for the next login.
    Logout,

    /// Show who is signed in.
    Whoami,

    /// Show or edit your profile.
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },

    /// Start an interactive chat session.
    Chat {
        /// Relay base URL (defaults to `client.relay_url` in config.toml).
        #[arg(long, env = "AICHAT_RELAY_URL")]
        url: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the current profile.
    Show,

    /// Update name, email or avatar. Unset fields keep their value.
    Set {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Image file to use as the avatar.
        #[arg(long, conflicts_with = "clear_avatar")]
        avatar: Option<PathBuf>,

        /// Remove the avatar.
        #[arg(long)]
        clear_avatar: bool,
    },
}
