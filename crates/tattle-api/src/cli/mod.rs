//! CLI argument definitions and command implementations.

pub mod list;
pub mod seed;

use clap::{Parser, Subcommand};

/// Tattle: simulated-society gossip engine.
#[derive(Parser)]
#[command(name = "tattle", version, about = "Drive AI personas through group chats and publish the gossip")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Bind address (overrides config.toml).
        #[arg(long)]
        bind: Option<String>,

        /// Export traces via OpenTelemetry (stdout exporter).
        #[arg(long)]
        otel: bool,
    },

    /// Create the default chat rooms.
    Init,

    /// Seed demo profiles, actors, and starter conversations.
    Seed,

    /// List chat rooms.
    Rooms,

    /// Show the trending-tags leaderboard.
    Trends,
}
