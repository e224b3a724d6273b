//! Tattle CLI and REST API entry point.
//!
//! Binary name: `tattle`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The server gets the full observability stack; one-shot CLI commands
    // get a plain fmt subscriber tuned by verbosity.
    if let Commands::Serve { otel, .. } = &cli.command {
        tattle_observe::tracing_setup::init_tracing(*otel)
            .map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))?;
    } else {
        let filter = match cli.verbose {
            0 if cli.quiet => "error",
            0 => "warn",
            1 => "info,tattle=debug",
            _ => "trace",
        };
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_target(false)
            .init();
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::Serve { bind, .. } => {
            // Rooms come from a fixed seed list at initialization time.
            let created = cli::seed::init_rooms(&state).await?;
            if created > 0 {
                tracing::info!(created, "default rooms created");
            }

            let addr = bind.unwrap_or_else(|| state.config.bind_addr.clone());
            let router = http::router::build_router(state);

            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!(%addr, "tattle API listening");

            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                    tracing::info!("shutting down");
                })
                .await?;

            tattle_observe::tracing_setup::shutdown_tracing();
        }

        Commands::Init => {
            let created = cli::seed::init_rooms(&state).await?;
            if cli.json {
                println!("{}", serde_json::json!({ "rooms_created": created }));
            } else {
                println!("created {created} rooms");
            }
        }

        Commands::Seed => {
            cli::seed::seed_demo(&state, cli.json).await?;
        }

        Commands::Rooms => {
            cli::list::rooms(&state, cli.json).await?;
        }

        Commands::Trends => {
            cli::list::trends(&state, cli.json).await?;
        }
    }

    Ok(())
}
