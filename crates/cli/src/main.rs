//! Section Forge CLI - Database migrations and maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Apply server migrations
//! sf-cli migrate
//!
//! # Delete expired handoff records
//! sf-cli purge-expired
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `purge-expired` - Delete `temp_sections` rows past `expires_at`

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(author, version, about = "Section Forge CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Delete handoff records whose expiry has passed
    PurgeExpired,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::PurgeExpired => commands::purge::run().await.map(|_| ()),
    }
}
