//! Tribal Market CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (including the session table)
//! tm-cli migrate
//!
//! # Upsert catalog categories from a YAML file
//! tm-cli seed categories --file seed/categories.yaml
//!
//! # Create a user with a generated password
//! tm-cli user create -e weaver@example.com -n "Asha Devi" -r artist
//! ```
//!
//! # Environment Variables
//!
//! - `MARKET_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tm-cli")]
#[command(author, version, about = "Tribal Market CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed reference data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert categories from a YAML file
    Categories {
        /// Path to the YAML file
        #[arg(short, long)]
        file: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user with a random password
    Create {
        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account role (`buyer` or `artist`)
        #[arg(short, long, default_value = "buyer")]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Categories { file } => commands::seed::categories(&file).await?,
        },
        Commands::User { action } => match action {
            UserAction::Create { email, name, role } => {
                commands::user::create(&email, &name, &role).await?;
            }
        },
    }
    Ok(())
}
