//! Mobile Order CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! mo-cli migrate
//!
//! # Create a shop owner account
//! mo-cli owner create -e owner@example.com -p 'correct horse battery'
//!
//! # Load a shop profile and menu for an owner
//! mo-cli seed menu -e owner@example.com -f demos/menu.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `owner create` - Create owner accounts
//! - `seed menu` - Seed a shop and its menu from YAML

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mo-cli")]
#[command(author, version, about = "Mobile Order CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage shop owners
    Owner {
        #[command(subcommand)]
        action: OwnerAction,
    },
    /// Seed data from files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum OwnerAction {
    /// Create a new owner account
    Create {
        /// Owner email address
        #[arg(short, long)]
        email: String,

        /// Initial password
        #[arg(short, long, env = "MOBILE_ORDER_OWNER_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Create the shop profile and menu described by a YAML file
    Menu {
        /// Email of the owner the menu belongs to
        #[arg(short, long)]
        email: String,

        /// Path to the menu YAML file
        #[arg(short, long)]
        file: PathBuf,
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
        Commands::Owner { action } => match action {
            OwnerAction::Create { email, password } => {
                commands::owner::create(&email, &password).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Menu { email, file } => {
                commands::seed::menu(&email, &file).await?;
            }
        },
    }
    Ok(())
}
