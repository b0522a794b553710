//! Bazaar CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the document and session tables
//! bz-cli migrate
//!
//! # Create an admin account
//! bz-cli admin create -e admin@example.com -n "Admin Name" -p 'S3cure!pass'
//!
//! # Create the root admin from ROOT_ADMIN_EMAIL / ROOT_ADMIN_PASSWORD
//! bz-cli admin ensure-root
//!
//! # Load catalog items from YAML
//! bz-cli seed items --file catalog.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bz-cli")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (documents and sessions)
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Password (must satisfy the signup policy)
        #[arg(short, long, env = "BAZAAR_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create the root admin if it is missing and restore its admin flag
    EnsureRoot,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert catalog items from a YAML list
    Items {
        /// Path to the YAML file
        #[arg(short, long)]
        file: String,
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
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => {
                commands::admin::create_user(&email, &name, &password).await?;
            }
            AdminAction::EnsureRoot => {
                commands::admin::ensure_root().await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Items { file } => commands::seed::items(&file).await?,
        },
    }
    Ok(())
}
