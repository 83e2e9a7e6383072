//! Solemart CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply schema and session-store migrations
//! solemart-cli migrate
//!
//! # Create a user with an elevated role
//! solemart-cli user create -e seller@example.com -p 'long-password' -r seller
//!
//! # Change an existing user's role
//! solemart-cli user set-role -e buyer@example.com -r admin
//!
//! # Load demo products
//! solemart-cli seed products -f crates/cli/seed/products.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "solemart-cli")]
#[command(author, version, about = "Solemart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a credential user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,

        /// Role (`user`, `seller`, `admin`)
        #[arg(short, long, default_value = "user")]
        role: String,
    },
    /// Change a user's role
    SetRole {
        /// Email address of the existing user
        #[arg(short, long)]
        email: String,

        /// New role (`user`, `seller`, `admin`)
        #[arg(short, long)]
        role: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert products from a YAML file, skipping names that already exist
    Products {
        /// Path to the YAML file
        #[arg(short, long, default_value = "crates/cli/seed/products.yaml")]
        file: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                password,
                name,
                role,
            } => {
                commands::user::create(&email, &password, name.as_deref(), &role).await?;
            }
            UserAction::SetRole { email, role } => {
                commands::user::set_role(&email, &role).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => {
                commands::seed::products(&file).await?;
            }
        },
    }
    Ok(())
}
