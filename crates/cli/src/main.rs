//! FanatikJersey CLI - Database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! fj-cli migrate
//!
//! # Grant or revoke admin privileges
//! fj-cli user promote -e fan@example.com
//! fj-cli user demote -e fan@example.com
//!
//! # Block or unblock sign-in
//! fj-cli user deactivate -e fan@example.com
//! fj-cli user activate -e fan@example.com
//!
//! # Show every admin account
//! fj-cli user list-admins
//! ```
//!
//! # Environment Variables
//!
//! - `FANATIK_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use fanatik_core::Email;

mod commands;

#[derive(Parser)]
#[command(name = "fj-cli")]
#[command(author, version, about = "FanatikJersey CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Give an account admin privileges
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: Email,
    },
    /// Return an admin to a regular account
    Demote {
        #[arg(short, long)]
        email: Email,
    },
    /// Allow an account to sign in again
    Activate {
        #[arg(short, long)]
        email: Email,
    },
    /// Block an account from signing in
    Deactivate {
        #[arg(short, long)]
        email: Email,
    },
    /// List admin accounts
    ListAdmins,
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
    dotenvy::dotenv().ok();
    let pool = commands::connect().await?;

    match cli.command {
        Commands::Migrate => commands::migrate::run(&pool).await?,
        Commands::User { action } => match action {
            UserAction::Promote { email } => commands::users::promote(&pool, &email).await?,
            UserAction::Demote { email } => commands::users::demote(&pool, &email).await?,
            UserAction::Activate { email } => {
                commands::users::set_active(&pool, &email, true).await?;
            }
            UserAction::Deactivate { email } => {
                commands::users::set_active(&pool, &email, false).await?;
            }
            UserAction::ListAdmins => commands::users::list_admins(&pool).await?,
        },
    }
    Ok(())
}
