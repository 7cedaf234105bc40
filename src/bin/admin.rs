//! CLI administration tool for anony-url.
//!
//! Mints owners and their bearer tokens, shows link statistics, and runs
//! database checks without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Create a new owner and print its token
//! cargo run --bin admin -- owner create
//!
//! # Re-issue the token of an existing owner
//! cargo run --bin admin -- token issue 3f2b8c4e-9a1d-4e7f-b6c5-0d8e2a4f6b1c
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string (`stats` and `db`)
//! - `TOKEN_SIGNING_SECRET`: token signing key (`owner` and `token`)

use anony_url::application::services::AuthService;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;

/// CLI tool for managing anony-url.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage owners
    Owner {
        #[command(subcommand)]
        action: OwnerAction,
    },

    /// Manage owner tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum OwnerAction {
    /// Create a new owner id and issue its token
    Create {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue the bearer token for an existing owner id
    Issue {
        /// Owner id (prompted for when omitted)
        owner_id: Option<String>,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Owner { action } => handle_owner_action(action, &auth_service()?)?,
        Commands::Token { action } => handle_token_action(action, &auth_service()?)?,
        Commands::Stats => handle_stats(&connect().await?).await?,
        Commands::Db { action } => handle_db_action(action, &connect().await?).await?,
    }

    Ok(())
}

fn auth_service() -> Result<AuthService> {
    let secret =
        std::env::var("TOKEN_SIGNING_SECRET").context("TOKEN_SIGNING_SECRET must be set")?;
    Ok(AuthService::new(secret))
}

async fn connect() -> Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")
}

/// Creates a new owner with a confirmation prompt.
///
/// Owners are not stored anywhere: the id only exists inside the token and
/// on the links saved with it.
fn handle_owner_action(action: OwnerAction, auth: &AuthService) -> Result<()> {
    let OwnerAction::Create { yes } = action;

    println!("{}", "Create owner".bright_blue().bold());
    println!();

    let owner_id = uuid::Uuid::new_v4().to_string();
    println!("  Owner id: {}", owner_id.cyan());
    println!();

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Create this owner?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled".red());
            return Ok(());
        }
    }

    print_token(auth, &owner_id)
}

fn handle_token_action(action: TokenAction, auth: &AuthService) -> Result<()> {
    let TokenAction::Issue { owner_id } = action;

    let owner_id = match owner_id {
        Some(id) => id,
        None => Input::new().with_prompt("Owner id").interact_text()?,
    };

    print_token(auth, &owner_id)
}

fn print_token(auth: &AuthService, owner_id: &str) -> Result<()> {
    let token = auth
        .issue_token(owner_id)
        .map_err(|e| anyhow::anyhow!("Failed to issue token: {}", e))?;

    println!("{}", "Token issued".green().bold());
    println!();
    println!("{}", "Add this to your requests:".bright_white());
    println!(
        "  {}: Bearer {}",
        "Authorization".bright_cyan(),
        token.bright_yellow()
    );
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/api/links",
        token.bright_yellow()
    );
    println!();
    println!(
        "{}",
        "Anyone holding this token can manage the owner's links."
            .red()
            .bold()
    );

    Ok(())
}

/// Displays link counts across all owners.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "Statistics".bright_blue().bold());
    println!();

    let (total, active, owners): (i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 1), COUNT(DISTINCT owner_id) FROM links",
    )
    .fetch_one(pool)
    .await?;

    println!("  Links:        {}", total.to_string().bright_green().bold());
    println!("  Active links: {}", active.to_string().bright_green().bold());
    println!("  Owners:       {}", owners.to_string().bright_green().bold());
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            let migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
