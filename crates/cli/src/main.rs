//! E-Depot CLI - Company directory tools for operators.
//!
//! # Usage
//!
//! ```bash
//! # List every transport company
//! edepot companies list
//!
//! # Show one company by id
//! edepot companies get 38512
//!
//! # Resolve the company a user or driver belongs to
//! edepot companies user u-1024
//!
//! # Check that a session token can be obtained
//! edepot token --purpose CMS_TaiKhoan_ThongTin
//!
//! # Load the directory and print cache statistics
//! edepot stats
//! ```
//!
//! # Commands
//!
//! - `companies` - Query the company directory
//! - `token` - Acquire an upstream session token
//! - `stats` - Show cache statistics
//!
//! Configuration comes from `EDEPOT_*` environment variables (or `.env`).
//! Logs go to stderr; set `EDEPOT_LOG_FORMAT=json` for structured output.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "edepot")]
#[command(author, version, about = "E-Depot company directory tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the company directory
    Companies {
        #[command(subcommand)]
        action: CompaniesAction,
    },
    /// Acquire an upstream session token
    Token {
        /// Token purpose (report name); defaults to the driver listing report
        #[arg(short, long)]
        purpose: Option<String>,
    },
    /// Load the company directory and show cache statistics
    Stats,
}

#[derive(Subcommand)]
enum CompaniesAction {
    /// List all companies
    List {
        /// Print full JSON records instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Show a company by id
    Get {
        /// Company id
        id: String,
    },
    /// Resolve the company of a user or driver
    User {
        /// User or driver id
        user_id: String,
    },
}

/// Initialize tracing, writing to stderr so command output stays clean.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "edepot_client=info,edepot_cli=info".into());

    let is_json = std::env::var("EDEPOT_LOG_FORMAT").is_ok_and(|format| format == "json");
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!is_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Companies { action } => match action {
            CompaniesAction::List { json } => commands::companies::list(json).await?,
            CompaniesAction::Get { id } => commands::companies::get(&id).await?,
            CompaniesAction::User { user_id } => commands::companies::for_user(&user_id).await?,
        },
        Commands::Token { purpose } => commands::token::acquire(purpose.as_deref()).await?,
        Commands::Stats => commands::companies::stats().await?,
    }
    Ok(())
}
