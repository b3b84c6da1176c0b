// ABOUTME: dorxl command line entry point
// ABOUTME: Parses arguments, sets up logging and dispatches account and token commands

use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use std::process;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::accounts::AccountsCommands;

#[derive(Parser)]
#[command(name = "dorxl")]
#[command(about = "dorxl - manage linked subscriber accounts and their session tokens")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage linked accounts
    #[command(subcommand)]
    Accounts(AccountsCommands),
    /// Print the active account's tokens, refreshing them when due
    Tokens {
        /// Emit JSON (full token values) for scripts
        #[arg(long)]
        json: bool,
        /// Show full token values instead of masked ones
        #[arg(long)]
        reveal: bool,
    },
    /// Force a token refresh for the active account
    Refresh,
    /// Show the active account and session state
    Status,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = handle_command(cli.command).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if dorxl_cli::error::is_retryable(&e) {
            eprintln!(
                "{}",
                "The identity service may be briefly unavailable; try the command again".dimmed()
            );
        }
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let mut manager = dorxl_cli::build_manager().await?;

    match command {
        Commands::Accounts(accounts_cmd) => {
            cli::accounts::handle_accounts_command(&mut manager, accounts_cmd).await
        }
        Commands::Tokens { json, reveal } => {
            cli::session::print_tokens(&mut manager, json, reveal).await
        }
        Commands::Refresh => cli::session::refresh(&mut manager).await,
        Commands::Status => cli::session::status(&manager),
    }
}
