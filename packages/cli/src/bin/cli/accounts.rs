// ABOUTME: CLI commands for linked subscriber accounts
// ABOUTME: List, add, switch and remove accounts through the SessionManager

use anyhow::{bail, Context};
use clap::Subcommand;
use colored::*;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use dorxl_auth::{AuthError, RemoveOutcome, SessionManager};
use dorxl_cli::{
    context::{parse_linked_number, parse_number},
    display::subscription_label,
};
use inquire::{Confirm, Password, PasswordDisplayMode, Select, Text};

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// List linked accounts
    List,
    /// Link an account with its refresh token, or replace the token of a linked one
    Add {
        /// Subscriber number (628...)
        number: Option<String>,
        /// Refresh token; prompted for when omitted
        #[arg(long)]
        token: Option<String>,
    },
    /// Make another linked account the active one
    Switch {
        /// Subscriber number; pick from a list when omitted
        number: Option<String>,
    },
    /// Unlink an account
    Remove {
        /// Subscriber number to remove
        number: String,
        /// Skip confirmation prompts
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn handle_accounts_command(
    manager: &mut SessionManager,
    command: AccountsCommands,
) -> anyhow::Result<()> {
    match command {
        AccountsCommands::List => {
            list_accounts(manager);
            Ok(())
        }
        AccountsCommands::Add { number, token } => add_account(manager, number, token).await,
        AccountsCommands::Switch { number } => switch_account(manager, number).await,
        AccountsCommands::Remove { number, yes } => remove_account(manager, &number, yes).await,
    }
}

fn list_accounts(manager: &SessionManager) {
    if manager.accounts().is_empty() {
        println!("{}", "No accounts linked".yellow());
        println!("{}", "Use 'dorxl accounts add' to link one".dimmed());
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["", "Number", "Type", "Subscriber ID"]);

    for entry in manager.accounts() {
        let marker = if manager.is_active(entry.number) { "*" } else { "" };
        let subscriber_id = if entry.subscriber_id.is_empty() {
            "-".to_string()
        } else {
            entry.subscriber_id.clone()
        };
        table.add_row(vec![
            marker.to_string(),
            entry.number.to_string(),
            subscription_label(&entry.subscription_type).to_string(),
            subscriber_id,
        ]);
    }

    println!("{}", table);
    println!(
        "Total: {} accounts ({} store)",
        manager.accounts().len().to_string().cyan(),
        manager.backend_name()
    );
}

async fn add_account(
    manager: &mut SessionManager,
    number: Option<String>,
    token: Option<String>,
) -> anyhow::Result<()> {
    let raw_number = match number {
        Some(number) => number,
        None => Text::new("Subscriber number (628...):")
            .prompt()
            .context("Failed to read number")?,
    };
    let number = parse_number(&raw_number)?;

    let token = match token {
        Some(token) => token,
        None => Password::new("Refresh token:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .context("Failed to read refresh token")?,
    };

    let existed = manager.accounts().iter().any(|e| e.number == number);
    match manager.add_or_replace_account(number, &token).await {
        Ok(()) => {
            let verb = if existed { "Updated" } else { "Linked" };
            println!(
                "{} {} account {}",
                "✓".green().bold(),
                verb,
                number.to_string().bold()
            );
            if let Some(summary) = manager.get_active_account_summary() {
                println!(
                    "  Active: {} ({})",
                    summary.number,
                    subscription_label(&summary.subscription_type)
                );
            }
            Ok(())
        }
        Err(e @ AuthError::TokenExchange(_)) => {
            eprintln!(
                "{} The refresh token was rejected; log in again to obtain a new one",
                "✗".red().bold()
            );
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

async fn switch_account(manager: &mut SessionManager, number: Option<String>) -> anyhow::Result<()> {
    if manager.accounts().is_empty() {
        bail!("No accounts linked; use 'dorxl accounts add' first");
    }

    let number = match number {
        Some(raw) => parse_linked_number(&raw)?,
        None => {
            let options: Vec<String> = manager
                .accounts()
                .iter()
                .map(|entry| {
                    let marker = if manager.is_active(entry.number) { " (active)" } else { "" };
                    format!(
                        "{} {}{}",
                        entry.number,
                        subscription_label(&entry.subscription_type),
                        marker
                    )
                })
                .collect();
            let choice = Select::new("Switch to account:", options)
                .prompt()
                .context("Failed to read selection")?;
            let digits = choice.split_whitespace().next().unwrap_or_default();
            parse_linked_number(digits)?
        }
    };

    manager.activate(number).await?;
    println!(
        "{} Now using account {}",
        "✓".green().bold(),
        number.to_string().bold()
    );
    Ok(())
}

async fn remove_account(
    manager: &mut SessionManager,
    raw_number: &str,
    skip_confirmation: bool,
) -> anyhow::Result<()> {
    let number = parse_linked_number(raw_number)?;
    if !manager.accounts().iter().any(|e| e.number == number) {
        bail!("Account {} is not linked", number);
    }

    let confirmed = if skip_confirmation {
        true
    } else {
        let question = if manager.is_active(number) {
            format!(
                "{} is the active account. Remove it and switch to the next one?",
                number
            )
        } else {
            format!("Remove account {}?", number)
        };
        Confirm::new(&question).with_default(false).prompt()?
    };
    if !confirmed {
        println!("{}", "Operation cancelled".yellow());
        return Ok(());
    }

    match manager.remove_account(number).await? {
        RemoveOutcome::NotFound => bail!("Account {} is not linked", number),
        RemoveOutcome::Removed => {
            println!("{} Removed account {}", "✓".green().bold(), number);
        }
        RemoveOutcome::Promoted(next) => {
            println!("{} Removed account {}", "✓".green().bold(), number);
            println!("  Active account is now {}", next.to_string().bold());
        }
        RemoveOutcome::PromotionFailed { number: next, reason } => {
            println!("{} Removed account {}", "✓".green().bold(), number);
            eprintln!(
                "{} Could not activate {}: {}",
                "!".yellow().bold(),
                next,
                reason
            );
            eprintln!("  Use 'dorxl accounts switch' or re-add the account");
        }
        RemoveOutcome::NoAccountsLeft => {
            println!("{} Removed account {}", "✓".green().bold(), number);
            println!("{}", "No accounts left. Add one with 'dorxl accounts add'.".yellow());
            if !skip_confirmation {
                Confirm::new("Continue?").with_default(true).prompt()?;
            }
        }
    }
    Ok(())
}
