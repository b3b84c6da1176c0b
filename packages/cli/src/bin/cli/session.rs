// ABOUTME: CLI commands for the active session
// ABOUTME: Print tokens, force a refresh and show session status

use anyhow::bail;
use colored::*;
use dorxl_auth::{SessionManager, TokenSet};
use dorxl_cli::display::{format_remaining, format_timestamp, mask_token, subscription_label};
use dorxl_core::now_timestamp;
use serde_json::json;

pub async fn print_tokens(
    manager: &mut SessionManager,
    as_json: bool,
    reveal: bool,
) -> anyhow::Result<()> {
    let Some(tokens) = manager.get_active_tokens().await else {
        bail!("No active session; link an account with 'dorxl accounts add'");
    };
    let Some(session) = manager.active_session() else {
        bail!("No active session");
    };

    if as_json {
        let output = json!({
            "number": session.number,
            "subscriber_id": session.subscriber_id,
            "subscription_type": session.subscription_type,
            "access_token": tokens.access_token,
            "id_token": tokens.id_token,
            "refresh_token": tokens.refresh_token,
            "expires_at": tokens.expires_at,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("Tokens for {}", session.number).blue().bold()
    );
    println!();
    print_token_lines(&tokens, reveal);
    Ok(())
}

fn print_token_lines(tokens: &TokenSet, reveal: bool) {
    let show = |token: &str| {
        if reveal {
            token.to_string()
        } else {
            mask_token(token)
        }
    };
    println!("{:<15} {}", "Access:".cyan(), show(&tokens.access_token));
    println!("{:<15} {}", "ID:".cyan(), show(&tokens.id_token));
    println!("{:<15} {}", "Refresh:".cyan(), show(&tokens.refresh_token));
    println!(
        "{:<15} {} ({})",
        "Expires:".cyan(),
        format_timestamp(tokens.expires_at),
        format_remaining(tokens.expires_at, now_timestamp())
    );
}

pub async fn refresh(manager: &mut SessionManager) -> anyhow::Result<()> {
    // A restored-from-disk session counts; fall back to activating the first account
    if manager.active_session().is_none() && manager.get_active_tokens().await.is_none() {
        bail!("No active session; link an account with 'dorxl accounts add'");
    }

    let tokens = manager.renew_active_tokens().await?;
    println!("{} Tokens refreshed", "✓".green().bold());
    println!(
        "  Expires {} ({})",
        format_timestamp(tokens.expires_at),
        format_remaining(tokens.expires_at, now_timestamp())
    );
    Ok(())
}

pub fn status(manager: &SessionManager) -> anyhow::Result<()> {
    println!("{}", "dorxl session status".blue().bold());
    println!();
    println!("{:<15} {}", "Store:".cyan(), manager.backend_name());
    println!("{:<15} {}", "Accounts:".cyan(), manager.accounts().len());

    let Some(session) = manager.active_session() else {
        println!("{:<15} {}", "Active:".cyan(), "none".yellow());
        return Ok(());
    };

    let now = now_timestamp();
    println!("{:<15} {}", "Active:".cyan(), session.number.to_string().bold());
    println!(
        "{:<15} {}",
        "Type:".cyan(),
        subscription_label(&session.subscription_type)
    );
    let expiry = format_remaining(session.tokens.expires_at, now);
    let expiry = if session.tokens.is_expired(now) {
        expiry.red()
    } else {
        expiry.green()
    };
    println!(
        "{:<15} {} ({})",
        "Expires:".cyan(),
        format_timestamp(session.tokens.expires_at),
        expiry
    );
    if let Some(at) = manager.last_refresh_at() {
        println!("{:<15} {}", "Refreshed:".cyan(), format_timestamp(at));
    }
    Ok(())
}
