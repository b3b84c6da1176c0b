// ABOUTME: Terminal formatting for accounts and tokens
// ABOUTME: Token masking, relative expiry and timestamp rendering

use chrono::{DateTime, Local};
use dorxl_core::SubscriptionType;

/// Show only the start of a token plus its length
pub fn mask_token(token: &str) -> String {
    let chars = token.chars().count();
    if chars <= 12 {
        return "*".repeat(chars);
    }
    let prefix: String = token.chars().take(8).collect();
    format!("{}... ({} chars)", prefix, chars)
}

/// "in 58m 59s" or "expired 10s ago"
pub fn format_remaining(expires_at: i64, now: i64) -> String {
    let delta = expires_at - now;
    if delta > 0 {
        format!("in {}", format_duration(delta))
    } else if delta == 0 {
        "now".to_string()
    } else {
        format!("expired {} ago", format_duration(-delta))
    }
}

fn format_duration(secs: i64) -> String {
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (hours, minutes) {
        (0, 0) => format!("{}s", seconds),
        (0, _) => format!("{}m {}s", minutes, seconds),
        _ => format!("{}h {}m", hours, minutes),
    }
}

pub fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|utc| {
            utc.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| timestamp.to_string())
}

pub fn subscription_label(subscription_type: &SubscriptionType) -> &str {
    if subscription_type.is_unknown() {
        "-"
    } else {
        subscription_type.as_str()
    }
}
