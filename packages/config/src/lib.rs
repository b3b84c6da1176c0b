// ABOUTME: Environment-driven configuration helpers for dorxl
// ABOUTME: Env var names plus typed lookups that fall back to defaults instead of failing

pub mod constants;

use std::env;
use std::str::FromStr;
use tracing::warn;

/// Read `name` from the environment, falling back to `default` when unset or unparsable
pub fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid value for {}: {:?}", name, raw);
                default
            }
        },
        _ => default,
    }
}

/// Read a string setting, treating blank values as unset
pub fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
