// ABOUTME: Session timing settings
// ABOUTME: Refresh safety margin and refresh throttle, overridable through the environment

use dorxl_config::{
    constants::{DORXL_REFRESH_INTERVAL_SECS, DORXL_REFRESH_MARGIN_SECS},
    env_or,
};

pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 60;
pub const DEFAULT_REFRESH_INTERVAL_SECS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Subtracted from the declared token lifetime, and the minimum remaining
    /// lifetime for the no-network fast path
    pub refresh_margin_secs: i64,
    /// Refresh at least this often even if tokens are still fresh
    pub refresh_interval_secs: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            refresh_margin_secs: DEFAULT_REFRESH_MARGIN_SECS,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }
}

impl SessionSettings {
    pub fn from_env() -> Self {
        let refresh_margin_secs = env_or(DORXL_REFRESH_MARGIN_SECS, DEFAULT_REFRESH_MARGIN_SECS);
        let refresh_interval_secs =
            env_or(DORXL_REFRESH_INTERVAL_SECS, DEFAULT_REFRESH_INTERVAL_SECS);

        Self {
            refresh_margin_secs: if refresh_margin_secs < 0 {
                DEFAULT_REFRESH_MARGIN_SECS
            } else {
                refresh_margin_secs
            },
            refresh_interval_secs: if refresh_interval_secs <= 0 {
                DEFAULT_REFRESH_INTERVAL_SECS
            } else {
                refresh_interval_secs
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SessionSettings::default();
        assert_eq!(settings.refresh_margin_secs, 60);
        assert_eq!(settings.refresh_interval_secs, 300);
    }
}
