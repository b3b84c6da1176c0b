// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across dorxl

// Session timing
pub const DORXL_REFRESH_MARGIN_SECS: &str = "DORXL_REFRESH_MARGIN_SECS";
pub const DORXL_REFRESH_INTERVAL_SECS: &str = "DORXL_REFRESH_INTERVAL_SECS";

// HTTP client
pub const DORXL_HTTP_TIMEOUT_SECS: &str = "DORXL_HTTP_TIMEOUT_SECS";

// Provider endpoints and credentials
pub const DORXL_CIAM_BASE_URL: &str = "DORXL_CIAM_BASE_URL";
pub const DORXL_CIAM_BASIC_AUTH: &str = "DORXL_CIAM_BASIC_AUTH";
pub const DORXL_API_BASE_URL: &str = "DORXL_API_BASE_URL";
pub const DORXL_API_KEY: &str = "DORXL_API_KEY";
pub const DORXL_APP_VERSION: &str = "DORXL_APP_VERSION";

// Persistence
pub const DORXL_STORE: &str = "DORXL_STORE";
pub const DORXL_DATA_DIR: &str = "DORXL_DATA_DIR";

// Logging
pub const RUST_LOG: &str = "RUST_LOG";

// System Environment Variables
pub const HOME: &str = "HOME";
