// ABOUTME: Shared utility functions for dorxl
// ABOUTME: Clock access and subscriber number validation

/// Current Unix time in seconds
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Subscriber numbers are written in international form: `628` prefix, 10-14 digits
pub fn is_valid_number(input: &str) -> bool {
    input.starts_with("628")
        && (10..=14).contains(&input.len())
        && input.chars().all(|c| c.is_ascii_digit())
}
