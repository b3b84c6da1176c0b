use crate::display::{format_remaining, format_timestamp, mask_token, subscription_label};
use dorxl_core::SubscriptionType;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case("", "")]
#[case("short", "*****")]
#[case("exactly12chr", "************")]
#[case("eyJhbGciOiJSUzI1NiJ9.payload", "eyJhbGci... (28 chars)")]
fn test_mask_token(#[case] token: &str, #[case] expected: &str) {
    assert_eq!(mask_token(token), expected);
}

#[test]
fn test_mask_never_reveals_tail() {
    let masked = mask_token("aaaaaaaaaaaaaaaaSECRET");
    assert!(!masked.contains("SECRET"));
}

#[rstest]
#[case(1_000 + 3540, 1_000, "in 59m 0s")]
#[case(1_000 + 45, 1_000, "in 45s")]
#[case(1_000 + 7260, 1_000, "in 2h 1m")]
#[case(1_000, 1_000, "now")]
#[case(1_000 - 10, 1_000, "expired 10s ago")]
fn test_format_remaining(#[case] expires_at: i64, #[case] now: i64, #[case] expected: &str) {
    assert_eq!(format_remaining(expires_at, now), expected);
}

#[test]
fn test_format_timestamp_shape() {
    let rendered = format_timestamp(1_700_000_000);
    assert_eq!(rendered.len(), "2023-11-14 22:13:20".len());
    assert!(rendered.starts_with("2023-11-1"));
}

#[test]
fn test_subscription_label() {
    assert_eq!(subscription_label(&SubscriptionType::Unknown), "-");
    assert_eq!(subscription_label(&SubscriptionType::Prepaid), "PREPAID");
}
