// ABOUTME: Tests for the encrypted active-session snapshot
// ABOUTME: Save and load, expiry filtering, wrong keys, corrupt files and clearing

use dorxl_auth::{SessionCache, SessionSnapshot, TokenSet};
use dorxl_core::SubscriptionType;
use dorxl_security::TokenEncryption;
use tempfile::TempDir;

const NOW: i64 = 1_700_000_000;

fn snapshot(expires_at: i64) -> SessionSnapshot {
    SessionSnapshot {
        number: 62812345,
        subscriber_id: "S1".to_string(),
        subscription_type: SubscriptionType::Prepaid,
        tokens: TokenSet {
            access_token: "access-secret".to_string(),
            id_token: "id-secret".to_string(),
            refresh_token: "refresh-secret".to_string(),
            expires_at,
        },
        expires_at,
    }
}

fn cache_in(dir: &TempDir, key: u8) -> SessionCache {
    SessionCache::new(
        dir.path().join("nested").join("active_session.enc"),
        TokenEncryption::with_key(&[key; 32]).unwrap(),
    )
}

#[tokio::test]
async fn test_save_and_load_fresh() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir, 1);
    let saved = snapshot(NOW + 3540);

    cache.save(&saved).await.unwrap();

    assert_eq!(cache.load_fresh(NOW).await, Some(saved.clone()));
    assert_eq!(cache.load().await, Some(saved));
}

#[tokio::test]
async fn test_file_does_not_contain_plain_tokens() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir, 1);
    cache.save(&snapshot(NOW + 3540)).await.unwrap();

    let raw = std::fs::read_to_string(cache.path()).unwrap();
    assert!(!raw.contains("access-secret"));
    assert!(!raw.contains("refresh-secret"));
    assert!(TokenEncryption::is_encrypted(raw.trim()));
}

#[tokio::test]
async fn test_expired_snapshot_is_not_fresh() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir, 1);
    cache.save(&snapshot(NOW)).await.unwrap();

    assert_eq!(cache.load_fresh(NOW).await, None);
    assert_eq!(cache.load_fresh(NOW - 1).await.map(|s| s.number), Some(62812345));
}

#[tokio::test]
async fn test_missing_wrong_key_and_corrupt_files_read_as_absent() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir, 1);
    assert_eq!(cache.load().await, None);

    cache.save(&snapshot(NOW + 3540)).await.unwrap();
    let other_key = cache_in(&dir, 2);
    assert_eq!(other_key.load_fresh(NOW).await, None);

    std::fs::write(cache.path(), "not even base64 !!").unwrap();
    assert_eq!(cache.load_fresh(NOW).await, None);
}

#[tokio::test]
async fn test_clear_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir, 1);
    cache.save(&snapshot(NOW + 3540)).await.unwrap();

    cache.clear().await.unwrap();
    assert!(!cache.path().exists());
    cache.clear().await.unwrap();
    assert_eq!(cache.load().await, None);
}
