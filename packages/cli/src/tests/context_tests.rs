use crate::context::{open_store, parse_linked_number, parse_number, StoreKind};
use crate::error::CliError;
use dorxl_config::constants::{DORXL_DATA_DIR, DORXL_STORE};
use dorxl_core::AccountEntry;
use dorxl_storage::AccountStore;
use serial_test::serial;
use std::env;
use tempfile::TempDir;

#[test]
fn test_store_kind_parsing() {
    assert_eq!("sqlite".parse::<StoreKind>().unwrap(), StoreKind::Sqlite);
    assert_eq!(" JSON ".parse::<StoreKind>().unwrap(), StoreKind::Json);
    assert_eq!("memory".parse::<StoreKind>().unwrap(), StoreKind::Memory);
    assert!(matches!(
        "redis".parse::<StoreKind>(),
        Err(CliError::UnknownStore(_))
    ));
}

#[test]
#[serial]
fn test_store_kind_from_env() {
    env::remove_var(DORXL_STORE);
    assert_eq!(StoreKind::from_env(), StoreKind::Sqlite);

    env::set_var(DORXL_STORE, "json");
    assert_eq!(StoreKind::from_env(), StoreKind::Json);

    env::set_var(DORXL_STORE, "nonsense");
    assert_eq!(StoreKind::from_env(), StoreKind::Sqlite);

    env::remove_var(DORXL_STORE);
}

#[test]
fn test_parse_number() {
    assert_eq!(parse_number(" 6281234567890 ").unwrap(), 6281234567890);
    assert!(matches!(
        parse_number("081234567890"),
        Err(CliError::InvalidNumber(_))
    ));
    assert!(parse_number("628123").is_err());
    assert!(parse_number("62812345678901234").is_err());
}

#[test]
fn test_parse_linked_number_accepts_any_digits() {
    // Legacy stores may hold local-format or short numbers
    assert_eq!(parse_linked_number(" 81234567890 ").unwrap(), 81234567890);
    assert_eq!(parse_linked_number("628123").unwrap(), 628123);
    assert!(matches!(
        parse_linked_number("0812-345"),
        Err(CliError::NotANumber(_))
    ));
    assert!(parse_linked_number("").is_err());
}

#[tokio::test]
#[serial]
async fn test_json_store_lives_in_data_dir() {
    let dir = TempDir::new().unwrap();
    env::set_var(DORXL_DATA_DIR, dir.path());

    let store = open_store(StoreKind::Json, None).await;
    store
        .replace_account_list(&[AccountEntry::new(6281234567890, "rt")])
        .await
        .unwrap();

    assert_eq!(store.backend_name(), "json");
    assert!(dir.path().join("local_store.json").exists());
    env::remove_var(DORXL_DATA_DIR);
}

#[tokio::test]
#[serial]
async fn test_sqlite_without_key_falls_back_to_json() {
    let dir = TempDir::new().unwrap();
    env::set_var(DORXL_DATA_DIR, dir.path());

    let store = open_store(StoreKind::Sqlite, None).await;

    assert_eq!(store.backend_name(), "json");
    env::remove_var(DORXL_DATA_DIR);
}
