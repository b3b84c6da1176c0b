// ABOUTME: Persistence backends for the dorxl account list and active-account pointer
// ABOUTME: In-memory, JSON file and encrypted SQLite implementations of AccountStore

pub mod error;
pub mod json_file;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::AccountStore;
