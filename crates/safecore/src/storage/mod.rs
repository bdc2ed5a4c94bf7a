//! Vault storage — models, persistence trait, and backends

pub mod memory;
pub mod models;
pub mod postgres;
pub mod vault;

// Re-exports for convenience
pub use memory::MemoryVault;
pub use models::{
    FileCategory, FileEntry, PasswordEntry, Priority, TaskEntry, TaskStatus, UserRecord, UserSettings,
};
pub use postgres::PgVault;
pub use vault::Vault;
