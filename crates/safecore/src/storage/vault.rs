//! The `Vault` persistence contract.
//!
//! Mirrors the narrow surface the handlers actually need: user lookup,
//! per-record CRUD scoped by owning user, and the settings blob. Handlers
//! call the vault only at scene completion or for read-only listing — no
//! transaction ever spans wizard steps.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::AppResult;
use crate::storage::models::{FileEntry, PasswordEntry, Priority, TaskEntry, TaskStatus, UserRecord, UserSettings};

/// Fields for a new password entry, collected by the save-password wizard.
#[derive(Debug, Clone)]
pub struct NewPassword {
    pub service_name: String,
    pub encrypted_username: String,
    pub encrypted_password: String,
    pub tags: Vec<String>,
}

/// Fields for a new task, collected by the add-task wizard.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub encrypted_content: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
}

/// Fields for a new file entry, captured from an uploaded message.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub telegram_file_id: String,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: i64,
    pub encrypted_description: String,
    pub tags: Vec<String>,
}

/// Persistence collaborator for all durable user data.
///
/// Delete/update operations take the owning user's id and affect only that
/// user's records; they return `false` when nothing matched.
#[async_trait]
pub trait Vault: Send + Sync {
    // ==================== Users ====================

    async fn create_user(&self, telegram_id: i64, master_password_hash: &str) -> AppResult<UserRecord>;

    async fn get_user_by_telegram_id(&self, telegram_id: i64) -> AppResult<Option<UserRecord>>;

    async fn update_master_password(&self, user_id: Uuid, new_hash: &str) -> AppResult<bool>;

    // ==================== Passwords ====================

    async fn save_password(&self, user_id: Uuid, entry: NewPassword) -> AppResult<PasswordEntry>;

    /// Lists entries newest-first; `service_filter` is a case-insensitive
    /// substring match on the service name.
    async fn get_passwords(&self, user_id: Uuid, service_filter: Option<&str>) -> AppResult<Vec<PasswordEntry>>;

    async fn update_password_field(
        &self,
        password_id: Uuid,
        user_id: Uuid,
        field: &str,
        value: &str,
    ) -> AppResult<bool>;

    async fn delete_password(&self, password_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    // ==================== Tasks ====================

    async fn create_task(&self, user_id: Uuid, task: NewTask) -> AppResult<TaskEntry>;

    async fn get_tasks(&self, user_id: Uuid, status: Option<TaskStatus>) -> AppResult<Vec<TaskEntry>>;

    async fn update_task_status(&self, task_id: Uuid, user_id: Uuid, status: TaskStatus) -> AppResult<bool>;

    async fn update_task_content(&self, task_id: Uuid, user_id: Uuid, encrypted_content: &str) -> AppResult<bool>;

    async fn update_task_priority(&self, task_id: Uuid, user_id: Uuid, priority: Priority) -> AppResult<bool>;

    async fn delete_task(&self, task_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    // ==================== Files ====================

    async fn save_file(&self, user_id: Uuid, file: NewFile) -> AppResult<FileEntry>;

    async fn get_files(&self, user_id: Uuid, name_filter: Option<&str>) -> AppResult<Vec<FileEntry>>;

    async fn delete_file(&self, file_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    // ==================== Settings ====================

    async fn get_user_settings(&self, user_id: Uuid) -> AppResult<UserSettings>;

    async fn update_user_settings(&self, user_id: Uuid, settings: &UserSettings) -> AppResult<()>;
}
