//! In-memory vault used by unit and integration tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::AppResult;
use crate::storage::models::{FileEntry, PasswordEntry, Priority, TaskEntry, TaskStatus, UserRecord, UserSettings};
use crate::storage::vault::{NewFile, NewPassword, NewTask, Vault};

/// HashMap-backed `Vault`. Same visible semantics as `PgVault` (ownership
/// scoping, newest-first listing, case-insensitive filters).
#[derive(Debug, Default)]
pub struct MemoryVault {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, UserRecord>,
    passwords: Vec<PasswordEntry>,
    tasks: Vec<TaskEntry>,
    files: Vec<FileEntry>,
    settings: HashMap<Uuid, UserSettings>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Vault for MemoryVault {
    async fn create_user(&self, telegram_id: i64, master_password_hash: &str) -> AppResult<UserRecord> {
        let user = UserRecord {
            id: Uuid::new_v4(),
            telegram_id,
            master_password_hash: master_password_hash.to_string(),
            created_at: Utc::now(),
        };
        let mut inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_telegram_id(&self, telegram_id: i64) -> AppResult<Option<UserRecord>> {
        let inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        Ok(inner.users.values().find(|u| u.telegram_id == telegram_id).cloned())
    }

    async fn update_master_password(&self, user_id: Uuid, new_hash: &str) -> AppResult<bool> {
        let mut inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        match inner.users.get_mut(&user_id) {
            Some(user) => {
                user.master_password_hash = new_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn save_password(&self, user_id: Uuid, entry: NewPassword) -> AppResult<PasswordEntry> {
        let record = PasswordEntry {
            id: Uuid::new_v4(),
            user_id,
            service_name: entry.service_name,
            encrypted_username: entry.encrypted_username,
            encrypted_password: entry.encrypted_password,
            tags: entry.tags,
            created_at: Utc::now(),
        };
        let mut inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        inner.passwords.push(record.clone());
        Ok(record)
    }

    async fn get_passwords(&self, user_id: Uuid, service_filter: Option<&str>) -> AppResult<Vec<PasswordEntry>> {
        let inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        let needle = service_filter.map(|s| s.to_lowercase());
        let mut results: Vec<_> = inner
            .passwords
            .iter()
            .filter(|p| p.user_id == user_id)
            .filter(|p| match &needle {
                Some(n) => p.service_name.to_lowercase().contains(n),
                None => true,
            })
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    async fn update_password_field(
        &self,
        password_id: Uuid,
        user_id: Uuid,
        field: &str,
        value: &str,
    ) -> AppResult<bool> {
        let mut inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        let entry = inner
            .passwords
            .iter_mut()
            .find(|p| p.id == password_id && p.user_id == user_id);
        let Some(entry) = entry else { return Ok(false) };
        match field {
            "service_name" => entry.service_name = value.to_string(),
            "encrypted_username" => entry.encrypted_username = value.to_string(),
            "encrypted_password" => entry.encrypted_password = value.to_string(),
            _ => return Ok(false),
        }
        Ok(true)
    }

    async fn delete_password(&self, password_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        let before = inner.passwords.len();
        inner.passwords.retain(|p| !(p.id == password_id && p.user_id == user_id));
        Ok(inner.passwords.len() < before)
    }

    async fn create_task(&self, user_id: Uuid, task: NewTask) -> AppResult<TaskEntry> {
        let record = TaskEntry {
            id: Uuid::new_v4(),
            user_id,
            encrypted_content: task.encrypted_content,
            priority: task.priority,
            status: TaskStatus::Pending,
            due_date: task.due_date,
            tags: task.tags,
            created_at: Utc::now(),
            completed_at: None,
        };
        let mut inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        inner.tasks.push(record.clone());
        Ok(record)
    }

    async fn get_tasks(&self, user_id: Uuid, status: Option<TaskStatus>) -> AppResult<Vec<TaskEntry>> {
        let inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        let mut results: Vec<_> = inner
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .filter(|t| status.map(|s| t.status == s).unwrap_or(true))
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    async fn update_task_status(&self, task_id: Uuid, user_id: Uuid, status: TaskStatus) -> AppResult<bool> {
        let mut inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        let task = inner.tasks.iter_mut().find(|t| t.id == task_id && t.user_id == user_id);
        match task {
            Some(task) => {
                task.status = status;
                task.completed_at = (status == TaskStatus::Completed).then(Utc::now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_task_content(&self, task_id: Uuid, user_id: Uuid, encrypted_content: &str) -> AppResult<bool> {
        let mut inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        let task = inner.tasks.iter_mut().find(|t| t.id == task_id && t.user_id == user_id);
        match task {
            Some(task) => {
                task.encrypted_content = encrypted_content.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_task_priority(&self, task_id: Uuid, user_id: Uuid, priority: Priority) -> AppResult<bool> {
        let mut inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        let task = inner.tasks.iter_mut().find(|t| t.id == task_id && t.user_id == user_id);
        match task {
            Some(task) => {
                task.priority = priority;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_task(&self, task_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        let before = inner.tasks.len();
        inner.tasks.retain(|t| !(t.id == task_id && t.user_id == user_id));
        Ok(inner.tasks.len() < before)
    }

    async fn save_file(&self, user_id: Uuid, file: NewFile) -> AppResult<FileEntry> {
        let record = FileEntry {
            id: Uuid::new_v4(),
            user_id,
            telegram_file_id: file.telegram_file_id,
            file_name: file.file_name,
            mime_type: file.mime_type,
            file_size: file.file_size,
            encrypted_description: file.encrypted_description,
            tags: file.tags,
            created_at: Utc::now(),
        };
        let mut inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        inner.files.push(record.clone());
        Ok(record)
    }

    async fn get_files(&self, user_id: Uuid, name_filter: Option<&str>) -> AppResult<Vec<FileEntry>> {
        let inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        let needle = name_filter.map(|s| s.to_lowercase());
        let mut results: Vec<_> = inner
            .files
            .iter()
            .filter(|f| f.user_id == user_id)
            .filter(|f| match &needle {
                Some(n) => f.file_name.to_lowercase().contains(n),
                None => true,
            })
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    async fn delete_file(&self, file_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        let before = inner.files.len();
        inner.files.retain(|f| !(f.id == file_id && f.user_id == user_id));
        Ok(inner.files.len() < before)
    }

    async fn get_user_settings(&self, user_id: Uuid) -> AppResult<UserSettings> {
        let inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        Ok(inner.settings.get(&user_id).cloned().unwrap_or_default())
    }

    async fn update_user_settings(&self, user_id: Uuid, settings: &UserSettings) -> AppResult<()> {
        let mut inner = self.inner.lock().map_err(|_| "vault lock poisoned".to_string())?;
        inner.settings.insert(user_id, settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::Priority;
    use pretty_assertions::assert_eq;

    fn new_password(service: &str) -> NewPassword {
        NewPassword {
            service_name: service.to_string(),
            encrypted_username: "enc-user".to_string(),
            encrypted_password: "enc-pass".to_string(),
            tags: vec!["work".to_string()],
        }
    }

    #[tokio::test]
    async fn test_passwords_are_scoped_by_user() {
        let vault = MemoryVault::new();
        let alice = vault.create_user(1, "hash-a").await.unwrap();
        let bob = vault.create_user(2, "hash-b").await.unwrap();

        vault.save_password(alice.id, new_password("GitHub")).await.unwrap();

        assert_eq!(vault.get_passwords(alice.id, None).await.unwrap().len(), 1);
        assert_eq!(vault.get_passwords(bob.id, None).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_service_filter_is_case_insensitive_substring() {
        let vault = MemoryVault::new();
        let user = vault.create_user(1, "hash").await.unwrap();
        vault.save_password(user.id, new_password("GitHub")).await.unwrap();
        vault.save_password(user.id, new_password("Gmail")).await.unwrap();

        let hits = vault.get_passwords(user.id, Some("git")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].service_name, "GitHub");
    }

    #[tokio::test]
    async fn test_delete_requires_matching_owner() {
        let vault = MemoryVault::new();
        let alice = vault.create_user(1, "hash-a").await.unwrap();
        let bob = vault.create_user(2, "hash-b").await.unwrap();
        let entry = vault.save_password(alice.id, new_password("GitHub")).await.unwrap();

        // Bob cannot delete Alice's entry
        assert!(!vault.delete_password(entry.id, bob.id).await.unwrap());
        assert!(vault.delete_password(entry.id, alice.id).await.unwrap());
        // Second delete finds nothing
        assert!(!vault.delete_password(entry.id, alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_completing_a_task_stamps_completed_at() {
        let vault = MemoryVault::new();
        let user = vault.create_user(1, "hash").await.unwrap();
        let task = vault
            .create_task(
                user.id,
                NewTask {
                    encrypted_content: "enc".to_string(),
                    priority: Priority::Medium,
                    due_date: None,
                    tags: vec![],
                },
            )
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Pending);

        vault.update_task_status(task.id, user.id, TaskStatus::Completed).await.unwrap();
        let tasks = vault.get_tasks(user.id, Some(TaskStatus::Completed)).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].completed_at.is_some());
    }

    #[tokio::test]
    async fn test_settings_default_until_written() {
        let vault = MemoryVault::new();
        let user = vault.create_user(1, "hash").await.unwrap();

        let mut settings = vault.get_user_settings(user.id).await.unwrap();
        assert_eq!(settings, UserSettings::default());

        settings.weekly_summary = true;
        vault.update_user_settings(user.id, &settings).await.unwrap();
        assert!(vault.get_user_settings(user.id).await.unwrap().weekly_summary);
    }
}
