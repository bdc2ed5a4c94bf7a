//! Postgres vault backend (sqlx).
//!
//! The original deployment talks to a hosted Postgres instance; the pool is
//! created once at startup and shared. Schema bootstrap runs on connect so a
//! fresh database works without a separate migration step.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::storage::models::{FileEntry, PasswordEntry, Priority, TaskEntry, TaskStatus, UserRecord, UserSettings};
use crate::storage::vault::{NewFile, NewPassword, NewTask, Vault};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    telegram_id BIGINT NOT NULL UNIQUE,
    master_password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS passwords (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    service_name TEXT NOT NULL,
    encrypted_username TEXT NOT NULL DEFAULT '',
    encrypted_password TEXT NOT NULL,
    tags TEXT[] NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_passwords_user_id ON passwords(user_id);

CREATE TABLE IF NOT EXISTS tasks (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    encrypted_content TEXT NOT NULL,
    priority TEXT NOT NULL DEFAULT 'medium',
    status TEXT NOT NULL DEFAULT 'pending',
    due_date DATE,
    tags TEXT[] NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    completed_at TIMESTAMPTZ
);
CREATE INDEX IF NOT EXISTS idx_tasks_user_id ON tasks(user_id);

CREATE TABLE IF NOT EXISTS files (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    telegram_file_id TEXT NOT NULL,
    file_name TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    file_size BIGINT NOT NULL DEFAULT 0,
    encrypted_description TEXT NOT NULL DEFAULT '',
    tags TEXT[] NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_files_user_id ON files(user_id);

CREATE TABLE IF NOT EXISTS user_settings (
    user_id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    settings JSONB NOT NULL DEFAULT '{}'::jsonb
);
"#;

/// sqlx-backed `Vault` implementation.
#[derive(Debug, Clone)]
pub struct PgVault {
    pool: PgPool,
}

impl PgVault {
    /// Connects to the database and ensures the schema exists.
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
        for statement in SCHEMA.split(';') {
            let statement = statement.trim();
            if !statement.is_empty() {
                sqlx::query(statement).execute(&pool).await?;
            }
        }
        log::info!("Database connection established");
        Ok(Self { pool })
    }

    /// Wraps an existing pool (used by tests against a scratch database).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<UserRecord, sqlx::Error> {
    Ok(UserRecord {
        id: row.try_get("id")?,
        telegram_id: row.try_get("telegram_id")?,
        master_password_hash: row.try_get("master_password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

fn password_from_row(row: &PgRow) -> Result<PasswordEntry, sqlx::Error> {
    Ok(PasswordEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        service_name: row.try_get("service_name")?,
        encrypted_username: row.try_get("encrypted_username")?,
        encrypted_password: row.try_get("encrypted_password")?,
        tags: row.try_get("tags")?,
        created_at: row.try_get("created_at")?,
    })
}

fn task_from_row(row: &PgRow) -> Result<TaskEntry, sqlx::Error> {
    let priority: String = row.try_get("priority")?;
    let status: String = row.try_get("status")?;
    Ok(TaskEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        encrypted_content: row.try_get("encrypted_content")?,
        priority: Priority::parse(&priority).unwrap_or(Priority::Medium),
        status: TaskStatus::parse(&status).unwrap_or(TaskStatus::Pending),
        due_date: row.try_get("due_date")?,
        tags: row.try_get("tags")?,
        created_at: row.try_get("created_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

fn file_from_row(row: &PgRow) -> Result<FileEntry, sqlx::Error> {
    Ok(FileEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        telegram_file_id: row.try_get("telegram_file_id")?,
        file_name: row.try_get("file_name")?,
        mime_type: row.try_get("mime_type")?,
        file_size: row.try_get("file_size")?,
        encrypted_description: row.try_get("encrypted_description")?,
        tags: row.try_get("tags")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl Vault for PgVault {
    async fn create_user(&self, telegram_id: i64, master_password_hash: &str) -> AppResult<UserRecord> {
        let row = sqlx::query(
            "INSERT INTO users (telegram_id, master_password_hash) VALUES ($1, $2) \
             RETURNING id, telegram_id, master_password_hash, created_at",
        )
        .bind(telegram_id)
        .bind(master_password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user_from_row(&row)?)
    }

    async fn get_user_by_telegram_id(&self, telegram_id: i64) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, telegram_id, master_password_hash, created_at FROM users WHERE telegram_id = $1",
        )
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(user_from_row).transpose().map_err(AppError::from)
    }

    async fn update_master_password(&self, user_id: Uuid, new_hash: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET master_password_hash = $1 WHERE id = $2")
            .bind(new_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_password(&self, user_id: Uuid, entry: NewPassword) -> AppResult<PasswordEntry> {
        let row = sqlx::query(
            "INSERT INTO passwords (user_id, service_name, encrypted_username, encrypted_password, tags) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, service_name, encrypted_username, encrypted_password, tags, created_at",
        )
        .bind(user_id)
        .bind(&entry.service_name)
        .bind(&entry.encrypted_username)
        .bind(&entry.encrypted_password)
        .bind(&entry.tags)
        .fetch_one(&self.pool)
        .await?;
        Ok(password_from_row(&row)?)
    }

    async fn get_passwords(&self, user_id: Uuid, service_filter: Option<&str>) -> AppResult<Vec<PasswordEntry>> {
        let rows = match service_filter {
            Some(filter) => {
                sqlx::query(
                    "SELECT id, user_id, service_name, encrypted_username, encrypted_password, tags, created_at \
                     FROM passwords WHERE user_id = $1 AND service_name ILIKE $2 ORDER BY created_at DESC",
                )
                .bind(user_id)
                .bind(format!("%{}%", filter))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, user_id, service_name, encrypted_username, encrypted_password, tags, created_at \
                     FROM passwords WHERE user_id = $1 ORDER BY created_at DESC",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.iter().map(password_from_row).collect::<Result<_, _>>().map_err(AppError::from)
    }

    async fn update_password_field(
        &self,
        password_id: Uuid,
        user_id: Uuid,
        field: &str,
        value: &str,
    ) -> AppResult<bool> {
        // Column name comes from a fixed whitelist, never from user input.
        let query = match field {
            "service_name" => "UPDATE passwords SET service_name = $1 WHERE id = $2 AND user_id = $3",
            "encrypted_username" => "UPDATE passwords SET encrypted_username = $1 WHERE id = $2 AND user_id = $3",
            "encrypted_password" => "UPDATE passwords SET encrypted_password = $1 WHERE id = $2 AND user_id = $3",
            _ => return Ok(false),
        };
        let result = sqlx::query(query)
            .bind(value)
            .bind(password_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_password(&self, password_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM passwords WHERE id = $1 AND user_id = $2")
            .bind(password_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_task(&self, user_id: Uuid, task: NewTask) -> AppResult<TaskEntry> {
        let row = sqlx::query(
            "INSERT INTO tasks (user_id, encrypted_content, priority, due_date, tags) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, encrypted_content, priority, status, due_date, tags, created_at, completed_at",
        )
        .bind(user_id)
        .bind(&task.encrypted_content)
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(&task.tags)
        .fetch_one(&self.pool)
        .await?;
        Ok(task_from_row(&row)?)
    }

    async fn get_tasks(&self, user_id: Uuid, status: Option<TaskStatus>) -> AppResult<Vec<TaskEntry>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    "SELECT id, user_id, encrypted_content, priority, status, due_date, tags, created_at, completed_at \
                     FROM tasks WHERE user_id = $1 AND status = $2 ORDER BY created_at DESC",
                )
                .bind(user_id)
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, user_id, encrypted_content, priority, status, due_date, tags, created_at, completed_at \
                     FROM tasks WHERE user_id = $1 ORDER BY created_at DESC",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.iter().map(task_from_row).collect::<Result<_, _>>().map_err(AppError::from)
    }

    async fn update_task_status(&self, task_id: Uuid, user_id: Uuid, status: TaskStatus) -> AppResult<bool> {
        let completed_at = (status == TaskStatus::Completed).then(Utc::now);
        let result = sqlx::query(
            "UPDATE tasks SET status = $1, completed_at = $2 WHERE id = $3 AND user_id = $4",
        )
        .bind(status.as_str())
        .bind(completed_at)
        .bind(task_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_task_content(&self, task_id: Uuid, user_id: Uuid, encrypted_content: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE tasks SET encrypted_content = $1 WHERE id = $2 AND user_id = $3")
            .bind(encrypted_content)
            .bind(task_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_task_priority(&self, task_id: Uuid, user_id: Uuid, priority: Priority) -> AppResult<bool> {
        let result = sqlx::query("UPDATE tasks SET priority = $1 WHERE id = $2 AND user_id = $3")
            .bind(priority.as_str())
            .bind(task_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_task(&self, task_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_file(&self, user_id: Uuid, file: NewFile) -> AppResult<FileEntry> {
        let row = sqlx::query(
            "INSERT INTO files (user_id, telegram_file_id, file_name, mime_type, file_size, encrypted_description, tags) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, user_id, telegram_file_id, file_name, mime_type, file_size, encrypted_description, tags, created_at",
        )
        .bind(user_id)
        .bind(&file.telegram_file_id)
        .bind(&file.file_name)
        .bind(&file.mime_type)
        .bind(file.file_size)
        .bind(&file.encrypted_description)
        .bind(&file.tags)
        .fetch_one(&self.pool)
        .await?;
        Ok(file_from_row(&row)?)
    }

    async fn get_files(&self, user_id: Uuid, name_filter: Option<&str>) -> AppResult<Vec<FileEntry>> {
        let rows = match name_filter {
            Some(filter) => {
                sqlx::query(
                    "SELECT id, user_id, telegram_file_id, file_name, mime_type, file_size, encrypted_description, tags, created_at \
                     FROM files WHERE user_id = $1 AND file_name ILIKE $2 ORDER BY created_at DESC",
                )
                .bind(user_id)
                .bind(format!("%{}%", filter))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, user_id, telegram_file_id, file_name, mime_type, file_size, encrypted_description, tags, created_at \
                     FROM files WHERE user_id = $1 ORDER BY created_at DESC",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.iter().map(file_from_row).collect::<Result<_, _>>().map_err(AppError::from)
    }

    async fn delete_file(&self, file_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1 AND user_id = $2")
            .bind(file_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_user_settings(&self, user_id: Uuid) -> AppResult<UserSettings> {
        let row = sqlx::query("SELECT settings FROM user_settings WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(UserSettings::default());
        };
        let value: serde_json::Value = row.try_get("settings").map_err(AppError::from)?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    async fn update_user_settings(&self, user_id: Uuid, settings: &UserSettings) -> AppResult<()> {
        let value = serde_json::to_value(settings)
            .map_err(|e| AppError::Validation(format!("settings serialization failed: {}", e)))?;
        sqlx::query(
            "INSERT INTO user_settings (user_id, settings) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET settings = EXCLUDED.settings",
        )
        .bind(user_id)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
