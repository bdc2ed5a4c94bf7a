//! Vault record types shared between the bot and the storage backends.
//!
//! Sensitive fields (stored usernames, stored passwords, task content, file
//! descriptions) are kept encrypted at rest; the `encrypted_*` naming marks
//! every field that must pass through the crypto service before display.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered bot user. The master password is stored only as a salted
/// hash; field-level encryption is keyed separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub telegram_id: i64,
    pub master_password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// One stored credential for an external service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_name: String,
    pub encrypted_username: String,
    pub encrypted_password: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Task priority level. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Priority::Low => "🔵",
            Priority::Medium => "🟡",
            Priority::High => "🔴",
        }
    }
}

/// Task lifecycle status. Stored as snake_case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

/// One task. Content is encrypted at rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub encrypted_content: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Coarse file categories used for list filters and display icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Document,
}

impl FileCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
            FileCategory::Document => "document",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(FileCategory::Image),
            "video" => Some(FileCategory::Video),
            "audio" => Some(FileCategory::Audio),
            "document" => Some(FileCategory::Document),
            _ => None,
        }
    }

    /// Categorizes a MIME type the way the list filters expect.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image/") {
            FileCategory::Image
        } else if mime.starts_with("video/") {
            FileCategory::Video
        } else if mime.starts_with("audio/") {
            FileCategory::Audio
        } else {
            FileCategory::Document
        }
    }
}

/// Stored file metadata. The bytes themselves stay on Telegram's servers;
/// we keep the file id plus an encrypted description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Telegram file id used to re-send the file on download/share
    pub telegram_file_id: String,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: i64,
    pub encrypted_description: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl FileEntry {
    pub fn category(&self) -> FileCategory {
        FileCategory::from_mime(&self.mime_type)
    }
}

/// Per-user preferences, stored as one JSONB blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub auto_lock_minutes: u64,
    pub task_reminders: bool,
    pub weekly_summary: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            auto_lock_minutes: crate::config::session::DEFAULT_AUTO_LOCK_MINUTES,
            task_reminders: true,
            weekly_summary: false,
        }
    }
}

impl UserSettings {
    /// Next auto-lock duration in the 15 → 30 → 60 → 120 cycle.
    pub fn cycle_auto_lock(&mut self) {
        let choices = crate::config::session::AUTO_LOCK_CHOICES;
        let next = choices
            .iter()
            .position(|&m| m == self.auto_lock_minutes)
            .map(|i| choices[(i + 1) % choices.len()])
            .unwrap_or(crate::config::session::DEFAULT_AUTO_LOCK_MINUTES);
        self.auto_lock_minutes = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_priority_round_trip() {
        for p in [Priority::Low, Priority::Medium, Priority::High] {
            assert_eq!(Priority::parse(p.as_str()), Some(p));
        }
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn test_task_status_round_trip() {
        for s in [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed] {
            assert_eq!(TaskStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(TaskStatus::parse("done"), None);
    }

    #[test]
    fn test_file_category_from_mime() {
        let cases = vec![
            ("image/jpeg", FileCategory::Image),
            ("video/mp4", FileCategory::Video),
            ("audio/ogg", FileCategory::Audio),
            ("application/pdf", FileCategory::Document),
            ("text/plain", FileCategory::Document),
        ];
        for (mime, expected) in cases {
            assert_eq!(FileCategory::from_mime(mime), expected, "failed for: {}", mime);
        }
    }

    #[test]
    fn test_auto_lock_cycle() {
        let mut settings = UserSettings::default();
        assert_eq!(settings.auto_lock_minutes, 60);
        settings.cycle_auto_lock();
        assert_eq!(settings.auto_lock_minutes, 120);
        settings.cycle_auto_lock();
        assert_eq!(settings.auto_lock_minutes, 15);
        // Unknown stored value falls back to the default
        settings.auto_lock_minutes = 45;
        settings.cycle_auto_lock();
        assert_eq!(settings.auto_lock_minutes, 60);
    }
}
