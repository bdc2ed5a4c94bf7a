//! Message formatting for lists, detail cards, and static texts.
//!
//! Everything renders as MarkdownV2, so dynamic content is escaped with
//! [`markdown::escape`] and static literals escape their own punctuation.

use chrono::{DateTime, NaiveDate, Utc};
use safecore::storage::{FileEntry, PasswordEntry, TaskEntry, TaskStatus};

use super::markdown;

/// Formats a datetime for display.
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    markdown::escape(&dt.format("%Y-%m-%d %H:%M").to_string())
}

/// Formats a date for display.
pub fn format_date(date: NaiveDate) -> String {
    markdown::escape(&date.format("%Y-%m-%d").to_string())
}

/// Formats a byte count in human-readable units.
pub fn format_file_size(size_bytes: i64) -> String {
    let mut size = size_bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} TB", size)
}

/// Picks a display emoji for a MIME type.
pub fn file_emoji(mime_type: &str) -> &'static str {
    if mime_type.contains("image") {
        "🖼️"
    } else if mime_type.contains("video") {
        "🎥"
    } else if mime_type.contains("audio") {
        "🎵"
    } else if mime_type.contains("pdf") {
        "📄"
    } else if mime_type.contains("document") || mime_type.contains("text") {
        "📝"
    } else if mime_type.contains("zip") || mime_type.contains("archive") {
        "📦"
    } else {
        "📎"
    }
}

fn format_tags(tags: &[String]) -> String {
    markdown::escape(&tags.join(", "))
}

// ==================== Passwords ====================

/// Password list (one page of entries).
pub fn format_password_list(passwords: &[PasswordEntry], total: usize) -> String {
    if passwords.is_empty() {
        return "🔐 You have no saved passwords\\.".to_string();
    }

    let mut message = format!("🔐 *Your Saved Passwords* \\({} total\\)\n\n", total);
    for (i, entry) in passwords.iter().enumerate() {
        message.push_str(&format!("{}\\. *{}*\n", i + 1, markdown::escape(&entry.service_name)));
        if !entry.tags.is_empty() {
            message.push_str(&format!("   Tags: {}\n", format_tags(&entry.tags)));
        }
        message.push_str(&format!("   ID: `{}`\n", entry.id));
        message.push_str(&format!("   Created: {}\n\n", format_datetime(entry.created_at)));
    }
    message
}

/// Password detail card with the decrypted secret fields.
pub fn format_password_details(entry: &PasswordEntry, username: &str, password: &str) -> String {
    let shown_username = if username.is_empty() { "N/A" } else { username };
    let mut message = format!("🔐 *{}*\n\n", markdown::escape(&entry.service_name));
    message.push_str(&format!("👤 Username: `{}`\n", markdown::escape(shown_username)));
    message.push_str(&format!("🔑 Password: `{}`\n\n", markdown::escape(password)));
    if !entry.tags.is_empty() {
        message.push_str(&format!("🏷️ Tags: {}\n", format_tags(&entry.tags)));
    }
    message.push_str("\n⚠️ This message will be deleted in 60 seconds for security\\.");
    message
}

// ==================== Tasks ====================

fn priority_emoji(task: &TaskEntry) -> &'static str {
    task.priority.emoji()
}

/// One task line: priority dot, decrypted content, id, optional due date.
pub fn format_task_item(task: &TaskEntry, content: &str) -> String {
    let mut item = format!("{} {}\n   ID: `{}`", priority_emoji(task), markdown::escape(content), task.id);
    if let Some(due) = task.due_date {
        item.push_str(&format!(" \\| Due: {}", format_date(due)));
    }
    item.push('\n');
    item
}

/// Task list grouped by status. `tasks` pairs each entry with its decrypted
/// content.
pub fn format_task_list(tasks: &[(TaskEntry, String)]) -> String {
    if tasks.is_empty() {
        return "✅ You have no tasks\\.".to_string();
    }

    let mut message = format!("✅ *Your Tasks* \\({} total\\)\n\n", tasks.len());

    let sections = [
        (TaskStatus::Pending, "📋 *Pending*"),
        (TaskStatus::InProgress, "🔄 *In Progress*"),
        (TaskStatus::Completed, "✔️ *Completed*"),
    ];
    for (status, header) in sections {
        let group: Vec<_> = tasks.iter().filter(|(t, _)| t.status == status).collect();
        if group.is_empty() {
            continue;
        }
        message.push_str(header);
        message.push('\n');
        let shown = if status == TaskStatus::Completed {
            safecore::config::pagination::COMPLETED_TASKS_SHOWN
        } else {
            group.len()
        };
        for (task, content) in group.iter().take(shown) {
            message.push_str(&format_task_item(task, content));
        }
        if group.len() > shown {
            message.push_str(&format!("   \\.\\.\\. and {} more\n", group.len() - shown));
        }
        message.push('\n');
    }
    message
}

/// Task detail card.
pub fn format_task_details(task: &TaskEntry, content: &str) -> String {
    let status_icon = if task.status == TaskStatus::Completed { "✅" } else { "📋" };
    let status_name = match task.status {
        TaskStatus::Pending => "Pending",
        TaskStatus::InProgress => "In Progress",
        TaskStatus::Completed => "Completed",
    };
    let priority_name = match task.priority {
        safecore::storage::Priority::Low => "Low",
        safecore::storage::Priority::Medium => "Medium",
        safecore::storage::Priority::High => "High",
    };

    let mut message = format!("{} *Task Details*\n\n", status_icon);
    message.push_str(&format!("📝 *Content*: {}\n", markdown::escape(content)));
    message.push_str(&format!("⚡ *Priority*: {} {}\n", priority_emoji(task), priority_name));
    message.push_str(&format!("📊 *Status*: {}\n", status_name));
    if let Some(due) = task.due_date {
        message.push_str(&format!("📅 *Due*: {}\n", format_date(due)));
    }
    if !task.tags.is_empty() {
        message.push_str(&format!("🏷️ *Tags*: {}\n", format_tags(&task.tags)));
    }
    message.push_str(&format!("\n🕒 Created: {}\n", format_datetime(task.created_at)));
    message
}

// ==================== Files ====================

/// File list (one page of entries).
pub fn format_file_list(files: &[FileEntry], total: usize, filter_label: Option<&str>) -> String {
    let filter_text = filter_label
        .map(|f| format!(" \\({}\\)", markdown::escape(f)))
        .unwrap_or_default();
    if files.is_empty() {
        return format!(
            "📁 *No files found{}\\.*\n\nSend any file to the bot to save it\\!",
            filter_text
        );
    }

    let mut message = format!("📁 *Your Files*{} \\({} total\\)\n\n", filter_text, total);
    for (i, file) in files.iter().enumerate() {
        message.push_str(&format!(
            "{}\\. {} *{}* \\({}\\)\n",
            i + 1,
            file_emoji(&file.mime_type),
            markdown::escape(&file.file_name),
            markdown::escape(&format_file_size(file.file_size)),
        ));
        if !file.tags.is_empty() {
            message.push_str(&format!("   Tags: {}\n", format_tags(&file.tags)));
        }
        message.push_str(&format!("   ID: `{}`\n\n", file.id));
    }
    message
}

/// File detail card with the decrypted description.
pub fn format_file_details(file: &FileEntry, description: &str) -> String {
    let mut message = format!("{} *File Details*\n\n", file_emoji(&file.mime_type));
    message.push_str(&format!("📄 *Name*: `{}`\n", markdown::escape(&file.file_name)));
    message.push_str(&format!(
        "📦 *Size*: {}\n",
        markdown::escape(&format_file_size(file.file_size))
    ));
    message.push_str(&format!("📎 *Type*: {}\n", markdown::escape(&file.mime_type)));
    if !description.is_empty() {
        message.push_str(&format!("\n📝 *Description*: {}\n", markdown::escape(description)));
    }
    if !file.tags.is_empty() {
        message.push_str(&format!("\n🏷️ *Tags*: {}\n", format_tags(&file.tags)));
    }
    message.push_str(&format!("\n🕒 Uploaded: {}\n", format_datetime(file.created_at)));
    message
}

// ==================== Static texts ====================

/// Welcome text for brand-new users.
pub fn welcome_message(user_name: &str) -> String {
    format!(
        "👋 *Welcome to QuikSafe Bot, {}\\!*\n\n\
         I'm your secure personal assistant for managing:\n\
         🔐 Passwords\n\
         ✅ Tasks\n\
         📁 Files\n\n\
         *Getting Started:*\n\
         1\\. Set up your master password \\(required for security\\)\n\
         2\\. Start saving your data securely\n\n\
         Let's get started\\! Please create a master password to secure your data\\.",
        markdown::escape(user_name)
    )
}

/// Master-password requirements prompt for registration.
pub fn master_password_rules() -> String {
    "🔐 *Create Your Master Password*\n\n\
     Your master password must:\n\
     • Be at least 8 characters long\n\
     • Contain uppercase and lowercase letters\n\
     • Contain at least one number\n\
     • Contain at least one special character \\(\\!@\\#$%^&\\*\\)\n\n\
     ⚠️ *Important:* This password cannot be recovered if lost\\!\n\n\
     Please enter your master password:"
        .to_string()
}

/// /help text.
pub fn help_message() -> String {
    "📖 *QuikSafe Bot \\- Help*\n\n\
     *Password Management* 🔐\n\
     /savepassword \\- Save a new password\n\
     /getpassword service \\- Retrieve a password\n\
     /listpasswords \\- List all saved passwords\n\
     /deletepassword id \\- Delete a password\n\n\
     *Task Management* ✅\n\
     /addtask \\- Create a new task\n\
     /listtasks \\- View all tasks\n\
     /completetask id \\- Mark task as complete\n\
     /deletetask id \\- Delete a task\n\n\
     *File Management* 📁\n\
     Send any file to save it\n\
     /listfiles \\- List all saved files\n\n\
     *AI Features* 🤖\n\
     /search query \\- Smart search across all data\n\
     /summarize \\- Get AI summary of your tasks\n\n\
     *Other Commands*\n\
     /settings \\- Open settings\n\
     /cancel \\- Cancel the current wizard\n\
     /help \\- Show this help message\n\
     /start \\- Restart the bot\n\n\
     💡 *Tips:*\n\
     • Use tags \\(e\\.g\\. \\#work \\#important\\) to organize your data\n\
     • All sensitive data is encrypted with AES\\-256\n\
     • Your master password is never stored in plaintext"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn password_entry(service: &str, tags: Vec<String>) -> PasswordEntry {
        PasswordEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            service_name: service.to_string(),
            encrypted_username: String::new(),
            encrypted_password: "enc".to_string(),
            tags,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_file_size_units() {
        let cases = vec![
            (512, "512.0 B"),
            (2048, "2.0 KB"),
            (5 * 1024 * 1024, "5.0 MB"),
            (3 * 1024 * 1024 * 1024, "3.0 GB"),
        ];
        for (bytes, expected) in cases {
            assert_eq!(format_file_size(bytes), expected, "failed for: {}", bytes);
        }
    }

    #[test]
    fn test_password_list_escapes_service_names() {
        let entries = vec![password_entry("my.bank (new)", vec!["work".to_string()])];
        let message = format_password_list(&entries, 1);
        assert!(message.contains("my\\.bank \\(new\\)"));
        assert!(message.contains("Tags: work"));
    }

    #[test]
    fn test_empty_lists_have_friendly_text() {
        assert!(format_password_list(&[], 0).contains("no saved passwords"));
        assert!(format_task_list(&[]).contains("no tasks"));
        assert!(format_file_list(&[], 0, None).contains("No files found"));
    }

    #[test]
    fn test_password_details_warns_about_self_destruct() {
        let entry = password_entry("GitHub", vec![]);
        let message = format_password_details(&entry, "alice", "hunter2");
        assert!(message.contains("`alice`"));
        assert!(message.contains("`hunter2`"));
        assert!(message.contains("deleted in 60 seconds"));
    }

    #[test]
    fn test_task_list_groups_by_status() {
        use safecore::storage::Priority;
        let make = |status| TaskEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            encrypted_content: String::new(),
            priority: Priority::High,
            status,
            due_date: None,
            tags: vec![],
            created_at: Utc::now(),
            completed_at: None,
        };
        let tasks = vec![
            (make(TaskStatus::Pending), "write report".to_string()),
            (make(TaskStatus::Completed), "call dentist".to_string()),
        ];
        let message = format_task_list(&tasks);
        assert!(message.contains("*Pending*"));
        assert!(message.contains("*Completed*"));
        assert!(!message.contains("*In Progress*"));
        assert!(message.contains("write report"));
    }

    #[test]
    fn test_file_emoji_by_mime() {
        assert_eq!(file_emoji("image/png"), "🖼️");
        assert_eq!(file_emoji("application/pdf"), "📄");
        assert_eq!(file_emoji("application/octet-stream"), "📎");
    }
}
