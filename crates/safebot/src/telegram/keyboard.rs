//! Inline keyboard builders
//!
//! All buttons carry typed [`Callback`] payloads. Encoding can fail when a
//! payload cannot fit Telegram's 64-byte budget even in short form; such
//! buttons are dropped (with an error log) rather than emitted truncated,
//! because a truncated token would decode to the error sentinel and read as
//! a dead button to the user anyway.

use safecore::callback::{Callback, DueChoice, TaskFilter};
use safecore::storage::{FileCategory, PasswordEntry, Priority, TaskEntry, TaskStatus};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Builds a callback button, or `None` when the payload is over budget.
pub fn cb(text: impl Into<String>, callback: &Callback) -> Option<InlineKeyboardButton> {
    match callback.encode() {
        Ok(token) => Some(InlineKeyboardButton::callback(text.into(), token)),
        Err(e) => {
            log::error!("Dropping inline button: {}", e);
            None
        }
    }
}

/// Collects rows, discarding buttons that failed to encode and rows left
/// empty afterwards.
pub fn markup(rows: Vec<Vec<Option<InlineKeyboardButton>>>) -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = rows
        .into_iter()
        .map(|row| row.into_iter().flatten().collect::<Vec<_>>())
        .filter(|row: &Vec<_>| !row.is_empty())
        .collect();
    InlineKeyboardMarkup::new(keyboard)
}

/// Main menu: the six top-level categories.
pub fn main_menu() -> InlineKeyboardMarkup {
    markup(vec![
        vec![
            cb("🔐 Passwords", &Callback::MenuPasswords),
            cb("✅ Tasks", &Callback::MenuTasks),
        ],
        vec![
            cb("📁 Files", &Callback::MenuFiles),
            cb("🔍 Search", &Callback::MenuSearch),
        ],
        vec![
            cb("🤖 AI Assistant", &Callback::MenuAi),
            cb("⚙️ Settings", &Callback::MenuSettings),
        ],
    ])
}

/// Quick actions shown alongside the main menu.
pub fn quick_actions() -> InlineKeyboardMarkup {
    markup(vec![
        vec![cb("➕ Save Password", &Callback::PasswordSaveStart)],
        vec![cb("➕ Add Task", &Callback::TaskAddStart)],
        vec![cb("⬆️ Upload File", &Callback::FileUploadStart)],
        vec![cb("🔍 Smart Search", &Callback::MenuSearch)],
        vec![cb("🏠 Main Menu", &Callback::MainMenu)],
    ])
}

/// Password category menu.
pub fn password_menu() -> InlineKeyboardMarkup {
    markup(vec![
        vec![cb("➕ Save New Password", &Callback::PasswordSaveStart)],
        vec![cb("👁️ View All Passwords", &Callback::PasswordList { page: 0 })],
        vec![cb("🔍 Search Passwords", &Callback::PasswordSearch)],
        vec![cb("◀️ Back to Main Menu", &Callback::MainMenu)],
    ])
}

/// Task category menu with status filters.
pub fn task_menu() -> InlineKeyboardMarkup {
    markup(vec![
        vec![cb("➕ Add New Task", &Callback::TaskAddStart)],
        vec![
            cb("⏳ Pending", &Callback::TaskList { page: 0, filter: TaskFilter::Status(TaskStatus::Pending) }),
            cb("🔄 In Progress", &Callback::TaskList { page: 0, filter: TaskFilter::Status(TaskStatus::InProgress) }),
        ],
        vec![
            cb("✔️ Completed", &Callback::TaskList { page: 0, filter: TaskFilter::Status(TaskStatus::Completed) }),
            cb("👁️ All Tasks", &Callback::TaskList { page: 0, filter: TaskFilter::All }),
        ],
        vec![cb("◀️ Back to Main Menu", &Callback::MainMenu)],
    ])
}

/// File category menu with type filters.
pub fn file_menu() -> InlineKeyboardMarkup {
    markup(vec![
        vec![cb("⬆️ Upload File", &Callback::FileUploadStart)],
        vec![cb("👁️ Browse All Files", &Callback::FileList { page: 0, filter: None })],
        vec![
            cb("🖼️ Images", &Callback::FileList { page: 0, filter: Some(FileCategory::Image) }),
            cb("📄 Documents", &Callback::FileList { page: 0, filter: Some(FileCategory::Document) }),
        ],
        vec![
            cb("🎥 Videos", &Callback::FileList { page: 0, filter: Some(FileCategory::Video) }),
            cb("🎵 Audio", &Callback::FileList { page: 0, filter: Some(FileCategory::Audio) }),
        ],
        vec![cb("◀️ Back to Main Menu", &Callback::MainMenu)],
    ])
}

/// AI assistant menu.
pub fn ai_menu() -> InlineKeyboardMarkup {
    markup(vec![
        vec![
            cb("🏷️ Auto-Tag Items", &Callback::AiTag),
            cb("📝 Summarize Tasks", &Callback::AiSummarizeTasks),
        ],
        vec![cb("🔍 Smart Search", &Callback::MenuSearch)],
        vec![cb("◀️ Back to Menu", &Callback::MainMenu)],
    ])
}

/// Action row for one password entry.
pub fn password_actions(entry: &PasswordEntry) -> InlineKeyboardMarkup {
    let id = entry.id.to_string();
    markup(vec![
        vec![
            cb("👁️ View", &Callback::PasswordView { id: id.clone() }),
            cb("📋 Copy", &Callback::PasswordCopy { id: id.clone() }),
        ],
        vec![
            cb("✏️ Edit", &Callback::PasswordEdit { id: id.clone() }),
            cb("🗑️ Delete", &Callback::PasswordDelete { id }),
        ],
        vec![cb("◀️ Back to List", &Callback::PasswordList { page: 0 })],
    ])
}

/// Action rows for one task; status buttons skip the current status.
pub fn task_actions(task: &TaskEntry) -> InlineKeyboardMarkup {
    let id = task.id.to_string();
    let mut status_row = vec![];
    if task.status != TaskStatus::InProgress {
        status_row.push(cb(
            "🔄 Start",
            &Callback::TaskStatus { id: id.clone(), status: TaskStatus::InProgress },
        ));
    }
    if task.status != TaskStatus::Completed {
        status_row.push(cb(
            "✔️ Complete",
            &Callback::TaskStatus { id: id.clone(), status: TaskStatus::Completed },
        ));
    }
    markup(vec![
        status_row,
        vec![
            cb("✏️ Edit", &Callback::TaskEdit { id: id.clone() }),
            cb("🗑️ Delete", &Callback::TaskDelete { id }),
        ],
        vec![cb("◀️ Back to Tasks", &Callback::MenuTasks)],
    ])
}

/// Action rows for one file entry.
pub fn file_actions(file_id: &str) -> InlineKeyboardMarkup {
    let id = file_id.to_string();
    markup(vec![
        vec![
            cb("⬇️ Download", &Callback::FileDownload { id: id.clone() }),
            cb("📤 Share", &Callback::FileShare { id: id.clone() }),
        ],
        vec![cb("🗑️ Delete", &Callback::FileDelete { id })],
        vec![cb("◀️ Back to Files", &Callback::MenuFiles)],
    ])
}

/// Pagination row: previous / page indicator / next.
/// `make` builds the list callback for a target page.
pub fn pagination(
    current_page: u16,
    total_pages: usize,
    make: impl Fn(u16) -> Callback,
) -> Vec<InlineKeyboardButton> {
    let mut buttons = vec![];
    if current_page > 0 {
        buttons.extend(cb("◀️ Previous", &make(current_page - 1)));
    }
    buttons.extend(cb(
        format!("📄 {}/{}", current_page + 1, total_pages),
        &Callback::Noop,
    ));
    if usize::from(current_page) + 1 < total_pages {
        buttons.extend(cb("Next ▶️", &make(current_page + 1)));
    }
    buttons
}

/// Priority selector for the add-task wizard.
pub fn priority_selector() -> InlineKeyboardMarkup {
    markup(vec![
        vec![
            cb("🔵 Low", &Callback::SelectPriority { level: Priority::Low }),
            cb("🟡 Medium", &Callback::SelectPriority { level: Priority::Medium }),
            cb("🔴 High", &Callback::SelectPriority { level: Priority::High }),
        ],
        vec![
            cb("⏭️ Skip", &Callback::WizardSkip),
            cb("❌ Cancel", &Callback::Cancel),
        ],
    ])
}

/// Due-date selector for the add-task wizard.
pub fn due_date_selector() -> InlineKeyboardMarkup {
    markup(vec![
        vec![
            cb("📅 Today", &Callback::SelectDue { choice: DueChoice::Today }),
            cb("📅 Tomorrow", &Callback::SelectDue { choice: DueChoice::Tomorrow }),
        ],
        vec![
            cb("📅 This Week", &Callback::SelectDue { choice: DueChoice::Week }),
            cb("📅 Next Week", &Callback::SelectDue { choice: DueChoice::NextWeek }),
        ],
        vec![
            cb("✏️ Custom Date", &Callback::SelectDue { choice: DueChoice::Custom }),
            cb("⏭️ Skip", &Callback::SelectDue { choice: DueChoice::Skip }),
        ],
        vec![cb("❌ Cancel", &Callback::Cancel)],
    ])
}

/// Skip/cancel row for optional free-text wizard steps.
pub fn skip_row() -> InlineKeyboardMarkup {
    markup(vec![vec![
        cb("⏭️ Skip", &Callback::WizardSkip),
        cb("❌ Cancel", &Callback::Cancel),
    ]])
}

/// Cancel-only row for required wizard steps.
pub fn cancel_row() -> InlineKeyboardMarkup {
    markup(vec![vec![cb("❌ Cancel", &Callback::Cancel)]])
}

/// Confirm/cancel row for the final wizard step.
pub fn confirm_row() -> InlineKeyboardMarkup {
    markup(vec![vec![
        cb("✔️ Confirm", &Callback::WizardConfirm),
        cb("❌ Cancel", &Callback::Cancel),
    ]])
}

/// Single back button to a given destination.
pub fn back_to(text: &str, destination: &Callback) -> InlineKeyboardMarkup {
    markup(vec![vec![cb(text, destination)]])
}

/// Settings menu.
pub fn settings_menu() -> InlineKeyboardMarkup {
    markup(vec![
        vec![
            cb("🔒 Security Settings", &Callback::SettingsSecurity),
            cb("🔔 Notifications", &Callback::SettingsNotifications),
        ],
        vec![cb("🗑️ Clear Session (Logout)", &Callback::SettingsLogout)],
        vec![cb("◀️ Back to Menu", &Callback::MainMenu)],
    ])
}

/// Security settings submenu.
pub fn security_menu() -> InlineKeyboardMarkup {
    markup(vec![
        vec![
            cb("⏱️ Change Auto-Lock", &Callback::SettingsAutoLock),
            cb("🔑 Change Master Pass", &Callback::SettingsChangePass),
        ],
        vec![cb("◀️ Back to Settings", &Callback::MenuSettings)],
    ])
}

/// Notification settings submenu; icons reflect the current toggles.
pub fn notifications_menu(tasks_on: bool, summary_on: bool) -> InlineKeyboardMarkup {
    let tasks_icon = if tasks_on { "✅" } else { "❌" };
    let summary_icon = if summary_on { "✅" } else { "❌" };
    markup(vec![
        vec![
            cb(format!("{} Toggle Reminders", tasks_icon), &Callback::SettingsToggleReminders),
            cb(format!("{} Toggle Summary", summary_icon), &Callback::SettingsToggleSummary),
        ],
        vec![cb("◀️ Back to Settings", &Callback::MenuSettings)],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn payloads(markup: &InlineKeyboardMarkup) -> Vec<String> {
        markup
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_every_menu_button_decodes() {
        let menus = vec![
            main_menu(),
            quick_actions(),
            password_menu(),
            task_menu(),
            file_menu(),
            ai_menu(),
            priority_selector(),
            due_date_selector(),
            skip_row(),
            cancel_row(),
            confirm_row(),
        ];
        for menu in menus {
            let data = payloads(&menu);
            assert!(!data.is_empty());
            for payload in data {
                assert!(payload.len() <= 64, "over budget: {}", payload);
                assert_ne!(Callback::decode(&payload), Callback::Error, "undecodable: {}", payload);
            }
        }
    }

    #[test]
    fn test_pagination_edges() {
        let make = |page| Callback::PasswordList { page };
        // First page: no Previous
        let first = pagination(0, 3, make);
        assert_eq!(first.len(), 2);
        // Middle page: both
        let middle = pagination(1, 3, make);
        assert_eq!(middle.len(), 3);
        // Last page: no Next
        let last = pagination(2, 3, make);
        assert_eq!(last.len(), 2);
    }

    #[test]
    fn test_task_actions_hide_current_status() {
        use chrono::Utc;
        use uuid::Uuid;

        let task = TaskEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            encrypted_content: String::new(),
            priority: Priority::Medium,
            status: TaskStatus::InProgress,
            due_date: None,
            tags: vec![],
            created_at: Utc::now(),
            completed_at: None,
        };
        let markup = task_actions(&task);
        let all_text: Vec<String> = markup
            .inline_keyboard
            .iter()
            .flatten()
            .map(|b| b.text.clone())
            .collect();
        assert!(!all_text.iter().any(|t| t.contains("Start")));
        assert!(all_text.iter().any(|t| t.contains("Complete")));
    }
}
