//! Inline-button callback codec
//!
//! Telegram round-trips at most 64 bytes of opaque callback data per inline
//! button, so routing intent must be packed into a compact token. This
//! module owns that token format: a typed [`Callback`] enum (one variant per
//! action, with explicit fields) serialized as colon-separated
//! `action[:field]*`.
//!
//! Encoding first tries the canonical, human-readable action name
//! (`password_view:<id>`); when that would blow the budget it falls back to
//! the short opcode from [`ACTIONS`] (`pv:<id>`). If even the short form is
//! over budget, [`Callback::encode`] fails and the caller must drop the
//! button — a truncated token would decode to garbage later, which is worse
//! than a missing button.
//!
//! Decoding is total: any input that is not a well-formed token produced by
//! `encode` yields [`Callback::Error`], never a panic or an `Err`, so the
//! router can answer with a generic "unknown action" message.

use thiserror::Error;

use crate::storage::{FileCategory, Priority, TaskStatus};

/// Telegram's hard limit on callback data, in bytes.
pub const MAX_CALLBACK_BYTES: usize = 64;

/// Canonical action name ↔ short opcode, both unique.
/// Decode accepts either spelling; encode prefers the canonical one.
const ACTIONS: &[(&str, &str)] = &[
    ("noop", "np"),
    ("main_menu", "mm"),
    ("quick_actions", "qa"),
    ("menu_passwords", "mp"),
    ("menu_tasks", "mt"),
    ("menu_files", "mf"),
    ("menu_search", "msr"),
    ("menu_ai", "mai"),
    ("menu_settings", "mst"),
    ("password_save_start", "pss"),
    ("password_list", "pl"),
    ("password_view", "pv"),
    ("password_copy", "pc"),
    ("password_edit", "pe"),
    ("password_delete", "pd"),
    ("password_search", "ps"),
    ("task_add_start", "tas"),
    ("task_list", "tl"),
    ("task_view", "tv"),
    ("task_edit", "te"),
    ("task_status", "ts"),
    ("task_delete", "td"),
    ("file_upload_start", "fus"),
    ("file_list", "fl"),
    ("file_view", "fv"),
    ("file_download", "fdown"),
    ("file_share", "fs"),
    ("file_delete", "fd"),
    ("ai_tag", "ait"),
    ("ai_summarize_tasks", "ais"),
    ("settings_logout", "slo"),
    ("settings_security", "ssec"),
    ("settings_notifications", "snot"),
    ("settings_autolock", "salk"),
    ("settings_changepass", "scp"),
    ("settings_toggle_reminders", "strm"),
    ("settings_toggle_summary", "stsm"),
    ("select_priority", "spr"),
    ("select_due", "sdue"),
    ("wizard_skip", "ws"),
    ("wizard_back", "wb"),
    ("wizard_confirm", "wc"),
    ("cancel", "cx"),
];

/// Task-list filter carried by `task_list` buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    All,
    Status(TaskStatus),
}

impl TaskFilter {
    fn as_str(self) -> &'static str {
        match self {
            TaskFilter::All => "all",
            TaskFilter::Status(s) => s.as_str(),
        }
    }

    fn parse(s: &str) -> Option<Self> {
        if s == "all" {
            return Some(TaskFilter::All);
        }
        TaskStatus::parse(s).map(TaskFilter::Status)
    }
}

/// Quick due-date choices offered by the task wizard keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueChoice {
    Today,
    Tomorrow,
    Week,
    NextWeek,
    Custom,
    Skip,
}

impl DueChoice {
    fn as_str(self) -> &'static str {
        match self {
            DueChoice::Today => "today",
            DueChoice::Tomorrow => "tomorrow",
            DueChoice::Week => "week",
            DueChoice::NextWeek => "next_week",
            DueChoice::Custom => "custom",
            DueChoice::Skip => "skip",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "today" => Some(DueChoice::Today),
            "tomorrow" => Some(DueChoice::Tomorrow),
            "week" => Some(DueChoice::Week),
            "next_week" => Some(DueChoice::NextWeek),
            "custom" => Some(DueChoice::Custom),
            "skip" => Some(DueChoice::Skip),
            _ => None,
        }
    }
}

/// Routing intent carried by an inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    /// Page-indicator button; acknowledged and otherwise ignored
    Noop,
    MainMenu,
    QuickActions,
    MenuPasswords,
    MenuTasks,
    MenuFiles,
    MenuSearch,
    MenuAi,
    MenuSettings,
    PasswordSaveStart,
    PasswordList { page: u16 },
    PasswordView { id: String },
    PasswordCopy { id: String },
    PasswordEdit { id: String },
    PasswordDelete { id: String },
    PasswordSearch,
    TaskAddStart,
    TaskList { page: u16, filter: TaskFilter },
    TaskView { id: String },
    TaskEdit { id: String },
    TaskStatus { id: String, status: TaskStatus },
    TaskDelete { id: String },
    FileUploadStart,
    FileList { page: u16, filter: Option<FileCategory> },
    FileView { id: String },
    FileDownload { id: String },
    FileShare { id: String },
    FileDelete { id: String },
    AiTag,
    AiSummarizeTasks,
    SettingsLogout,
    SettingsSecurity,
    SettingsNotifications,
    SettingsAutoLock,
    SettingsChangePass,
    SettingsToggleReminders,
    SettingsToggleSummary,
    SelectPriority { level: Priority },
    SelectDue { choice: DueChoice },
    WizardSkip,
    WizardBack,
    WizardConfirm,
    Cancel,
    /// Sentinel produced by `decode` for malformed input; never encoded
    Error,
}

/// Encoding failures surfaced to keyboard builders.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackError {
    /// Token exceeds 64 bytes even with the short opcode
    #[error("callback token exceeds {MAX_CALLBACK_BYTES} bytes even when shortened: {0}")]
    Budget(String),

    /// The `Error` sentinel has no wire representation
    #[error("the error sentinel cannot be encoded")]
    Unencodable,
}

impl Callback {
    /// Canonical action name plus serialized fields, in wire order.
    fn parts(&self) -> Option<(&'static str, Vec<String>)> {
        let parts = match self {
            Callback::Noop => ("noop", vec![]),
            Callback::MainMenu => ("main_menu", vec![]),
            Callback::QuickActions => ("quick_actions", vec![]),
            Callback::MenuPasswords => ("menu_passwords", vec![]),
            Callback::MenuTasks => ("menu_tasks", vec![]),
            Callback::MenuFiles => ("menu_files", vec![]),
            Callback::MenuSearch => ("menu_search", vec![]),
            Callback::MenuAi => ("menu_ai", vec![]),
            Callback::MenuSettings => ("menu_settings", vec![]),
            Callback::PasswordSaveStart => ("password_save_start", vec![]),
            Callback::PasswordList { page } => ("password_list", vec![page.to_string()]),
            Callback::PasswordView { id } => ("password_view", vec![id.clone()]),
            Callback::PasswordCopy { id } => ("password_copy", vec![id.clone()]),
            Callback::PasswordEdit { id } => ("password_edit", vec![id.clone()]),
            Callback::PasswordDelete { id } => ("password_delete", vec![id.clone()]),
            Callback::PasswordSearch => ("password_search", vec![]),
            Callback::TaskAddStart => ("task_add_start", vec![]),
            Callback::TaskList { page, filter } => {
                ("task_list", vec![page.to_string(), filter.as_str().to_string()])
            }
            Callback::TaskView { id } => ("task_view", vec![id.clone()]),
            Callback::TaskEdit { id } => ("task_edit", vec![id.clone()]),
            Callback::TaskStatus { id, status } => {
                ("task_status", vec![id.clone(), status.as_str().to_string()])
            }
            Callback::TaskDelete { id } => ("task_delete", vec![id.clone()]),
            Callback::FileUploadStart => ("file_upload_start", vec![]),
            Callback::FileList { page, filter } => {
                let mut args = vec![page.to_string()];
                if let Some(category) = filter {
                    args.push(category.as_str().to_string());
                }
                ("file_list", args)
            }
            Callback::FileView { id } => ("file_view", vec![id.clone()]),
            Callback::FileDownload { id } => ("file_download", vec![id.clone()]),
            Callback::FileShare { id } => ("file_share", vec![id.clone()]),
            Callback::FileDelete { id } => ("file_delete", vec![id.clone()]),
            Callback::AiTag => ("ai_tag", vec![]),
            Callback::AiSummarizeTasks => ("ai_summarize_tasks", vec![]),
            Callback::SettingsLogout => ("settings_logout", vec![]),
            Callback::SettingsSecurity => ("settings_security", vec![]),
            Callback::SettingsNotifications => ("settings_notifications", vec![]),
            Callback::SettingsAutoLock => ("settings_autolock", vec![]),
            Callback::SettingsChangePass => ("settings_changepass", vec![]),
            Callback::SettingsToggleReminders => ("settings_toggle_reminders", vec![]),
            Callback::SettingsToggleSummary => ("settings_toggle_summary", vec![]),
            Callback::SelectPriority { level } => ("select_priority", vec![level.as_str().to_string()]),
            Callback::SelectDue { choice } => ("select_due", vec![choice.as_str().to_string()]),
            Callback::WizardSkip => ("wizard_skip", vec![]),
            Callback::WizardBack => ("wizard_back", vec![]),
            Callback::WizardConfirm => ("wizard_confirm", vec![]),
            Callback::Cancel => ("cancel", vec![]),
            Callback::Error => return None,
        };
        Some(parts)
    }

    /// Serializes the intent into a token within the 64-byte budget.
    ///
    /// Tries the canonical action name first, then the short opcode. Fails
    /// with [`CallbackError::Budget`] rather than emitting a token the
    /// decoder could not reverse.
    pub fn encode(&self) -> Result<String, CallbackError> {
        let (canonical, args) = self.parts().ok_or(CallbackError::Unencodable)?;

        let token = join_token(canonical, &args);
        if token.len() <= MAX_CALLBACK_BYTES {
            return Ok(token);
        }

        let short = ACTIONS
            .iter()
            .find(|(name, _)| *name == canonical)
            .map(|(_, short)| *short)
            .unwrap_or(canonical);
        let token = join_token(short, &args);
        if token.len() <= MAX_CALLBACK_BYTES {
            return Ok(token);
        }

        Err(CallbackError::Budget(token))
    }

    /// Parses a token back into the typed intent, expanding short opcodes.
    ///
    /// Total: malformed input of any shape yields [`Callback::Error`].
    pub fn decode(token: &str) -> Callback {
        let mut fields = token.split(':');
        let Some(name) = fields.next() else {
            return Callback::Error;
        };
        let canonical = ACTIONS
            .iter()
            .find(|(full, short)| *full == name || *short == name)
            .map(|(full, _)| *full);
        let Some(canonical) = canonical else {
            return Callback::Error;
        };
        let args: Vec<&str> = fields.collect();

        from_parts(canonical, &args).unwrap_or(Callback::Error)
    }
}

fn join_token(name: &str, args: &[String]) -> String {
    if args.is_empty() {
        return name.to_string();
    }
    let mut token = String::from(name);
    for arg in args {
        token.push(':');
        token.push_str(arg);
    }
    token
}

/// Rebuilds the typed variant from a canonical name + field list.
/// `None` on wrong arity or unparseable fields.
fn from_parts(canonical: &str, args: &[&str]) -> Option<Callback> {
    let unit = |cb: Callback| if args.is_empty() { Some(cb) } else { None };
    let with_id = |make: fn(String) -> Callback| match args {
        [id] if !id.is_empty() => Some(make((*id).to_string())),
        _ => None,
    };

    match canonical {
        "noop" => unit(Callback::Noop),
        "main_menu" => unit(Callback::MainMenu),
        "quick_actions" => unit(Callback::QuickActions),
        "menu_passwords" => unit(Callback::MenuPasswords),
        "menu_tasks" => unit(Callback::MenuTasks),
        "menu_files" => unit(Callback::MenuFiles),
        "menu_search" => unit(Callback::MenuSearch),
        "menu_ai" => unit(Callback::MenuAi),
        "menu_settings" => unit(Callback::MenuSettings),
        "password_save_start" => unit(Callback::PasswordSaveStart),
        "password_list" => match args {
            [page] => Some(Callback::PasswordList { page: page.parse().ok()? }),
            _ => None,
        },
        "password_view" => with_id(|id| Callback::PasswordView { id }),
        "password_copy" => with_id(|id| Callback::PasswordCopy { id }),
        "password_edit" => with_id(|id| Callback::PasswordEdit { id }),
        "password_delete" => with_id(|id| Callback::PasswordDelete { id }),
        "password_search" => unit(Callback::PasswordSearch),
        "task_add_start" => unit(Callback::TaskAddStart),
        "task_list" => match args {
            [page, filter] => Some(Callback::TaskList {
                page: page.parse().ok()?,
                filter: TaskFilter::parse(filter)?,
            }),
            _ => None,
        },
        "task_view" => with_id(|id| Callback::TaskView { id }),
        "task_edit" => with_id(|id| Callback::TaskEdit { id }),
        "task_status" => match args {
            [id, status] if !id.is_empty() => Some(Callback::TaskStatus {
                id: (*id).to_string(),
                status: TaskStatus::parse(status)?,
            }),
            _ => None,
        },
        "task_delete" => with_id(|id| Callback::TaskDelete { id }),
        "file_upload_start" => unit(Callback::FileUploadStart),
        "file_list" => match args {
            [page] => Some(Callback::FileList { page: page.parse().ok()?, filter: None }),
            [page, category] => Some(Callback::FileList {
                page: page.parse().ok()?,
                filter: Some(FileCategory::parse(category)?),
            }),
            _ => None,
        },
        "file_view" => with_id(|id| Callback::FileView { id }),
        "file_download" => with_id(|id| Callback::FileDownload { id }),
        "file_share" => with_id(|id| Callback::FileShare { id }),
        "file_delete" => with_id(|id| Callback::FileDelete { id }),
        "ai_tag" => unit(Callback::AiTag),
        "ai_summarize_tasks" => unit(Callback::AiSummarizeTasks),
        "settings_logout" => unit(Callback::SettingsLogout),
        "settings_security" => unit(Callback::SettingsSecurity),
        "settings_notifications" => unit(Callback::SettingsNotifications),
        "settings_autolock" => unit(Callback::SettingsAutoLock),
        "settings_changepass" => unit(Callback::SettingsChangePass),
        "settings_toggle_reminders" => unit(Callback::SettingsToggleReminders),
        "settings_toggle_summary" => unit(Callback::SettingsToggleSummary),
        "select_priority" => match args {
            [level] => Some(Callback::SelectPriority { level: Priority::parse(level)? }),
            _ => None,
        },
        "select_due" => match args {
            [choice] => Some(Callback::SelectDue { choice: DueChoice::parse(choice)? }),
            _ => None,
        },
        "wizard_skip" => unit(Callback::WizardSkip),
        "wizard_back" => unit(Callback::WizardBack),
        "wizard_confirm" => unit(Callback::WizardConfirm),
        "cancel" => unit(Callback::Cancel),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip_unit_actions() {
        let cases = vec![
            Callback::Noop,
            Callback::MainMenu,
            Callback::QuickActions,
            Callback::MenuPasswords,
            Callback::MenuSettings,
            Callback::PasswordSaveStart,
            Callback::PasswordSearch,
            Callback::TaskAddStart,
            Callback::FileUploadStart,
            Callback::AiTag,
            Callback::AiSummarizeTasks,
            Callback::SettingsLogout,
            Callback::SettingsToggleReminders,
            Callback::WizardSkip,
            Callback::WizardBack,
            Callback::WizardConfirm,
            Callback::Cancel,
        ];
        for cb in cases {
            let token = cb.encode().unwrap();
            assert!(token.len() <= MAX_CALLBACK_BYTES, "over budget: {}", token);
            assert_eq!(Callback::decode(&token), cb, "failed for: {}", token);
        }
    }

    #[test]
    fn test_round_trip_field_actions() {
        let id = "550e8400-e29b-41d4-a716-446655440000".to_string();
        let cases = vec![
            Callback::PasswordList { page: 0 },
            Callback::PasswordView { id: id.clone() },
            Callback::PasswordDelete { id: id.clone() },
            Callback::TaskList { page: 3, filter: TaskFilter::All },
            Callback::TaskList { page: 0, filter: TaskFilter::Status(TaskStatus::InProgress) },
            Callback::TaskStatus { id: id.clone(), status: TaskStatus::Completed },
            Callback::FileList { page: 1, filter: None },
            Callback::FileList { page: 0, filter: Some(FileCategory::Image) },
            Callback::FileDownload { id: id.clone() },
            Callback::SelectPriority { level: Priority::High },
            Callback::SelectDue { choice: DueChoice::NextWeek },
        ];
        for cb in cases {
            let token = cb.encode().unwrap();
            assert!(token.len() <= MAX_CALLBACK_BYTES, "over budget: {}", token);
            assert_eq!(Callback::decode(&token), cb, "failed for: {}", token);
        }
    }

    #[test]
    fn test_password_view_token_round_trip() {
        let cb = Callback::PasswordView { id: "abc-123".to_string() };
        let token = cb.encode().unwrap();
        assert_eq!(token, "password_view:abc-123");
        assert_eq!(Callback::decode(&token), cb);
    }

    #[test]
    fn test_shortens_when_canonical_form_is_over_budget() {
        // 46-char id: canonical "task_status:<46>:in_progress" is 70 bytes,
        // the short "ts:<46>:in_progress" is 62 and fits.
        let id = "a".repeat(46);
        let cb = Callback::TaskStatus { id: id.clone(), status: TaskStatus::InProgress };
        let token = cb.encode().unwrap();
        assert!(token.starts_with("ts:"), "expected short form, got: {}", token);
        assert!(token.len() <= MAX_CALLBACK_BYTES);
        assert_eq!(Callback::decode(&token), cb);
    }

    #[test]
    fn test_rejects_tokens_that_cannot_fit() {
        let cb = Callback::PasswordView { id: "x".repeat(100) };
        match cb.encode() {
            Err(CallbackError::Budget(_)) => {}
            other => panic!("expected budget error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_sentinel_is_unencodable() {
        assert_eq!(Callback::Error.encode(), Err(CallbackError::Unencodable));
    }

    #[test]
    fn test_decode_garbage_yields_error_sentinel() {
        let cases = vec![
            "",
            "definitely_not_an_action",
            "password_view",          // missing id
            "password_view:",         // empty id
            "password_list:notanum",
            "task_list:0",            // missing filter
            "task_list:0:bogus",
            "select_priority:urgent",
            "main_menu:extra",
            "{\"a\":\"pv\"}",
            "pv:abc:extra",
        ];
        for token in cases {
            assert_eq!(Callback::decode(token), Callback::Error, "failed for: {}", token);
        }
    }

    #[test]
    fn test_decode_accepts_short_opcodes() {
        assert_eq!(
            Callback::decode("pv:abc-123"),
            Callback::PasswordView { id: "abc-123".to_string() }
        );
        assert_eq!(Callback::decode("mm"), Callback::MainMenu);
        assert_eq!(
            Callback::decode("spr:high"),
            Callback::SelectPriority { level: Priority::High }
        );
    }

    #[test]
    fn test_action_table_has_no_duplicates() {
        for (i, (full_a, short_a)) in ACTIONS.iter().enumerate() {
            for (full_b, short_b) in ACTIONS.iter().skip(i + 1) {
                assert_ne!(full_a, full_b);
                assert_ne!(short_a, short_b);
                assert_ne!(full_a, short_b);
                assert_ne!(short_a, full_b);
            }
        }
    }
}
