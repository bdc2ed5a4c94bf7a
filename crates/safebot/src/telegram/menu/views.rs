//! List and detail view builders.
//!
//! Each view returns `(text, keyboard)` so callback handlers can edit the
//! originating message and command handlers can send a fresh one from the
//! same code path.

use safecore::callback::{Callback, TaskFilter};
use safecore::config::pagination::ITEMS_PER_PAGE;
use safecore::error::{AppError, AppResult};
use safecore::storage::{FileCategory, TaskStatus};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use uuid::Uuid;

use crate::telegram::handlers::HandlerDeps;
use crate::telegram::{formatters, keyboard};

/// Clamps a page index against the item count, returning the page slice
/// bounds plus the total page count.
fn page_bounds(len: usize, page: u16) -> (usize, usize, usize, u16) {
    let total_pages = len.div_ceil(ITEMS_PER_PAGE).max(1);
    let page = (page as usize).min(total_pages - 1);
    let start = page * ITEMS_PER_PAGE;
    let end = (start + ITEMS_PER_PAGE).min(len);
    (start, end, total_pages, page as u16)
}

// ==================== Passwords ====================

/// Paginated password list with one view button per entry.
pub async fn password_list(
    deps: &HandlerDeps,
    user_id: Uuid,
    page: u16,
) -> AppResult<(String, InlineKeyboardMarkup)> {
    let passwords = deps.vault.get_passwords(user_id, None).await?;
    let (start, end, total_pages, page) = page_bounds(passwords.len(), page);
    let visible = &passwords[start..end];

    let text = formatters::format_password_list(visible, passwords.len());

    let mut rows: Vec<Vec<InlineKeyboardButton>> = visible
        .iter()
        .filter_map(|entry| {
            keyboard::cb(
                format!("👁️ {}", entry.service_name),
                &Callback::PasswordView { id: entry.id.to_string() },
            )
            .map(|b| vec![b])
        })
        .collect();
    if total_pages > 1 {
        rows.push(keyboard::pagination(page, total_pages, |page| Callback::PasswordList { page }));
    }
    rows.extend(keyboard::back_to("◀️ Back to Menu", &Callback::MenuPasswords).inline_keyboard);

    Ok((text, InlineKeyboardMarkup::new(rows)))
}

/// Password detail card with decrypted fields and per-entry actions.
pub async fn password_detail(
    deps: &HandlerDeps,
    user_id: Uuid,
    password_id: &str,
) -> AppResult<(String, InlineKeyboardMarkup)> {
    let entry = find_password(deps, user_id, password_id).await?;
    let username = deps.crypto.decrypt(&entry.encrypted_username)?;
    let password = deps.crypto.decrypt(&entry.encrypted_password)?;
    let text = formatters::format_password_details(&entry, &username, &password);
    let markup = keyboard::password_actions(&entry);
    Ok((text, markup))
}

/// Decrypted secret for the copy action (sent as a bare monospace line).
pub async fn password_secret(deps: &HandlerDeps, user_id: Uuid, password_id: &str) -> AppResult<String> {
    let entry = find_password(deps, user_id, password_id).await?;
    deps.crypto.decrypt(&entry.encrypted_password)
}

async fn find_password(
    deps: &HandlerDeps,
    user_id: Uuid,
    password_id: &str,
) -> AppResult<safecore::storage::PasswordEntry> {
    let id = parse_id(password_id)?;
    deps.vault
        .get_passwords(user_id, None)
        .await?
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| AppError::NotFound("password entry".to_string()))
}

// ==================== Tasks ====================

/// Task list filtered by status, with one view button per task.
pub async fn task_list(
    deps: &HandlerDeps,
    user_id: Uuid,
    filter: TaskFilter,
    page: u16,
) -> AppResult<(String, InlineKeyboardMarkup)> {
    let status = match filter {
        TaskFilter::All => None,
        TaskFilter::Status(s) => Some(s),
    };
    let tasks = deps.vault.get_tasks(user_id, status).await?;
    let (start, end, total_pages, page) = page_bounds(tasks.len(), page);

    let mut decrypted = Vec::with_capacity(tasks.len());
    for task in &tasks {
        let content = deps.crypto.decrypt(&task.encrypted_content)?;
        decrypted.push((task.clone(), content));
    }
    let text = formatters::format_task_list(&decrypted);

    let mut rows: Vec<Vec<InlineKeyboardButton>> = decrypted[start..end]
        .iter()
        .filter_map(|(task, content)| {
            let label: String = content.chars().take(24).collect();
            keyboard::cb(
                format!("👁️ {}", label),
                &Callback::TaskView { id: task.id.to_string() },
            )
            .map(|b| vec![b])
        })
        .collect();
    if total_pages > 1 {
        rows.push(keyboard::pagination(page, total_pages, move |page| Callback::TaskList {
            page,
            filter,
        }));
    }
    rows.extend(keyboard::back_to("◀️ Back to Tasks", &Callback::MenuTasks).inline_keyboard);

    Ok((text, InlineKeyboardMarkup::new(rows)))
}

/// Task detail card with status/edit/delete actions.
pub async fn task_detail(
    deps: &HandlerDeps,
    user_id: Uuid,
    task_id: &str,
) -> AppResult<(String, InlineKeyboardMarkup)> {
    let id = parse_id(task_id)?;
    let task = deps
        .vault
        .get_tasks(user_id, None)
        .await?
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| AppError::NotFound("task".to_string()))?;
    let content = deps.crypto.decrypt(&task.encrypted_content)?;
    let text = formatters::format_task_details(&task, &content);
    let markup = keyboard::task_actions(&task);
    Ok((text, markup))
}

/// Applies a status change and returns the refreshed task list view.
pub async fn set_task_status(
    deps: &HandlerDeps,
    user_id: Uuid,
    task_id: &str,
    status: TaskStatus,
) -> AppResult<(String, InlineKeyboardMarkup)> {
    let id = parse_id(task_id)?;
    if !deps.vault.update_task_status(id, user_id, status).await? {
        return Err(AppError::NotFound("task".to_string()));
    }
    task_list(deps, user_id, TaskFilter::All, 0).await
}

// ==================== Files ====================

/// Paginated file list with category filter buttons.
pub async fn file_list(
    deps: &HandlerDeps,
    user_id: Uuid,
    filter: Option<FileCategory>,
    page: u16,
) -> AppResult<(String, InlineKeyboardMarkup)> {
    let mut files = deps.vault.get_files(user_id, None).await?;
    if let Some(category) = filter {
        files.retain(|f| f.category() == category);
    }
    let (start, end, total_pages, page) = page_bounds(files.len(), page);
    let visible = &files[start..end];

    let text = formatters::format_file_list(visible, files.len(), filter.map(|f| f.as_str()));

    let mut rows: Vec<Vec<InlineKeyboardButton>> = visible
        .iter()
        .filter_map(|file| {
            let label: String = file.file_name.chars().take(20).collect();
            keyboard::cb(
                format!("👁️ {}", label),
                &Callback::FileView { id: file.id.to_string() },
            )
            .map(|b| vec![b])
        })
        .collect();
    if total_pages > 1 {
        rows.push(keyboard::pagination(page, total_pages, move |page| Callback::FileList {
            page,
            filter,
        }));
    }
    rows.push(
        [
            keyboard::cb("All", &Callback::FileList { page: 0, filter: None }),
            keyboard::cb("Images", &Callback::FileList { page: 0, filter: Some(FileCategory::Image) }),
            keyboard::cb("Docs", &Callback::FileList { page: 0, filter: Some(FileCategory::Document) }),
        ]
        .into_iter()
        .flatten()
        .collect(),
    );
    rows.extend(keyboard::back_to("◀️ Back to Menu", &Callback::MenuFiles).inline_keyboard);

    Ok((text, InlineKeyboardMarkup::new(rows)))
}

/// File detail card with download/share/delete actions.
pub async fn file_detail(
    deps: &HandlerDeps,
    user_id: Uuid,
    file_id: &str,
) -> AppResult<(String, InlineKeyboardMarkup)> {
    let file = find_file(deps, user_id, file_id).await?;
    let description = deps.crypto.decrypt(&file.encrypted_description)?;
    let text = formatters::format_file_details(&file, &description);
    let markup = keyboard::file_actions(&file.id.to_string());
    Ok((text, markup))
}

/// Looks up one file entry owned by the user.
pub async fn find_file(
    deps: &HandlerDeps,
    user_id: Uuid,
    file_id: &str,
) -> AppResult<safecore::storage::FileEntry> {
    let id = parse_id(file_id)?;
    deps.vault
        .get_files(user_id, None)
        .await?
        .into_iter()
        .find(|f| f.id == id)
        .ok_or_else(|| AppError::NotFound("file".to_string()))
}

fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("malformed record id: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_page_bounds_clamps_past_the_end() {
        // 7 items, 5 per page → 2 pages; page 9 clamps to the last page
        let (start, end, total, page) = page_bounds(7, 9);
        assert_eq!((start, end, total, page), (5, 7, 2, 1));
    }

    #[test]
    fn test_page_bounds_empty_list() {
        let (start, end, total, page) = page_bounds(0, 0);
        assert_eq!((start, end, total, page), (0, 0, 1, 0));
    }
}
