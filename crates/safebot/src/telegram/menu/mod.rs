//! Menus and list/detail views

pub mod callback_router;
pub mod views;

use safecore::error::AppResult;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use super::{keyboard, markdown};
use crate::telegram::handlers::HandlerDeps;

/// Sends the main menu as a fresh message (after login or /start).
pub async fn send_main_menu(bot: &Bot, chat_id: ChatId, user_name: &str) -> AppResult<()> {
    bot.send_message(chat_id, main_menu_text(user_name))
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(keyboard::main_menu())
        .await?;
    Ok(())
}

/// Edits an existing message into the main menu (back buttons).
pub async fn edit_main_menu(
    bot: &Bot,
    chat_id: ChatId,
    message_id: teloxide::types::MessageId,
    user_name: &str,
) -> AppResult<()> {
    bot.edit_message_text(chat_id, message_id, main_menu_text(user_name))
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(keyboard::main_menu())
        .await?;
    Ok(())
}

fn main_menu_text(user_name: &str) -> String {
    format!(
        "👋 *Welcome back, {}\\!*\n\nWhat would you like to do today?\n\nChoose a category below:",
        markdown::escape(user_name)
    )
}

/// Password category menu text.
pub fn password_menu_text() -> String {
    "🔐 *Password Management*\n\n\
     Securely manage your passwords with AES\\-256 encryption\\.\n\n\
     What would you like to do?"
        .to_string()
}

/// Task category menu text.
pub fn task_menu_text() -> String {
    "✅ *Task Management*\n\nOrganize and track your tasks efficiently\\.\n\nChoose an option:".to_string()
}

/// File category menu text.
pub fn file_menu_text() -> String {
    "📁 *File Management*\n\nStore and organize your files securely\\.\n\nBrowse by category or view all:".to_string()
}

/// Search prompt text.
pub fn search_menu_text() -> String {
    "🔍 *Smart Search*\n\n\
     Search across all your passwords, tasks, and files\\.\n\n\
     Use: /search query\n\
     Example: /search work passwords"
        .to_string()
}

/// AI assistant menu text.
pub fn ai_menu_text() -> String {
    "🤖 *AI Assistant*\n\nI can help you organize and understand your data\\.\n\nChoose an action:".to_string()
}

/// Settings menu text with the user's current preferences.
pub async fn settings_menu_text(deps: &HandlerDeps, user_id: uuid::Uuid) -> AppResult<String> {
    let settings = deps.vault.get_user_settings(user_id).await?;
    let reminders = if settings.task_reminders { "On" } else { "Off" };
    let summary = if settings.weekly_summary { "On" } else { "Off" };
    Ok(format!(
        "⚙️ *Settings*\n\n\
         Configure your bot preferences\\.\n\n\
         *Security*\n\
         • Auto\\-lock: {} minutes\n\
         • Data Encryption: AES\\-256 \\(Active\\)\n\n\
         *Notifications*\n\
         • Task Reminders: {}\n\
         • Weekly Summary: {}",
        settings.auto_lock_minutes, reminders, summary
    ))
}
