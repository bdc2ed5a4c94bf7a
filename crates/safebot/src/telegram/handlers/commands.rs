//! Command endpoints (/savepassword, /listtasks, ...).
//!
//! Commands are thin: gate on the session, then reuse the same views and
//! wizard starters the inline menus use.

use safecore::callback::TaskFilter;
use safecore::error::AppResult;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use super::types::HandlerDeps;
use crate::telegram::menu::views;
use crate::telegram::wizard::password::PasswordWizard;
use crate::telegram::wizard::task::TaskWizard;
use crate::telegram::{formatters, keyboard, markdown, menu};

async fn require_user(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> AppResult<Option<uuid::Uuid>> {
    match deps.auth_user(msg.chat.id.0) {
        Some(user_id) => Ok(Some(user_id)),
        None => {
            bot.send_message(msg.chat.id, "❌ Please /start and authenticate first.").await?;
            Ok(None)
        }
    }
}

/// /help
pub async fn handle_help(bot: &Bot, msg: &Message) -> AppResult<()> {
    bot.send_message(msg.chat.id, formatters::help_message())
        .parse_mode(ParseMode::MarkdownV2)
        .await?;
    Ok(())
}

/// /savepassword
pub async fn handle_save_password(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> AppResult<()> {
    if require_user(bot, msg, deps).await?.is_none() {
        return Ok(());
    }
    PasswordWizard::start_save(bot, msg.chat.id, deps, msg.chat.id.0).await
}

/// /getpassword <service>
pub async fn handle_get_password(bot: &Bot, msg: &Message, deps: &HandlerDeps, service: &str) -> AppResult<()> {
    let Some(user_id) = require_user(bot, msg, deps).await? else {
        return Ok(());
    };
    let service = service.trim();
    if service.is_empty() {
        bot.send_message(msg.chat.id, "Usage: /getpassword <service_name>\nExample: /getpassword gmail")
            .await?;
        return Ok(());
    }

    let matches = deps.vault.get_passwords(user_id, Some(service)).await?;
    match matches.len() {
        0 => {
            bot.send_message(msg.chat.id, format!("❌ No password found for '{}'", service)).await?;
        }
        1 => {
            let entry = &matches[0];
            let username = deps.crypto.decrypt(&entry.encrypted_username)?;
            let password = deps.crypto.decrypt(&entry.encrypted_password)?;
            let sent = bot
                .send_message(msg.chat.id, formatters::format_password_details(entry, &username, &password))
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
            let bot = bot.clone();
            let chat_id = msg.chat.id;
            tokio::spawn(async move {
                tokio::time::sleep(safecore::config::security::reveal_delay()).await;
                if let Err(e) = bot.delete_message(chat_id, sent.id).await {
                    log::debug!("Could not delete revealed password message: {}", e);
                }
            });
        }
        n => {
            let mut text = format!("Found {} matches:\n\n", n);
            for (i, entry) in matches.iter().enumerate() {
                text.push_str(&format!(
                    "{}\\. {} \\(ID: `{}`\\)\n",
                    i + 1,
                    markdown::escape(&entry.service_name),
                    entry.id
                ));
            }
            text.push_str("\nUse /getpassword with the exact service name to retrieve a specific one\\.");
            bot.send_message(msg.chat.id, text).parse_mode(ParseMode::MarkdownV2).await?;
        }
    }
    Ok(())
}

/// /listpasswords
pub async fn handle_list_passwords(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> AppResult<()> {
    let Some(user_id) = require_user(bot, msg, deps).await? else {
        return Ok(());
    };
    let (text, kb) = views::password_list(deps, user_id, 0).await?;
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(kb)
        .await?;
    Ok(())
}

/// /deletepassword <id>
pub async fn handle_delete_password(bot: &Bot, msg: &Message, deps: &HandlerDeps, raw_id: &str) -> AppResult<()> {
    let Some(user_id) = require_user(bot, msg, deps).await? else {
        return Ok(());
    };
    let raw_id = raw_id.trim();
    if raw_id.is_empty() {
        bot.send_message(msg.chat.id, "Usage: /deletepassword <password_id>\nUse /listpasswords to see IDs")
            .await?;
        return Ok(());
    }
    let deleted = match uuid::Uuid::parse_str(raw_id) {
        Ok(id) => deps.vault.delete_password(id, user_id).await?,
        Err(_) => false,
    };
    if deleted {
        bot.send_message(msg.chat.id, "✅ Password deleted successfully!").await?;
    } else {
        bot.send_message(msg.chat.id, "❌ Failed to delete password. Check the ID and try again.")
            .await?;
    }
    Ok(())
}

/// /completetask <id>
pub async fn handle_complete_task(bot: &Bot, msg: &Message, deps: &HandlerDeps, raw_id: &str) -> AppResult<()> {
    use safecore::storage::TaskStatus;

    let Some(user_id) = require_user(bot, msg, deps).await? else {
        return Ok(());
    };
    let raw_id = raw_id.trim();
    if raw_id.is_empty() {
        bot.send_message(msg.chat.id, "Usage: /completetask <task_id>\nUse /listtasks to see task IDs")
            .await?;
        return Ok(());
    }
    let updated = match uuid::Uuid::parse_str(raw_id) {
        Ok(id) => deps.vault.update_task_status(id, user_id, TaskStatus::Completed).await?,
        Err(_) => false,
    };
    if updated {
        bot.send_message(msg.chat.id, "✅ Task marked as complete!").await?;
    } else {
        bot.send_message(msg.chat.id, "❌ Failed to update task. Check the ID and try again.")
            .await?;
    }
    Ok(())
}

/// /deletetask <id>
pub async fn handle_delete_task(bot: &Bot, msg: &Message, deps: &HandlerDeps, raw_id: &str) -> AppResult<()> {
    let Some(user_id) = require_user(bot, msg, deps).await? else {
        return Ok(());
    };
    let raw_id = raw_id.trim();
    if raw_id.is_empty() {
        bot.send_message(msg.chat.id, "Usage: /deletetask <task_id>\nUse /listtasks to see task IDs")
            .await?;
        return Ok(());
    }
    let deleted = match uuid::Uuid::parse_str(raw_id) {
        Ok(id) => deps.vault.delete_task(id, user_id).await?,
        Err(_) => false,
    };
    if deleted {
        bot.send_message(msg.chat.id, "✅ Task deleted successfully!").await?;
    } else {
        bot.send_message(msg.chat.id, "❌ Failed to delete task. Check the ID and try again.")
            .await?;
    }
    Ok(())
}

/// /addtask
pub async fn handle_add_task(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> AppResult<()> {
    if require_user(bot, msg, deps).await?.is_none() {
        return Ok(());
    }
    TaskWizard::start_add(bot, msg.chat.id, deps, msg.chat.id.0).await
}

/// /listtasks
pub async fn handle_list_tasks(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> AppResult<()> {
    let Some(user_id) = require_user(bot, msg, deps).await? else {
        return Ok(());
    };
    let (text, kb) = views::task_list(deps, user_id, TaskFilter::All, 0).await?;
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(kb)
        .await?;
    Ok(())
}

/// /listfiles
pub async fn handle_list_files(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> AppResult<()> {
    let Some(user_id) = require_user(bot, msg, deps).await? else {
        return Ok(());
    };
    let (text, kb) = views::file_list(deps, user_id, None, 0).await?;
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(kb)
        .await?;
    Ok(())
}

/// /settings
pub async fn handle_settings(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> AppResult<()> {
    let Some(user_id) = require_user(bot, msg, deps).await? else {
        return Ok(());
    };
    let text = menu::settings_menu_text(deps, user_id).await?;
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(keyboard::settings_menu())
        .await?;
    Ok(())
}
