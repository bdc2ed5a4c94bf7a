//! Natural-language search and AI features.
//!
//! Everything here decrypts locally first and forwards only plaintext
//! summaries to the assistant; the assistant returns record ids (search)
//! or display text (summaries, tag suggestions).

use safecore::ai::SearchItem;
use safecore::error::AppResult;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use super::handlers::HandlerDeps;
use super::{keyboard, markdown};

/// /search <query> across passwords, tasks, and files.
pub async fn handle_search(bot: &Bot, msg: &Message, deps: &HandlerDeps, query: &str) -> AppResult<()> {
    let chat_id = msg.chat.id;
    let telegram_id = chat_id.0;

    let Some(user_id) = deps.auth_user(telegram_id) else {
        bot.send_message(chat_id, "❌ Please /start and authenticate first.").await?;
        return Ok(());
    };
    let query = query.trim();
    if query.is_empty() {
        bot.send_message(
            chat_id,
            "Usage: /search <query>\nExample: /search work passwords\nExample: /search urgent tasks",
        )
        .await?;
        return Ok(());
    }

    bot.send_message(chat_id, "🔍 Searching...").await?;

    // Build plaintext summaries per category
    let passwords = deps.vault.get_passwords(user_id, None).await?;
    let password_items: Vec<SearchItem> = passwords
        .iter()
        .map(|p| SearchItem {
            id: p.id.to_string(),
            summary: format!("Service: {}, Tags: {}", p.service_name, p.tags.join(", ")),
        })
        .collect();

    let tasks = deps.vault.get_tasks(user_id, None).await?;
    let mut task_items = Vec::with_capacity(tasks.len());
    for task in &tasks {
        let content = deps.crypto.decrypt(&task.encrypted_content)?;
        task_items.push(SearchItem {
            id: task.id.to_string(),
            summary: format!("Task: {}, Priority: {}", content, task.priority.as_str()),
        });
    }

    let files = deps.vault.get_files(user_id, None).await?;
    let file_items: Vec<SearchItem> = files
        .iter()
        .map(|f| SearchItem {
            id: f.id.to_string(),
            summary: format!("File: {}, Type: {}", f.file_name, f.mime_type),
        })
        .collect();

    let password_hits = deps.assistant.search(query, &password_items, "passwords").await?;
    let task_hits = deps.assistant.search(query, &task_items, "tasks").await?;
    let file_hits = deps.assistant.search(query, &file_items, "files").await?;

    let mut message = format!("🔍 *Search Results for:* '{}'\n\n", markdown::escape(query));
    if !password_hits.is_empty() {
        message.push_str(&format!("🔐 *Passwords* \\({}\\)\n", password_hits.len()));
        for id in &password_hits {
            if let Some(p) = passwords.iter().find(|p| p.id.to_string() == *id) {
                message.push_str(&format!("• {} \\(ID: `{}`\\)\n", markdown::escape(&p.service_name), p.id));
            }
        }
        message.push('\n');
    }
    if !task_hits.is_empty() {
        message.push_str(&format!("✅ *Tasks* \\({}\\)\n", task_hits.len()));
        for id in &task_hits {
            if let Some(item) = task_items.iter().find(|t| t.id == *id) {
                let content = item.summary.trim_start_matches("Task: ");
                let content = content.split(", Priority:").next().unwrap_or(content);
                message.push_str(&format!("• {} \\(ID: `{}`\\)\n", markdown::escape(content), id));
            }
        }
        message.push('\n');
    }
    if !file_hits.is_empty() {
        message.push_str(&format!("📁 *Files* \\({}\\)\n", file_hits.len()));
        for id in &file_hits {
            if let Some(f) = files.iter().find(|f| f.id.to_string() == *id) {
                message.push_str(&format!("• {} \\(ID: `{}`\\)\n", markdown::escape(&f.file_name), f.id));
            }
        }
        message.push('\n');
    }
    if password_hits.is_empty() && task_hits.is_empty() && file_hits.is_empty() {
        message.push_str("No results found\\.");
    }

    bot.send_message(chat_id, message).parse_mode(ParseMode::MarkdownV2).await?;
    Ok(())
}

/// /summarize — AI summary of the user's tasks.
pub async fn handle_summarize(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps) -> AppResult<()> {
    let telegram_id = chat_id.0;
    let Some(user_id) = deps.auth_user(telegram_id) else {
        bot.send_message(chat_id, "❌ Please /start and authenticate first.").await?;
        return Ok(());
    };

    let tasks = deps.vault.get_tasks(user_id, None).await?;
    if tasks.is_empty() {
        bot.send_message(chat_id, "You have no tasks to summarize.").await?;
        return Ok(());
    }

    bot.send_message(chat_id, "🤖 Generating summary...").await?;

    let mut lines = Vec::with_capacity(tasks.len());
    for task in &tasks {
        let content = deps.crypto.decrypt(&task.encrypted_content)?;
        lines.push(format!(
            "- {} (Priority: {}, Status: {})",
            content,
            task.priority.as_str(),
            task.status.as_str()
        ));
    }

    match deps.assistant.summarize_tasks(&lines).await {
        Ok(summary) => {
            bot.send_message(
                chat_id,
                format!("📊 *Task Summary*\n\n{}", markdown::escape(&summary)),
            )
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(keyboard::back_to("◀️ Back to Menu", &safecore::callback::Callback::MenuAi))
            .await?;
        }
        Err(e) => {
            log::error!("Summarization failed for user {}: {}", telegram_id, e);
            bot.send_message(chat_id, "❌ Failed to generate summary. Please try /listtasks instead.")
                .await?;
        }
    }
    Ok(())
}

/// AI auto-tag: suggests tags for the first few untagged passwords.
pub async fn handle_auto_tag(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps) -> AppResult<()> {
    let telegram_id = chat_id.0;
    let Some(user_id) = deps.auth_user(telegram_id) else {
        bot.send_message(chat_id, "❌ Please /start and authenticate first.").await?;
        return Ok(());
    };

    bot.send_message(chat_id, "🤖 Analyzing your data... This may take a moment.").await?;

    let passwords = deps.vault.get_passwords(user_id, None).await?;
    let untagged: Vec<_> = passwords.iter().filter(|p| p.tags.is_empty()).collect();
    if untagged.is_empty() {
        bot.send_message(chat_id, "✅ All your items are already tagged!")
            .reply_markup(keyboard::back_to("◀️ Back", &safecore::callback::Callback::MenuAi))
            .await?;
        return Ok(());
    }

    let mut suggestions = Vec::new();
    for entry in untagged.iter().take(safecore::config::ai::AUTO_TAG_BATCH) {
        match deps.assistant.suggest_tags(&entry.service_name, "password").await {
            Ok(tags) if !tags.is_empty() => {
                suggestions.push(format!(
                    "• *{}*: {}",
                    markdown::escape(&entry.service_name),
                    markdown::escape(&tags.join(", "))
                ));
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("Tag suggestion failed for '{}': {}", entry.service_name, e);
            }
        }
    }

    let message = if suggestions.is_empty() {
        "❌ Could not generate tag suggestions right now\\. Please try again later\\.".to_string()
    } else {
        format!(
            "🏷️ *Tag Suggestions*\n\nHere are some suggestions for your untagged items:\n\n{}",
            suggestions.join("\n")
        )
    };

    bot.send_message(chat_id, message)
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(keyboard::back_to("◀️ Back", &safecore::callback::Callback::MenuAi))
        .await?;
    Ok(())
}
