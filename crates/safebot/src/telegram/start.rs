//! /start flow — registration and master-password login.
//!
//! `/start` looks the user up and arms the pre-auth state; the next text
//! message is treated as the master password (and deleted from the chat
//! immediately). Deep-link payloads survive authentication and route the
//! user to the feature they clicked.

use safecore::error::AppResult;
use safecore::session::AuthIntent;
use safecore::storage::UserRecord;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use super::deep_links::DeepLink;
use super::handlers::HandlerDeps;
use super::wizard::password::PasswordWizard;
use super::wizard::task::TaskWizard;
use super::{formatters, markdown, menu};

use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Deep link remembered between /start and the password message.
static PENDING_LINKS: Lazy<DashMap<i64, DeepLink>> = Lazy::new(DashMap::new);

fn first_name(msg: &Message) -> String {
    msg.from.as_ref().map(|u| u.first_name.clone()).unwrap_or_else(|| "there".to_string())
}

/// Handles /start (with optional deep-link payload).
pub async fn handle_start(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> AppResult<()> {
    let chat_id = msg.chat.id;
    let telegram_id = chat_id.0;
    let name = first_name(msg);

    // Stale wizard state never survives a fresh /start.
    deps.scenes.cancel(telegram_id);

    let payload = msg
        .text()
        .and_then(|t| t.strip_prefix("/start"))
        .map(str::trim)
        .unwrap_or_default();
    let deep_link = DeepLink::parse(payload);
    if let Some(link) = deep_link {
        log::info!("Deep link detected for user {}: {:?}", telegram_id, link);
        PENDING_LINKS.insert(telegram_id, link);
    } else {
        PENDING_LINKS.remove(&telegram_id);
    }

    match deps.vault.get_user_by_telegram_id(telegram_id).await? {
        Some(_) => {
            deps.sessions.begin_auth(telegram_id, AuthIntent::AwaitingLogin);
            let mut text = format!("👋 Welcome back, {}\\!\n\n", markdown::escape(&name));
            if let Some(link) = deep_link {
                text.push_str(&format!("You're accessing: {}\n\n", markdown::escape(link.description())));
            }
            text.push_str("Please enter your master password to continue:");
            bot.send_message(chat_id, text).parse_mode(ParseMode::MarkdownV2).await?;
        }
        None => {
            deps.sessions.begin_auth(telegram_id, AuthIntent::AwaitingRegistration);
            bot.send_message(chat_id, formatters::welcome_message(&name))
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
            bot.send_message(chat_id, formatters::master_password_rules())
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
        }
    }
    Ok(())
}

/// Handles the text message following /start: verifies or creates the
/// master password. Returns false when no auth is pending for this user.
pub async fn handle_master_password(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> AppResult<bool> {
    let chat_id = msg.chat.id;
    let telegram_id = chat_id.0;
    let Some(intent) = deps.sessions.take_pending_auth(telegram_id) else {
        return Ok(false);
    };
    let Some(password) = msg.text().map(str::to_string) else {
        deps.sessions.retry_auth(telegram_id, intent);
        return Ok(false);
    };

    // Never leave the master password sitting in the chat history.
    if let Err(e) = bot.delete_message(chat_id, msg.id).await {
        log::warn!("Could not delete master password message: {}", e);
    }

    match intent {
        AuthIntent::AwaitingLogin => {
            let Some(user) = deps.vault.get_user_by_telegram_id(telegram_id).await? else {
                // Account vanished between /start and the password message
                bot.send_message(chat_id, "❌ Account not found. Please /start again.").await?;
                return Ok(true);
            };
            if deps.auth.verify_master_password(&password, &user.master_password_hash) {
                open_session(bot, msg, deps, &user).await?;
            } else {
                deps.sessions.retry_auth(telegram_id, intent);
                bot.send_message(chat_id, "❌ Incorrect master password. Please try again:").await?;
            }
        }
        AuthIntent::AwaitingRegistration => {
            if let Err(reason) = deps.auth.validate_strength(&password) {
                deps.sessions.retry_auth(telegram_id, intent);
                bot.send_message(chat_id, format!("❌ {}\n\nPlease try again:", reason)).await?;
                return Ok(true);
            }
            let hash = deps
                .auth
                .hash_master_password(&password)
                .map_err(safecore::error::AppError::Validation)?;
            match deps.vault.create_user(telegram_id, &hash).await {
                Ok(user) => {
                    log::info!("New user registered: {}", telegram_id);
                    open_session(bot, msg, deps, &user).await?;
                }
                Err(e) => {
                    log::error!("Failed to create user {}: {}", telegram_id, e);
                    bot.send_message(chat_id, "❌ Failed to create account. Please try /start again.").await?;
                }
            }
        }
    }
    Ok(true)
}

/// Opens the session, then routes to the deep-linked feature or main menu.
async fn open_session(bot: &Bot, msg: &Message, deps: &HandlerDeps, user: &UserRecord) -> AppResult<()> {
    let chat_id = msg.chat.id;
    let telegram_id = chat_id.0;

    let settings = deps.vault.get_user_settings(user.id).await.unwrap_or_default();
    let auto_lock = std::time::Duration::from_secs(settings.auto_lock_minutes * 60);
    deps.sessions.login(telegram_id, user.id, auto_lock);

    let link = PENDING_LINKS.remove(&telegram_id).map(|(_, link)| link);
    if let Some(link) = link {
        bot.send_message(
            chat_id,
            format!(
                "✅ *Authentication Successful\\!*\n\nTaking you to: {}",
                markdown::escape(link.description())
            ),
        )
        .parse_mode(ParseMode::MarkdownV2)
        .await?;
        return follow_deep_link(bot, chat_id, deps, telegram_id, user, link).await;
    }

    menu::send_main_menu(bot, chat_id, &first_name(msg)).await
}

async fn follow_deep_link(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    telegram_id: i64,
    user: &UserRecord,
    link: DeepLink,
) -> AppResult<()> {
    use super::menu::views;
    use safecore::callback::TaskFilter;

    match link {
        DeepLink::AddPassword => PasswordWizard::start_save(bot, chat_id, deps, telegram_id).await,
        DeepLink::AddTask => TaskWizard::start_add(bot, chat_id, deps, telegram_id).await,
        DeepLink::UploadFile => {
            super::wizard::file::FileWizard::start_upload(bot, chat_id, deps, telegram_id).await
        }
        DeepLink::ViewPasswords => {
            let (text, kb) = views::password_list(deps, user.id, 0).await?;
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::MarkdownV2)
                .reply_markup(kb)
                .await?;
            Ok(())
        }
        DeepLink::ViewTasks => {
            let (text, kb) = views::task_list(deps, user.id, TaskFilter::All, 0).await?;
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::MarkdownV2)
                .reply_markup(kb)
                .await?;
            Ok(())
        }
        DeepLink::ViewFiles => {
            let (text, kb) = views::file_list(deps, user.id, None, 0).await?;
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::MarkdownV2)
                .reply_markup(kb)
                .await?;
            Ok(())
        }
        DeepLink::Search => {
            bot.send_message(chat_id, menu::search_menu_text())
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
            Ok(())
        }
        DeepLink::Settings => {
            let text = menu::settings_menu_text(deps, user.id).await?;
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::MarkdownV2)
                .reply_markup(crate::telegram::keyboard::settings_menu())
                .await?;
            Ok(())
        }
    }
}

/// Avoid leaking memory for users who tapped a deep link and never logged
/// in; called from the periodic sweep alongside the scene TTL.
pub fn sweep_pending_links() {
    if PENDING_LINKS.len() > 10_000 {
        PENDING_LINKS.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_link_survival_map_is_per_user() {
        PENDING_LINKS.insert(7001, DeepLink::AddTask);
        PENDING_LINKS.insert(7002, DeepLink::Search);
        assert_eq!(PENDING_LINKS.remove(&7001).map(|(_, l)| l), Some(DeepLink::AddTask));
        assert_eq!(PENDING_LINKS.remove(&7001).map(|(_, l)| l), None);
        PENDING_LINKS.remove(&7002);
    }
}
