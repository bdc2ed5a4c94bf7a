//! Central router for inline-keyboard callback queries.
//!
//! Decodes the token, gates on authentication, then dispatches on the typed
//! action. All handler errors stop at this boundary: they are logged with
//! the full callback payload and converted into one generic apology, so a
//! failing handler can never leave the user staring at a dead button — or
//! leave a wizard half-advanced (scene transitions are atomic inside the
//! scene manager).

use safecore::callback::Callback;
use safecore::error::{AppError, AppResult};
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};
use uuid::Uuid;

use super::views;
use crate::telegram::handlers::HandlerDeps;
use crate::telegram::wizard::{self, WizardAction};
use crate::telegram::{files, keyboard, menu, search};
use crate::telegram::wizard::file::FileWizard;
use crate::telegram::wizard::password::PasswordWizard;
use crate::telegram::wizard::settings::SettingsWizard;
use crate::telegram::wizard::task::TaskWizard;

/// Telegram rejects edits that change nothing; a user double-tapping the
/// same button triggers exactly that and it is not an error.
fn is_message_not_modified(err: &teloxide::RequestError) -> bool {
    err.to_string().to_lowercase().contains("message is not modified")
}

/// Handles callback queries from the inline keyboards.
pub async fn handle_callback_query(bot: Bot, q: CallbackQuery, deps: HandlerDeps) -> ResponseResult<()> {
    let callback_id = q.id.clone();
    let _ = bot.answer_callback_query(callback_id).await;

    let Some(data) = q.data.clone() else {
        return Ok(());
    };
    let chat_id = q.message.as_ref().map(|m| m.chat().id);
    let message_id = q.message.as_ref().map(|m| m.id());
    let (Some(chat_id), Some(message_id)) = (chat_id, message_id) else {
        return Ok(());
    };

    let action = Callback::decode(&data);
    match route(&bot, &q, &deps, chat_id, message_id, action).await {
        Ok(()) => {}
        Err(AppError::Telegram(e)) if is_message_not_modified(&e) => {
            log::debug!("Message not modified for callback '{}' - content is identical", data);
        }
        Err(e) => {
            let telegram_id = chat_id.0;
            log::error!("Error handling callback for user {}: {}", telegram_id, e);
            log::error!("Callback data: {}", data);
            let apology = "❌ An error occurred. Please try again or /start to return to main menu.";
            if let Err(edit_err) = bot.edit_message_text(chat_id, message_id, apology).await {
                if !is_message_not_modified(&edit_err) {
                    log::debug!("Could not edit message to show error: {}", edit_err);
                }
            }
        }
    }
    Ok(())
}

async fn route(
    bot: &Bot,
    q: &CallbackQuery,
    deps: &HandlerDeps,
    chat_id: ChatId,
    message_id: MessageId,
    action: Callback,
) -> AppResult<()> {
    let telegram_id = chat_id.0;
    let user_name = q.from.first_name.clone();

    // Page indicators do nothing; the main menu is reachable pre-auth so a
    // stale menu message stays navigable.
    if action == Callback::Noop {
        return Ok(());
    }
    if action == Callback::MainMenu {
        return menu::edit_main_menu(bot, chat_id, message_id, &user_name).await;
    }

    let Some(user_id) = deps.auth_user(telegram_id) else {
        bot.edit_message_text(chat_id, message_id, "❌ Session expired. Please /start again to authenticate.")
            .await?;
        return Ok(());
    };

    match action {
        Callback::Noop | Callback::MainMenu => Ok(()),

        Callback::QuickActions => {
            edit(bot, chat_id, message_id, "⚡ *Quick Actions*".to_string(), keyboard::quick_actions()).await
        }

        // ==================== Category menus ====================
        Callback::MenuPasswords => {
            edit(bot, chat_id, message_id, menu::password_menu_text(), keyboard::password_menu()).await
        }
        Callback::MenuTasks => edit(bot, chat_id, message_id, menu::task_menu_text(), keyboard::task_menu()).await,
        Callback::MenuFiles => edit(bot, chat_id, message_id, menu::file_menu_text(), keyboard::file_menu()).await,
        Callback::MenuSearch | Callback::PasswordSearch => {
            edit(
                bot,
                chat_id,
                message_id,
                menu::search_menu_text(),
                keyboard::back_to("◀️ Back to Main Menu", &Callback::MainMenu),
            )
            .await
        }
        Callback::MenuAi => edit(bot, chat_id, message_id, menu::ai_menu_text(), keyboard::ai_menu()).await,
        Callback::MenuSettings => {
            let text = menu::settings_menu_text(deps, user_id).await?;
            edit(bot, chat_id, message_id, text, keyboard::settings_menu()).await
        }

        // ==================== Passwords ====================
        Callback::PasswordSaveStart => PasswordWizard::start_save(bot, chat_id, deps, telegram_id).await,
        Callback::PasswordList { page } => {
            let (text, kb) = views::password_list(deps, user_id, page).await?;
            edit(bot, chat_id, message_id, text, kb).await
        }
        Callback::PasswordView { id } => {
            let (text, kb) = views::password_detail(deps, user_id, &id).await?;
            let sent = bot
                .send_message(chat_id, text)
                .parse_mode(ParseMode::MarkdownV2)
                .reply_markup(kb)
                .await?;
            schedule_self_destruct(bot.clone(), chat_id, sent.id);
            Ok(())
        }
        Callback::PasswordCopy { id } => {
            let secret = views::password_secret(deps, user_id, &id).await?;
            let sent = bot
                .send_message(chat_id, format!("`{}`", crate::telegram::markdown::escape(&secret)))
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
            schedule_self_destruct(bot.clone(), chat_id, sent.id);
            Ok(())
        }
        Callback::PasswordEdit { id } => PasswordWizard::start_edit(bot, chat_id, deps, telegram_id, &id).await,
        Callback::PasswordDelete { id } => {
            let deleted = match Uuid::parse_str(&id) {
                Ok(id) => deps.vault.delete_password(id, user_id).await?,
                Err(_) => false,
            };
            if deleted {
                let (text, kb) = views::password_list(deps, user_id, 0).await?;
                edit(bot, chat_id, message_id, text, kb).await
            } else {
                bot.edit_message_text(chat_id, message_id, "❌ Password not found. It may already be deleted.")
                    .await?;
                Ok(())
            }
        }

        // ==================== Tasks ====================
        Callback::TaskAddStart => TaskWizard::start_add(bot, chat_id, deps, telegram_id).await,
        Callback::TaskList { page, filter } => {
            let (text, kb) = views::task_list(deps, user_id, filter, page).await?;
            edit(bot, chat_id, message_id, text, kb).await
        }
        Callback::TaskView { id } => {
            let (text, kb) = views::task_detail(deps, user_id, &id).await?;
            edit(bot, chat_id, message_id, text, kb).await
        }
        Callback::TaskEdit { id } => TaskWizard::start_edit(bot, chat_id, deps, telegram_id, &id).await,
        Callback::TaskStatus { id, status } => {
            let (text, kb) = views::set_task_status(deps, user_id, &id, status).await?;
            edit(bot, chat_id, message_id, text, kb).await
        }
        Callback::TaskDelete { id } => {
            let deleted = match Uuid::parse_str(&id) {
                Ok(id) => deps.vault.delete_task(id, user_id).await?,
                Err(_) => false,
            };
            if deleted {
                let (text, kb) = views::task_list(deps, user_id, safecore::callback::TaskFilter::All, 0).await?;
                edit(bot, chat_id, message_id, text, kb).await
            } else {
                bot.edit_message_text(chat_id, message_id, "❌ Task not found. It may already be deleted.")
                    .await?;
                Ok(())
            }
        }

        // ==================== Files ====================
        Callback::FileUploadStart => FileWizard::start_upload(bot, chat_id, deps, telegram_id).await,
        Callback::FileList { page, filter } => {
            let (text, kb) = views::file_list(deps, user_id, filter, page).await?;
            edit(bot, chat_id, message_id, text, kb).await
        }
        Callback::FileView { id } => {
            let (text, kb) = views::file_detail(deps, user_id, &id).await?;
            edit(bot, chat_id, message_id, text, kb).await
        }
        Callback::FileDownload { id } | Callback::FileShare { id } => {
            files::send_stored_file(bot, chat_id, deps, user_id, &id).await
        }
        Callback::FileDelete { id } => {
            let deleted = match Uuid::parse_str(&id) {
                Ok(id) => deps.vault.delete_file(id, user_id).await?,
                Err(_) => false,
            };
            if deleted {
                let (text, kb) = views::file_list(deps, user_id, None, 0).await?;
                edit(bot, chat_id, message_id, text, kb).await
            } else {
                bot.edit_message_text(chat_id, message_id, "❌ File not found. It may already be deleted.")
                    .await?;
                Ok(())
            }
        }

        // ==================== AI ====================
        Callback::AiTag => search::handle_auto_tag(bot, chat_id, deps).await,
        Callback::AiSummarizeTasks => search::handle_summarize(bot, chat_id, deps).await,

        // ==================== Settings ====================
        Callback::SettingsLogout => {
            deps.scenes.cancel(telegram_id);
            deps.sessions.logout(telegram_id);
            bot.edit_message_text(
                chat_id,
                message_id,
                "👋 Logged out. Your session has been cleared securely.\nUse /start to log in again.",
            )
            .await?;
            Ok(())
        }
        Callback::SettingsSecurity => {
            let settings = deps.vault.get_user_settings(user_id).await?;
            let text = format!(
                "🔒 *Security Settings*\n\n\
                 Manage your account security\\.\n\n\
                 • *Encryption*: AES\\-256 \\(Always On\\)\n\
                 • *Auto\\-Lock*: {} Minutes",
                settings.auto_lock_minutes
            );
            edit(bot, chat_id, message_id, text, keyboard::security_menu()).await
        }
        Callback::SettingsNotifications => {
            let settings = deps.vault.get_user_settings(user_id).await?;
            let text = notifications_text(settings.task_reminders, settings.weekly_summary);
            edit(
                bot,
                chat_id,
                message_id,
                text,
                keyboard::notifications_menu(settings.task_reminders, settings.weekly_summary),
            )
            .await
        }
        Callback::SettingsAutoLock => {
            let mut settings = deps.vault.get_user_settings(user_id).await?;
            settings.cycle_auto_lock();
            deps.vault.update_user_settings(user_id, &settings).await?;
            deps.sessions
                .set_auto_lock(telegram_id, std::time::Duration::from_secs(settings.auto_lock_minutes * 60));
            let text = format!(
                "🔒 *Security Settings*\n\n\
                 Manage your account security\\.\n\n\
                 • *Encryption*: AES\\-256 \\(Always On\\)\n\
                 • *Auto\\-Lock*: {} Minutes",
                settings.auto_lock_minutes
            );
            edit(bot, chat_id, message_id, text, keyboard::security_menu()).await
        }
        Callback::SettingsChangePass => SettingsWizard::start_change_password(bot, chat_id, deps, telegram_id).await,
        Callback::SettingsToggleReminders => {
            let mut settings = deps.vault.get_user_settings(user_id).await?;
            settings.task_reminders = !settings.task_reminders;
            deps.vault.update_user_settings(user_id, &settings).await?;
            let text = notifications_text(settings.task_reminders, settings.weekly_summary);
            edit(
                bot,
                chat_id,
                message_id,
                text,
                keyboard::notifications_menu(settings.task_reminders, settings.weekly_summary),
            )
            .await
        }
        Callback::SettingsToggleSummary => {
            let mut settings = deps.vault.get_user_settings(user_id).await?;
            settings.weekly_summary = !settings.weekly_summary;
            deps.vault.update_user_settings(user_id, &settings).await?;
            let text = notifications_text(settings.task_reminders, settings.weekly_summary);
            edit(
                bot,
                chat_id,
                message_id,
                text,
                keyboard::notifications_menu(settings.task_reminders, settings.weekly_summary),
            )
            .await
        }

        // ==================== Wizard buttons ====================
        Callback::WizardSkip => {
            wizard::dispatch_action(bot, chat_id, deps, telegram_id, WizardAction::Skip).await
        }
        Callback::WizardBack => {
            wizard::dispatch_action(bot, chat_id, deps, telegram_id, WizardAction::Back).await
        }
        Callback::WizardConfirm => {
            wizard::dispatch_action(bot, chat_id, deps, telegram_id, WizardAction::Confirm).await
        }
        Callback::SelectPriority { level } => {
            wizard::dispatch_action(bot, chat_id, deps, telegram_id, WizardAction::SetPriority(level)).await
        }
        Callback::SelectDue { choice } => {
            wizard::dispatch_action(bot, chat_id, deps, telegram_id, WizardAction::SetDue(choice)).await
        }
        Callback::Cancel => {
            deps.scenes.cancel(telegram_id);
            bot.edit_message_text(
                chat_id,
                message_id,
                "❌ Operation cancelled.\n\nUse /start to return to the main menu.",
            )
            .await?;
            Ok(())
        }

        Callback::Error => {
            log::warn!("Undecodable callback payload from user {}", telegram_id);
            bot.edit_message_text(
                chat_id,
                message_id,
                "⚠️ Unknown action. Please try again or /start to return to main menu.",
            )
            .await?;
            Ok(())
        }
    }
}

fn notifications_text(tasks_on: bool, summary_on: bool) -> String {
    let tasks_icon = if tasks_on { "✅" } else { "❌" };
    let summary_icon = if summary_on { "✅" } else { "❌" };
    format!(
        "🔔 *Notification Settings*\n\n\
         Customize your alerts\\.\n\n\
         • *Task Reminders*: {} {}\n\
         • *Weekly Summary*: {} {}\n\
         • *Security Alerts*: ✅ On",
        tasks_icon,
        if tasks_on { "On" } else { "Off" },
        summary_icon,
        if summary_on { "On" } else { "Off" },
    )
}

async fn edit(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: String,
    keyboard: teloxide::types::InlineKeyboardMarkup,
) -> AppResult<()> {
    bot.edit_message_text(chat_id, message_id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

/// Deletes a revealed-secret message after the configured delay.
fn schedule_self_destruct(bot: Bot, chat_id: ChatId, message_id: MessageId) {
    tokio::spawn(async move {
        tokio::time::sleep(safecore::config::security::reveal_delay()).await;
        if let Err(e) = bot.delete_message(chat_id, message_id).await {
            log::debug!("Could not delete revealed secret message: {}", e);
        }
    });
}
