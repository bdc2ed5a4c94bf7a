//! Change-master-password wizard: change_password.
//!
//! Every message in this flow is secret input, so each one is deleted from
//! the chat before validation.

use async_trait::async_trait;
use safecore::error::AppResult;
use safecore::scene::{SceneKind, SceneValue, Step};
use teloxide::prelude::*;

use super::{delete_secret_message, send_prompt, WizardAction, WizardFlow};
use crate::telegram::handlers::HandlerDeps;
use crate::telegram::keyboard;

pub struct SettingsWizard;

impl SettingsWizard {
    /// Starts the change-password wizard and asks for the current password.
    pub async fn start_change_password(
        bot: &Bot,
        chat_id: ChatId,
        deps: &HandlerDeps,
        telegram_id: i64,
    ) -> AppResult<()> {
        let first = deps.scenes.start(telegram_id, SceneKind::ChangePassword);
        SettingsWizard.prompt(bot, chat_id, deps, telegram_id, first).await
    }
}

#[async_trait]
impl WizardFlow for SettingsWizard {
    fn kinds(&self) -> &'static [SceneKind] {
        &[SceneKind::ChangePassword]
    }

    async fn prompt(
        &self,
        bot: &Bot,
        chat_id: ChatId,
        _deps: &HandlerDeps,
        _telegram_id: i64,
        step: Step,
    ) -> AppResult<()> {
        match step {
            Step::CurrentPassword => {
                send_prompt(
                    bot,
                    chat_id,
                    "🔑 *Change Master Password*\n\nStep 1/3: *Current Password*\nPlease enter your current master password:",
                    Some(keyboard::cancel_row()),
                )
                .await
            }
            Step::NewPassword => {
                send_prompt(
                    bot,
                    chat_id,
                    "✅ Password verified\\.\n\nStep 2/3: *New Password*\nEnter your new strong password:",
                    Some(keyboard::cancel_row()),
                )
                .await
            }
            Step::ConfirmPassword => {
                send_prompt(
                    bot,
                    chat_id,
                    "Step 3/3: *Confirm Password*\nPlease re\\-enter your new password:",
                    Some(keyboard::cancel_row()),
                )
                .await
            }
            other => {
                log::error!("Settings wizard asked to prompt foreign step '{}'", other);
                Ok(())
            }
        }
    }

    async fn handle_text(
        &self,
        bot: &Bot,
        msg: &Message,
        deps: &HandlerDeps,
        telegram_id: i64,
        text: &str,
    ) -> AppResult<()> {
        let chat_id = msg.chat.id;
        let Some(step) = deps.scenes.current_step(telegram_id) else {
            return Ok(());
        };
        delete_secret_message(bot, msg).await;

        let Some(user_id) = deps.auth_user(telegram_id) else {
            deps.scenes.cancel(telegram_id);
            bot.send_message(chat_id, "❌ Session expired. Please /start again.").await?;
            return Ok(());
        };

        match step {
            Step::CurrentPassword => {
                let record = deps.vault.get_user_by_telegram_id(telegram_id).await?;
                let verified = record
                    .map(|u| deps.auth.verify_master_password(text, &u.master_password_hash))
                    .unwrap_or(false);
                if !verified {
                    bot.send_message(chat_id, "❌ Incorrect password. Please try again:").await?;
                    return Ok(());
                }
                if let Some(next) = deps.scenes.advance(telegram_id) {
                    self.prompt(bot, chat_id, deps, telegram_id, next).await?;
                }
            }
            Step::NewPassword => {
                if let Err(reason) = deps.auth.validate_strength(text) {
                    bot.send_message(chat_id, format!("❌ {}\nPlease try again:", reason)).await?;
                    return Ok(());
                }
                if let Some(next) =
                    deps.scenes
                        .record_and_advance(telegram_id, "new_password", SceneValue::Text(text.to_string()))
                {
                    self.prompt(bot, chat_id, deps, telegram_id, next).await?;
                }
            }
            Step::ConfirmPassword => {
                let expected = deps
                    .scenes
                    .get_data(telegram_id, "new_password")
                    .and_then(|v| v.as_text().map(str::to_string))
                    .unwrap_or_default();
                if text != expected {
                    bot.send_message(chat_id, "❌ Passwords do not match. Please try again:").await?;
                    return Ok(());
                }

                let new_hash = match deps.auth.hash_master_password(&expected) {
                    Ok(hash) => hash,
                    Err(reason) => {
                        deps.scenes.cancel(telegram_id);
                        bot.send_message(chat_id, format!("❌ {}", reason)).await?;
                        return Ok(());
                    }
                };
                match deps.vault.update_master_password(user_id, &new_hash).await {
                    Ok(true) => {
                        deps.scenes.complete(telegram_id);
                        send_prompt(
                            bot,
                            chat_id,
                            "✅ *Success\\!*\n\nYour master password has been changed\\.",
                            Some(keyboard::back_to("◀️ Back to Settings", &safecore::callback::Callback::MenuSettings)),
                        )
                        .await?;
                    }
                    Ok(false) => {
                        deps.scenes.cancel(telegram_id);
                        bot.send_message(chat_id, "❌ Failed to update password. Please try again later.")
                            .await?;
                    }
                    Err(e) => {
                        log::error!("Failed to update master password for user {}: {}", telegram_id, e);
                        // No partial state to keep: drop the wizard, the old
                        // password still works.
                        deps.scenes.cancel(telegram_id);
                        bot.send_message(chat_id, "❌ Failed to update password. Please try again later.")
                            .await?;
                    }
                }
            }
            other => {
                log::warn!("Settings wizard received text on foreign step '{}'", other);
            }
        }
        Ok(())
    }

    async fn handle_action(
        &self,
        _bot: &Bot,
        _chat_id: ChatId,
        _deps: &HandlerDeps,
        telegram_id: i64,
        action: WizardAction,
    ) -> AppResult<()> {
        // Every step here is secret text input; the only button is Cancel,
        // which the router handles before reaching the flow.
        log::debug!(
            "Ignoring wizard action {:?} in change-password flow for user {}",
            action,
            telegram_id
        );
        Ok(())
    }
}
