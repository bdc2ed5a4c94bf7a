//! Password wizards: save_password and edit_password.

use async_trait::async_trait;
use safecore::error::AppResult;
use safecore::scene::{SceneKind, SceneValue, Step};
use safecore::storage::vault::NewPassword;
use safecore::validation;
use teloxide::prelude::*;

use super::{delete_secret_message, is_skip, send_prompt, WizardAction, WizardFlow};
use crate::telegram::handlers::HandlerDeps;
use crate::telegram::{keyboard, markdown};

/// Fields the edit wizard can change.
const EDITABLE_FIELDS: &[&str] = &["service", "username", "password"];

pub struct PasswordWizard;

impl PasswordWizard {
    /// Starts the save wizard and sends the first prompt.
    pub async fn start_save(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, telegram_id: i64) -> AppResult<()> {
        let first = deps.scenes.start(telegram_id, SceneKind::SavePassword);
        PASSWORD_PROMPTS.prompt(bot, chat_id, deps, telegram_id, first).await
    }

    /// Starts the edit wizard for one entry and sends the first prompt.
    pub async fn start_edit(
        bot: &Bot,
        chat_id: ChatId,
        deps: &HandlerDeps,
        telegram_id: i64,
        password_id: &str,
    ) -> AppResult<()> {
        let first = deps.scenes.start(telegram_id, SceneKind::EditPassword);
        deps.scenes
            .set_data(telegram_id, "password_id", SceneValue::Text(password_id.to_string()));
        PASSWORD_PROMPTS.prompt(bot, chat_id, deps, telegram_id, first).await
    }

    async fn finish_save(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, telegram_id: i64) -> AppResult<()> {
        let Some(user_id) = deps.auth_user(telegram_id) else {
            deps.scenes.cancel(telegram_id);
            bot.send_message(chat_id, "❌ Session expired. Please /start again.").await?;
            return Ok(());
        };
        let Some(data) = deps.scenes.complete(telegram_id) else {
            return Ok(());
        };

        let service_name = data
            .get("service_name")
            .and_then(|v| v.as_text())
            .unwrap_or_default()
            .to_string();
        let username = data.get("username").and_then(|v| v.as_text()).unwrap_or_default();
        let password = data.get("password").and_then(|v| v.as_text()).unwrap_or_default();
        let tags = data
            .get("tags")
            .and_then(|v| v.as_tags())
            .map(<[String]>::to_vec)
            .unwrap_or_default();

        let entry = NewPassword {
            service_name: service_name.clone(),
            encrypted_username: deps.crypto.encrypt(username)?,
            encrypted_password: deps.crypto.encrypt(password)?,
            tags: tags.clone(),
        };

        match deps.vault.save_password(user_id, entry).await {
            Ok(_) => {
                let tags_line = if tags.is_empty() { "None".to_string() } else { tags.join(", ") };
                send_prompt(
                    bot,
                    chat_id,
                    format!(
                        "✅ Password for *{}* saved successfully\\!\n\nTags: {}",
                        markdown::escape(&service_name),
                        markdown::escape(&tags_line)
                    ),
                    None,
                )
                .await?;
            }
            Err(e) => {
                log::error!("Failed to save password for user {}: {}", telegram_id, e);
                bot.send_message(chat_id, "❌ Failed to save password. Please try again.").await?;
            }
        }
        Ok(())
    }

    async fn finish_edit(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, telegram_id: i64) -> AppResult<()> {
        let Some(user_id) = deps.auth_user(telegram_id) else {
            deps.scenes.cancel(telegram_id);
            bot.send_message(chat_id, "❌ Session expired. Please /start again.").await?;
            return Ok(());
        };
        let Some(data) = deps.scenes.complete(telegram_id) else {
            return Ok(());
        };

        let password_id = data.get("password_id").and_then(|v| v.as_text()).unwrap_or_default();
        let field = data.get("field").and_then(|v| v.as_text()).unwrap_or_default();
        let new_value = data.get("new_value").and_then(|v| v.as_text()).unwrap_or_default();

        let Ok(id) = uuid::Uuid::parse_str(password_id) else {
            bot.send_message(chat_id, "❌ That password entry no longer exists.").await?;
            return Ok(());
        };
        // Secret fields are stored encrypted; the service name is plaintext.
        let (column, stored) = match field {
            "service" => ("service_name", new_value.to_string()),
            "username" => ("encrypted_username", deps.crypto.encrypt(new_value)?),
            "password" => ("encrypted_password", deps.crypto.encrypt(new_value)?),
            other => {
                log::error!("Edit wizard completed with unknown field '{}'", other);
                bot.send_message(chat_id, "❌ An error occurred. Please try again.").await?;
                return Ok(());
            }
        };

        match deps.vault.update_password_field(id, user_id, column, &stored).await {
            Ok(true) => {
                send_prompt(
                    bot,
                    chat_id,
                    format!("✅ *{}* updated successfully\\!", markdown::escape(field)),
                    Some(keyboard::back_to("◀️ Back to List", &safecore::callback::Callback::PasswordList { page: 0 })),
                )
                .await?;
            }
            Ok(false) => {
                bot.send_message(chat_id, "❌ That password entry no longer exists.").await?;
            }
            Err(e) => {
                log::error!("Failed to update password for user {}: {}", telegram_id, e);
                bot.send_message(chat_id, "❌ Failed to update password. Please try again.").await?;
            }
        }
        Ok(())
    }

    async fn confirm_summary(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, telegram_id: i64) -> AppResult<()> {
        match deps.scenes.kind_of(telegram_id) {
            Some(SceneKind::SavePassword) => {
                let service = deps
                    .scenes
                    .get_data(telegram_id, "service_name")
                    .and_then(|v| v.as_text().map(str::to_string))
                    .unwrap_or_default();
                let tags = deps
                    .scenes
                    .get_data(telegram_id, "tags")
                    .and_then(|v| v.as_tags().map(<[String]>::to_vec))
                    .unwrap_or_default();
                let tags_line = if tags.is_empty() { "None".to_string() } else { tags.join(", ") };
                send_prompt(
                    bot,
                    chat_id,
                    format!(
                        "Ready to save:\n\n\
                         Service: *{}*\n\
                         Tags: {}\n\n\
                         The password will be encrypted before it is stored\\.",
                        markdown::escape(&service),
                        markdown::escape(&tags_line)
                    ),
                    Some(keyboard::confirm_row()),
                )
                .await
            }
            _ => {
                let field = deps
                    .scenes
                    .get_data(telegram_id, "field")
                    .and_then(|v| v.as_text().map(str::to_string))
                    .unwrap_or_default();
                send_prompt(
                    bot,
                    chat_id,
                    format!("Apply the new *{}* to this entry?", markdown::escape(&field)),
                    Some(keyboard::confirm_row()),
                )
                .await
            }
        }
    }
}

// The flow is stateless; prompts and handlers key off the scene registry.
static PASSWORD_PROMPTS: PasswordWizard = PasswordWizard;

#[async_trait]
impl WizardFlow for PasswordWizard {
    fn kinds(&self) -> &'static [SceneKind] {
        &[SceneKind::SavePassword, SceneKind::EditPassword]
    }

    async fn prompt(
        &self,
        bot: &Bot,
        chat_id: ChatId,
        deps: &HandlerDeps,
        telegram_id: i64,
        step: Step,
    ) -> AppResult<()> {
        match step {
            Step::ServiceName => {
                send_prompt(
                    bot,
                    chat_id,
                    "🔐 *Save New Password*\n\nEnter the service name \\(e\\.g\\. Gmail, Facebook, GitHub\\):",
                    Some(keyboard::cancel_row()),
                )
                .await
            }
            Step::Username => {
                send_prompt(
                    bot,
                    chat_id,
                    "Enter the username/email \\(or skip if not applicable\\):",
                    Some(keyboard::skip_row()),
                )
                .await
            }
            Step::Password => send_prompt(bot, chat_id, "Enter the password:", Some(keyboard::cancel_row())).await,
            Step::Tags => {
                send_prompt(
                    bot,
                    chat_id,
                    "Add tags for organization \\(optional\\)?\nUse hashtags like: \\#work \\#important\nOr skip to finish:",
                    Some(keyboard::skip_row()),
                )
                .await
            }
            Step::SelectField => {
                send_prompt(
                    bot,
                    chat_id,
                    "✏️ *Edit Password*\n\nWhich field do you want to change?\nType one of: service, username, password",
                    Some(keyboard::cancel_row()),
                )
                .await
            }
            Step::NewValue => send_prompt(bot, chat_id, "Enter the new value:", Some(keyboard::cancel_row())).await,
            Step::Confirm => Self::confirm_summary(bot, chat_id, deps, telegram_id).await,
            other => {
                log::error!("Password wizard asked to prompt foreign step '{}'", other);
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
        let input = validation::sanitize_input(text);

        match step {
            Step::ServiceName => match validation::validate_service_name(&input) {
                Ok(()) => {
                    let next = deps.scenes.record_and_advance(telegram_id, "service_name", SceneValue::Text(input));
                    if let Some(next) = next {
                        self.prompt(bot, chat_id, deps, telegram_id, next).await?;
                    }
                }
                Err(reason) => {
                    bot.send_message(chat_id, format!("❌ {}\n\nPlease try again:", reason)).await?;
                }
            },
            Step::Username => {
                if is_skip(&input) {
                    if let Some(next) =
                        deps.scenes.record_and_advance(telegram_id, "username", SceneValue::Text(String::new()))
                    {
                        self.prompt(bot, chat_id, deps, telegram_id, next).await?;
                    }
                    return Ok(());
                }
                match validation::validate_username(&input) {
                    Ok(()) => {
                        if let Some(next) =
                            deps.scenes.record_and_advance(telegram_id, "username", SceneValue::Text(input))
                        {
                            self.prompt(bot, chat_id, deps, telegram_id, next).await?;
                        }
                    }
                    Err(reason) => {
                        bot.send_message(chat_id, format!("❌ {}\n\nPlease try again:", reason)).await?;
                    }
                }
            }
            Step::Password => {
                // The plaintext must not linger in the chat history.
                delete_secret_message(bot, msg).await;
                match validation::validate_stored_password(&input) {
                    Ok(()) => {
                        if let Some(next) =
                            deps.scenes.record_and_advance(telegram_id, "password", SceneValue::Text(input))
                        {
                            self.prompt(bot, chat_id, deps, telegram_id, next).await?;
                        }
                    }
                    Err(reason) => {
                        bot.send_message(chat_id, format!("❌ {}\n\nPlease try again:", reason)).await?;
                    }
                }
            }
            Step::Tags => {
                let tags = if is_skip(&input) { vec![] } else { validation::parse_tags(&input) };
                if let Err(reason) = validation::validate_tags(&tags) {
                    bot.send_message(chat_id, format!("❌ {}\n\nPlease try again:", reason)).await?;
                    return Ok(());
                }
                if let Some(next) = deps.scenes.record_and_advance(telegram_id, "tags", SceneValue::Tags(tags)) {
                    self.prompt(bot, chat_id, deps, telegram_id, next).await?;
                }
            }
            Step::SelectField => {
                let field = input.to_lowercase();
                if !EDITABLE_FIELDS.contains(&field.as_str()) {
                    bot.send_message(chat_id, "❌ Please type one of: service, username, password").await?;
                    return Ok(());
                }
                if let Some(next) = deps.scenes.record_and_advance(telegram_id, "field", SceneValue::Text(field)) {
                    self.prompt(bot, chat_id, deps, telegram_id, next).await?;
                }
            }
            Step::NewValue => {
                let field = deps
                    .scenes
                    .get_data(telegram_id, "field")
                    .and_then(|v| v.as_text().map(str::to_string))
                    .unwrap_or_default();
                let check = match field.as_str() {
                    "service" => validation::validate_service_name(&input),
                    "username" => validation::validate_username(&input),
                    _ => validation::validate_stored_password(&input),
                };
                if field == "password" {
                    delete_secret_message(bot, msg).await;
                }
                match check {
                    Ok(()) => {
                        if let Some(next) =
                            deps.scenes.record_and_advance(telegram_id, "new_value", SceneValue::Text(input))
                        {
                            self.prompt(bot, chat_id, deps, telegram_id, next).await?;
                        }
                    }
                    Err(reason) => {
                        bot.send_message(chat_id, format!("❌ {}\n\nPlease try again:", reason)).await?;
                    }
                }
            }
            Step::Confirm => {
                if input.eq_ignore_ascii_case("yes") || input.eq_ignore_ascii_case("confirm") {
                    self.handle_action(bot, chat_id, deps, telegram_id, WizardAction::Confirm).await?;
                } else {
                    bot.send_message(chat_id, "Press Confirm to save, or Cancel to discard.").await?;
                }
            }
            other => {
                log::warn!("Password wizard received text on foreign step '{}'", other);
            }
        }
        Ok(())
    }

    async fn handle_action(
        &self,
        bot: &Bot,
        chat_id: ChatId,
        deps: &HandlerDeps,
        telegram_id: i64,
        action: WizardAction,
    ) -> AppResult<()> {
        let Some(step) = deps.scenes.current_step(telegram_id) else {
            return Ok(());
        };
        match (step, action) {
            (Step::Username, WizardAction::Skip) => {
                if let Some(next) =
                    deps.scenes.record_and_advance(telegram_id, "username", SceneValue::Text(String::new()))
                {
                    self.prompt(bot, chat_id, deps, telegram_id, next).await?;
                }
            }
            (Step::Tags, WizardAction::Skip) => {
                if let Some(next) = deps.scenes.record_and_advance(telegram_id, "tags", SceneValue::Tags(vec![])) {
                    self.prompt(bot, chat_id, deps, telegram_id, next).await?;
                }
            }
            (Step::Confirm, WizardAction::Confirm) => {
                let kind = deps.scenes.kind_of(telegram_id);
                // Reaching the confirm step means every prior step validated;
                // completion hands the bundle to the vault.
                deps.scenes.advance(telegram_id);
                match kind {
                    Some(SceneKind::EditPassword) => Self::finish_edit(bot, chat_id, deps, telegram_id).await?,
                    _ => Self::finish_save(bot, chat_id, deps, telegram_id).await?,
                }
            }
            (step, action) => {
                log::debug!(
                    "Ignoring stale wizard action {:?} on step '{}' for user {}",
                    action,
                    step,
                    telegram_id
                );
            }
        }
        Ok(())
    }
}
