//! File upload wizard: upload_file.
//!
//! The file step completes from the media upload handler (a document or
//! photo arriving while the scene sits on `Step::File`), not from free
//! text; description and tags then follow the usual text/skip contract.

use async_trait::async_trait;
use safecore::error::AppResult;
use safecore::scene::{SceneKind, SceneValue, Step};
use safecore::storage::vault::NewFile;
use safecore::validation;
use teloxide::prelude::*;

use super::{is_skip, send_prompt, WizardAction, WizardFlow};
use crate::telegram::handlers::HandlerDeps;
use crate::telegram::{formatters, keyboard, markdown};

/// Media metadata captured from an uploaded message.
#[derive(Debug, Clone)]
pub struct MediaMeta {
    pub telegram_file_id: String,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: i64,
}

pub struct FileWizard;

impl FileWizard {
    /// Starts the upload wizard and asks for the file.
    pub async fn start_upload(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, telegram_id: i64) -> AppResult<()> {
        let first = deps.scenes.start(telegram_id, SceneKind::UploadFile);
        FileWizard.prompt(bot, chat_id, deps, telegram_id, first).await
    }

    /// Records an uploaded file into the active scene's file step.
    /// Returns false when the scene isn't waiting for a file.
    pub async fn handle_upload(
        bot: &Bot,
        chat_id: ChatId,
        deps: &HandlerDeps,
        telegram_id: i64,
        meta: &MediaMeta,
    ) -> AppResult<bool> {
        if deps.scenes.kind_of(telegram_id) != Some(SceneKind::UploadFile)
            || deps.scenes.current_step(telegram_id) != Some(Step::File)
        {
            return Ok(false);
        }
        if let Err(reason) = validation::validate_file_name(&meta.file_name) {
            bot.send_message(chat_id, format!("❌ {}\n\nPlease send a different file:", reason))
                .await?;
            return Ok(true);
        }

        deps.scenes
            .set_data(telegram_id, "file_id", SceneValue::Text(meta.telegram_file_id.clone()));
        deps.scenes
            .set_data(telegram_id, "file_name", SceneValue::Text(meta.file_name.clone()));
        deps.scenes
            .set_data(telegram_id, "mime_type", SceneValue::Text(meta.mime_type.clone()));
        let next = deps.scenes.record_and_advance(
            telegram_id,
            "file_size",
            SceneValue::Text(meta.file_size.to_string()),
        );
        if let Some(next) = next {
            FileWizard.prompt(bot, chat_id, deps, telegram_id, next).await?;
        }
        Ok(true)
    }

    async fn finish(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, telegram_id: i64) -> AppResult<()> {
        let Some(user_id) = deps.auth_user(telegram_id) else {
            deps.scenes.cancel(telegram_id);
            bot.send_message(chat_id, "❌ Session expired. Please /start again.").await?;
            return Ok(());
        };
        let Some(data) = deps.scenes.complete(telegram_id) else {
            return Ok(());
        };

        let text_field = |key: &str| {
            data.get(key)
                .and_then(|v| v.as_text())
                .unwrap_or_default()
                .to_string()
        };
        let file_name = text_field("file_name");
        let description = text_field("description");
        let file = NewFile {
            telegram_file_id: text_field("file_id"),
            file_name: file_name.clone(),
            mime_type: text_field("mime_type"),
            file_size: text_field("file_size").parse().unwrap_or(0),
            encrypted_description: deps.crypto.encrypt(&description)?,
            tags: data
                .get("tags")
                .and_then(|v| v.as_tags())
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
        };

        match deps.vault.save_file(user_id, file).await {
            Ok(saved) => {
                send_prompt(
                    bot,
                    chat_id,
                    format!(
                        "✅ *File Saved\\!*\n\n📎 {}\nSize: {}",
                        markdown::escape(&saved.file_name),
                        markdown::escape(&formatters::format_file_size(saved.file_size))
                    ),
                    Some(keyboard::back_to(
                        "👁️ View List",
                        &safecore::callback::Callback::FileList { page: 0, filter: None },
                    )),
                )
                .await?;
            }
            Err(e) => {
                log::error!("Failed to save file for user {}: {}", telegram_id, e);
                bot.send_message(chat_id, "❌ Failed to save file. Please try again.").await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl WizardFlow for FileWizard {
    fn kinds(&self) -> &'static [SceneKind] {
        &[SceneKind::UploadFile]
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
            Step::File => {
                send_prompt(
                    bot,
                    chat_id,
                    "📁 *Upload File*\n\nSend any file, photo, or video to this chat\\.\nI'll save it securely for you\\!",
                    Some(keyboard::cancel_row()),
                )
                .await
            }
            Step::Description => {
                send_prompt(
                    bot,
                    chat_id,
                    "Add a description \\(optional\\), or skip:",
                    Some(keyboard::skip_row()),
                )
                .await
            }
            Step::Tags => {
                send_prompt(
                    bot,
                    chat_id,
                    "Add tags \\(optional\\)?\nUse hashtags like: \\#work \\#receipts\nOr skip:",
                    Some(keyboard::skip_row()),
                )
                .await
            }
            Step::Confirm => {
                let file_name = deps
                    .scenes
                    .get_data(telegram_id, "file_name")
                    .and_then(|v| v.as_text().map(str::to_string))
                    .unwrap_or_default();
                send_prompt(
                    bot,
                    chat_id,
                    format!("Save *{}* to your vault?", markdown::escape(&file_name)),
                    Some(keyboard::confirm_row()),
                )
                .await
            }
            other => {
                log::error!("File wizard asked to prompt foreign step '{}'", other);
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
            Step::File => {
                bot.send_message(chat_id, "Please send a file, photo, or video (or press Cancel).").await?;
            }
            Step::Description => {
                let description = if is_skip(&input) { String::new() } else { input };
                if let Some(next) =
                    deps.scenes.record_and_advance(telegram_id, "description", SceneValue::Text(description))
                {
                    self.prompt(bot, chat_id, deps, telegram_id, next).await?;
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
            Step::Confirm => {
                if input.eq_ignore_ascii_case("yes") || input.eq_ignore_ascii_case("confirm") {
                    self.handle_action(bot, chat_id, deps, telegram_id, WizardAction::Confirm).await?;
                } else {
                    bot.send_message(chat_id, "Press Confirm to save, or Cancel to discard.").await?;
                }
            }
            other => {
                log::warn!("File wizard received text on foreign step '{}'", other);
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
            (Step::Description, WizardAction::Skip) => {
                if let Some(next) =
                    deps.scenes.record_and_advance(telegram_id, "description", SceneValue::Text(String::new()))
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
                deps.scenes.advance(telegram_id);
                Self::finish(bot, chat_id, deps, telegram_id).await?;
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
