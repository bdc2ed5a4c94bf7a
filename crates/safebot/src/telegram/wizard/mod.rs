//! Wizard step router
//!
//! Free-text messages and wizard buttons both feed the user's active scene.
//! Each scene family implements [`WizardFlow`]; the router resolves the
//! active scene's kind to its flow and forwards the event, so adding a new
//! wizard means adding a flow implementation, not growing a conditional
//! chain.
//!
//! Both input channels resolve to the same contract: validate against the
//! current step, then `record_and_advance` on success or re-prompt on
//! failure. Buttons that don't match the current step (stale keyboards from
//! superseded messages) are acknowledged and dropped without touching the
//! scene.

pub mod file;
pub mod password;
pub mod settings;
pub mod task;

use async_trait::async_trait;
use safecore::callback::DueChoice;
use safecore::error::AppResult;
use safecore::scene::{SceneKind, Step};
use safecore::storage::Priority;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use super::handlers::HandlerDeps;

/// Canonical wizard button vocabulary, shared by every flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardAction {
    Skip,
    Back,
    Confirm,
    SetPriority(Priority),
    SetDue(DueChoice),
}

/// One wizard family (password, task, file, settings).
#[async_trait]
pub trait WizardFlow: Send + Sync {
    /// Scene kinds this flow owns.
    fn kinds(&self) -> &'static [SceneKind];

    /// Sends the prompt for `step` (also used to re-prompt after go-back).
    async fn prompt(&self, bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, telegram_id: i64, step: Step)
        -> AppResult<()>;

    /// Handles free text for the current step.
    async fn handle_text(&self, bot: &Bot, msg: &Message, deps: &HandlerDeps, telegram_id: i64, text: &str)
        -> AppResult<()>;

    /// Handles a wizard button for the current step. Flows ignore actions
    /// that don't fit the step they are on.
    async fn handle_action(
        &self,
        bot: &Bot,
        chat_id: ChatId,
        deps: &HandlerDeps,
        telegram_id: i64,
        action: WizardAction,
    ) -> AppResult<()>;
}

static PASSWORD_FLOW: password::PasswordWizard = password::PasswordWizard;
static TASK_FLOW: task::TaskWizard = task::TaskWizard;
static FILE_FLOW: file::FileWizard = file::FileWizard;
static SETTINGS_FLOW: settings::SettingsWizard = settings::SettingsWizard;

/// Resolves a scene kind to its owning flow.
pub fn flow_for(kind: SceneKind) -> &'static dyn WizardFlow {
    match kind {
        SceneKind::SavePassword | SceneKind::EditPassword => &PASSWORD_FLOW,
        SceneKind::AddTask | SceneKind::EditTask => &TASK_FLOW,
        SceneKind::UploadFile => &FILE_FLOW,
        SceneKind::ChangePassword => &SETTINGS_FLOW,
    }
}

/// Routes a free-text message into the active scene.
/// Returns false when the user has no active wizard (the message belongs to
/// normal command handling).
pub async fn dispatch_text(bot: &Bot, msg: &Message, deps: &HandlerDeps, text: &str) -> AppResult<bool> {
    let telegram_id = msg.chat.id.0;
    let Some(kind) = deps.scenes.kind_of(telegram_id) else {
        return Ok(false);
    };

    // A wizard step must not outlive the session that started it.
    if deps.auth_user(telegram_id).is_none() {
        deps.scenes.cancel(telegram_id);
        bot.send_message(msg.chat.id, "❌ Session expired. Please /start again to authenticate.")
            .await?;
        return Ok(true);
    }

    flow_for(kind).handle_text(bot, msg, deps, telegram_id, text).await?;
    Ok(true)
}

/// Routes a wizard button press into the active scene.
pub async fn dispatch_action(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    telegram_id: i64,
    action: WizardAction,
) -> AppResult<()> {
    let Some(kind) = deps.scenes.kind_of(telegram_id) else {
        bot.send_message(chat_id, "⚠️ No active wizard. Use the menu to start one.")
            .await?;
        return Ok(());
    };
    let flow = flow_for(kind);

    if action == WizardAction::Back {
        match deps.scenes.go_back(telegram_id) {
            Some(step) => flow.prompt(bot, chat_id, deps, telegram_id, step).await?,
            None => log::debug!("go_back ignored at first step for user {}", telegram_id),
        }
        return Ok(());
    }

    flow.handle_action(bot, chat_id, deps, telegram_id, action).await
}

/// Cancels any active wizard and confirms to the user.
pub async fn cancel(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, telegram_id: i64) -> AppResult<()> {
    deps.scenes.cancel(telegram_id);
    bot.send_message(chat_id, "❌ Operation cancelled.\n\nUse /start to return to the main menu.")
        .await?;
    Ok(())
}

/// Sends a MarkdownV2 prompt with an optional keyboard. Shared by flows.
pub(crate) async fn send_prompt(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    keyboard: Option<teloxide::types::InlineKeyboardMarkup>,
) -> AppResult<()> {
    let mut request = bot.send_message(chat_id, text.into()).parse_mode(ParseMode::MarkdownV2);
    if let Some(kb) = keyboard {
        request = request.reply_markup(kb);
    }
    request.await?;
    Ok(())
}

/// Deletes a message containing secret input; failure is logged, not fatal.
pub(crate) async fn delete_secret_message(bot: &Bot, msg: &Message) {
    if let Err(e) = bot.delete_message(msg.chat.id, msg.id).await {
        log::warn!("Could not delete secret input message: {}", e);
    }
}

/// True when a text input is the skip keyword.
pub(crate) fn is_skip(text: &str) -> bool {
    text.eq_ignore_ascii_case("skip")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_scene_kind_resolves_to_its_owning_flow() {
        let kinds = [
            SceneKind::SavePassword,
            SceneKind::AddTask,
            SceneKind::UploadFile,
            SceneKind::EditPassword,
            SceneKind::EditTask,
            SceneKind::ChangePassword,
        ];
        for kind in kinds {
            let flow = flow_for(kind);
            assert!(flow.kinds().contains(&kind), "flow does not own kind {}", kind);
        }
    }

    #[test]
    fn test_skip_keyword_is_case_insensitive() {
        assert!(is_skip("skip"));
        assert!(is_skip("SKIP"));
        assert!(!is_skip("skipped"));
    }
}

