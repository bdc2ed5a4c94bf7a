//! Task wizards: add_task and edit_task.

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use safecore::callback::DueChoice;
use safecore::error::AppResult;
use safecore::scene::{SceneKind, SceneValue, Step};
use safecore::storage::vault::NewTask;
use safecore::storage::Priority;
use safecore::validation;
use teloxide::prelude::*;

use super::{is_skip, send_prompt, WizardAction, WizardFlow};
use crate::telegram::handlers::HandlerDeps;
use crate::telegram::{keyboard, markdown};

pub struct TaskWizard;

impl TaskWizard {
    /// Starts the add wizard and sends the first prompt.
    pub async fn start_add(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, telegram_id: i64) -> AppResult<()> {
        let first = deps.scenes.start(telegram_id, SceneKind::AddTask);
        TaskWizard.prompt(bot, chat_id, deps, telegram_id, first).await
    }

    /// Starts the edit wizard for one task and sends the first prompt.
    pub async fn start_edit(
        bot: &Bot,
        chat_id: ChatId,
        deps: &HandlerDeps,
        telegram_id: i64,
        task_id: &str,
    ) -> AppResult<()> {
        let first = deps.scenes.start(telegram_id, SceneKind::EditTask);
        deps.scenes
            .set_data(telegram_id, "task_id", SceneValue::Text(task_id.to_string()));
        TaskWizard.prompt(bot, chat_id, deps, telegram_id, first).await
    }

    fn resolve_due(choice: DueChoice) -> Option<NaiveDate> {
        let today = Local::now().date_naive();
        match choice {
            DueChoice::Today => Some(today),
            DueChoice::Tomorrow => today.checked_add_days(Days::new(1)),
            DueChoice::Week => today.checked_add_days(Days::new(7)),
            DueChoice::NextWeek => today.checked_add_days(Days::new(14)),
            DueChoice::Custom | DueChoice::Skip => None,
        }
    }

    async fn advance_with_due(
        &self,
        bot: &Bot,
        chat_id: ChatId,
        deps: &HandlerDeps,
        telegram_id: i64,
        due: Option<NaiveDate>,
    ) -> AppResult<()> {
        let value = match due {
            Some(date) => SceneValue::Date(date),
            // Skip stores the empty default so the step still records a value
            None => SceneValue::Text(String::new()),
        };
        if let Some(next) = deps.scenes.record_and_advance(telegram_id, "due_date", value) {
            self.prompt(bot, chat_id, deps, telegram_id, next).await?;
        }
        Ok(())
    }

    async fn finish_add(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, telegram_id: i64) -> AppResult<()> {
        let Some(user_id) = deps.auth_user(telegram_id) else {
            deps.scenes.cancel(telegram_id);
            bot.send_message(chat_id, "❌ Session expired. Please /start again.").await?;
            return Ok(());
        };
        let Some(data) = deps.scenes.complete(telegram_id) else {
            return Ok(());
        };

        let content = data.get("content").and_then(|v| v.as_text()).unwrap_or_default().to_string();
        let priority = data
            .get("priority")
            .and_then(|v| v.as_text())
            .and_then(Priority::parse)
            .unwrap_or(Priority::Medium);
        let due_date = data.get("due_date").and_then(|v| v.as_date());
        let tags = data
            .get("tags")
            .and_then(|v| v.as_tags())
            .map(<[String]>::to_vec)
            .unwrap_or_default();

        let task = NewTask {
            encrypted_content: deps.crypto.encrypt(&content)?,
            priority,
            due_date,
            tags: tags.clone(),
        };

        match deps.vault.create_task(user_id, task).await {
            Ok(_) => {
                let due_line = due_date
                    .map(|d| format!("\nDue: {}", markdown::escape(&d.format("%Y-%m-%d").to_string())))
                    .unwrap_or_default();
                let tags_line = if tags.is_empty() { "None".to_string() } else { tags.join(", ") };
                send_prompt(
                    bot,
                    chat_id,
                    format!(
                        "✅ Task created successfully\\!\n\n*{}*\nPriority: {}{}\nTags: {}",
                        markdown::escape(&content),
                        priority_label(priority),
                        due_line,
                        markdown::escape(&tags_line)
                    ),
                    None,
                )
                .await?;
            }
            Err(e) => {
                log::error!("Failed to create task for user {}: {}", telegram_id, e);
                bot.send_message(chat_id, "❌ Failed to create task. Please try again.").await?;
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

        let task_id = data.get("task_id").and_then(|v| v.as_text()).unwrap_or_default();
        let field = data.get("field").and_then(|v| v.as_text()).unwrap_or_default();
        let new_value = data.get("new_value").and_then(|v| v.as_text()).unwrap_or_default();

        let Ok(id) = uuid::Uuid::parse_str(task_id) else {
            bot.send_message(chat_id, "❌ That task no longer exists.").await?;
            return Ok(());
        };

        let updated = match field {
            "content" => {
                let encrypted = deps.crypto.encrypt(new_value)?;
                deps.vault.update_task_content(id, user_id, &encrypted).await
            }
            "priority" => {
                let priority = Priority::parse(new_value).unwrap_or(Priority::Medium);
                deps.vault.update_task_priority(id, user_id, priority).await
            }
            other => {
                log::error!("Edit wizard completed with unknown field '{}'", other);
                bot.send_message(chat_id, "❌ An error occurred. Please try again.").await?;
                return Ok(());
            }
        };

        match updated {
            Ok(true) => {
                bot.send_message(chat_id, "✅ Task updated successfully!").await?;
            }
            Ok(false) => {
                bot.send_message(chat_id, "❌ That task no longer exists.").await?;
            }
            Err(e) => {
                log::error!("Failed to update task for user {}: {}", telegram_id, e);
                bot.send_message(chat_id, "❌ Failed to update task. Please try again.").await?;
            }
        }
        Ok(())
    }

    async fn confirm_summary(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, telegram_id: i64) -> AppResult<()> {
        match deps.scenes.kind_of(telegram_id) {
            Some(SceneKind::AddTask) => {
                let content = deps
                    .scenes
                    .get_data(telegram_id, "content")
                    .and_then(|v| v.as_text().map(str::to_string))
                    .unwrap_or_default();
                let priority = deps
                    .scenes
                    .get_data(telegram_id, "priority")
                    .and_then(|v| v.as_text().and_then(Priority::parse))
                    .unwrap_or(Priority::Medium);
                send_prompt(
                    bot,
                    chat_id,
                    format!(
                        "Ready to create:\n\n*{}*\nPriority: {}",
                        markdown::escape(&content),
                        priority_label(priority)
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
                    format!("Apply the new *{}* to this task?", markdown::escape(&field)),
                    Some(keyboard::confirm_row()),
                )
                .await
            }
        }
    }
}

fn priority_label(priority: Priority) -> String {
    let name = match priority {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
    };
    format!("{} {}", priority.emoji(), name)
}

#[async_trait]
impl WizardFlow for TaskWizard {
    fn kinds(&self) -> &'static [SceneKind] {
        &[SceneKind::AddTask, SceneKind::EditTask]
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
            Step::Content => {
                send_prompt(
                    bot,
                    chat_id,
                    "✅ *Create New Task*\n\nEnter the task description:",
                    Some(keyboard::cancel_row()),
                )
                .await
            }
            Step::Priority => {
                send_prompt(
                    bot,
                    chat_id,
                    "Set the priority \\(or skip for Medium\\):",
                    Some(keyboard::priority_selector()),
                )
                .await
            }
            Step::DueDate => {
                send_prompt(
                    bot,
                    chat_id,
                    "Set a due date, or type one as YYYY\\-MM\\-DD:",
                    Some(keyboard::due_date_selector()),
                )
                .await
            }
            Step::Tags => {
                send_prompt(
                    bot,
                    chat_id,
                    "Add tags \\(optional\\)?\nUse hashtags like: \\#work \\#urgent\nOr skip:",
                    Some(keyboard::skip_row()),
                )
                .await
            }
            Step::SelectField => {
                send_prompt(
                    bot,
                    chat_id,
                    "✏️ *Edit Task*\n\nWhich field do you want to change?\nType one of: content, priority",
                    Some(keyboard::cancel_row()),
                )
                .await
            }
            Step::NewValue => {
                send_prompt(bot, chat_id, "Enter the new value:", Some(keyboard::cancel_row())).await
            }
            Step::Confirm => Self::confirm_summary(bot, chat_id, deps, telegram_id).await,
            other => {
                log::error!("Task wizard asked to prompt foreign step '{}'", other);
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
            Step::Content => match validation::validate_task_content(&input) {
                Ok(()) => {
                    if let Some(next) = deps.scenes.record_and_advance(telegram_id, "content", SceneValue::Text(input))
                    {
                        self.prompt(bot, chat_id, deps, telegram_id, next).await?;
                    }
                }
                Err(reason) => {
                    bot.send_message(chat_id, format!("❌ {}\n\nPlease try again:", reason)).await?;
                }
            },
            Step::Priority => {
                let level = if is_skip(&input) {
                    Priority::Medium
                } else {
                    match Priority::parse(&input.to_lowercase()) {
                        Some(level) => level,
                        None => {
                            bot.send_message(chat_id, "❌ Priority must be one of: low, medium, high\n\nPlease try again:")
                                .await?;
                            return Ok(());
                        }
                    }
                };
                if let Some(next) =
                    deps.scenes
                        .record_and_advance(telegram_id, "priority", SceneValue::Text(level.as_str().to_string()))
                {
                    self.prompt(bot, chat_id, deps, telegram_id, next).await?;
                }
            }
            Step::DueDate => {
                if is_skip(&input) {
                    self.advance_with_due(bot, chat_id, deps, telegram_id, None).await?;
                    return Ok(());
                }
                match validation::validate_due_date(&input) {
                    Ok(date) => self.advance_with_due(bot, chat_id, deps, telegram_id, Some(date)).await?,
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
                if field != "content" && field != "priority" {
                    bot.send_message(chat_id, "❌ Please type one of: content, priority").await?;
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
                let check = if field == "priority" {
                    Priority::parse(&input.to_lowercase())
                        .map(|_| ())
                        .ok_or_else(|| "Priority must be one of: low, medium, high".to_string())
                } else {
                    validation::validate_task_content(&input)
                };
                match check {
                    Ok(()) => {
                        let value = if field == "priority" { input.to_lowercase() } else { input };
                        if let Some(next) =
                            deps.scenes.record_and_advance(telegram_id, "new_value", SceneValue::Text(value))
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
                log::warn!("Task wizard received text on foreign step '{}'", other);
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
            (Step::Priority, WizardAction::SetPriority(level)) => {
                if let Some(next) =
                    deps.scenes
                        .record_and_advance(telegram_id, "priority", SceneValue::Text(level.as_str().to_string()))
                {
                    self.prompt(bot, chat_id, deps, telegram_id, next).await?;
                }
            }
            (Step::Priority, WizardAction::Skip) => {
                if let Some(next) = deps.scenes.record_and_advance(
                    telegram_id,
                    "priority",
                    SceneValue::Text(Priority::Medium.as_str().to_string()),
                ) {
                    self.prompt(bot, chat_id, deps, telegram_id, next).await?;
                }
            }
            (Step::DueDate, WizardAction::SetDue(choice)) => match choice {
                DueChoice::Custom => {
                    send_prompt(
                        bot,
                        chat_id,
                        "Enter the due date as YYYY\\-MM\\-DD \\(e\\.g\\. 2026\\-12\\-31\\):",
                        Some(keyboard::cancel_row()),
                    )
                    .await?;
                }
                DueChoice::Skip => self.advance_with_due(bot, chat_id, deps, telegram_id, None).await?,
                chosen => {
                    self.advance_with_due(bot, chat_id, deps, telegram_id, Self::resolve_due(chosen)).await?;
                }
            },
            (Step::DueDate, WizardAction::Skip) => {
                self.advance_with_due(bot, chat_id, deps, telegram_id, None).await?;
            }
            (Step::Tags, WizardAction::Skip) => {
                if let Some(next) = deps.scenes.record_and_advance(telegram_id, "tags", SceneValue::Tags(vec![])) {
                    self.prompt(bot, chat_id, deps, telegram_id, next).await?;
                }
            }
            (Step::Confirm, WizardAction::Confirm) => {
                let kind = deps.scenes.kind_of(telegram_id);
                deps.scenes.advance(telegram_id);
                match kind {
                    Some(SceneKind::EditTask) => Self::finish_edit(bot, chat_id, deps, telegram_id).await?,
                    _ => Self::finish_add(bot, chat_id, deps, telegram_id).await?,
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
