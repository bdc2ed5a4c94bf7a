//! Bot initialization and command definitions
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Telegram command menu setup

use std::time::Duration;

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

/// Request timeout for the Telegram API client (in seconds)
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "I can:")]
pub enum Command {
    #[command(description = "register or log in with your master password")]
    Start,
    #[command(description = "show all commands")]
    Help,
    #[command(description = "save a new password")]
    SavePassword,
    #[command(description = "retrieve a password by service name")]
    GetPassword(String),
    #[command(description = "list all saved passwords")]
    ListPasswords,
    #[command(description = "delete a password by id")]
    DeletePassword(String),
    #[command(description = "create a new task")]
    AddTask,
    #[command(description = "view your tasks")]
    ListTasks,
    #[command(description = "mark a task as complete by id")]
    CompleteTask(String),
    #[command(description = "delete a task by id")]
    DeleteTask(String),
    #[command(description = "list your saved files")]
    ListFiles,
    #[command(description = "smart search across all your data")]
    Search(String),
    #[command(description = "AI summary of your tasks")]
    Summarize,
    #[command(description = "open settings")]
    Settings,
    #[command(description = "cancel the current wizard")]
    Cancel,
}

/// Creates a Bot instance with a bounded-timeout HTTP client.
///
/// The token comes from TELOXIDE_TOKEN (or TELEGRAM_BOT_TOKEN, which main
/// mirrors into it before calling this).
pub fn create_bot() -> anyhow::Result<Bot> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?;
    Ok(Bot::from_env_with_client(client))
}

/// Sets up the bot command menu in the Telegram UI.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    use teloxide::types::BotCommand;

    bot.set_my_commands(vec![
        BotCommand::new("start", "register or log in"),
        BotCommand::new("help", "show all commands"),
        BotCommand::new("savepassword", "save a new password"),
        BotCommand::new("getpassword", "retrieve a password by service"),
        BotCommand::new("listpasswords", "list all saved passwords"),
        BotCommand::new("deletepassword", "delete a password by id"),
        BotCommand::new("addtask", "create a new task"),
        BotCommand::new("listtasks", "view your tasks"),
        BotCommand::new("completetask", "mark a task as complete"),
        BotCommand::new("deletetask", "delete a task by id"),
        BotCommand::new("listfiles", "list your saved files"),
        BotCommand::new("search", "smart search across your data"),
        BotCommand::new("summarize", "AI summary of your tasks"),
        BotCommand::new("settings", "open settings"),
        BotCommand::new("cancel", "cancel the current wizard"),
    ])
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_descriptions_present() {
        let commands = Command::descriptions();
        let command_list = format!("{}", commands);

        assert!(command_list.contains("I can"));
        assert!(command_list.contains("start"));
        assert!(command_list.contains("savepassword"));
        assert!(command_list.contains("search"));
        assert!(command_list.contains("cancel"));
    }
}
