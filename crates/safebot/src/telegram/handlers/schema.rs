//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::commands;
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;
use crate::telegram::{files, handle_callback_query, search, start, wizard};

/// Creates the main dispatcher schema for the Telegram bot.
///
/// This function returns a handler tree that can be used with teloxide's
/// Dispatcher. The same schema is used in production and in tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_media = deps.clone();
    let deps_messages = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        // Command handler first so "/cancel" never reads as wizard input
        .branch(command_handler(deps_commands))
        // Media uploads (documents, photos, videos, audio, voice)
        .branch(media_upload_handler(deps_media))
        // Free text: master-password entry, then wizard steps
        .branch(message_handler(deps_messages))
        // Inline keyboard callbacks
        .branch(callback_handler(deps_callback))
}

/// Handler for bot commands (/start, /savepassword, /search, ...).
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);

                let result = match cmd {
                    Command::Start => start::handle_start(&bot, &msg, &deps).await,
                    Command::Help => commands::handle_help(&bot, &msg).await,
                    Command::SavePassword => commands::handle_save_password(&bot, &msg, &deps).await,
                    Command::GetPassword(service) => {
                        commands::handle_get_password(&bot, &msg, &deps, &service).await
                    }
                    Command::ListPasswords => commands::handle_list_passwords(&bot, &msg, &deps).await,
                    Command::DeletePassword(id) => {
                        commands::handle_delete_password(&bot, &msg, &deps, &id).await
                    }
                    Command::AddTask => commands::handle_add_task(&bot, &msg, &deps).await,
                    Command::ListTasks => commands::handle_list_tasks(&bot, &msg, &deps).await,
                    Command::CompleteTask(id) => commands::handle_complete_task(&bot, &msg, &deps, &id).await,
                    Command::DeleteTask(id) => commands::handle_delete_task(&bot, &msg, &deps, &id).await,
                    Command::ListFiles => commands::handle_list_files(&bot, &msg, &deps).await,
                    Command::Search(query) => search::handle_search(&bot, &msg, &deps, &query).await,
                    Command::Summarize => search::handle_summarize(&bot, msg.chat.id, &deps).await,
                    Command::Settings => commands::handle_settings(&bot, &msg, &deps).await,
                    Command::Cancel => wizard::cancel(&bot, msg.chat.id, &deps, msg.chat.id.0).await,
                };

                if let Err(e) = result {
                    log::error!("Command handler failed for chat {}: {}", msg.chat.id, e);
                    let _ = bot
                        .send_message(msg.chat.id, "❌ An error occurred. Please try again.")
                        .await;
                }
                Ok(())
            }
        },
    ))
}

/// Handler for media messages (file uploads).
fn media_upload_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| files::extract_media_meta(&msg).is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if let Err(e) = files::handle_media_upload(&bot, &msg, &deps).await {
                    log::error!("Media upload failed for chat {}: {}", msg.chat.id, e);
                    let _ = bot
                        .send_message(msg.chat.id, "❌ Failed to save file. Please try again.")
                        .await;
                }
                Ok(())
            }
        })
}

/// Handler for free-text messages: pending master-password input first,
/// then the active wizard; anything else gets a gentle hint.
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let text = msg.text().unwrap_or_default().to_string();

                let handled = async {
                    if start::handle_master_password(&bot, &msg, &deps).await? {
                        return Ok::<bool, safecore::error::AppError>(true);
                    }
                    wizard::dispatch_text(&bot, &msg, &deps, &text).await
                }
                .await;

                match handled {
                    Ok(true) => {}
                    Ok(false) => {
                        // Not in a wizard and not logging in: point at the menu
                        let _ = bot
                            .send_message(msg.chat.id, "Use /start to open the menu, or /help to see all commands.")
                            .await;
                    }
                    Err(e) => {
                        log::error!("Message handler failed for chat {}: {}", msg.chat.id, e);
                        let _ = bot
                            .send_message(
                                msg.chat.id,
                                "❌ An error occurred. Please try again or /start to return to main menu.",
                            )
                            .await;
                    }
                }
                Ok(())
            }
        })
}

/// Handler for callback queries (inline keyboard buttons).
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let result: teloxide::RequestError = match handle_callback_query(bot, q, deps).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            Err(Box::new(result) as HandlerError)
        }
    })
}
