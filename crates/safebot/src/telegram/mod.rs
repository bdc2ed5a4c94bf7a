//! Telegram bot integration and handlers

pub mod bot;
pub mod deep_links;
pub mod files;
pub mod formatters;
pub mod handlers;
pub mod keyboard;
pub mod markdown;
pub mod menu;
pub mod search;
pub mod start;
pub mod wizard;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use keyboard::cb;
pub use menu::callback_router::handle_callback_query;
