//! QuikSafe - Secure Telegram bot for passwords, tasks, and files
//!
//! This library provides the Telegram-facing half of the bot: the
//! dispatcher schema, command and callback handlers, the wizard step
//! router, keyboards, and message formatting. Everything domain-shaped
//! (scenes, codec, vault, crypto, sessions, assistant) lives in `safecore`.

pub mod telegram;

// Re-export commonly used types for convenience
pub use telegram::handlers::{schema, HandlerDeps};
pub use telegram::{create_bot, setup_bot_commands, Command};
