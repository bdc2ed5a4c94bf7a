use once_cell::sync::Lazy;
use secrecy::SecretString;
use std::env;
use std::time::Duration;

/// Configuration constants for the bot

/// Postgres connection string for the vault database.
/// Read once at startup from DATABASE_URL.
pub static DATABASE_URL: Lazy<String> = Lazy::new(|| env::var("DATABASE_URL").unwrap_or_default());

/// Field-level encryption key material.
/// Read from ENCRYPTION_KEY; the AES key is derived from it with SHA-256,
/// so any non-empty string works, but it must never change once data exists.
pub static ENCRYPTION_KEY: Lazy<SecretString> =
    Lazy::new(|| SecretString::from(env::var("ENCRYPTION_KEY").unwrap_or_default()));

/// Google Gemini API key for search/summarization.
/// Read from GEMINI_API_KEY; the assistant degrades to substring search
/// when empty.
pub static GEMINI_API_KEY: Lazy<String> = Lazy::new(|| env::var("GEMINI_API_KEY").unwrap_or_default());

/// Bot username used when building deep links (without @).
pub static BOT_USERNAME: Lazy<String> = Lazy::new(|| env::var("BOT_USERNAME").unwrap_or_else(|_| "QuikSafeBot".to_string()));

/// Returns true when all required configuration is present, plus a reason
/// when it is not. Checked once at startup before any component spins up.
pub fn validate() -> Result<(), String> {
    if env::var("TELOXIDE_TOKEN").is_err() && env::var("TELEGRAM_BOT_TOKEN").is_err() {
        return Err("TELOXIDE_TOKEN is required".to_string());
    }
    if DATABASE_URL.is_empty() {
        return Err("DATABASE_URL is required".to_string());
    }
    if secrecy::ExposeSecret::expose_secret(&*ENCRYPTION_KEY).is_empty() {
        return Err("ENCRYPTION_KEY is required".to_string());
    }
    Ok(())
}

/// Session configuration
pub mod session {
    /// Auto-lock window applied before the user has picked one (in minutes)
    pub const DEFAULT_AUTO_LOCK_MINUTES: u64 = 60;

    /// Selectable auto-lock durations, cycled by the settings menu
    pub const AUTO_LOCK_CHOICES: [u64; 4] = [15, 30, 60, 120];
}

/// Wizard scene configuration
pub mod scene {
    use super::Duration;

    /// Idle time after which an abandoned wizard is swept (in seconds)
    pub const IDLE_TTL_SECS: u64 = 30 * 60;

    /// Interval between idle-scene sweeps (in seconds)
    pub const SWEEP_INTERVAL_SECS: u64 = 5 * 60;

    /// Idle TTL duration
    pub fn idle_ttl() -> Duration {
        Duration::from_secs(IDLE_TTL_SECS)
    }

    /// Sweep interval duration
    pub fn sweep_interval() -> Duration {
        Duration::from_secs(SWEEP_INTERVAL_SECS)
    }
}

/// Security configuration
pub mod security {
    use super::Duration;

    /// Iterations of the salted hash applied to master passwords
    pub const HASH_ITERATIONS: u32 = 600_000;

    /// Delay before a revealed password message self-destructs (in seconds)
    pub const REVEAL_DELAY_SECS: u64 = 60;

    /// Reveal self-destruct delay
    pub fn reveal_delay() -> Duration {
        Duration::from_secs(REVEAL_DELAY_SECS)
    }
}

/// List pagination configuration
pub mod pagination {
    /// Items shown per page in password/task/file lists
    pub const ITEMS_PER_PAGE: usize = 5;

    /// Completed tasks shown before collapsing into "... and N more"
    pub const COMPLETED_TASKS_SHOWN: usize = 5;
}

/// Assistant configuration
pub mod ai {
    use super::Duration;

    /// Gemini model used for search/summarization (free tier)
    pub const MODEL: &str = "gemini-pro";

    /// Request timeout for Gemini calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Untagged items analyzed per auto-tag run (rate-limit guard)
    pub const AUTO_TAG_BATCH: usize = 3;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Validation limits shared with the wizard flows
pub mod limits {
    /// Maximum service name length
    pub const MAX_SERVICE_NAME: usize = 100;

    /// Maximum username length
    pub const MAX_USERNAME: usize = 255;

    /// Maximum stored password length
    pub const MAX_STORED_PASSWORD: usize = 500;

    /// Maximum task content length
    pub const MAX_TASK_CONTENT: usize = 1000;

    /// Maximum file name length
    pub const MAX_FILE_NAME: usize = 255;

    /// Maximum number of tags per item
    pub const MAX_TAGS: usize = 10;

    /// Maximum length of a single tag
    pub const MAX_TAG_LEN: usize = 50;
}
