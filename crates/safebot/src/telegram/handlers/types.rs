//! Handler types and dependencies

use std::sync::Arc;

use safecore::ai::Assistant;
use safecore::scene::SceneManager;
use safecore::security::{AuthService, CryptoService};
use safecore::session::SessionManager;
use safecore::storage::Vault;
use uuid::Uuid;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub vault: Arc<dyn Vault>,
    pub crypto: Arc<CryptoService>,
    pub auth: Arc<AuthService>,
    pub sessions: Arc<SessionManager>,
    pub scenes: Arc<SceneManager>,
    pub assistant: Arc<dyn Assistant>,
}

impl HandlerDeps {
    pub fn new(
        vault: Arc<dyn Vault>,
        crypto: Arc<CryptoService>,
        auth: Arc<AuthService>,
        sessions: Arc<SessionManager>,
        scenes: Arc<SceneManager>,
        assistant: Arc<dyn Assistant>,
    ) -> Self {
        Self {
            vault,
            crypto,
            auth,
            sessions,
            scenes,
            assistant,
        }
    }

    /// Auth gate: the vault user id behind a live session, or `None` when
    /// the user must /start again. Every protected handler calls this
    /// before touching scenes or records.
    pub fn auth_user(&self, telegram_id: i64) -> Option<Uuid> {
        self.sessions.user_id(telegram_id)
    }
}
