//! Authenticated-session registry
//!
//! One session per Telegram user, created after a successful master-password
//! check and dropped on logout or when the auto-lock window elapses. Also
//! tracks the short-lived pre-auth state for /start (waiting for the user to
//! type their master password), which lives outside the wizard scene
//! registry on purpose: a user mid-login has no vault identity yet.
//!
//! Everything here is in-memory. A process restart logs everyone out, which
//! is the intended behavior for a password vault.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

/// What /start is currently waiting for from this user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthIntent {
    /// Existing user, next text message is their master password
    AwaitingLogin,
    /// New user, next text message becomes their master password
    AwaitingRegistration,
}

#[derive(Debug, Clone)]
struct Session {
    user_id: Uuid,
    auto_lock: Duration,
    last_seen: Instant,
}

/// Per-user session registry with auto-lock expiry.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: DashMap<i64, Session>,
    pending: DashMap<i64, AuthIntent>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Pre-auth state ====================

    /// Records that /start is waiting for this user's master password.
    pub fn begin_auth(&self, telegram_id: i64, intent: AuthIntent) {
        self.pending.insert(telegram_id, intent);
    }

    /// Takes (and clears) the pending auth intent, if any.
    pub fn take_pending_auth(&self, telegram_id: i64) -> Option<AuthIntent> {
        self.pending.remove(&telegram_id).map(|(_, intent)| intent)
    }

    /// Restores a pending intent after a failed attempt so the next message
    /// is treated as a retry.
    pub fn retry_auth(&self, telegram_id: i64, intent: AuthIntent) {
        self.pending.insert(telegram_id, intent);
    }

    pub fn has_pending_auth(&self, telegram_id: i64) -> bool {
        self.pending.contains_key(&telegram_id)
    }

    // ==================== Sessions ====================

    /// Opens a session after a successful master-password check.
    pub fn login(&self, telegram_id: i64, user_id: Uuid, auto_lock: Duration) {
        self.pending.remove(&telegram_id);
        self.sessions.insert(
            telegram_id,
            Session {
                user_id,
                auto_lock,
                last_seen: Instant::now(),
            },
        );
        log::info!("Session opened for user {}", telegram_id);
    }

    /// Vault user id for an authenticated, non-expired session. Refreshes
    /// the idle clock on every successful lookup.
    pub fn user_id(&self, telegram_id: i64) -> Option<Uuid> {
        let mut session = self.sessions.get_mut(&telegram_id)?;
        if session.last_seen.elapsed() >= session.auto_lock {
            drop(session);
            self.sessions.remove(&telegram_id);
            log::info!("Session auto-locked for user {}", telegram_id);
            return None;
        }
        session.last_seen = Instant::now();
        Some(session.user_id)
    }

    /// True while the user holds a live (non-expired) session.
    pub fn is_authenticated(&self, telegram_id: i64) -> bool {
        self.user_id(telegram_id).is_some()
    }

    /// Applies a new auto-lock window to an open session.
    pub fn set_auto_lock(&self, telegram_id: i64, auto_lock: Duration) {
        if let Some(mut session) = self.sessions.get_mut(&telegram_id) {
            session.auto_lock = auto_lock;
        }
    }

    /// Drops the session (and any pending auth state).
    pub fn logout(&self, telegram_id: i64) {
        self.pending.remove(&telegram_id);
        if self.sessions.remove(&telegram_id).is_some() {
            log::info!("Session closed for user {}", telegram_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const USER: i64 = 42;

    #[test]
    fn test_login_opens_session() {
        let sessions = SessionManager::new();
        let user_id = Uuid::new_v4();
        assert!(!sessions.is_authenticated(USER));

        sessions.login(USER, user_id, Duration::from_secs(60));
        assert!(sessions.is_authenticated(USER));
        assert_eq!(sessions.user_id(USER), Some(user_id));
    }

    #[test]
    fn test_auto_lock_expires_session() {
        let sessions = SessionManager::new();
        sessions.login(USER, Uuid::new_v4(), Duration::ZERO);
        assert!(!sessions.is_authenticated(USER));
        // Expired session is removed, not resurrected
        assert_eq!(sessions.user_id(USER), None);
    }

    #[test]
    fn test_logout_clears_session_and_pending() {
        let sessions = SessionManager::new();
        sessions.begin_auth(USER, AuthIntent::AwaitingLogin);
        sessions.login(USER, Uuid::new_v4(), Duration::from_secs(60));
        sessions.logout(USER);
        assert!(!sessions.is_authenticated(USER));
        assert!(!sessions.has_pending_auth(USER));
        // Idempotent
        sessions.logout(USER);
    }

    #[test]
    fn test_pending_auth_is_taken_once() {
        let sessions = SessionManager::new();
        sessions.begin_auth(USER, AuthIntent::AwaitingRegistration);
        assert_eq!(sessions.take_pending_auth(USER), Some(AuthIntent::AwaitingRegistration));
        assert_eq!(sessions.take_pending_auth(USER), None);
    }

    #[test]
    fn test_sessions_are_per_user() {
        let sessions = SessionManager::new();
        sessions.login(1, Uuid::new_v4(), Duration::from_secs(60));
        assert!(sessions.is_authenticated(1));
        assert!(!sessions.is_authenticated(2));
    }
}
