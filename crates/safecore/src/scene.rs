//! Multi-step wizard scenes
//!
//! A `Scene` is one in-progress conversational flow for one user (save a
//! password, add a task, ...). Each scene kind has a fixed ordered step
//! sequence; input collected along the way lands in the scene's data map and
//! is handed out as a single snapshot on completion.
//!
//! The `SceneManager` owns the process-wide registry (one live scene per
//! user, keyed by Telegram id). It is injected into handlers rather than
//! accessed as a global so tests can run many independent fake users against
//! their own manager. Nothing here is persisted: a restart drops every
//! in-flight wizard and the user simply starts over.
//!
//! Concurrency: Telegram delivers one user's updates in order, and every
//! mutation below is a single atomic operation on the user's `DashMap`
//! entry (`record_and_advance` fuses the store with the step advance), so a
//! handler can never observe a half-advanced scene even if updates for the
//! same user were dispatched concurrently.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use dashmap::DashMap;
use strum::Display;

/// Wizard kinds, one per multi-step flow the bot offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SceneKind {
    SavePassword,
    AddTask,
    UploadFile,
    EditPassword,
    EditTask,
    ChangePassword,
}

/// One stage within a scene's fixed step sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Step {
    // save_password
    ServiceName,
    Username,
    Password,
    // add_task
    Content,
    Priority,
    DueDate,
    // upload_file
    File,
    Description,
    // edit_password / edit_task
    SelectField,
    NewValue,
    // change_password
    CurrentPassword,
    NewPassword,
    ConfirmPassword,
    // shared
    Tags,
    Confirm,
}

impl SceneKind {
    /// Fixed ordered step sequence for this kind.
    pub fn steps(self) -> &'static [Step] {
        match self {
            SceneKind::SavePassword => &[
                Step::ServiceName,
                Step::Username,
                Step::Password,
                Step::Tags,
                Step::Confirm,
            ],
            SceneKind::AddTask => &[
                Step::Content,
                Step::Priority,
                Step::DueDate,
                Step::Tags,
                Step::Confirm,
            ],
            SceneKind::UploadFile => &[Step::File, Step::Description, Step::Tags, Step::Confirm],
            SceneKind::EditPassword | SceneKind::EditTask => {
                &[Step::SelectField, Step::NewValue, Step::Confirm]
            }
            SceneKind::ChangePassword => &[
                Step::CurrentPassword,
                Step::NewPassword,
                Step::ConfirmPassword,
            ],
        }
    }
}

/// Lifecycle state of a scene. Terminal once completed or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneStatus {
    Active,
    Completed,
    Cancelled,
}

/// A value collected by one wizard step.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneValue {
    Text(String),
    Date(NaiveDate),
    Tags(Vec<String>),
}

impl SceneValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SceneValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            SceneValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_tags(&self) -> Option<&[String]> {
        match self {
            SceneValue::Tags(t) => Some(t),
            _ => None,
        }
    }
}

/// Snapshot of a completed scene's collected data.
pub type SceneData = HashMap<&'static str, SceneValue>;

/// One in-progress wizard for one user.
#[derive(Debug)]
struct Scene {
    kind: SceneKind,
    current_step: usize,
    status: SceneStatus,
    data: SceneData,
    touched: Instant,
}

impl Scene {
    fn new(kind: SceneKind) -> Self {
        Self {
            kind,
            current_step: 0,
            status: SceneStatus::Active,
            data: HashMap::new(),
            touched: Instant::now(),
        }
    }

    fn current(&self) -> Option<Step> {
        self.kind.steps().get(self.current_step).copied()
    }

    /// Advances one step; flips to Completed when the sequence is exhausted.
    fn next_step(&mut self) -> Option<Step> {
        self.current_step += 1;
        match self.kind.steps().get(self.current_step) {
            Some(step) => Some(*step),
            None => {
                self.status = SceneStatus::Completed;
                None
            }
        }
    }

    fn previous_step(&mut self) -> Option<Step> {
        if self.current_step == 0 {
            return None;
        }
        self.current_step -= 1;
        self.current()
    }

    fn set_data(&mut self, key: &'static str, value: SceneValue) {
        if let Some(existing) = self.data.get(key) {
            // Re-prompting the same step may rewrite its own key; a different
            // step overwriting an earlier one would be a routing bug.
            if *existing != value {
                log::warn!("Scene data key '{}' rewritten with a different value", key);
            }
        }
        self.data.insert(key, value);
    }
}

/// Process-wide registry of active wizard scenes, one per user.
///
/// Owned by the dependency bundle and injected into handlers. All methods
/// take the user's Telegram id; calls against a user with no active scene
/// are harmless no-ops.
#[derive(Debug, Default)]
pub struct SceneManager {
    scenes: DashMap<i64, Scene>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new scene, silently cancelling and discarding any scene the
    /// user already had (no nesting — documented behavior, not corruption).
    /// Returns the first step of the new scene.
    pub fn start(&self, telegram_id: i64, kind: SceneKind) -> Step {
        if self.scenes.remove(&telegram_id).is_some() {
            log::info!("Replacing active scene for user {} with '{}'", telegram_id, kind);
        } else {
            log::info!("Started scene '{}' for user {}", kind, telegram_id);
        }
        let scene = Scene::new(kind);
        let first = scene.kind.steps()[0];
        self.scenes.insert(telegram_id, scene);
        first
    }

    /// True only while the user's scene is active (not completed/cancelled).
    pub fn has_active(&self, telegram_id: i64) -> bool {
        self.scenes
            .get(&telegram_id)
            .map(|s| s.status == SceneStatus::Active)
            .unwrap_or(false)
    }

    /// Kind of the user's active scene, if any.
    pub fn kind_of(&self, telegram_id: i64) -> Option<SceneKind> {
        let scene = self.scenes.get(&telegram_id)?;
        (scene.status == SceneStatus::Active).then_some(scene.kind)
    }

    /// Current step of the user's active scene, if any.
    pub fn current_step(&self, telegram_id: i64) -> Option<Step> {
        let scene = self.scenes.get(&telegram_id)?;
        (scene.status == SceneStatus::Active).then(|| scene.current())?
    }

    /// Advances to the next step. Returns the new step, or `None` when the
    /// scene just completed or the user has no active scene.
    pub fn advance(&self, telegram_id: i64) -> Option<Step> {
        let mut scene = self.scenes.get_mut(&telegram_id)?;
        if scene.status != SceneStatus::Active {
            return None;
        }
        scene.touched = Instant::now();
        scene.next_step()
    }

    /// Steps back one step if possible. No-op at the first step.
    pub fn go_back(&self, telegram_id: i64) -> Option<Step> {
        let mut scene = self.scenes.get_mut(&telegram_id)?;
        if scene.status != SceneStatus::Active {
            return None;
        }
        scene.touched = Instant::now();
        scene.previous_step()
    }

    /// Stores a collected value. Returns false when no active scene exists.
    pub fn set_data(&self, telegram_id: i64, key: &'static str, value: SceneValue) -> bool {
        match self.scenes.get_mut(&telegram_id) {
            Some(mut scene) if scene.status == SceneStatus::Active => {
                scene.touched = Instant::now();
                scene.set_data(key, value);
                true
            }
            _ => false,
        }
    }

    /// Stores a value and advances in one atomic operation, so a validated
    /// input can never be recorded without the matching step transition.
    /// Returns the new step, or `None` when the scene completed (or there is
    /// no active scene — distinguish with [`SceneManager::has_active`]).
    pub fn record_and_advance(
        &self,
        telegram_id: i64,
        key: &'static str,
        value: SceneValue,
    ) -> Option<Step> {
        let mut scene = self.scenes.get_mut(&telegram_id)?;
        if scene.status != SceneStatus::Active {
            return None;
        }
        scene.touched = Instant::now();
        scene.set_data(key, value);
        scene.next_step()
    }

    /// Reads a collected value from the user's active scene.
    pub fn get_data(&self, telegram_id: i64, key: &str) -> Option<SceneValue> {
        self.scenes.get(&telegram_id)?.data.get(key).cloned()
    }

    /// Marks the scene completed, removes it from the registry, and returns
    /// a snapshot of everything collected. The second call for the same
    /// scene returns `None` (the scene is already gone).
    pub fn complete(&self, telegram_id: i64) -> Option<SceneData> {
        let (_, mut scene) = self.scenes.remove(&telegram_id)?;
        scene.status = SceneStatus::Completed;
        log::info!("Completed scene '{}' for user {}", scene.kind, telegram_id);
        Some(scene.data)
    }

    /// Cancels and discards the user's scene. Always safe to call.
    pub fn cancel(&self, telegram_id: i64) {
        if let Some((_, scene)) = self.scenes.remove(&telegram_id) {
            log::info!("Cancelled scene '{}' for user {}", scene.kind, telegram_id);
        }
    }

    /// (current 1-based step, total steps) for progress prompts.
    pub fn progress(&self, telegram_id: i64) -> Option<(usize, usize)> {
        let scene = self.scenes.get(&telegram_id)?;
        if scene.status != SceneStatus::Active {
            return None;
        }
        Some((scene.current_step + 1, scene.kind.steps().len()))
    }

    /// Drops scenes idle longer than `max_idle`. Called from a periodic
    /// sweep task so abandoned half-finished wizards don't live forever.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let before = self.scenes.len();
        self.scenes.retain(|telegram_id, scene| {
            let keep = scene.touched.elapsed() < max_idle;
            if !keep {
                log::info!("Sweeping idle scene '{}' for user {}", scene.kind, telegram_id);
            }
            keep
        });
        before - self.scenes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const USER: i64 = 42;

    #[test]
    fn test_start_begins_at_first_step() {
        let scenes = SceneManager::new();
        let first = scenes.start(USER, SceneKind::SavePassword);
        assert_eq!(first, Step::ServiceName);
        assert!(scenes.has_active(USER));
        assert_eq!(scenes.current_step(USER), Some(Step::ServiceName));
        assert_eq!(scenes.progress(USER), Some((1, 5)));
    }

    #[test]
    fn test_advance_walks_the_template_in_order() {
        let scenes = SceneManager::new();
        scenes.start(USER, SceneKind::AddTask);

        assert_eq!(scenes.advance(USER), Some(Step::Priority));
        assert_eq!(scenes.advance(USER), Some(Step::DueDate));
        assert_eq!(scenes.advance(USER), Some(Step::Tags));
        assert_eq!(scenes.advance(USER), Some(Step::Confirm));
        // Past the last step: scene completes exactly once
        assert_eq!(scenes.advance(USER), None);
        assert!(!scenes.has_active(USER));
        // Further advances are no-ops
        assert_eq!(scenes.advance(USER), None);
    }

    #[test]
    fn test_advance_without_scene_is_noop() {
        let scenes = SceneManager::new();
        assert_eq!(scenes.advance(USER), None);
        assert_eq!(scenes.go_back(USER), None);
        assert!(!scenes.set_data(USER, "x", SceneValue::Text("y".into())));
    }

    #[test]
    fn test_go_back_decrements_but_stops_at_zero() {
        let scenes = SceneManager::new();
        scenes.start(USER, SceneKind::SavePassword);
        assert_eq!(scenes.go_back(USER), None); // already at step 0
        scenes.advance(USER);
        assert_eq!(scenes.go_back(USER), Some(Step::ServiceName));
        assert_eq!(scenes.go_back(USER), None);
    }

    #[test]
    fn test_second_start_discards_first_scene() {
        let scenes = SceneManager::new();
        scenes.start(USER, SceneKind::SavePassword);
        scenes.set_data(USER, "service_name", SceneValue::Text("GitHub".into()));

        scenes.start(USER, SceneKind::AddTask);
        assert!(scenes.has_active(USER));
        assert_eq!(scenes.kind_of(USER), Some(SceneKind::AddTask));
        // First scene's data is unrecoverable
        assert_eq!(scenes.get_data(USER, "service_name"), None);
    }

    #[test]
    fn test_complete_returns_snapshot_once() {
        let scenes = SceneManager::new();
        scenes.start(USER, SceneKind::SavePassword);
        scenes.set_data(USER, "service_name", SceneValue::Text("GitHub".into()));

        let data = scenes.complete(USER).unwrap();
        assert_eq!(
            data.get("service_name"),
            Some(&SceneValue::Text("GitHub".into()))
        );
        // Idempotent double-complete: scene already gone
        assert!(scenes.complete(USER).is_none());
        assert!(!scenes.has_active(USER));
    }

    #[test]
    fn test_cancel_is_always_safe() {
        let scenes = SceneManager::new();
        scenes.cancel(USER); // no scene: fine
        scenes.start(USER, SceneKind::UploadFile);
        scenes.cancel(USER);
        assert!(!scenes.has_active(USER));
        scenes.cancel(USER);
    }

    #[test]
    fn test_record_and_advance_is_one_transition() {
        let scenes = SceneManager::new();
        scenes.start(USER, SceneKind::SavePassword);
        let next = scenes.record_and_advance(USER, "service_name", SceneValue::Text("GitHub".into()));
        assert_eq!(next, Some(Step::Username));
        assert_eq!(
            scenes.get_data(USER, "service_name"),
            Some(SceneValue::Text("GitHub".into()))
        );
    }

    #[test]
    fn test_save_password_skip_scenario() {
        // service → skip username → password → skip tags
        let scenes = SceneManager::new();
        scenes.start(USER, SceneKind::SavePassword);

        scenes.record_and_advance(USER, "service_name", SceneValue::Text("GitHub".into()));
        scenes.record_and_advance(USER, "username", SceneValue::Text(String::new()));
        scenes.record_and_advance(USER, "password", SceneValue::Text("Str0ng!Pass".into()));
        let next = scenes.record_and_advance(USER, "tags", SceneValue::Tags(vec![]));
        assert_eq!(next, Some(Step::Confirm));

        let data = scenes.complete(USER).unwrap();
        assert_eq!(data.get("service_name"), Some(&SceneValue::Text("GitHub".into())));
        assert_eq!(data.get("username"), Some(&SceneValue::Text(String::new())));
        assert_eq!(data.get("password"), Some(&SceneValue::Text("Str0ng!Pass".into())));
        assert_eq!(data.get("tags"), Some(&SceneValue::Tags(vec![])));
    }

    #[test]
    fn test_users_do_not_share_scenes() {
        let scenes = SceneManager::new();
        scenes.start(1, SceneKind::SavePassword);
        scenes.start(2, SceneKind::AddTask);

        scenes.set_data(1, "service_name", SceneValue::Text("Gmail".into()));
        assert_eq!(scenes.get_data(2, "service_name"), None);
        assert_eq!(scenes.kind_of(1), Some(SceneKind::SavePassword));
        assert_eq!(scenes.kind_of(2), Some(SceneKind::AddTask));
    }

    #[test]
    fn test_sweep_idle_drops_stale_scenes() {
        let scenes = SceneManager::new();
        scenes.start(USER, SceneKind::AddTask);
        // Nothing is stale yet
        assert_eq!(scenes.sweep_idle(Duration::from_secs(60)), 0);
        // Zero TTL: everything is stale
        assert_eq!(scenes.sweep_idle(Duration::ZERO), 1);
        assert!(!scenes.has_active(USER));
    }

    #[test]
    fn test_step_templates_end_in_terminal_step() {
        let kinds = [
            SceneKind::SavePassword,
            SceneKind::AddTask,
            SceneKind::UploadFile,
            SceneKind::EditPassword,
            SceneKind::EditTask,
            SceneKind::ChangePassword,
        ];
        for kind in kinds {
            let steps = kind.steps();
            assert!(!steps.is_empty(), "empty template for {}", kind);
            let last = steps[steps.len() - 1];
            assert!(
                last == Step::Confirm || last == Step::ConfirmPassword,
                "{} does not end in a confirm step",
                kind
            );
        }
    }
}
