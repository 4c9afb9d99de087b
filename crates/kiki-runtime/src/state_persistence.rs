//! Application state persistence across page loads.
//!
//! This module provides the [`StateStore`] and [`StorageBackend`] infrastructure
//! for persisting the learner's progress on a single device.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        StateStore                             │
//! │   - In-memory JSON object merged over defaults                │
//! │   - get/set/update never touch storage directly               │
//! │   - save() serialises the whole object under one key          │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     StorageBackend                            │
//! │   - MemoryStorage: in-memory (testing, ephemeral)             │
//! │   - FileStorage: one JSON file per key (state-persistence)    │
//! │   - LocalStorage: browser localStorage (wasm host)            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Invariants
//!
//! 1. **Graceful degradation**: storage failures never panic; `save` reports `false`.
//! 2. **Merge over defaults**: unknown keys are kept, missing keys take defaults.
//! 3. **Corrupt payloads**: anything that is not a JSON object yields exactly the defaults.
//! 4. **Explicit I/O**: `get`/`set` perform durable I/O only through `save`.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `StorageError::Io` | File I/O failure | `save` returns `false`, memory state kept |
//! | `StorageError::QuotaExceeded` | Backend full | `save` returns `false`, memory state kept |
//! | `StorageError::Unavailable` | Storage disabled (privacy mode) | operate in memory only |
//! | Corrupt record | Hand-edited or truncated | defaults used, logged |
//!
//! # Feature Gates
//!
//! - `state-persistence`: Enables `FileStorage`.
//!   Without this feature, only `MemoryStorage` (and the host's own backend) is available.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during state storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error during file operations.
    Io(std::io::Error),
    /// Serialization or deserialization error.
    Serialization(String),
    /// The backend refused the write because it is full.
    QuotaExceeded(String),
    /// Backend is not available (disabled storage, poisoned lock).
    Unavailable(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            StorageError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            StorageError::QuotaExceeded(msg) => write!(f, "storage quota exceeded: {msg}"),
            StorageError::Unavailable(msg) => write!(f, "storage unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Serialization(_)
            | StorageError::QuotaExceeded(_)
            | StorageError::Unavailable(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// ─────────────────────────────────────────────────────────────────────────────
// Storage Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Key used by the availability probe.
pub const PROBE_KEY: &str = "__storage_test__";

/// Trait for pluggable string key-value storage backends.
///
/// # Implementation Notes
///
/// - `read` returns `Ok(None)` when nothing is stored under the key.
/// - `write` replaces the value atomically where the medium allows it.
/// - `remove` of an absent key is not an error.
pub trait StorageBackend {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Read the raw value stored under `key`.
    fn read(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`.
    fn write(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove whatever is stored under `key`.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Check if the backend is available and functional.
    ///
    /// The default writes and deletes a probe entry.
    fn is_available(&self) -> bool {
        self.write(PROBE_KEY, PROBE_KEY)
            .and_then(|()| self.remove(PROBE_KEY))
            .is_ok()
    }
}

/// Whether `backend` accepts a harmless write/delete probe. Never panics.
#[must_use]
pub fn is_storage_available(backend: &dyn StorageBackend) -> bool {
    backend.is_available()
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Storage (always available)
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory storage backend for testing and ephemeral state.
///
/// State is lost when the process exits. A read-only switch simulates
/// disabled or full browser storage.
#[derive(Default)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, String>>,
    read_only: AtomicBool,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create memory storage pre-populated with one raw record.
    #[must_use]
    pub fn with_record(key: impl Into<String>, raw: impl Into<String>) -> Self {
        let storage = Self::new();
        if let Ok(mut guard) = storage.data.write() {
            guard.insert(key.into(), raw.into());
        }
        storage
    }

    /// Make every later write and remove fail with `QuotaExceeded`.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::Relaxed);
    }

    /// Raw stored value, bypassing the trait.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.data.read().ok()?.get(key).cloned()
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.read_only.load(Ordering::Relaxed) {
            return Err(StorageError::QuotaExceeded("memory storage is read-only".into()));
        }
        Ok(())
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "MemoryStorage"
    }

    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let guard = self
            .data
            .read()
            .map_err(|_| StorageError::Unavailable("lock poisoned".into()))?;
        Ok(guard.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check_writable()?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| StorageError::Unavailable("lock poisoned".into()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.check_writable()?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| StorageError::Unavailable("lock poisoned".into()))?;
        guard.remove(key);
        Ok(())
    }
}

impl fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.data.read().map(|g| g.len()).unwrap_or(0);
        f.debug_struct("MemoryStorage")
            .field("entries", &count)
            .field("read_only", &self.read_only.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T: StorageBackend + ?Sized> StorageBackend for std::rc::Rc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Storage (requires state-persistence feature)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "state-persistence")]
mod file_storage {
    use super::*;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    /// File-based storage backend: one file per key below a directory.
    ///
    /// # Atomic Writes
    ///
    /// Writes use a temporary file + rename pattern to prevent corruption:
    /// 1. Write to `{key}.json.tmp`
    /// 2. Flush and sync
    /// 3. Rename `{key}.json.tmp` -> `{key}.json`
    pub struct FileStorage {
        dir: PathBuf,
    }

    impl FileStorage {
        /// Create a file storage rooted at `dir`.
        ///
        /// The directory does not need to exist; it will be created on first write.
        #[must_use]
        pub fn new(dir: impl AsRef<Path>) -> Self {
            Self {
                dir: dir.as_ref().to_path_buf(),
            }
        }

        /// Create storage at the default location for the application.
        ///
        /// Uses `$XDG_STATE_HOME/{app_name}` or `~/.local/state/{app_name}`.
        #[must_use]
        pub fn default_for_app(app_name: &str) -> Self {
            Self {
                dir: dirs_or_fallback().join(app_name),
            }
        }

        /// Path of the file holding `key`.
        #[must_use]
        pub fn path_for(&self, key: &str) -> PathBuf {
            let safe: String = key
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                .collect();
            self.dir.join(format!("{safe}.json"))
        }
    }

    /// Get state directory, falling back to current dir if unavailable.
    fn dirs_or_fallback() -> PathBuf {
        if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
            return PathBuf::from(state_home);
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".local").join("state");
        }
        PathBuf::from(".")
    }

    impl StorageBackend for FileStorage {
        fn name(&self) -> &str {
            "FileStorage"
        }

        fn read(&self, key: &str) -> StorageResult<Option<String>> {
            match fs::read_to_string(self.path_for(key)) {
                Ok(raw) => Ok(Some(raw)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }

        fn write(&self, key: &str, value: &str) -> StorageResult<()> {
            fs::create_dir_all(&self.dir)?;
            let path = self.path_for(key);
            let mut tmp_path = path.clone();
            tmp_path.set_extension("json.tmp");
            {
                let file = File::create(&tmp_path)?;
                let mut writer = BufWriter::new(file);
                writer.write_all(value.as_bytes())?;
                writer.flush()?;
                writer.get_ref().sync_all()?;
            }
            fs::rename(&tmp_path, &path)?;

            tracing::debug!(path = %path.display(), bytes = value.len(), "saved state record");
            Ok(())
        }

        fn remove(&self, key: &str) -> StorageResult<()> {
            match fs::remove_file(self.path_for(key)) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        }
    }

    impl fmt::Debug for FileStorage {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FileStorage").field("dir", &self.dir).finish()
        }
    }
}

#[cfg(feature = "state-persistence")]
pub use file_storage::FileStorage;

// ─────────────────────────────────────────────────────────────────────────────
// Domain Records
// ─────────────────────────────────────────────────────────────────────────────

/// Field names of the persisted application state.
pub mod keys {
    pub const CURRENT_LESSON: &str = "currentLesson";
    pub const COMPLETED_LESSONS: &str = "completedLessons";
    pub const QUIZ_SCORES: &str = "quizScores";
    pub const LAST_VISITED: &str = "lastVisited";
    pub const SOUND_ENABLED: &str = "soundEnabled";

    /// Key holding the remembered screen of a lesson.
    #[must_use]
    pub fn lesson_position(lesson_id: u32) -> String {
        format!("lesson_{lesson_id}_position")
    }
}

/// Latest quiz result for one lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizScore {
    pub score: u32,
    pub total: u32,
    pub completed_at: DateTime<Utc>,
}

/// Host page lifecycle signals relevant to flushing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// The page became hidden.
    Hidden,
    /// The page became visible again.
    Visible,
    /// The page is about to unload.
    Unload,
}

// ─────────────────────────────────────────────────────────────────────────────
// State Store
// ─────────────────────────────────────────────────────────────────────────────

/// The learner's progress as one JSON object over a storage backend.
///
/// The store is single-threaded and shared by `Rc`; every method takes
/// `&self`.
///
/// # Example
///
/// ```
/// use kiki_runtime::state_persistence::{StateStore, MemoryStorage};
///
/// let store = StateStore::load(Box::new(MemoryStorage::new()), StateStore::DEFAULT_KEY);
/// assert_eq!(store.current_lesson(), 0);
/// store.set("currentLesson", 3.into());
/// assert!(store.save());
/// ```
pub struct StateStore {
    backend: Box<dyn StorageBackend>,
    key: String,
    state: RefCell<Map<String, Value>>,
    auto_save: Cell<bool>,
}

impl StateStore {
    /// Conventional storage key.
    pub const DEFAULT_KEY: &'static str = "ki-und-ich-state";

    /// Default state object.
    #[must_use]
    pub fn defaults() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(keys::CURRENT_LESSON.into(), json!(0));
        map.insert(keys::COMPLETED_LESSONS.into(), json!([]));
        map.insert(keys::QUIZ_SCORES.into(), json!({}));
        map.insert(keys::LAST_VISITED.into(), Value::Null);
        map.insert(keys::SOUND_ENABLED.into(), json!(true));
        map
    }

    /// Load the record under `key` from `backend`, merged over defaults.
    #[must_use]
    pub fn load(backend: Box<dyn StorageBackend>, key: impl Into<String>) -> Self {
        let key = key.into();
        let state = read_merged(backend.as_ref(), &key);
        Self {
            backend,
            key,
            state: RefCell::new(state),
            auto_save: Cell::new(false),
        }
    }

    /// Create a store with memory storage (ephemeral, for testing).
    #[must_use]
    pub fn in_memory() -> Self {
        Self::load(Box::new(MemoryStorage::new()), Self::DEFAULT_KEY)
    }

    /// Create a store with file storage below `dir`.
    #[cfg(feature = "state-persistence")]
    #[must_use]
    pub fn with_file(dir: impl AsRef<std::path::Path>) -> Self {
        Self::load(Box::new(FileStorage::new(dir)), Self::DEFAULT_KEY)
    }

    /// Replace in-memory state with the durable record.
    pub fn reload(&self) {
        *self.state.borrow_mut() = read_merged(self.backend.as_ref(), &self.key);
    }

    /// Storage key of the durable record.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the backend name for logging.
    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.borrow().get(key).cloned()
    }

    /// Write one key in memory; saves only when auto-save is enabled.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.state.borrow_mut().insert(key.into(), value);
        self.after_write();
    }

    /// Merge several keys in one step; saves only when auto-save is enabled.
    pub fn update(&self, partial: Map<String, Value>) {
        {
            let mut state = self.state.borrow_mut();
            for (key, value) in partial {
                state.insert(key, value);
            }
        }
        self.after_write();
    }

    /// Snapshot copy of the whole state.
    #[must_use]
    pub fn get_all(&self) -> Map<String, Value> {
        self.state.borrow().clone()
    }

    fn after_write(&self) {
        if self.auto_save.get() {
            self.save();
        }
    }

    /// Serialise and write the whole state. Returns `false` on any failure.
    pub fn save(&self) -> bool {
        let serialized = match serde_json::to_string(&*self.state.borrow()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize state");
                return false;
            }
        };
        match self.backend.write(&self.key, &serialized) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(backend = %self.backend.name(), error = %e, "failed to save state");
                false
            }
        }
    }

    /// Restore defaults and remove the durable record.
    pub fn reset(&self) {
        *self.state.borrow_mut() = Self::defaults();
        if let Err(e) = self.backend.remove(&self.key) {
            tracing::error!(backend = %self.backend.name(), error = %e, "failed to clear stored state");
        }
    }

    /// Turn on auto-save. Returns `true` only the first time, so the host
    /// installs its hide/unload hooks exactly once.
    pub fn enable_auto_save(&self) -> bool {
        !self.auto_save.replace(true)
    }

    /// Whether auto-save is on.
    #[must_use]
    pub fn is_auto_save(&self) -> bool {
        self.auto_save.get()
    }

    /// React to a page lifecycle signal. Returns whether a flush happened.
    pub fn handle_lifecycle(&self, signal: Lifecycle) -> bool {
        match signal {
            Lifecycle::Hidden | Lifecycle::Unload if self.auto_save.get() => self.save(),
            _ => false,
        }
    }

    /// Check if the storage backend is available.
    #[must_use]
    pub fn is_storage_available(&self) -> bool {
        is_storage_available(self.backend.as_ref())
    }

    // ── typed accessors ──────────────────────────────────────────────────

    /// Last lesson that loaded successfully (`0` = none yet).
    #[must_use]
    pub fn current_lesson(&self) -> u32 {
        self.get(keys::CURRENT_LESSON)
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0)
    }

    pub fn set_current_lesson(&self, lesson_id: u32) {
        self.set(keys::CURRENT_LESSON, json!(lesson_id));
    }

    /// Completed lessons in completion order.
    #[must_use]
    pub fn completed_lessons(&self) -> Vec<u32> {
        self.get(keys::COMPLETED_LESSONS)
            .and_then(|v| v.as_array().cloned())
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_u64)
                    .filter_map(|v| u32::try_from(v).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_lesson_completed(&self, lesson_id: u32) -> bool {
        self.completed_lessons().contains(&lesson_id)
    }

    /// Append `lesson_id` to the completed set. Returns `false` if it was
    /// already there.
    pub fn mark_lesson_completed(&self, lesson_id: u32) -> bool {
        let mut completed = self.completed_lessons();
        if completed.contains(&lesson_id) {
            return false;
        }
        completed.push(lesson_id);
        self.set(keys::COMPLETED_LESSONS, json!(completed));
        true
    }

    /// Latest quiz result per lesson. Malformed entries are skipped.
    #[must_use]
    pub fn quiz_scores(&self) -> BTreeMap<u32, QuizScore> {
        let Some(Value::Object(map)) = self.get(keys::QUIZ_SCORES) else {
            return BTreeMap::new();
        };
        map.into_iter()
            .filter_map(|(id, score)| {
                let id = id.parse::<u32>().ok()?;
                let score = serde_json::from_value(score).ok()?;
                Some((id, score))
            })
            .collect()
    }

    #[must_use]
    pub fn quiz_score(&self, lesson_id: u32) -> Option<QuizScore> {
        self.quiz_scores().remove(&lesson_id)
    }

    /// Store the latest result for `lesson_id`, overwriting any earlier one.
    pub fn record_quiz_result(
        &self,
        lesson_id: u32,
        score: u32,
        total: u32,
        completed_at: DateTime<Utc>,
    ) {
        let mut scores = match self.get(keys::QUIZ_SCORES) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let record = QuizScore {
            score,
            total,
            completed_at,
        };
        let value = match serde_json::to_value(&record) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize quiz score");
                return;
            }
        };
        scores.insert(lesson_id.to_string(), value);
        self.set(keys::QUIZ_SCORES, Value::Object(scores));
    }

    /// Remembered screen index for `lesson_id`.
    #[must_use]
    pub fn lesson_position(&self, lesson_id: u32) -> Option<usize> {
        self.get(&keys::lesson_position(lesson_id))
            .and_then(|v| v.as_u64())
            .and_then(|v| usize::try_from(v).ok())
    }

    pub fn set_lesson_position(&self, lesson_id: u32, position: usize) {
        self.set(keys::lesson_position(lesson_id), json!(position));
    }

    #[must_use]
    pub fn sound_enabled(&self) -> bool {
        self.get(keys::SOUND_ENABLED)
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.set(keys::SOUND_ENABLED, json!(enabled));
    }

    #[must_use]
    pub fn last_visited(&self) -> Option<DateTime<Utc>> {
        self.get(keys::LAST_VISITED)
            .and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn set_last_visited(&self, at: DateTime<Utc>) {
        self.set(
            keys::LAST_VISITED,
            Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
    }
}

fn read_merged(backend: &dyn StorageBackend, key: &str) -> Map<String, Value> {
    let mut state = StateStore::defaults();
    let raw = match backend.read(key) {
        Ok(Some(raw)) if !raw.is_empty() => raw,
        Ok(_) => return state,
        Err(e) => {
            tracing::warn!(backend = %backend.name(), error = %e, "failed to read stored state");
            return state;
        }
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(stored)) => {
            let count = stored.len();
            state.extend(stored);
            tracing::debug!(backend = %backend.name(), count, "loaded state");
        }
        Ok(other) => {
            tracing::warn!(kind = json_kind(&other), "stored state is not an object, using defaults");
        }
        Err(e) => {
            tracing::warn!(error = %e, "stored state is corrupt, using defaults");
        }
    }
    state
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("backend", &self.backend.name())
            .field("key", &self.key)
            .field("entries", &self.state.borrow().len())
            .field("auto_save", &self.auto_save.get())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
