//! State Persistence E2E Tests
//!
//! End-to-end validation of progress persistence and restoration.
//!
//! # Running Tests
//!
//! ```sh
//! cargo test -p kiki-runtime --test state_persistence_e2e --features state-persistence
//! ```
//!
//! # Invariants
//!
//! 1. **Round-trip integrity**: state saved equals state restored
//! 2. **Merge over defaults**: missing keys take defaults, extra keys survive
//! 3. **Graceful degradation**: corrupt data or failing storage never panics
//! 4. **Flush on hide/unload**: once auto-save is on, lifecycle signals persist

#![cfg(test)]

use std::rc::Rc;

use chrono::{TimeZone, Utc};
use kiki_runtime::state_persistence::{
    Lifecycle, MemoryStorage, StateStore, StorageBackend, keys,
};
use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn store_over(storage: &Rc<MemoryStorage>) -> StateStore {
    StateStore::load(Box::new(Rc::clone(storage)), StateStore::DEFAULT_KEY)
}

// ============================================================================
// 1. Save/Restore Cycle
// ============================================================================

#[test]
fn persist_cycle_round_trip() {
    init_tracing();
    let storage = Rc::new(MemoryStorage::new());
    let store = store_over(&storage);

    store.set_current_lesson(3);
    store.set_lesson_position(3, 4);
    store.mark_lesson_completed(1);
    store.record_quiz_result(
        1,
        4,
        5,
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
    );
    store.set_sound_enabled(false);
    assert!(store.save());

    let restored = store_over(&storage);
    assert_eq!(restored.get_all(), store.get_all());
    assert_eq!(restored.lesson_position(3), Some(4));
    assert_eq!(restored.completed_lessons(), vec![1]);
    assert_eq!(restored.quiz_score(1).map(|s| s.score), Some(4));
    assert!(!restored.sound_enabled());
}

#[test]
fn update_merges_many_keys_in_one_save() {
    let storage = Rc::new(MemoryStorage::new());
    let store = store_over(&storage);
    store.enable_auto_save();

    let mut partial = Map::new();
    partial.insert(keys::CURRENT_LESSON.into(), json!(2));
    partial.insert(keys::lesson_position(2), json!(1));
    store.update(partial);

    let raw: Value =
        serde_json::from_str(&storage.raw(StateStore::DEFAULT_KEY).unwrap()).unwrap();
    assert_eq!(raw["currentLesson"], json!(2));
    assert_eq!(raw["lesson_2_position"], json!(1));
    assert_eq!(raw["soundEnabled"], json!(true));
}

// ============================================================================
// 2. Graceful Degradation
// ============================================================================

#[test]
fn corrupt_record_falls_back_to_defaults_and_is_overwritten() {
    init_tracing();
    let storage = Rc::new(MemoryStorage::with_record(
        StateStore::DEFAULT_KEY,
        "{\"currentLesson\": 2,",
    ));
    let store = store_over(&storage);
    assert_eq!(store.get_all(), StateStore::defaults());

    store.set_current_lesson(1);
    assert!(store.save());
    assert_eq!(store_over(&storage).current_lesson(), 1);
}

#[test]
fn storage_failure_keeps_working_in_memory() {
    let storage = Rc::new(MemoryStorage::new());
    storage.set_read_only(true);
    let store = store_over(&storage);
    assert!(!store.is_storage_available());

    store.enable_auto_save();
    store.set_current_lesson(5);
    store.mark_lesson_completed(5);
    assert_eq!(store.current_lesson(), 5);
    assert!(!store.save());
    assert!(!store.handle_lifecycle(Lifecycle::Unload));
    assert_eq!(storage.raw(StateStore::DEFAULT_KEY), None);
}

#[test]
fn unrelated_keys_are_untouched() {
    let storage = Rc::new(MemoryStorage::new());
    storage.write("other-app", "keep me").unwrap();
    let store = store_over(&storage);
    store.set_current_lesson(1);
    store.save();
    store.reset();
    assert_eq!(storage.raw("other-app").as_deref(), Some("keep me"));
}

// ============================================================================
// 3. Lifecycle Flushes
// ============================================================================

#[test]
fn hide_flushes_pending_changes_after_auto_save() {
    let storage = Rc::new(MemoryStorage::new());
    let store = store_over(&storage);
    store.set_lesson_position(1, 2);
    assert!(store.enable_auto_save());

    storage.remove(StateStore::DEFAULT_KEY).unwrap();
    assert!(store.handle_lifecycle(Lifecycle::Hidden));
    assert_eq!(store_over(&storage).lesson_position(1), Some(2));
}

// ============================================================================
// 4. File Storage
// ============================================================================

#[cfg(feature = "state-persistence")]
#[test]
fn file_storage_survives_restart() {
    use kiki_runtime::state_persistence::FileStorage;

    let dir = tempfile::tempdir().unwrap();
    {
        let store = StateStore::load(
            Box::new(FileStorage::new(dir.path())),
            StateStore::DEFAULT_KEY,
        );
        store.mark_lesson_completed(2);
        assert!(store.save());
    }
    let store = StateStore::load(
        Box::new(FileStorage::new(dir.path())),
        StateStore::DEFAULT_KEY,
    );
    assert_eq!(store.completed_lessons(), vec![2]);
    assert!(store.is_storage_available());
}
