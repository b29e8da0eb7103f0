//! Durable persistence of the progression.
//!
//! The balance always lives under `tuning.balance_key` as a plain decimal
//! string, the format the page has always used for `localStorage.adCount`.
//! The ad count, when the variant keeps one, is stored the same way under
//! `tuning.ad_count_key`.
//!
//! With `persist_progress` the quota and the upgrade levels are saved too,
//! as versioned JSON under `tuning.progress_key()`:
//!
//! - `SAVE_VERSION`: bump when fields are added.
//! - `MIN_COMPATIBLE_VERSION`: bump only for breaking changes (a field changes
//!   meaning or disappears). Anything at or above it loads, with missing
//!   fields taking their defaults.

use serde::{Deserialize, Serialize};

use crate::log;
use crate::storage::KeyValueStore;

use super::state::{ProgressionState, UpgradeKind};
use super::tuning::Tuning;

const SAVE_VERSION: u32 = 1;

const MIN_COMPATIBLE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SaveData {
    version: u32,
    progress: ProgressSave,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct ProgressSave {
    quota: u32,
    /// Levels in `UpgradeKind::all()` order.
    levels: Vec<u32>,
}

fn extract_progress(state: &ProgressionState) -> SaveData {
    SaveData {
        version: SAVE_VERSION,
        progress: ProgressSave {
            quota: state.quota,
            levels: UpgradeKind::all()
                .iter()
                .map(|k| state.levels.get(*k))
                .collect(),
        },
    }
}

/// Levels first, so the cap is known before the quota is clamped to it.
fn apply_progress(state: &mut ProgressionState, tuning: &Tuning, save: &ProgressSave) {
    for (i, &level) in save.levels.iter().enumerate() {
        if let Some(kind) = UpgradeKind::from_index(i) {
            state.levels.set(kind, level);
        }
    }
    state.quota = save.quota;
    state.recompute_derived(tuning);
}

/// Stored counter (balance or ad count), or 0 when absent. A value that is
/// not a non-negative integer is discarded.
pub fn load_count(store: &mut dyn KeyValueStore, key: &str) -> u64 {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return 0,
        Err(e) => {
            log::warn(&format!("cannot read {key}: {e}"));
            return 0;
        }
    };
    match raw.trim().parse::<u64>() {
        Ok(value) => value,
        Err(e) => {
            log::warn(&format!("discarding stored {key}={raw:?}: {e}"));
            if let Err(e) = store.remove(key) {
                log::warn(&format!("cannot remove {key}: {e}"));
            }
            0
        }
    }
}

pub fn save_count(store: &mut dyn KeyValueStore, key: &str, value: u64) {
    if let Err(e) = store.set(key, &value.to_string()) {
        log::warn(&format!("failed to save {key}: {e}"));
    }
}

pub fn save_progress(store: &mut dyn KeyValueStore, tuning: &Tuning, state: &ProgressionState) {
    let key = tuning.progress_key();
    let json = match serde_json::to_string(&extract_progress(state)) {
        Ok(j) => j,
        Err(e) => {
            log::warn(&format!("failed to serialize progress: {e}"));
            return;
        }
    };
    if let Err(e) = store.set(&key, &json) {
        log::warn(&format!("failed to save {key}: {e}"));
    }
}

/// Restore quota and levels. Returns false (and drops the entry) when the
/// save is unreadable or too old.
pub fn load_progress(
    store: &mut dyn KeyValueStore,
    tuning: &Tuning,
    state: &mut ProgressionState,
) -> bool {
    let key = tuning.progress_key();
    let json = match store.get(&key) {
        Ok(Some(j)) => j,
        Ok(None) => return false,
        Err(e) => {
            log::warn(&format!("cannot read {key}: {e}"));
            return false;
        }
    };

    let save: SaveData = match serde_json::from_str(&json) {
        Ok(d) => d,
        Err(e) => {
            log::warn(&format!("corrupt progress save, discarding: {e}"));
            let _ = store.remove(&key);
            return false;
        }
    };

    if save.version < MIN_COMPATIBLE_VERSION {
        log::info(&format!(
            "progress save too old (saved={}, min_compatible={}), starting fresh",
            save.version, MIN_COMPATIBLE_VERSION
        ));
        let _ = store.remove(&key);
        return false;
    }

    apply_progress(state, tuning, &save.progress);
    true
}

/// Build the state for a new session from whatever the store holds.
pub fn restore(store: &mut dyn KeyValueStore, tuning: &Tuning) -> ProgressionState {
    let mut state = ProgressionState::new(tuning);
    state.balance = load_count(store, &tuning.balance_key);
    if let Some(key) = &tuning.ad_count_key {
        state.ads_watched = load_count(store, key);
    }
    if tuning.persist_progress && load_progress(store, tuning, &mut state) {
        state.add_log("Progress restored.", false);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn balance_roundtrip_as_decimal_string() {
        let mut store = MemoryStore::new();
        save_count(&mut store, "adCount", 1234);
        assert_eq!(store.get("adCount").unwrap().as_deref(), Some("1234"));
        assert_eq!(load_count(&mut store, "adCount"), 1234);
    }

    #[test]
    fn missing_balance_is_zero() {
        let mut store = MemoryStore::new();
        assert_eq!(load_count(&mut store, "adCount"), 0);
    }

    #[test]
    fn garbage_balance_is_discarded() {
        let mut store = MemoryStore::new();
        store.set("adCount", "NaN").unwrap();
        assert_eq!(load_count(&mut store, "adCount"), 0);
        assert_eq!(store.get("adCount").unwrap(), None);
    }

    #[test]
    fn negative_balance_is_discarded() {
        let mut store = MemoryStore::new();
        store.set("adCount", "-5").unwrap();
        assert_eq!(load_count(&mut store, "adCount"), 0);
    }

    #[test]
    fn whitespace_is_tolerated() {
        let mut store = MemoryStore::new();
        store.set("adCount", " 42\n").unwrap();
        assert_eq!(load_count(&mut store, "adCount"), 42);
    }

    #[test]
    fn restore_keeps_only_balance_by_default() {
        let tuning = Tuning::clicker();
        let mut state = ProgressionState::new(&tuning);
        state.balance = 77;
        state.quota = 3;
        state.levels.set(UpgradeKind::Multiplier, 2);

        let mut store = MemoryStore::new();
        save_count(&mut store, &tuning.balance_key, state.balance);
        save_progress(&mut store, &tuning, &state);

        let restored = restore(&mut store, &tuning);
        assert_eq!(restored.balance, 77);
        assert_eq!(restored.quota, tuning.quota_cap);
        assert_eq!(restored.levels.get(UpgradeKind::Multiplier), 0);
    }

    #[test]
    fn ad_count_restored_apart_from_balance() {
        let tuning = Tuning::ad_counter();
        let mut store = MemoryStore::new();
        store.set("adCount", "61").unwrap();
        store.set(&tuning.balance_key, "12").unwrap();

        let restored = restore(&mut store, &tuning);
        assert_eq!(restored.ads_watched, 61);
        assert_eq!(restored.balance, 12);

        let clicker = restore(&mut store, &Tuning::clicker());
        assert_eq!(clicker.ads_watched, 0);
    }

    #[test]
    fn progress_roundtrip_when_enabled() {
        let mut tuning = Tuning::clicker();
        tuning.persist_progress = true;
        let mut state = ProgressionState::new(&tuning);
        state.levels.set(UpgradeKind::Capacity, 3);
        state.levels.set(UpgradeKind::Speed, 2);
        state.levels.set(UpgradeKind::Multiplier, 1);
        state.recompute_derived(&tuning);
        state.quota = 1250;

        let mut store = MemoryStore::new();
        save_progress(&mut store, &tuning, &state);

        let restored = restore(&mut store, &tuning);
        assert_eq!(restored.quota_cap, 1300);
        assert_eq!(restored.quota, 1250);
        assert_eq!(restored.click_delay_ticks, 3);
        assert_eq!(restored.multiplier(), 2);
    }

    #[test]
    fn saved_quota_is_clamped_to_cap() {
        let mut tuning = Tuning::clicker();
        tuning.persist_progress = true;
        let mut store = MemoryStore::new();
        store
            .set(&tuning.progress_key(), r#"{"version":1,"progress":{"quota":99999}}"#)
            .unwrap();
        let restored = restore(&mut store, &tuning);
        assert_eq!(restored.quota, tuning.quota_cap);
    }

    #[test]
    fn corrupt_progress_is_dropped() {
        let mut tuning = Tuning::clicker();
        tuning.persist_progress = true;
        let mut store = MemoryStore::new();
        store.set(&tuning.progress_key(), "{not json").unwrap();

        let mut state = ProgressionState::new(&tuning);
        assert!(!load_progress(&mut store, &tuning, &mut state));
        assert_eq!(store.get(&tuning.progress_key()).unwrap(), None);
    }

    #[test]
    fn too_old_progress_is_dropped() {
        let mut tuning = Tuning::clicker();
        tuning.persist_progress = true;
        let mut store = MemoryStore::new();
        store
            .set(&tuning.progress_key(), r#"{"version":0,"progress":{"quota":5}}"#)
            .unwrap();

        let mut state = ProgressionState::new(&tuning);
        assert!(!load_progress(&mut store, &tuning, &mut state));
        assert_eq!(state.quota, tuning.quota_cap);
        assert_eq!(store.get(&tuning.progress_key()).unwrap(), None);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let mut tuning = Tuning::clicker();
        tuning.persist_progress = true;
        let mut store = MemoryStore::new();
        store
            .set(&tuning.progress_key(), r#"{"version":1,"progress":{"levels":[2]}}"#)
            .unwrap();

        let mut state = ProgressionState::new(&tuning);
        assert!(load_progress(&mut store, &tuning, &mut state));
        assert_eq!(state.multiplier(), 4);
        assert_eq!(state.quota, 0);
    }
}
