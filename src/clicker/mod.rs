//! Ad clicker: tap to earn, watch ads, buy upgrades.

pub mod actions;
pub mod logic;
pub mod render;
pub mod save;
pub mod state;
pub mod tuning;

use std::cell::RefCell;
use std::rc::Rc;

use ratzilla::ratatui::layout::Rect;
use ratzilla::ratatui::Frame;

use crate::input::{ClickState, InputEvent};
use crate::net::Reporter;
use crate::storage::KeyValueStore;

use logic::{Action, Effect};
use state::{ProgressionState, UpgradeKind};
use tuning::Tuning;

/// The progression plus the collaborators that carry out its effects.
pub struct ClickerGame {
    pub state: ProgressionState,
    pub tuning: Tuning,
    store: Box<dyn KeyValueStore>,
    reporter: Box<dyn Reporter>,
}

impl ClickerGame {
    pub fn new(
        tuning: Tuning,
        mut store: Box<dyn KeyValueStore>,
        reporter: Box<dyn Reporter>,
    ) -> Self {
        let state = save::restore(store.as_mut(), &tuning);
        Self {
            state,
            tuning,
            store,
            reporter,
        }
    }

    /// Run an action through the reducer and carry out its effects.
    pub fn dispatch(&mut self, action: Action) {
        let effects = logic::apply(&mut self.state, &self.tuning, action);
        self.run_effects(effects);
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::PersistBalance(balance) => {
                    save::save_count(self.store.as_mut(), &self.tuning.balance_key, balance);
                }
                Effect::PersistAdCount(count) => {
                    if let Some(key) = &self.tuning.ad_count_key {
                        save::save_count(self.store.as_mut(), key, count);
                    }
                }
                Effect::PersistProgress => {
                    save::save_progress(self.store.as_mut(), &self.tuning, &self.state);
                }
                Effect::ReportAdCount(count) => {
                    if let Some(remote) = &self.tuning.remote {
                        self.reporter.report_ad_count(&remote.ad_count_url, count);
                    }
                }
            }
        }
    }

    /// Map an input event to an action. Returns true if the event was consumed.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        let action = match event {
            InputEvent::Key(c) => match c {
                'c' | ' ' => Action::Click,
                't' => Action::StartTask,
                'g' => Action::CheckTask,
                'r' => {
                    self.restart();
                    return true;
                }
                '1'..='3' => match UpgradeKind::from_index((*c as u8 - b'1') as usize) {
                    Some(kind) => Action::Purchase(kind),
                    None => return false,
                },
                _ => return false,
            },
            InputEvent::Click(id) => match *id {
                actions::CLICK => Action::Click,
                actions::START_TASK => Action::StartTask,
                actions::CHECK_TASK => Action::CheckTask,
                actions::RESTART => {
                    self.restart();
                    return true;
                }
                id if id >= actions::BUY_UPGRADE_BASE => {
                    match UpgradeKind::from_index((id - actions::BUY_UPGRADE_BASE) as usize) {
                        Some(kind) => Action::Purchase(kind),
                        None => return false,
                    }
                }
                _ => return false,
            },
        };
        self.dispatch(action);
        true
    }

    pub fn tick(&mut self, delta_ticks: u32) {
        if delta_ticks > 0 {
            self.dispatch(Action::Tick(delta_ticks));
        }
    }

    /// Tear the session down and start a new one from storage. A pending
    /// click is lost, which matches leaving the page mid-ad.
    pub fn restart(&mut self) {
        self.dispatch(Action::Teardown);
        let user = self.state.user.take();
        self.state = save::restore(self.store.as_mut(), &self.tuning);
        self.state.user = user;
        self.state.add_log("Session restarted.", false);
    }

    pub fn render(&self, f: &mut Frame, area: Rect, click_state: &Rc<RefCell<ClickState>>) {
        render::render(&self.state, &self.tuning, f, area, click_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::NullReporter;
    use crate::storage::{MemoryStore, StorageError};

    /// Store handle the test keeps a second reference to.
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.borrow().get(key)
        }
        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.borrow_mut().set(key, value)
        }
        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.0.borrow_mut().remove(key)
        }
    }

    /// Every write fails.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable)
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Rejected("QuotaExceededError".into()))
        }
        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
    }

    #[derive(Clone, Default)]
    struct RecordingReporter(Rc<RefCell<Vec<(String, u64)>>>);

    impl Reporter for RecordingReporter {
        fn report_ad_count(&self, url: &str, count: u64) {
            self.0.borrow_mut().push((url.to_string(), count));
        }
    }

    fn game_with(tuning: Tuning, store: &SharedStore) -> ClickerGame {
        ClickerGame::new(tuning, Box::new(store.clone()), Box::new(NullReporter))
    }

    fn watch_one(game: &mut ClickerGame) {
        game.handle_input(&InputEvent::Key('c'));
        let delay = game.state.click_delay_ticks;
        game.tick(delay);
    }

    #[test]
    fn click_persists_balance() {
        let store = SharedStore::default();
        let mut game = game_with(Tuning::clicker(), &store);
        watch_one(&mut game);
        watch_one(&mut game);
        assert_eq!(game.state.balance, 2);
        assert_eq!(store.get("clicker_balance").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn balance_survives_new_session() {
        let store = SharedStore::default();
        {
            let mut game = game_with(Tuning::clicker(), &store);
            for _ in 0..3 {
                watch_one(&mut game);
            }
        }
        let game = game_with(Tuning::clicker(), &store);
        assert_eq!(game.state.balance, 3);
        assert_eq!(game.state.quota, 1000);
    }

    #[test]
    fn purchase_persists_debited_balance() {
        let store = SharedStore::default();
        store.0.borrow_mut().set("clicker_balance", "120").unwrap();
        let mut game = game_with(Tuning::clicker(), &store);
        assert!(game.handle_input(&InputEvent::Key('1')));
        assert_eq!(game.state.balance, 70);
        assert_eq!(store.get("clicker_balance").unwrap().as_deref(), Some("70"));
    }

    #[test]
    fn click_targets_map_to_actions() {
        let store = SharedStore::default();
        store.0.borrow_mut().set("clicker_balance", "500").unwrap();
        let mut game = game_with(Tuning::clicker(), &store);

        game.handle_input(&InputEvent::Click(actions::BUY_UPGRADE_BASE + 1));
        assert_eq!(game.state.levels.get(UpgradeKind::Capacity), 1);

        game.handle_input(&InputEvent::Click(actions::START_TASK));
        assert!(matches!(game.state.task, state::TaskPhase::Running { .. }));

        game.handle_input(&InputEvent::Click(actions::CLICK));
        assert!(game.state.is_pending());

        assert!(!game.handle_input(&InputEvent::Click(actions::BUY_UPGRADE_BASE + 9)));
        assert!(!game.handle_input(&InputEvent::Click(42)));
    }

    #[test]
    fn unknown_keys_are_not_consumed() {
        let store = SharedStore::default();
        let mut game = game_with(Tuning::clicker(), &store);
        assert!(!game.handle_input(&InputEvent::Key('z')));
        assert!(!game.handle_input(&InputEvent::Key('9')));
    }

    #[test]
    fn restart_drops_pending_click_and_reloads() {
        let store = SharedStore::default();
        let mut game = game_with(Tuning::clicker(), &store);
        watch_one(&mut game);
        game.handle_input(&InputEvent::Key('c'));
        game.tick(1);

        game.handle_input(&InputEvent::Key('r'));
        assert!(!game.state.is_pending());
        assert_eq!(game.state.balance, 1);
        assert_eq!(game.state.quota, 1000);

        game.tick(100);
        assert_eq!(game.state.balance, 1);
    }

    #[test]
    fn dropping_mid_ad_credits_nothing() {
        let store = SharedStore::default();
        {
            let mut game = game_with(Tuning::clicker(), &store);
            watch_one(&mut game);
            game.handle_input(&InputEvent::Key('c'));
            game.tick(2);
        }
        let game = game_with(Tuning::clicker(), &store);
        assert_eq!(game.state.balance, 1);
        assert!(!game.state.is_pending());
    }

    #[test]
    fn ad_count_report_is_previous_plus_one() {
        let store = SharedStore::default();
        store.0.borrow_mut().set("adCount", "60").unwrap();
        store.0.borrow_mut().set("adBalance", "60").unwrap();
        let reporter = RecordingReporter::default();
        let mut game = ClickerGame::new(
            Tuning::ad_counter(),
            Box::new(store.clone()),
            Box::new(reporter.clone()),
        );

        game.handle_input(&InputEvent::Key('1'));
        assert_eq!(game.state.balance, 10);
        watch_one(&mut game);

        assert_eq!(
            *reporter.0.borrow(),
            vec![("/api/increment-ad-count".to_string(), 61)]
        );
        assert_eq!(store.get("adCount").unwrap().as_deref(), Some("61"));
        assert_eq!(store.get("adBalance").unwrap().as_deref(), Some("12"));
    }

    #[test]
    fn ad_counter_reports_to_backend() {
        let reporter = RecordingReporter::default();
        let mut game = ClickerGame::new(
            Tuning::ad_counter(),
            Box::new(MemoryStore::new()),
            Box::new(reporter.clone()),
        );
        game.handle_input(&InputEvent::Key('c'));
        game.tick(149);
        assert!(reporter.0.borrow().is_empty());
        game.tick(1);
        assert_eq!(
            *reporter.0.borrow(),
            vec![("/api/increment-ad-count".to_string(), 1)]
        );
    }

    #[test]
    fn clicker_never_reports() {
        let reporter = RecordingReporter::default();
        let mut game = ClickerGame::new(
            Tuning::clicker(),
            Box::new(MemoryStore::new()),
            Box::new(reporter.clone()),
        );
        watch_one(&mut game);
        assert!(reporter.0.borrow().is_empty());
    }

    #[test]
    fn storage_failures_do_not_stop_play() {
        let mut game = ClickerGame::new(
            Tuning::clicker(),
            Box::new(BrokenStore),
            Box::new(NullReporter),
        );
        assert_eq!(game.state.balance, 0);
        watch_one(&mut game);
        assert_eq!(game.state.balance, 1);
        assert_eq!(game.state.quota, 999);
    }

    #[test]
    fn user_info_survives_restart() {
        let store = SharedStore::default();
        let mut game = game_with(Tuning::ad_counter(), &store);
        game.dispatch(Action::UserInfoLoaded(crate::net::UserInfo {
            id: Some("7".into()),
            username: None,
        }));
        game.restart();
        assert!(game.state.user.is_some());
    }
}
