//! Game constants and the two shipped variants.
//!
//! Every duration is in ticks (see [`crate::time::TICKS_PER_SEC`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::KeyValueStore;

use super::state::UpgradeKind;

/// localStorage key holding an optional JSON tuning override.
pub const TUNING_KEY: &str = "clicker_tuning";

/// Outbound endpoints of the ad-counter variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Remote {
    pub user_info_url: String,
    pub ad_count_url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Delay between pressing the button and the credit (simulated ad watch).
    pub click_delay_ticks: u32,
    /// Lowest delay the speed upgrade can reach.
    pub min_click_delay_ticks: u32,
    /// Delay removed per speed level.
    pub speed_step_ticks: u32,
    pub quota_cap: u32,
    /// Cap added per capacity level.
    pub capacity_step: u32,
    /// One quota unit comes back every this many ticks while below cap.
    pub regen_interval_ticks: u32,
    pub task_duration_ticks: u32,
    pub task_reward: u64,
    /// Lifetime of a notice such as "not enough coins".
    pub notice_ticks: u32,
    pub multiplier_base_cost: u64,
    pub capacity_base_cost: u64,
    pub speed_base_cost: u64,
    pub balance_key: String,
    /// Where the number of completed ads is kept, if anywhere.
    pub ad_count_key: Option<String>,
    /// Also save quota, cap and upgrade levels. Off in both shipped variants.
    pub persist_progress: bool,
    pub remote: Option<Remote>,
}

#[derive(Debug, Error, PartialEq)]
pub enum TuningError {
    #[error("regen_interval_ticks must be positive")]
    ZeroRegenInterval,
    #[error("quota_cap must be positive")]
    ZeroQuotaCap,
    #[error("task_duration_ticks must be positive")]
    ZeroTaskDuration,
    #[error("min_click_delay_ticks ({min}) exceeds click_delay_ticks ({delay})")]
    FloorAboveDelay { min: u32, delay: u32 },
    #[error("balance_key must not be empty")]
    EmptyBalanceKey,
    #[error("ad_count_key must be non-empty and differ from balance_key")]
    BadAdCountKey,
    #[error("invalid tuning JSON: {0}")]
    Parse(String),
}

impl Default for Tuning {
    fn default() -> Self {
        Self::clicker()
    }
}

impl Tuning {
    /// Tap-to-earn variant with upgrades and the timed bonus task.
    pub fn clicker() -> Self {
        Self {
            click_delay_ticks: 5,
            min_click_delay_ticks: 1,
            speed_step_ticks: 1,
            quota_cap: 1000,
            capacity_step: 100,
            regen_interval_ticks: 10,
            task_duration_ticks: 100,
            task_reward: 100,
            notice_ticks: 30,
            multiplier_base_cost: 50,
            capacity_base_cost: 100,
            speed_base_cost: 200,
            balance_key: "clicker_balance".into(),
            ad_count_key: None,
            persist_progress: false,
            remote: None,
        }
    }

    /// "Watch Ad" variant: a 15 second ad per credit. Completed ads are
    /// counted under `adCount` and reported to the backend; coins live apart.
    pub fn ad_counter() -> Self {
        Self {
            click_delay_ticks: 150,
            balance_key: "adBalance".into(),
            ad_count_key: Some("adCount".into()),
            remote: Some(Remote {
                user_info_url: "/api/user-info".into(),
                ad_count_url: "/api/increment-ad-count".into(),
            }),
            ..Self::clicker()
        }
    }

    /// Preset named by the page's query string (`?variant=ads`).
    pub fn from_query(search: &str) -> Self {
        let wants_ads = search
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .any(|(k, v)| k == "variant" && (v == "ads" || v == "ad_counter"));
        if wants_ads {
            Self::ad_counter()
        } else {
            Self::clicker()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning =
            serde_json::from_str(json).map_err(|e| TuningError::Parse(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.regen_interval_ticks == 0 {
            return Err(TuningError::ZeroRegenInterval);
        }
        if self.quota_cap == 0 {
            return Err(TuningError::ZeroQuotaCap);
        }
        if self.task_duration_ticks == 0 {
            return Err(TuningError::ZeroTaskDuration);
        }
        if self.min_click_delay_ticks > self.click_delay_ticks {
            return Err(TuningError::FloorAboveDelay {
                min: self.min_click_delay_ticks,
                delay: self.click_delay_ticks,
            });
        }
        if self.balance_key.is_empty() {
            return Err(TuningError::EmptyBalanceKey);
        }
        if let Some(key) = &self.ad_count_key {
            if key.is_empty() || *key == self.balance_key {
                return Err(TuningError::BadAdCountKey);
            }
        }
        Ok(())
    }

    pub fn base_cost(&self, kind: UpgradeKind) -> u64 {
        match kind {
            UpgradeKind::Multiplier => self.multiplier_base_cost,
            UpgradeKind::Capacity => self.capacity_base_cost,
            UpgradeKind::Speed => self.speed_base_cost,
        }
    }

    /// Key of the opt-in progress save, derived from the balance key.
    pub fn progress_key(&self) -> String {
        format!("{}_progress", self.balance_key)
    }
}

/// Resolve the tuning for this page load: a stored JSON override wins,
/// otherwise the preset picked by the query string.
pub fn load(store: &dyn KeyValueStore, search: &str) -> Tuning {
    let preset = Tuning::from_query(search);
    let json = match store.get(TUNING_KEY) {
        Ok(Some(json)) => json,
        Ok(None) => return preset,
        Err(e) => {
            crate::log::warn(&format!("cannot read {TUNING_KEY}: {e}"));
            return preset;
        }
    };
    match Tuning::from_json(&json) {
        Ok(tuning) => {
            crate::log::info(&format!("using tuning override from {TUNING_KEY}"));
            tuning
        }
        Err(e) => {
            crate::log::warn(&format!("ignoring {TUNING_KEY}: {e}"));
            preset
        }
    }
}
