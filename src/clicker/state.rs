//! Progression state: balance, quota, upgrade levels, the bonus task and
//! the in-flight click.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::net::UserInfo;

use super::tuning::Tuning;

/// Log lines kept for the view.
const LOG_LIMIT: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    /// Doubles the per-click credit.
    Multiplier,
    /// Raises the quota cap.
    Capacity,
    /// Shortens the click delay.
    Speed,
}

impl UpgradeKind {
    pub fn all() -> &'static [UpgradeKind] {
        &[UpgradeKind::Multiplier, UpgradeKind::Capacity, UpgradeKind::Speed]
    }

    pub fn index(self) -> usize {
        match self {
            UpgradeKind::Multiplier => 0,
            UpgradeKind::Capacity => 1,
            UpgradeKind::Speed => 2,
        }
    }

    pub fn from_index(idx: usize) -> Option<UpgradeKind> {
        Self::all().get(idx).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            UpgradeKind::Multiplier => "Multiplier",
            UpgradeKind::Capacity => "Capacity",
            UpgradeKind::Speed => "Speed",
        }
    }

    pub fn key(self) -> char {
        match self {
            UpgradeKind::Multiplier => '1',
            UpgradeKind::Capacity => '2',
            UpgradeKind::Speed => '3',
        }
    }
}

/// `base × 2^level`, saturating at `u64::MAX`.
pub fn upgrade_cost(base: u64, level: u32) -> u64 {
    base.saturating_mul(2u64.saturating_pow(level))
}

/// Upgrade levels, indexed by [`UpgradeKind::index`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Levels([u32; 3]);

impl Levels {
    pub fn get(&self, kind: UpgradeKind) -> u32 {
        self.0[kind.index()]
    }

    pub fn bump(&mut self, kind: UpgradeKind) {
        let slot = &mut self.0[kind.index()];
        *slot = slot.saturating_add(1);
    }

    pub fn set(&mut self, kind: UpgradeKind, level: u32) {
        self.0[kind.index()] = level;
    }
}

/// Re-entrancy gate for `click`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickPhase {
    Idle,
    /// Credit lands when `ticks_left` reaches zero.
    Pending { ticks_left: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskPhase {
    Idle,
    Running { ticks_left: u32 },
    Ready { claimed: bool },
}

/// Why an action did nothing.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("Not enough coins: need {cost}, have {balance}")]
    InsufficientFunds { cost: u64, balance: u64 },
    #[error("The task is not ready yet")]
    TaskNotReady,
    #[error("The task reward was already claimed")]
    AlreadyClaimed,
    #[error("A task is already in progress")]
    TaskInProgress,
    #[error("Still watching the previous ad")]
    Busy,
    #[error("No clicks left, wait for a refill")]
    QuotaExhausted,
}

impl Rejection {
    /// Rejections shown to the player as a notice. The rest are silent no-ops.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Rejection::InsufficientFunds { .. } | Rejection::TaskNotReady
        )
    }
}

/// Transient message, removed once `ticks_left` runs out.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub text: String,
    pub ticks_left: u32,
}

#[derive(Clone, Debug)]
pub struct LogEntry {
    pub text: String,
    pub is_important: bool,
}

pub struct ProgressionState {
    pub balance: u64,
    pub quota: u32,
    pub quota_cap: u32,
    pub levels: Levels,
    /// Current delay, derived from the speed level.
    pub click_delay_ticks: u32,
    pub click: ClickPhase,
    /// Ticks accumulated towards the next quota unit.
    pub regen_ticks: u32,
    pub task: TaskPhase,
    pub notice: Option<Notice>,
    /// Completed ad watches. Unlike the balance, purchases never lower it.
    pub ads_watched: u64,
    pub user: Option<UserInfo>,
    pub log: Vec<LogEntry>,
    /// Ticks of click feedback left for the view.
    pub click_flash: u32,
}

impl ProgressionState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            balance: 0,
            quota: tuning.quota_cap,
            quota_cap: tuning.quota_cap,
            levels: Levels::default(),
            click_delay_ticks: tuning.click_delay_ticks,
            click: ClickPhase::Idle,
            regen_ticks: 0,
            task: TaskPhase::Idle,
            notice: None,
            ads_watched: 0,
            user: None,
            log: vec![LogEntry {
                text: "Welcome! Tap to earn coins.".into(),
                is_important: true,
            }],
            click_flash: 0,
        }
    }

    /// Coins credited per completed click.
    pub fn multiplier(&self) -> u64 {
        2u64.saturating_pow(self.levels.get(UpgradeKind::Multiplier))
    }

    pub fn cost_of(&self, tuning: &Tuning, kind: UpgradeKind) -> u64 {
        upgrade_cost(tuning.base_cost(kind), self.levels.get(kind))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.click, ClickPhase::Pending { .. })
    }

    /// Recompute the quantities that follow from upgrade levels.
    pub fn recompute_derived(&mut self, tuning: &Tuning) {
        let capacity = self.levels.get(UpgradeKind::Capacity);
        self.quota_cap = tuning
            .quota_cap
            .saturating_add(tuning.capacity_step.saturating_mul(capacity));
        self.quota = self.quota.min(self.quota_cap);

        let speed = self.levels.get(UpgradeKind::Speed);
        self.click_delay_ticks = tuning
            .click_delay_ticks
            .saturating_sub(tuning.speed_step_ticks.saturating_mul(speed))
            .max(tuning.min_click_delay_ticks);
    }

    pub fn add_log(&mut self, text: &str, is_important: bool) {
        self.log.push(LogEntry {
            text: text.to_string(),
            is_important,
        });
        if self.log.len() > LOG_LIMIT {
            self.log.remove(0);
        }
    }

    pub fn show_notice(&mut self, text: String, ticks: u32) {
        self.notice = Some(Notice {
            text,
            ticks_left: ticks,
        });
    }
}
