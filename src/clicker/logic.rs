//! Progression reducer: pure functions over `ProgressionState`, no I/O.
//!
//! Every entry point returns the [`Effect`]s the host has to carry out
//! (storage writes, backend reports). Rejected actions leave the state
//! untouched apart from an optional notice.

use crate::net::UserInfo;

use super::state::{ClickPhase, ProgressionState, Rejection, TaskPhase, UpgradeKind};
use super::tuning::Tuning;

/// Ticks the view highlights the button after a credit.
const CLICK_FLASH_TICKS: u32 = 3;

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Click,
    Purchase(UpgradeKind),
    StartTask,
    CheckTask,
    Tick(u32),
    UserInfoLoaded(UserInfo),
    /// The owning session goes away: drop every running timer.
    Teardown,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Write the balance to durable storage.
    PersistBalance(u64),
    /// Write the number of completed ads (variants with an ad-count key).
    PersistAdCount(u64),
    /// Write quota, cap and levels (only emitted with `persist_progress`).
    PersistProgress,
    /// Tell the backend the new ad count.
    ReportAdCount(u64),
}

/// Run one action. User-facing rejections become a notice.
pub fn apply(state: &mut ProgressionState, tuning: &Tuning, action: Action) -> Vec<Effect> {
    let result = match action {
        Action::Click => click(state, tuning),
        Action::Purchase(kind) => purchase(state, tuning, kind),
        Action::StartTask => start_task(state, tuning).map(|()| Vec::new()),
        Action::CheckTask => check_task(state, tuning),
        Action::Tick(n) => Ok(tick(state, tuning, n)),
        Action::UserInfoLoaded(info) => {
            user_info_loaded(state, info);
            Ok(Vec::new())
        }
        Action::Teardown => {
            teardown(state);
            Ok(Vec::new())
        }
    };
    match result {
        Ok(effects) => effects,
        Err(rejection) => {
            if rejection.is_user_facing() {
                state.show_notice(rejection.to_string(), tuning.notice_ticks);
            }
            Vec::new()
        }
    }
}

/// Start a click. The credit lands after the current click delay; with a
/// zero delay it lands immediately.
pub fn click(state: &mut ProgressionState, tuning: &Tuning) -> Result<Vec<Effect>, Rejection> {
    if state.is_pending() {
        return Err(Rejection::Busy);
    }
    if state.quota == 0 {
        return Err(Rejection::QuotaExhausted);
    }
    if state.click_delay_ticks == 0 {
        return Ok(complete_click(state, tuning));
    }
    state.click = ClickPhase::Pending {
        ticks_left: state.click_delay_ticks,
    };
    Ok(Vec::new())
}

/// Quota −1, balance +multiplier and one more ad watched, together.
fn complete_click(state: &mut ProgressionState, tuning: &Tuning) -> Vec<Effect> {
    state.click = ClickPhase::Idle;
    if state.quota == 0 {
        return Vec::new();
    }
    state.quota -= 1;
    state.balance = state.balance.saturating_add(state.multiplier());
    state.ads_watched = state.ads_watched.saturating_add(1);
    state.click_flash = CLICK_FLASH_TICKS;

    let mut effects = vec![Effect::PersistBalance(state.balance)];
    if tuning.ad_count_key.is_some() {
        effects.push(Effect::PersistAdCount(state.ads_watched));
    }
    if tuning.remote.is_some() {
        effects.push(Effect::ReportAdCount(state.ads_watched));
    }
    if tuning.persist_progress {
        effects.push(Effect::PersistProgress);
    }
    effects
}

pub fn purchase(
    state: &mut ProgressionState,
    tuning: &Tuning,
    kind: UpgradeKind,
) -> Result<Vec<Effect>, Rejection> {
    let cost = state.cost_of(tuning, kind);
    if state.balance < cost {
        return Err(Rejection::InsufficientFunds {
            cost,
            balance: state.balance,
        });
    }

    state.balance -= cost;
    state.levels.bump(kind);
    state.recompute_derived(tuning);

    let level = state.levels.get(kind);
    let detail = match kind {
        UpgradeKind::Multiplier => format!("x{} per click", state.multiplier()),
        UpgradeKind::Capacity => {
            // New headroom arrives filled.
            state.quota = state
                .quota
                .saturating_add(tuning.capacity_step)
                .min(state.quota_cap);
            format!("cap {}", state.quota_cap)
        }
        UpgradeKind::Speed => format!(
            "delay {}",
            crate::time::ticks_label(state.click_delay_ticks)
        ),
    };
    state.add_log(&format!("✦ {} Lv{} ({})", kind.name(), level, detail), true);

    let mut effects = vec![Effect::PersistBalance(state.balance)];
    if tuning.persist_progress {
        effects.push(Effect::PersistProgress);
    }
    Ok(effects)
}

pub fn start_task(state: &mut ProgressionState, tuning: &Tuning) -> Result<(), Rejection> {
    match state.task {
        TaskPhase::Running { .. } | TaskPhase::Ready { claimed: false } => {
            Err(Rejection::TaskInProgress)
        }
        TaskPhase::Idle | TaskPhase::Ready { claimed: true } => {
            state.task = TaskPhase::Running {
                ticks_left: tuning.task_duration_ticks,
            };
            state.add_log(
                &format!(
                    "Task started, come back in {}",
                    crate::time::ticks_label(tuning.task_duration_ticks)
                ),
                false,
            );
            Ok(())
        }
    }
}

/// Claim the task reward. Only the first check after expiry pays.
pub fn check_task(
    state: &mut ProgressionState,
    tuning: &Tuning,
) -> Result<Vec<Effect>, Rejection> {
    match state.task {
        TaskPhase::Idle | TaskPhase::Running { .. } => Err(Rejection::TaskNotReady),
        TaskPhase::Ready { claimed: true } => Err(Rejection::AlreadyClaimed),
        TaskPhase::Ready { claimed: false } => {
            state.task = TaskPhase::Ready { claimed: true };
            state.balance = state.balance.saturating_add(tuning.task_reward);
            state.add_log(&format!("★ Task reward +{}", tuning.task_reward), true);
            Ok(vec![Effect::PersistBalance(state.balance)])
        }
    }
}

/// Advance every countdown by `delta_ticks`, one tick at a time so a long
/// frame behaves exactly like many short ones.
pub fn tick(state: &mut ProgressionState, tuning: &Tuning, delta_ticks: u32) -> Vec<Effect> {
    let mut effects = Vec::new();
    let mut regenerated = false;
    for _ in 0..delta_ticks {
        tick_click(state, tuning, &mut effects);
        regenerated |= tick_regen(state, tuning);
        tick_task(state);
        tick_notice(state);
        state.click_flash = state.click_flash.saturating_sub(1);
    }
    if regenerated && tuning.persist_progress && !effects.contains(&Effect::PersistProgress) {
        effects.push(Effect::PersistProgress);
    }
    effects
}

fn tick_click(state: &mut ProgressionState, tuning: &Tuning, effects: &mut Vec<Effect>) {
    if let ClickPhase::Pending { ticks_left } = state.click {
        let left = ticks_left.saturating_sub(1);
        if left == 0 {
            effects.extend(complete_click(state, tuning));
        } else {
            state.click = ClickPhase::Pending { ticks_left: left };
        }
    }
}

/// +1 quota per regen interval while below cap. The accumulator only runs
/// below cap, so a refill always takes a full interval.
fn tick_regen(state: &mut ProgressionState, tuning: &Tuning) -> bool {
    if state.quota >= state.quota_cap {
        state.regen_ticks = 0;
        return false;
    }
    state.regen_ticks += 1;
    if state.regen_ticks < tuning.regen_interval_ticks {
        return false;
    }
    state.regen_ticks = 0;
    state.quota += 1;
    true
}

fn tick_task(state: &mut ProgressionState) {
    if let TaskPhase::Running { ticks_left } = state.task {
        let left = ticks_left.saturating_sub(1);
        if left == 0 {
            state.task = TaskPhase::Ready { claimed: false };
            state.add_log("Task complete! Claim your reward.", true);
        } else {
            state.task = TaskPhase::Running { ticks_left: left };
        }
    }
}

fn tick_notice(state: &mut ProgressionState) {
    if let Some(notice) = &mut state.notice {
        notice.ticks_left = notice.ticks_left.saturating_sub(1);
        if notice.ticks_left == 0 {
            state.notice = None;
        }
    }
}

fn user_info_loaded(state: &mut ProgressionState, info: UserInfo) {
    if let Some(name) = info.display_name() {
        state.add_log(&format!("Signed in as {name}"), false);
    }
    state.user = Some(info);
}

/// Cancel the pending click without crediting it and stop every countdown.
pub fn teardown(state: &mut ProgressionState) {
    state.click = ClickPhase::Idle;
    state.regen_ticks = 0;
    if let TaskPhase::Running { .. } = state.task {
        state.task = TaskPhase::Idle;
    }
    state.notice = None;
    state.click_flash = 0;
}

/// Format a number with commas (e.g. 1234567 → "1,234,567").
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
