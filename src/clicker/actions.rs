//! Semantic action IDs for click targets.
//!
//! Registered during render and dispatched via `InputEvent::Click`.

// ── Core actions ────────────────────────────────────────────────
pub const CLICK: u16 = 0;
pub const RESTART: u16 = 1;

// ── Bonus task ──────────────────────────────────────────────────
pub const START_TASK: u16 = 10;
pub const CHECK_TASK: u16 = 11;

// ── Upgrade purchase (base + UpgradeKind::index) ────────────────
pub const BUY_UPGRADE_BASE: u16 = 100;
