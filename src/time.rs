//! Frame timestamps → fixed simulation ticks.
//!
//! `draw_web()` fires at the browser's frame rate with a variable delta.
//! `Clock` turns that into whole ticks (10 per second) so every countdown in
//! the progression state advances in discrete, reproducible steps.

/// Simulation rate shared by the clock and every duration in `Tuning`.
pub const TICKS_PER_SEC: u32 = 10;

/// Longest gap a single frame may account for. A tab that was hidden for a
/// minute resumes with half a second of progress, not sixty.
const MAX_FRAME_MS: f64 = 500.0;

pub struct Clock {
    ms_per_tick: f64,
    /// Milliseconds seen but not yet turned into ticks.
    carry_ms: f64,
    last_ms: Option<f64>,
}

impl Clock {
    pub fn new(ticks_per_sec: u32) -> Self {
        Self {
            ms_per_tick: 1000.0 / ticks_per_sec.max(1) as f64,
            carry_ms: 0.0,
            last_ms: None,
        }
    }

    /// Feed the current `performance.now()` value and get back how many
    /// ticks have to be simulated for this frame.
    pub fn advance(&mut self, now_ms: f64) -> u32 {
        let delta = self
            .last_ms
            .map(|prev| (now_ms - prev).clamp(0.0, MAX_FRAME_MS))
            .unwrap_or(0.0);
        self.last_ms = Some(now_ms);

        self.carry_ms += delta;
        let ticks = (self.carry_ms / self.ms_per_tick) as u32;
        self.carry_ms -= ticks as f64 * self.ms_per_tick;
        ticks
    }

    /// Forget the last timestamp, e.g. after the session was restarted.
    pub fn reset(&mut self) {
        self.carry_ms = 0.0;
        self.last_ms = None;
    }
}

/// Human-readable duration for a tick count, e.g. `15s` or `0.2s`.
pub fn ticks_label(ticks: u32) -> String {
    if ticks % TICKS_PER_SEC == 0 {
        format!("{}s", ticks / TICKS_PER_SEC)
    } else {
        format!("{:.1}s", ticks as f64 / TICKS_PER_SEC as f64)
    }
}
