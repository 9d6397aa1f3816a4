//! Multi-press pattern classification
//!
//! Contact inputs report raw open/close transitions; the interesting
//! events are the press patterns behind them. Classification runs on a
//! release transition against the item's 4-slot change history: a double
//! push shows up as four edges inside the double-push window, a long
//! push as a wide gap between the final press and release.

/// Press timing thresholds (milliseconds)
#[derive(Debug, Clone, Copy)]
pub struct PushTiming {
    pub short_push_timeout: u64,
    pub long_push_timeout: u64,
    pub double_push_timeout: u64,
}

impl Default for PushTiming {
    fn default() -> Self {
        Self {
            short_push_timeout: 300,
            long_push_timeout: 500,
            double_push_timeout: 700,
        }
    }
}

/// Classified press pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushEvent {
    ShortPush,
    LongPush,
    DoublePush,
}

impl PushEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushEvent::ShortPush => "ShortPush",
            PushEvent::LongPush => "LongPush",
            PushEvent::DoublePush => "DoublePush",
        }
    }
}

/// Classify the press pattern ending at the newest history slot.
///
/// `history` is oldest→newest. Returns `None` while the history is still
/// in its init phase (fewer than two real transitions recorded).
pub fn classify_push(history: &[u64; 4], timing: &PushTiming) -> Option<PushEvent> {
    let double_press_time = history[3].saturating_sub(history[0]);
    let last_press_time = history[3].saturating_sub(history[2]);

    if last_press_time == 0 {
        // init phase: not enough edges seen yet
        return None;
    }
    if double_press_time < timing.double_push_timeout && double_press_time > 0 {
        Some(PushEvent::DoublePush)
    } else if last_press_time > timing.long_push_timeout {
        Some(PushEvent::LongPush)
    } else {
        Some(PushEvent::ShortPush)
    }
}
