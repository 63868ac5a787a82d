use std::time::Duration;

use crate::models::NEUTRAL_RATING;

use super::rating::DEFAULT_RATING_IDLE_RESET;

/// Tunables for the pending-tag state machine.
#[derive(Debug, Clone)]
pub struct TaggingConfig {
    /// How far back an unmarked tag reaches when nothing precedes it.
    pub lookback_secs: f64,

    /// Countdown ticks before a pending tag commits on its own.
    pub countdown_ticks: u32,

    /// Rating a fresh tag starts with.
    pub default_rating: u8,

    /// Keypad buffer clears after this much inactivity.
    pub rating_idle_reset: Duration,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            lookback_secs: 5.0,
            countdown_ticks: 15,
            default_rating: NEUTRAL_RATING,
            rating_idle_reset: DEFAULT_RATING_IDLE_RESET,
        }
    }
}
