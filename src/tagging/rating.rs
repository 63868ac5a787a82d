use std::time::{Duration, Instant};

use crate::models::MAX_RATING;

pub const DEFAULT_RATING_IDLE_RESET: Duration = Duration::from_millis(1500);

/// Numeric keypad buffer for entering a 0–100 rating one digit at a time.
///
/// Digits accumulate into a number until it would exceed 100, at which point the
/// buffer restarts from the digit just pressed. After a quiet period the buffer
/// clears so the next digit starts a fresh number.
#[derive(Debug, Clone)]
pub struct RatingBuffer {
    value: Option<u32>,
    last_input: Option<Instant>,
    idle_reset: Duration,
}

impl Default for RatingBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_RATING_IDLE_RESET)
    }
}

impl RatingBuffer {
    pub fn new(idle_reset: Duration) -> Self {
        Self {
            value: None,
            last_input: None,
            idle_reset,
        }
    }

    /// Feed one digit and return the rating the buffer now spells.
    pub fn push_digit(&mut self, digit: u8, now: Instant) -> u8 {
        self.expire(now);

        let digit = u32::from(digit.min(9));
        let candidate = match self.value {
            Some(current) => current * 10 + digit,
            None => digit,
        };
        let value = if candidate > u32::from(MAX_RATING) {
            digit
        } else {
            candidate
        };

        self.value = Some(value);
        self.last_input = Some(now);
        value as u8
    }

    /// Clear the buffer if it has been idle for the reset period. Returns true if
    /// it was cleared.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.last_input {
            Some(last) if now.saturating_duration_since(last) >= self.idle_reset => {
                self.clear();
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.value = None;
        self.last_input = None;
    }

    pub fn value(&self) -> Option<u8> {
        self.value.map(|value| value as u8)
    }
}
