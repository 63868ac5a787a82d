use serde::Serialize;

use crate::models::SceneTag;

/// A provisional tag waiting for a rating or confirmation.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingTag {
    #[serde(rename = "type")]
    pub tag: SceneTag,
    pub start_time: f64,
    pub end_time: f64,
    pub ticks_remaining: u32,
}

/// Lifecycle of the in-flight tag. The resolved states are terminal: countdown
/// ticks and confirmations that arrive after resolution are ignored, and the next
/// trigger starts over from them exactly as it would from `Idle`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum TagState {
    Idle,
    Pending(PendingTag),
    #[serde(rename_all = "camelCase")]
    Committed { segment_id: String },
    Discarded,
}

impl Default for TagState {
    fn default() -> Self {
        TagState::Idle
    }
}

impl TagState {
    pub fn pending(&self) -> Option<&PendingTag> {
        match self {
            TagState::Pending(pending) => Some(pending),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TagState::Pending(_))
    }
}

/// Explicit in/out points set by the reviewer before triggering a tag.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Marks {
    pub mark_in: Option<f64>,
    pub mark_out: Option<f64>,
}

impl Marks {
    pub fn is_empty(&self) -> bool {
        self.mark_in.is_none() && self.mark_out.is_none()
    }

    /// Interval for a tag triggered at `current_time`.
    ///
    /// Without marks the tag ends now and starts at whichever is later: the end of
    /// the previous segment or `lookback_secs` ago. A lone mark pairs with the
    /// current time. The result is always ordered.
    pub fn resolve(&self, current_time: f64, last_end: Option<f64>, lookback_secs: f64) -> (f64, f64) {
        let (start, end) = match (self.mark_in, self.mark_out) {
            (None, None) => {
                let lookback_start = current_time - lookback_secs;
                let start = last_end.map_or(lookback_start, |end| end.max(lookback_start));
                (start.max(0.0), current_time)
            }
            (Some(mark_in), None) => (mark_in, current_time),
            (None, Some(mark_out)) => (current_time, mark_out),
            (Some(mark_in), Some(mark_out)) => (mark_in, mark_out),
        };

        if start <= end {
            (start, end)
        } else {
            (end, start)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_back_five_seconds_without_history() {
        assert_eq!(Marks::default().resolve(12.0, None, 5.0), (7.0, 12.0));
    }

    #[test]
    fn abuts_the_previous_segment() {
        assert_eq!(Marks::default().resolve(12.0, Some(9.0), 5.0), (9.0, 12.0));
        assert_eq!(Marks::default().resolve(12.0, Some(3.0), 5.0), (7.0, 12.0));
    }

    #[test]
    fn clamps_lookback_at_zero() {
        assert_eq!(Marks::default().resolve(2.0, None, 5.0), (0.0, 2.0));
    }

    #[test]
    fn pairs_single_mark_with_current_time_and_orders() {
        let only_in = Marks {
            mark_in: Some(20.0),
            mark_out: None,
        };
        assert_eq!(only_in.resolve(12.0, None, 5.0), (12.0, 20.0));

        let only_out = Marks {
            mark_in: None,
            mark_out: Some(30.0),
        };
        assert_eq!(only_out.resolve(12.0, Some(9.0), 5.0), (12.0, 30.0));

        let both = Marks {
            mark_in: Some(40.0),
            mark_out: Some(35.0),
        };
        assert_eq!(both.resolve(0.0, None, 5.0), (35.0, 40.0));
    }
}
