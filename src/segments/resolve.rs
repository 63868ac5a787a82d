use crate::models::Segment;

/// How an existing segment relates to an incoming interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    /// No shared time.
    Outside,
    /// Lies entirely inside the incoming interval.
    Covered,
    /// Begins before the incoming interval and ends inside it.
    StraddlesStart,
    /// Begins inside the incoming interval and ends after it.
    StraddlesEnd,
    /// Strictly contains the incoming interval on both sides.
    Contains,
}

pub fn classify(existing: &Segment, start: f64, end: f64) -> Overlap {
    let (s, e) = (existing.start_time, existing.end_time);

    if e <= start || s >= end {
        Overlap::Outside
    } else if s >= start && e <= end {
        Overlap::Covered
    } else if s < start && e > end {
        Overlap::Contains
    } else if s < start {
        Overlap::StraddlesStart
    } else {
        Overlap::StraddlesEnd
    }
}

/// Cut `existing` so that it no longer intersects `[start, end)`.
///
/// Returns the surviving pieces, left to right. A split keeps the original id on
/// the left piece and mints a fresh id for the right one.
pub fn carve(mut existing: Segment, start: f64, end: f64) -> Vec<Segment> {
    match classify(&existing, start, end) {
        Overlap::Outside => vec![existing],
        Overlap::Covered => Vec::new(),
        Overlap::StraddlesStart => {
            existing.end_time = start;
            vec![existing]
        }
        Overlap::StraddlesEnd => {
            existing.start_time = end;
            vec![existing]
        }
        Overlap::Contains => {
            let mut right = existing.clone();
            right.id = uuid::Uuid::new_v4().to_string();
            right.start_time = end;
            existing.end_time = start;
            vec![existing, right]
        }
    }
}
