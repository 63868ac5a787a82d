use serde::{Deserialize, Serialize};

pub const HEATMAP_BUCKETS: usize = 100;

/// Play-through counts bucketed by normalized playback position.
///
/// Counts only ever grow; consumers normalize them for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapAccumulator {
    buckets: Vec<u32>,
}

impl Default for HeatmapAccumulator {
    fn default() -> Self {
        Self {
            buckets: vec![0; HEATMAP_BUCKETS],
        }
    }
}

impl HeatmapAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a persisted array, padding or truncating it to 100 buckets.
    pub fn from_snapshot(snapshot: &[u32]) -> Self {
        let mut buckets = snapshot.to_vec();
        buckets.resize(HEATMAP_BUCKETS, 0);
        Self { buckets }
    }

    /// Count one tick at `position_fraction` (0..=1) if playback is running.
    /// Returns the bucket that was incremented.
    pub fn tick(&mut self, position_fraction: f64, is_playing: bool) -> Option<usize> {
        if !is_playing || !position_fraction.is_finite() {
            return None;
        }

        let fraction = position_fraction.clamp(0.0, 1.0);
        let index = ((fraction * HEATMAP_BUCKETS as f64).floor() as usize).min(HEATMAP_BUCKETS - 1);
        self.buckets[index] = self.buckets[index].saturating_add(1);
        Some(index)
    }

    pub fn snapshot(&self) -> Vec<u32> {
        self.buckets.clone()
    }

    pub fn bucket(&self, index: usize) -> u32 {
        self.buckets.get(index).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|count| u64::from(*count)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_by_position_and_clamps_the_end() {
        let mut heatmap = HeatmapAccumulator::new();
        assert_eq!(heatmap.tick(0.0, true), Some(0));
        assert_eq!(heatmap.tick(0.257, true), Some(25));
        assert_eq!(heatmap.tick(1.0, true), Some(99));
        assert_eq!(heatmap.tick(1.7, true), Some(99));

        assert_eq!(heatmap.bucket(99), 2);
        assert_eq!(heatmap.total(), 4);
    }

    #[test]
    fn paused_ticks_change_nothing() {
        let mut heatmap = HeatmapAccumulator::new();
        heatmap.tick(0.5, true);
        let before = heatmap.snapshot();

        assert_eq!(heatmap.tick(0.5, false), None);
        assert_eq!(heatmap.tick(f64::NAN, true), None);
        assert_eq!(heatmap.snapshot(), before);
    }

    #[test]
    fn counts_never_decrease() {
        let mut heatmap = HeatmapAccumulator::new();
        let mut previous = heatmap.snapshot();
        for step in 0..1000 {
            let fraction = (step % 137) as f64 / 137.0;
            heatmap.tick(fraction, step % 3 != 0);
            let current = heatmap.snapshot();
            assert!(current.iter().zip(&previous).all(|(now, before)| now >= before));
            previous = current;
        }
    }

    #[test]
    fn resumes_from_short_snapshot() {
        let heatmap = HeatmapAccumulator::from_snapshot(&[3, 1]);
        assert_eq!(heatmap.snapshot().len(), HEATMAP_BUCKETS);
        assert_eq!(heatmap.bucket(0), 3);
        assert_eq!(heatmap.bucket(50), 0);
    }
}
