/// Upper bound for any gain stage; cinema mode boosts the master past unity.
pub const MAX_GAIN: f32 = 1.5;

/// Gain that moves linearly to a new target over a short ramp so level changes
/// never step mid-waveform.
#[derive(Debug, Clone)]
pub struct GainRamp {
    sample_rate: u32,
    current: f32,
    target: f32,
    remaining_frames: usize,
}

impl GainRamp {
    pub fn new(sample_rate: u32, initial: f32) -> Self {
        let initial = initial.clamp(0.0, MAX_GAIN);
        Self {
            sample_rate: sample_rate.max(1),
            current: initial,
            target: initial,
            remaining_frames: 0,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_ramping(&self) -> bool {
        self.remaining_frames > 0
    }

    pub fn set_target(&mut self, target: f32, ramp_ms: u32) {
        let target = target.clamp(0.0, MAX_GAIN);
        if ramp_ms == 0 || (self.current - target).abs() <= f32::EPSILON {
            self.current = target;
            self.target = target;
            self.remaining_frames = 0;
            return;
        }

        let frames = (u64::from(self.sample_rate) * u64::from(ramp_ms)).div_ceil(1000).max(1);
        self.target = target;
        self.remaining_frames = frames as usize;
    }

    pub fn next_gain(&mut self) -> f32 {
        if self.remaining_frames == 0 {
            self.current = self.target;
            return self.current;
        }

        let remaining = self.remaining_frames as f32;
        self.current += (self.target - self.current) / remaining;
        self.remaining_frames -= 1;
        if self.remaining_frames == 0 {
            self.current = self.target;
        }
        self.current
    }

    /// Scale every channel of each frame in an interleaved block.
    pub fn apply(&mut self, block: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        if !self.is_ramping() && self.current <= 0.0 {
            block.fill(0.0);
            return;
        }
        if !self.is_ramping() && (self.current - 1.0).abs() < f32::EPSILON {
            return;
        }

        for frame in block.chunks_exact_mut(channels) {
            let gain = self.next_gain();
            for sample in frame {
                *sample *= gain;
            }
        }
    }

    /// Scale a single channel of each frame in an interleaved block.
    pub fn apply_channel(&mut self, block: &mut [f32], channels: usize, channel: usize) {
        let channels = channels.max(1);
        if channel >= channels {
            return;
        }
        for frame in block.chunks_exact_mut(channels) {
            frame[channel] *= self.next_gain();
        }
    }
}
