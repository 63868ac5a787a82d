/// Longest delay the stage can realize.
pub const MAX_DELAY_SECS: f64 = 5.0;

/// Interleaved ring-buffer delay shared by all channels.
#[derive(Debug, Clone)]
pub struct DelayLine {
    sample_rate: u32,
    channels: usize,
    buffer: Vec<f32>,
    capacity_frames: usize,
    write_frame: usize,
    delay_frames: usize,
}

impl DelayLine {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        let sample_rate = sample_rate.max(1);
        let channels = channels.max(1);
        let capacity_frames = (MAX_DELAY_SECS * f64::from(sample_rate)).ceil() as usize + 1;

        Self {
            sample_rate,
            channels,
            buffer: vec![0.0; capacity_frames * channels],
            capacity_frames,
            write_frame: 0,
            delay_frames: 0,
        }
    }

    pub fn set_delay_secs(&mut self, secs: f64) {
        let secs = if secs.is_finite() {
            secs.clamp(0.0, MAX_DELAY_SECS)
        } else {
            0.0
        };
        let frames = (secs * f64::from(self.sample_rate)).round() as usize;
        self.delay_frames = frames.min(self.capacity_frames - 1);
    }

    pub fn delay_secs(&self) -> f64 {
        self.delay_frames as f64 / f64::from(self.sample_rate)
    }

    pub fn process(&mut self, block: &mut [f32]) {
        let channels = self.channels;
        for frame in block.chunks_exact_mut(channels) {
            let write = self.write_frame * channels;
            self.buffer[write..write + channels].copy_from_slice(frame);

            let read_frame =
                (self.write_frame + self.capacity_frames - self.delay_frames) % self.capacity_frames;
            let read = read_frame * channels;
            frame.copy_from_slice(&self.buffer[read..read + channels]);

            self.write_frame = (self.write_frame + 1) % self.capacity_frames;
        }
    }
}
