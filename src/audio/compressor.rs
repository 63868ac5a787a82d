/// Static parameters of the dynamics stage, modelled on the browser
/// `DynamicsCompressorNode` defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorSettings {
    pub threshold_db: f32,
    pub knee_db: f32,
    pub ratio: f32,
    pub attack_secs: f32,
    pub release_secs: f32,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            threshold_db: -24.0,
            knee_db: 30.0,
            ratio: 12.0,
            attack_secs: 0.003,
            release_secs: 0.25,
        }
    }
}

/// Feed-forward soft-knee compressor with a peak envelope linked across channels.
#[derive(Debug, Clone)]
pub struct Compressor {
    settings: CompressorSettings,
    attack_coeff: f32,
    release_coeff: f32,
    envelope: f32,
}

impl Compressor {
    pub fn new(sample_rate: u32, settings: CompressorSettings) -> Self {
        let sample_rate = sample_rate.max(1) as f32;
        let coeff = |secs: f32| {
            if secs <= 0.0 {
                0.0
            } else {
                (-1.0 / (secs * sample_rate)).exp()
            }
        };

        Self {
            attack_coeff: coeff(settings.attack_secs),
            release_coeff: coeff(settings.release_secs),
            settings,
            envelope: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    /// Gain change in dB for a detector level in dB (zero or negative).
    pub fn gain_change_db(&self, level_db: f32) -> f32 {
        let CompressorSettings {
            threshold_db,
            knee_db,
            ratio,
            ..
        } = self.settings;
        let slope = 1.0 / ratio.max(1.0) - 1.0;
        let over = level_db - threshold_db;

        if 2.0 * over < -knee_db {
            0.0
        } else if knee_db > 0.0 && 2.0 * over.abs() <= knee_db {
            slope * (over + knee_db / 2.0).powi(2) / (2.0 * knee_db)
        } else {
            slope * over
        }
    }

    pub fn process(&mut self, block: &mut [f32], channels: usize) {
        for frame in block.chunks_exact_mut(channels.max(1)) {
            let peak = frame.iter().fold(0.0_f32, |peak, sample| peak.max(sample.abs()));
            let coeff = if peak > self.envelope {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.envelope = coeff * self.envelope + (1.0 - coeff) * peak;

            let level_db = 20.0 * self.envelope.max(1e-6).log10();
            let gain = 10.0_f32.powf(self.gain_change_db(level_db) / 20.0);
            for sample in frame {
                *sample *= gain;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(compressor: &mut Compressor, amplitude: f32, frames: usize) -> Vec<f32> {
        let mut block: Vec<f32> = (0..frames)
            .flat_map(|i| {
                let sample = if i % 2 == 0 { amplitude } else { -amplitude };
                [sample, sample]
            })
            .collect();
        compressor.process(&mut block, 2);
        block
    }

    #[test]
    fn leaves_quiet_material_alone() {
        let mut compressor = Compressor::new(48_000, CompressorSettings::default());
        let out = run(&mut compressor, 0.01, 4800);
        assert!((out.last().copied().unwrap_or_default().abs() - 0.01).abs() < 1e-4);
    }

    #[test]
    fn pulls_loud_material_down() {
        let mut compressor = Compressor::new(48_000, CompressorSettings::default());
        let out = run(&mut compressor, 0.9, 48_000);
        let tail_peak = out[out.len() - 200..]
            .iter()
            .fold(0.0_f32, |peak, sample| peak.max(sample.abs()));
        assert!(tail_peak < 0.2, "tail peak {tail_peak}");
    }

    #[test]
    fn knee_is_continuous() {
        let compressor = Compressor::new(48_000, CompressorSettings::default());
        let below = compressor.gain_change_db(-39.0 - 1e-3);
        let above = compressor.gain_change_db(-39.0 + 1e-3);
        assert!((below - above).abs() < 1e-3);
        assert_eq!(compressor.gain_change_db(-60.0), 0.0);
    }
}
