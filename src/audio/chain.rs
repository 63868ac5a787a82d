use serde::Serialize;

use super::{
    compressor::{Compressor, CompressorSettings},
    config::{AudioChannelConfig, CHANNEL_COUNT},
    delay::DelayLine,
    gain::GainRamp,
    topology::{StageId, Topology},
};

/// Targets the chain is currently steering toward.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainLevels {
    pub channel_gains: [f32; CHANNEL_COUNT],
    pub master_gain: f32,
    pub delay_secs: f64,
}

/// The graph's stage instances plus the edges that currently connect them.
///
/// Stages outlive rewiring so gain ramps continue smoothly from wherever they
/// were; only the topology is thrown away and rebuilt.
#[derive(Debug)]
pub struct SignalChain {
    channels: usize,
    channel_gains: Vec<GainRamp>,
    compressor: Compressor,
    delay: DelayLine,
    master: GainRamp,
    topology: Topology,
    route: Vec<StageId>,
}

impl SignalChain {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        let channels = channels.max(1);
        Self {
            channels,
            channel_gains: (0..CHANNEL_COUNT).map(|_| GainRamp::new(sample_rate, 1.0)).collect(),
            compressor: Compressor::new(sample_rate, CompressorSettings::default()),
            delay: DelayLine::new(sample_rate, channels),
            master: GainRamp::new(sample_rate, 1.0),
            topology: Topology::default(),
            route: Vec::new(),
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Remove every edge. Stage state is kept.
    pub fn disconnect_all(&mut self) {
        self.topology = Topology::default();
        self.route.clear();
    }

    /// Wire `topology` and steer every stage toward the levels in `config`.
    pub fn connect(&mut self, topology: Topology, config: &AudioChannelConfig, ramp_ms: u32) {
        for (channel, gain) in self.channel_gains.iter_mut().enumerate() {
            gain.set_target(config.channel_gain(channel), ramp_ms);
        }
        self.master.set_target(config.master_gain(), ramp_ms);
        self.delay.set_delay_secs(config.delay_secs());
        if !topology.contains(StageId::Compressor) {
            self.compressor.reset();
        }

        self.route = topology.route();
        self.topology = topology;
    }

    pub fn levels(&self) -> ChainLevels {
        let mut channel_gains = [0.0; CHANNEL_COUNT];
        for (slot, gain) in channel_gains.iter_mut().zip(&self.channel_gains) {
            *slot = gain.target();
        }
        ChainLevels {
            channel_gains,
            master_gain: self.master.target(),
            delay_secs: self.delay.delay_secs(),
        }
    }

    /// Run one interleaved block through the connected stages. With nothing
    /// connected the block is silenced; the media element is playing natively.
    pub fn process(&mut self, block: &mut [f32]) {
        if self.route.is_empty() {
            block.fill(0.0);
            return;
        }

        let channels = self.channels;
        for stage in &self.route {
            match *stage {
                StageId::ChannelGain(channel) => {
                    let channel = usize::from(channel);
                    if let Some(gain) = self.channel_gains.get_mut(channel) {
                        gain.apply_channel(block, channels, channel);
                    }
                }
                StageId::Compressor => self.compressor.process(block, channels),
                StageId::Delay => self.delay.process(block),
                StageId::MasterGain => self.master.apply(block, channels),
                StageId::Source | StageId::Splitter | StageId::Merger | StageId::Destination => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wired(config: &AudioChannelConfig) -> SignalChain {
        let mut chain = SignalChain::new(1000, 2);
        chain.connect(Topology::plan(config), config, 0);
        chain
    }

    #[test]
    fn disabled_channel_is_silenced() {
        let mut config = AudioChannelConfig::default();
        config.toggle_channel(1);
        let mut chain = wired(&config);

        let mut block = vec![0.5, 0.5, 0.5, 0.5];
        chain.process(&mut block);
        assert_eq!(block, vec![0.5, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn bypass_ignores_channel_mutes() {
        let mut config = AudioChannelConfig {
            bypass: true,
            volume: 0.5,
            ..AudioChannelConfig::default()
        };
        config.toggle_channel(0);
        let mut chain = wired(&config);

        let mut block = vec![1.0, 1.0];
        chain.process(&mut block);
        assert_eq!(block, vec![0.5, 0.5]);
    }

    #[test]
    fn mute_ramps_down_instead_of_stepping() {
        let config = AudioChannelConfig::default();
        let mut chain = wired(&config);
        let muted = AudioChannelConfig {
            muted: true,
            ..config
        };
        chain.disconnect_all();
        chain.connect(Topology::plan(&muted), &muted, 4);

        let mut block = vec![1.0; 8];
        chain.process(&mut block);
        assert!((block[0] - 0.75).abs() < 1e-6);
        assert!(block[6].abs() < 1e-6);
        assert_eq!(chain.levels().master_gain, 0.0);
    }

    #[test]
    fn unconnected_chain_outputs_silence() {
        let mut chain = wired(&AudioChannelConfig::default());
        chain.disconnect_all();
        let mut block = vec![0.3; 4];
        chain.process(&mut block);
        assert_eq!(block, vec![0.0; 4]);
    }
}
