use serde::Serialize;

use super::config::{AudioChannelConfig, CHANNEL_COUNT};

/// Persistent stages of the routing graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StageId {
    Source,
    Splitter,
    ChannelGain(u8),
    Merger,
    Compressor,
    Delay,
    MasterGain,
    Destination,
}

/// The edges currently connecting the graph's stages, in signal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Topology {
    edges: Vec<(StageId, StageId)>,
}

impl Topology {
    /// Lay out the signal path for `config`.
    ///
    /// Pure-native has no edges at all, bypass is source straight into the master
    /// gain, and the full path fans out to one gain per channel before the
    /// optional compressor, the delay and the master gain.
    pub fn plan(config: &AudioChannelConfig) -> Self {
        let mut topology = Self::default();
        if config.pure_native {
            return topology;
        }

        if config.bypass {
            topology.connect(StageId::Source, StageId::MasterGain);
            topology.connect(StageId::MasterGain, StageId::Destination);
            return topology;
        }

        topology.connect(StageId::Source, StageId::Splitter);
        for channel in 0..CHANNEL_COUNT as u8 {
            topology.connect(StageId::Splitter, StageId::ChannelGain(channel));
        }
        for channel in 0..CHANNEL_COUNT as u8 {
            topology.connect(StageId::ChannelGain(channel), StageId::Merger);
        }

        let mut tail = StageId::Merger;
        if config.cinema_mode {
            topology.connect(tail, StageId::Compressor);
            tail = StageId::Compressor;
        }
        topology.connect(tail, StageId::Delay);
        topology.connect(StageId::Delay, StageId::MasterGain);
        topology.connect(StageId::MasterGain, StageId::Destination);
        topology
    }

    fn connect(&mut self, from: StageId, to: StageId) {
        if !self.edges.contains(&(from, to)) {
            self.edges.push((from, to));
        }
    }

    pub fn edges(&self) -> &[(StageId, StageId)] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Connected stages in the order the signal reaches them.
    pub fn route(&self) -> Vec<StageId> {
        let mut route = Vec::new();
        for (from, to) in &self.edges {
            for stage in [*from, *to] {
                if !route.contains(&stage) {
                    route.push(stage);
                }
            }
        }
        route
    }

    pub fn stage_count(&self) -> usize {
        self.route().len()
    }

    pub fn contains(&self, stage: StageId) -> bool {
        self.edges.iter().any(|(from, to)| *from == stage || *to == stage)
    }
}
