//! Reconfigurable audio routing between a media tap and the output device.

pub mod chain;
pub mod compressor;
pub mod config;
pub mod delay;
pub mod gain;
pub mod graph;
pub mod output;
pub mod source;
pub mod topology;

pub use chain::{ChainLevels, SignalChain};
pub use config::{AudioChannelConfig, ChannelPosition, CHANNEL_COUNT};
pub use graph::{AudioRoutingGraph, DEFAULT_RAMP_MS};
pub use output::{AudioOutput, RodioOutput};
pub use source::RoutedSource;
pub use topology::{StageId, Topology};
