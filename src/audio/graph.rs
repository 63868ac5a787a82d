use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    error::AttachError,
    media::{MediaHandle, OutputMode},
};

use super::{
    chain::{ChainLevels, SignalChain},
    config::AudioChannelConfig,
    output::AudioOutput,
    source::RoutedSource,
    topology::Topology,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

pub const DEFAULT_RAMP_MS: u32 = 30;

/// Maps an `AudioChannelConfig` onto the live signal path between a media
/// source and the output device.
///
/// Every `configure` disconnects all edges and wires the path again from
/// scratch; the stage instances themselves persist.
pub struct AudioRoutingGraph {
    output: Box<dyn AudioOutput>,
    media: Option<Arc<dyn MediaHandle>>,
    chain: Option<Arc<Mutex<SignalChain>>>,
    config: AudioChannelConfig,
    ramp_ms: u32,
}

impl AudioRoutingGraph {
    pub fn new(output: Box<dyn AudioOutput>, ramp_ms: u32) -> Self {
        Self {
            output,
            media: None,
            chain: None,
            config: AudioChannelConfig::default(),
            ramp_ms,
        }
    }

    /// Bind to `media` once.
    ///
    /// If the source is already tapped by another graph this graph stays unbound and
    /// leaves the media element alone. Any other failure keeps the binding without a
    /// processed path, so later configures drive the element natively.
    pub fn attach(&mut self, media: Arc<dyn MediaHandle>) -> Result<(), AttachError> {
        if self.media.is_some() {
            return Err(AttachError::AlreadyAttached);
        }

        let result = self.open_processed_path(media.as_ref());
        if matches!(result, Err(AttachError::AlreadyTapped)) {
            log_warn!("'{}' is already routed by another graph", media.filename());
            return result;
        }
        if let Err(err) = &result {
            log_warn!("audio routing unavailable for '{}': {err}", media.filename());
        }

        self.media = Some(media);
        self.apply();
        result
    }

    fn open_processed_path(&mut self, media: &dyn MediaHandle) -> Result<(), AttachError> {
        let tap = media.open_audio_tap()?;
        let chain = Arc::new(Mutex::new(SignalChain::new(
            tap.sample_rate(),
            usize::from(tap.channels()),
        )));
        self.output.start(RoutedSource::new(tap, Arc::clone(&chain)))?;

        log_info!("audio routing graph attached to '{}'", media.filename());
        self.chain = Some(chain);
        Ok(())
    }

    /// Rebuild the signal path for `config`.
    pub fn configure(&mut self, config: AudioChannelConfig) {
        self.config = config;
        self.apply();
    }

    fn apply(&mut self) {
        let topology = Topology::plan(&self.config);
        log_debug!("rewiring audio graph: {} edges", topology.edge_count());

        if let Some(chain) = &self.chain {
            let mut chain = chain.lock().unwrap_or_else(PoisonError::into_inner);
            chain.disconnect_all();
            chain.connect(topology, &self.config, self.ramp_ms);
        }

        if let Some(media) = &self.media {
            media.set_output_mode(self.output_mode());
        }
    }

    fn output_mode(&self) -> OutputMode {
        if self.config.pure_native || self.chain.is_none() {
            OutputMode::Native {
                volume: self.config.volume.clamp(0.0, 1.0),
                muted: self.config.muted,
            }
        } else {
            OutputMode::Routed
        }
    }

    /// Tear the processed path down and hand output back to the media element.
    pub fn detach(&mut self) {
        if self.chain.take().is_some() {
            self.output.stop();
        }
        if let Some(media) = self.media.take() {
            media.set_output_mode(OutputMode::Native {
                volume: self.config.volume.clamp(0.0, 1.0),
                muted: self.config.muted,
            });
        }
    }

    pub fn config(&self) -> &AudioChannelConfig {
        &self.config
    }

    pub fn is_attached(&self) -> bool {
        self.media.is_some()
    }

    /// True while audio flows through the processed path.
    pub fn is_routed(&self) -> bool {
        self.chain.is_some() && !self.config.pure_native
    }

    pub fn topology(&self) -> Topology {
        self.chain
            .as_ref()
            .map(|chain| chain.lock().unwrap_or_else(PoisonError::into_inner).topology().clone())
            .unwrap_or_default()
    }

    pub fn levels(&self) -> Option<ChainLevels> {
        self.chain
            .as_ref()
            .map(|chain| chain.lock().unwrap_or_else(PoisonError::into_inner).levels())
    }
}

impl Drop for AudioRoutingGraph {
    fn drop(&mut self) {
        self.detach();
    }
}
