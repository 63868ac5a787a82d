use serde::{Deserialize, Serialize};

pub const CHANNEL_COUNT: usize = 6;

/// Master gain multiplier applied while cinema mode is on.
pub const CINEMA_BOOST: f32 = 1.5;

/// Speaker positions of the six routed channels, in interleaved order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelPosition {
    FrontLeft,
    FrontRight,
    Center,
    Lfe,
    SurroundLeft,
    SurroundRight,
}

impl ChannelPosition {
    pub const ALL: [ChannelPosition; CHANNEL_COUNT] = [
        ChannelPosition::FrontLeft,
        ChannelPosition::FrontRight,
        ChannelPosition::Center,
        ChannelPosition::Lfe,
        ChannelPosition::SurroundLeft,
        ChannelPosition::SurroundRight,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ChannelPosition::FrontLeft => "L",
            ChannelPosition::FrontRight => "R",
            ChannelPosition::Center => "C",
            ChannelPosition::Lfe => "LFE",
            ChannelPosition::SurroundLeft => "SL",
            ChannelPosition::SurroundRight => "SR",
        }
    }
}

/// Everything the routing graph needs to lay out the signal path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioChannelConfig {
    pub channel_enabled: [bool; CHANNEL_COUNT],
    pub cinema_mode: bool,
    pub bypass: bool,
    pub pure_native: bool,
    pub audio_delay_secs: f64,
    pub volume: f32,
    pub muted: bool,
}

impl Default for AudioChannelConfig {
    fn default() -> Self {
        Self {
            channel_enabled: [true; CHANNEL_COUNT],
            cinema_mode: false,
            bypass: false,
            pure_native: false,
            audio_delay_secs: 0.0,
            volume: 1.0,
            muted: false,
        }
    }
}

impl AudioChannelConfig {
    pub fn master_gain(&self) -> f32 {
        if self.muted {
            return 0.0;
        }
        let boost = if self.cinema_mode { CINEMA_BOOST } else { 1.0 };
        self.volume.clamp(0.0, 1.0) * boost
    }

    pub fn channel_gain(&self, channel: usize) -> f32 {
        match self.channel_enabled.get(channel) {
            Some(true) => 1.0,
            _ => 0.0,
        }
    }

    pub fn delay_secs(&self) -> f64 {
        if self.audio_delay_secs.is_finite() {
            self.audio_delay_secs.max(0.0)
        } else {
            0.0
        }
    }

    pub fn toggle_channel(&mut self, channel: usize) -> bool {
        match self.channel_enabled.get_mut(channel) {
            Some(enabled) => {
                *enabled = !*enabled;
                true
            }
            None => false,
        }
    }
}
