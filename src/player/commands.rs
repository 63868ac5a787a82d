use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::{
    audio::{AudioChannelConfig, CHANNEL_COUNT},
    models::SceneTag,
    sync::SyncOffsets,
    tagging::{CommitOutcome, Marks, TriggerOutcome},
};

use super::session::PlayerSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
}

/// A key press as delivered by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    pub key: Key,
    #[serde(default)]
    pub alt: bool,
}

impl KeyInput {
    pub fn plain(key: Key) -> Self {
        Self { key, alt: false }
    }

    pub fn alt(key: Key) -> Self {
        Self { key, alt: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PlayerCommand {
    TriggerTag { tag: SceneTag },
    RatingDigit { digit: u8 },
    Commit,
    Discard,
    MarkIn,
    MarkOut,
    NudgeSubtitle { later: bool },
    NudgeAudio { later: bool },
    ResetOffsets,
    ToggleChannel { channel: usize },
    ToggleCinema,
    ToggleBypass,
    TogglePureNative,
    ToggleMute,
}

impl PlayerCommand {
    /// Keyboard map. Alt+digit toggles a channel, a bare digit feeds the rating.
    pub fn from_key(input: KeyInput) -> Option<Self> {
        let ch = match input.key {
            Key::Enter => return Some(PlayerCommand::Commit),
            Key::Escape => return Some(PlayerCommand::Discard),
            Key::Backspace => return Some(PlayerCommand::ResetOffsets),
            Key::Char(ch) => ch.to_ascii_lowercase(),
        };

        if input.alt {
            return match ch {
                '1'..='9' => {
                    let channel = ch.to_digit(10)? as usize - 1;
                    (channel < CHANNEL_COUNT).then_some(PlayerCommand::ToggleChannel { channel })
                }
                'c' => Some(PlayerCommand::ToggleCinema),
                'b' => Some(PlayerCommand::ToggleBypass),
                'n' => Some(PlayerCommand::TogglePureNative),
                'm' => Some(PlayerCommand::ToggleMute),
                _ => None,
            };
        }

        match ch {
            '0'..='9' => ch
                .to_digit(10)
                .map(|digit| PlayerCommand::RatingDigit { digit: digit as u8 }),
            '[' => Some(PlayerCommand::MarkIn),
            ']' => Some(PlayerCommand::MarkOut),
            ',' => Some(PlayerCommand::NudgeSubtitle { later: false }),
            '.' => Some(PlayerCommand::NudgeSubtitle { later: true }),
            ';' => Some(PlayerCommand::NudgeAudio { later: false }),
            '\'' => Some(PlayerCommand::NudgeAudio { later: true }),
            'm' => Some(PlayerCommand::ToggleMute),
            other => SceneTag::from_hotkey(other).map(|tag| PlayerCommand::TriggerTag { tag }),
        }
    }
}

/// What a dispatched command did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CommandOutcome {
    Triggered { outcome: Option<TriggerOutcome> },
    Rated { rating: u8 },
    Committed { outcome: Option<CommitOutcome> },
    Discarded { discarded: bool },
    Marked(Marks),
    Offsets(SyncOffsets),
    Audio(AudioChannelConfig),
}

impl PlayerSession {
    pub fn dispatch(&mut self, command: PlayerCommand, now: Instant) -> CommandOutcome {
        match command {
            PlayerCommand::TriggerTag { tag } => CommandOutcome::Triggered {
                outcome: self.trigger_tag(tag),
            },
            PlayerCommand::RatingDigit { digit } => CommandOutcome::Rated {
                rating: self.press_digit(digit, now),
            },
            PlayerCommand::Commit => CommandOutcome::Committed {
                outcome: self.commit_pending(),
            },
            PlayerCommand::Discard => CommandOutcome::Discarded {
                discarded: self.discard_pending(),
            },
            PlayerCommand::MarkIn => CommandOutcome::Marked(self.set_mark_in()),
            PlayerCommand::MarkOut => CommandOutcome::Marked(self.set_mark_out()),
            PlayerCommand::NudgeSubtitle { later } => {
                self.nudge_subtitle_offset(later);
                CommandOutcome::Offsets(self.offsets())
            }
            PlayerCommand::NudgeAudio { later } => {
                self.nudge_audio_offset(later);
                CommandOutcome::Offsets(self.offsets())
            }
            PlayerCommand::ResetOffsets => {
                self.reset_offsets();
                CommandOutcome::Offsets(self.offsets())
            }
            PlayerCommand::ToggleChannel { channel } => {
                self.toggle_channel(channel);
                CommandOutcome::Audio(self.audio_config().clone())
            }
            PlayerCommand::ToggleCinema => {
                self.toggle_cinema();
                CommandOutcome::Audio(self.audio_config().clone())
            }
            PlayerCommand::ToggleBypass => {
                self.toggle_bypass();
                CommandOutcome::Audio(self.audio_config().clone())
            }
            PlayerCommand::TogglePureNative => {
                self.toggle_pure_native();
                CommandOutcome::Audio(self.audio_config().clone())
            }
            PlayerCommand::ToggleMute => {
                self.toggle_mute();
                CommandOutcome::Audio(self.audio_config().clone())
            }
        }
    }
}
