//! Error types at the seams of the playback engine.
//!
//! Storage, settings and background jobs use `anyhow` internally; these enums are
//! what callers of the session and the audio graph match on.

use thiserror::Error;

/// Failures reported by the media element collaborator.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("media source unavailable: {0}")]
    Unavailable(String),

    #[error("media audio is already tapped by another routing graph")]
    AlreadyTapped,

    #[error("playback blocked: {0}")]
    Blocked(String),
}

/// Failures binding the audio routing graph to a media source.
#[derive(Error, Debug)]
pub enum AttachError {
    #[error("routing graph is already attached to a media source")]
    AlreadyAttached,

    #[error("media audio is already tapped by another routing graph")]
    AlreadyTapped,

    #[error("audio context unavailable: {0}")]
    ContextUnavailable(String),

    #[error(transparent)]
    Media(MediaError),
}

impl From<MediaError> for AttachError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::AlreadyTapped => AttachError::AlreadyTapped,
            other => AttachError::Media(other),
        }
    }
}

/// Errors that prevent a player session from existing at all.
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("cannot bind media source '{filename}': {reason}")]
    MediaUnavailable { filename: String, reason: String },

    #[error(transparent)]
    Media(#[from] MediaError),
}
