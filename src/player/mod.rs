pub mod commands;
pub mod controller;
pub mod session;

pub use commands::{CommandOutcome, Key, KeyInput, PlayerCommand};
pub use controller::PlaybackDriver;
pub use session::{PlayerSession, SessionSnapshot};
