//! Background dominant-color scan of a title, independent of playback state.

pub mod color;
pub mod controller;
pub mod worker;

pub use color::average_color;
pub use controller::ColorScanController;
pub use worker::{ColorSample, FrameSampler, ScanProgress};
