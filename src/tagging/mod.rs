pub mod config;
pub mod rating;
pub mod session;
pub mod state;

pub use config::TaggingConfig;
pub use rating::RatingBuffer;
pub use session::{CommitOutcome, PendingTagSession, TriggerOutcome};
pub use state::{Marks, PendingTag, TagState};
