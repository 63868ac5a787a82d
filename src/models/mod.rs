pub mod records;
pub mod scene_tag;
pub mod segment;

pub use records::{ActivityLog, MovieMeta, Record};
pub use scene_tag::SceneTag;
pub use segment::{Segment, MAX_RATING, MIN_SEGMENT_SECS, NEUTRAL_RATING};
