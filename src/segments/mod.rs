pub mod resolve;
pub mod store;

pub use resolve::Overlap;
pub use store::{SegmentStore, StoreChange};
