pub mod metadata;
pub mod session;
pub mod timeline;

pub use metadata::Metadata;
pub use session::Session;
pub use timeline::{MetricSchema, RatingCountMismatch, Timeline, TimelineRecord};
