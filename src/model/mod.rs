// File: ./src/model/mod.rs
// Aggregates the split model files
pub mod bucket;
pub mod event;

pub use bucket::DayBucket;
pub use event::{ClassifiedEvent, CourseRef, EventIcon, RawEvent};
