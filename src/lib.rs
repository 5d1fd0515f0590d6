pub mod cache;
pub mod classify;
pub mod cli;
pub mod clock;
pub mod config;
pub mod group;
pub mod logging;
pub mod model;
pub mod section;
pub mod source;
pub mod window;

pub use section::{Section, SectionOptions, SectionQuery, SectionState, Subscription};
pub use source::{EventPage, EventSource, FetchError};
pub use window::{DateRange, DateWindow, TimelineFilter};
