// File: ./src/source/mod.rs
// The fetch contract and the bundled implementations of it.
pub mod json;
pub mod memory;

pub use self::json::JsonFileSource;
pub use self::memory::MemorySource;

use crate::model::RawEvent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One page of events. `next_cursor == None` means the source is exhausted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct EventPage {
    pub events: Vec<RawEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<i64>,
}

impl EventPage {
    pub fn last(events: Vec<RawEvent>) -> Self {
        Self {
            events,
            next_cursor: None,
        }
    }

    pub fn with_cursor(events: Vec<RawEvent>, next_cursor: i64) -> Self {
        Self {
            events,
            next_cursor: Some(next_cursor),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unknown course {0}")]
    UnknownCourse(i64),
    #[error("malformed event payload")]
    Decode(#[from] serde_json::Error),
    #[error("I/O error reading events")]
    Io(#[from] std::io::Error),
}

/// Paged access to action events, either for one course or across all of
/// them ordered by `timesort`.
///
/// `cursor` is the id of the last event already seen; `None` asks for the
/// first page.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_by_course(
        &self,
        course_id: i64,
        cursor: Option<i64>,
        search: &str,
    ) -> Result<EventPage, FetchError>;

    async fn fetch_by_timesort(
        &self,
        cursor: Option<i64>,
        search: &str,
    ) -> Result<EventPage, FetchError>;
}
