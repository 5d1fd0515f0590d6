// File: ./src/source/memory.rs
use crate::model::RawEvent;
use crate::source::{EventPage, EventSource, FetchError};
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::trace;

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// In-memory event list paged with "after event id" semantics.
///
/// Events are kept sorted by `(timesort, id)`. A page starts right after
/// the cursor event and carries a next cursor only when it is full.
#[derive(Debug, Clone)]
pub struct MemorySource {
    events: Vec<RawEvent>,
    courses: HashSet<i64>,
    page_size: usize,
}

impl MemorySource {
    pub fn new(mut events: Vec<RawEvent>, page_size: usize) -> Self {
        events.sort_by_key(|e| (e.timesort, e.id));
        let courses = events.iter().filter_map(|e| e.course_id()).collect();
        Self {
            events,
            courses,
            page_size: page_size.max(1),
        }
    }

    /// Register a course that exists but may have no events.
    pub fn with_course(mut self, course_id: i64) -> Self {
        self.courses.insert(course_id);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn page<F>(&self, cursor: Option<i64>, search: &str, keep: F) -> EventPage
    where
        F: Fn(&RawEvent) -> bool,
    {
        let start = match cursor {
            Some(id) => match self.events.iter().position(|e| e.id == id) {
                Some(pos) => pos + 1,
                // A cursor that vanished from the list means nothing follows it.
                None => self.events.len(),
            },
            None => 0,
        };
        let needle = search.trim().to_lowercase();

        let events: Vec<RawEvent> = self.events[start..]
            .iter()
            .filter(|&e| keep(e) && matches_search(e, &needle))
            .take(self.page_size)
            .cloned()
            .collect();

        let next_cursor = if events.len() == self.page_size {
            events.last().map(|e| e.id)
        } else {
            None
        };
        trace!(?cursor, returned = events.len(), ?next_cursor, "memory page");

        EventPage {
            events,
            next_cursor,
        }
    }
}

fn matches_search(event: &RawEvent, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    if event.name.to_lowercase().contains(needle) {
        return true;
    }
    event
        .course
        .as_ref()
        .is_some_and(|c| c.fullname.to_lowercase().contains(needle))
}

#[async_trait]
impl EventSource for MemorySource {
    async fn fetch_by_course(
        &self,
        course_id: i64,
        cursor: Option<i64>,
        search: &str,
    ) -> Result<EventPage, FetchError> {
        if !self.courses.contains(&course_id) {
            return Err(FetchError::UnknownCourse(course_id));
        }
        Ok(self.page(cursor, search, |e| e.course_id() == Some(course_id)))
    }

    async fn fetch_by_timesort(
        &self,
        cursor: Option<i64>,
        search: &str,
    ) -> Result<EventPage, FetchError> {
        Ok(self.page(cursor, search, |_| true))
    }
}
