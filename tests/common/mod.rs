#![allow(dead_code)]

use async_trait::async_trait;
use daybook::clock::FixedClock;
use daybook::model::{CourseRef, RawEvent};
use daybook::{EventPage, EventSource, FetchError, SectionOptions};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

// 2024-03-05T00:00:00Z
pub const DAY0: i64 = 1_709_596_800;
pub const HOUR: i64 = 3600;
pub const DAY: i64 = 24 * HOUR;

pub fn ev(id: i64, timesort: i64) -> RawEvent {
    RawEvent::new(id, &format!("Event {}", id), timesort, "due")
}

pub fn ev_in(id: i64, timesort: i64, course_id: i64) -> RawEvent {
    let mut e = ev(id, timesort);
    e.course = Some(CourseRef {
        id: course_id,
        fullname: format!("Course {}", course_id),
    });
    e
}

pub fn options_at(now: i64) -> SectionOptions {
    SectionOptions {
        clock: Arc::new(FixedClock::utc(now)),
        ..SectionOptions::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Course(i64, Option<i64>, String),
    Timesort(Option<i64>, String),
}

/// Replays a fixed list of results and records every call.
#[derive(Default)]
pub struct ScriptedSource {
    pages: Mutex<VecDeque<Result<EventPage, FetchError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedSource {
    pub fn new(pages: Vec<Result<EventPage, FetchError>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, call: Call) -> Result<EventPage, FetchError> {
        self.calls.lock().unwrap().push(call);
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Transport("script exhausted".to_string())))
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn fetch_by_course(
        &self,
        course_id: i64,
        cursor: Option<i64>,
        search: &str,
    ) -> Result<EventPage, FetchError> {
        self.next(Call::Course(course_id, cursor, search.to_string()))
    }

    async fn fetch_by_timesort(
        &self,
        cursor: Option<i64>,
        search: &str,
    ) -> Result<EventPage, FetchError> {
        self.next(Call::Timesort(cursor, search.to_string()))
    }
}

/// Suspends the first fetch until the test releases it.
pub struct GatedSource {
    gate: Mutex<Option<oneshot::Receiver<Result<EventPage, FetchError>>>>,
}

impl GatedSource {
    pub fn new() -> (oneshot::Sender<Result<EventPage, FetchError>>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            Self {
                gate: Mutex::new(Some(rx)),
            },
        )
    }

    async fn wait(&self) -> Result<EventPage, FetchError> {
        let rx = self.gate.lock().unwrap().take();
        match rx {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(FetchError::Transport("gate dropped".to_string()))),
            None => Err(FetchError::Transport("gate already used".to_string())),
        }
    }
}

#[async_trait]
impl EventSource for GatedSource {
    async fn fetch_by_course(
        &self,
        _course_id: i64,
        _cursor: Option<i64>,
        _search: &str,
    ) -> Result<EventPage, FetchError> {
        self.wait().await
    }

    async fn fetch_by_timesort(
        &self,
        _cursor: Option<i64>,
        _search: &str,
    ) -> Result<EventPage, FetchError> {
        self.wait().await
    }
}
