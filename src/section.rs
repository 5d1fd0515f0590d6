// File: ./src/section.rs
// A timeline section: accumulated day buckets, pagination and observers.
use crate::classify::{ModuleCatalog, StaticCatalog, admits, classify};
use crate::clock::{Clock, SystemClock};
use crate::group::{BucketMerge, group, merge_into};
use crate::model::{DayBucket, RawEvent};
use crate::source::{EventSource, FetchError};
use crate::window::{DateRange, DateWindow};
use futures::stream::Stream;
use futures::task::AtomicWaker;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tracing::{debug, info, warn};

/// Observable state of a section. Published as immutable snapshots.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SectionState {
    pub buckets: Vec<DayBucket>,
    /// Id of the last event seen; `None` once the source is exhausted.
    pub cursor: Option<i64>,
    pub can_load_more: bool,
    pub loading_more: bool,
}

impl SectionState {
    pub fn event_count(&self) -> usize {
        self.buckets.iter().map(DayBucket::len).sum()
    }
}

/// What a section shows. Fixed for the section's lifetime.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SectionQuery {
    pub search: Option<String>,
    pub overdue: bool,
    pub range: DateRange,
    /// Restrict fetches to one course instead of the global timeline.
    pub course: Option<i64>,
}

impl SectionQuery {
    pub fn new(range: DateRange) -> Self {
        Self {
            search: None,
            overdue: false,
            range,
            course: None,
        }
    }

    pub fn overdue(mut self, overdue: bool) -> Self {
        self.overdue = overdue;
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn course(mut self, course_id: i64) -> Self {
        self.course = Some(course_id);
        self
    }
}

/// Collaborators and policies shared by every section.
#[derive(Clone)]
pub struct SectionOptions {
    pub clock: Arc<dyn Clock>,
    pub catalog: Arc<dyn ModuleCatalog>,
    pub merge: BucketMerge,
}

impl Default for SectionOptions {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock::default()),
            catalog: Arc::new(StaticCatalog::default()),
            merge: BucketMerge::default(),
        }
    }
}

/// Filter, classify and group one batch of raw events.
pub fn reduce_events(
    events: &[RawEvent],
    overdue: bool,
    range: &DateRange,
    clock: &dyn Clock,
    catalog: &dyn ModuleCatalog,
) -> Vec<DayBucket> {
    let window = DateWindow::resolve(range, clock);
    let admitted: Vec<_> = events
        .iter()
        .filter(|e| admits(e, overdue, &window, clock))
        .map(|e| classify(e, window.now, catalog))
        .collect();
    debug!(
        fetched = events.len(),
        admitted = admitted.len(),
        overdue,
        "filtered events"
    );
    group(admitted, clock)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Snapshots an observer may fall behind by. Past that the oldest queued
/// snapshot is dropped, so a slow observer always ends on the latest state.
pub const SUBSCRIPTION_BUFFER: usize = 16;

/// One observer's pending snapshots.
#[derive(Debug, Default)]
struct Inbox {
    queue: Mutex<VecDeque<Arc<SectionState>>>,
    closed: AtomicBool,
    waker: AtomicWaker,
}

impl Inbox {
    fn queue(&self) -> MutexGuard<'_, VecDeque<Arc<SectionState>>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, state: Arc<SectionState>) {
        {
            let mut queue = self.queue();
            if queue.len() >= SUBSCRIPTION_BUFFER {
                queue.pop_front();
                debug!("observer lagging, dropped oldest snapshot");
            }
            queue.push_back(state);
        }
        self.waker.wake();
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.waker.wake();
    }
}

/// Snapshot stream handed to an observer. Starts with the state current at
/// subscription time and ends when the observer is unsubscribed or the
/// section is dropped. At most [`SUBSCRIPTION_BUFFER`] snapshots are held
/// for an observer that is not polling.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    inbox: Arc<Inbox>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Every snapshot delivered so far and not yet consumed.
    pub fn drain(&mut self) -> Vec<Arc<SectionState>> {
        self.inbox.queue().drain(..).collect()
    }
}

impl Stream for Subscription {
    type Item = Arc<SectionState>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inbox.waker.register(cx.waker());
        if let Some(state) = self.inbox.queue().pop_front() {
            return Poll::Ready(Some(state));
        }
        if self.inbox.closed.load(Ordering::Acquire) {
            return Poll::Ready(None);
        }
        Poll::Pending
    }
}

struct Publisher {
    state: Arc<SectionState>,
    observers: Vec<(SubscriptionId, Arc<Inbox>)>,
    next_id: u64,
}

impl Publisher {
    fn new(state: SectionState) -> Self {
        Self {
            state: Arc::new(state),
            observers: Vec::new(),
            next_id: 0,
        }
    }

    fn publish(&mut self, state: SectionState) {
        let state = Arc::new(state);
        self.state = Arc::clone(&state);
        // An inbox nobody else holds belongs to a dropped subscription.
        self.observers.retain(|(_, inbox)| Arc::strong_count(inbox) > 1);
        for (_, inbox) in &self.observers {
            inbox.push(Arc::clone(&state));
        }
    }

    fn subscribe(&mut self) -> Subscription {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let inbox = Arc::new(Inbox::default());
        inbox.push(Arc::clone(&self.state));
        self.observers.push((id, Arc::clone(&inbox)));
        Subscription { id, inbox }
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(pos) = self.observers.iter().position(|(sid, _)| *sid == id) else {
            return false;
        };
        let (_, inbox) = self.observers.remove(pos);
        inbox.close();
        true
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        for (_, inbox) in &self.observers {
            inbox.close();
        }
    }
}

/// Holds `loading_more` high while a fetch is in flight and lowers it on
/// every exit path, including the future being dropped.
struct LoadingGuard<'a> {
    publisher: &'a mut Publisher,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn engage(publisher: &'a mut Publisher) -> Self {
        let mut next = (*publisher.state).clone();
        next.loading_more = true;
        publisher.publish(next);
        Self {
            publisher,
            armed: true,
        }
    }

    fn cursor(&self) -> Option<i64> {
        self.publisher.state.cursor
    }

    fn complete(mut self, page: Vec<DayBucket>, next_cursor: Option<i64>, merge: BucketMerge) {
        let mut next = (*self.publisher.state).clone();
        merge_into(&mut next.buckets, page, merge);
        next.cursor = next_cursor;
        next.can_load_more = next_cursor.is_some();
        next.loading_more = false;
        self.armed = false;
        self.publisher.publish(next);
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut next = (*self.publisher.state).clone();
            next.loading_more = false;
            self.publisher.publish(next);
        }
    }
}

/// One timeline section over an [`EventSource`].
pub struct Section<S> {
    source: S,
    query: SectionQuery,
    options: SectionOptions,
    publisher: Publisher,
}

impl<S: EventSource> Section<S> {
    /// Seed a section from an optional first page. `cursor` is the next
    /// cursor reported with that page; `None` means there is nothing more.
    pub fn new(
        source: S,
        query: SectionQuery,
        initial: Option<&[RawEvent]>,
        cursor: Option<i64>,
    ) -> Self {
        Self::with_options(source, query, SectionOptions::default(), initial, cursor)
    }

    pub fn with_options(
        source: S,
        query: SectionQuery,
        options: SectionOptions,
        initial: Option<&[RawEvent]>,
        cursor: Option<i64>,
    ) -> Self {
        let buckets = match initial {
            Some(events) => reduce_events(
                events,
                query.overdue,
                &query.range,
                options.clock.as_ref(),
                options.catalog.as_ref(),
            ),
            None => Vec::new(),
        };
        let state = SectionState {
            buckets,
            cursor,
            can_load_more: cursor.is_some(),
            loading_more: false,
        };
        Self {
            source,
            query,
            options,
            publisher: Publisher::new(state),
        }
    }

    /// Build a section by fetching its first page.
    pub async fn fetch_first(
        source: S,
        query: SectionQuery,
        options: SectionOptions,
    ) -> Result<Self, FetchError> {
        let search = query.search.clone().unwrap_or_default();
        let page = match query.course {
            Some(course_id) => source.fetch_by_course(course_id, None, &search).await?,
            None => source.fetch_by_timesort(None, &search).await?,
        };
        Ok(Self::with_options(
            source,
            query,
            options,
            Some(page.events.as_slice()),
            page.next_cursor,
        ))
    }

    pub fn query(&self) -> &SectionQuery {
        &self.query
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn snapshot(&self) -> Arc<SectionState> {
        Arc::clone(&self.publisher.state)
    }

    pub fn can_load_more(&self) -> bool {
        self.publisher.state.can_load_more
    }

    pub fn subscribe(&mut self) -> Subscription {
        self.publisher.subscribe()
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.publisher.unsubscribe(id)
    }

    /// Fetch the page after the current cursor and append its buckets.
    ///
    /// On error the buckets and cursor are left as they were and the error
    /// is returned unchanged.
    pub async fn load_more(&mut self) -> Result<(), FetchError> {
        let guard = LoadingGuard::engage(&mut self.publisher);
        let cursor = guard.cursor();
        let search = self.query.search.as_deref().unwrap_or("");

        let fetched = match self.query.course {
            Some(course_id) => {
                self.source
                    .fetch_by_course(course_id, cursor, search)
                    .await
            }
            None => self.source.fetch_by_timesort(cursor, search).await,
        };
        let page = match fetched {
            Ok(page) => page,
            Err(err) => {
                warn!(?cursor, error = %err, "failed to load more events");
                return Err(err);
            }
        };

        let buckets = reduce_events(
            &page.events,
            self.query.overdue,
            &self.query.range,
            self.options.clock.as_ref(),
            self.options.catalog.as_ref(),
        );
        info!(
            ?cursor,
            next_cursor = ?page.next_cursor,
            days = buckets.len(),
            "loaded more events"
        );
        guard.complete(buckets, page.next_cursor, self.options.merge);
        Ok(())
    }

    /// Keep loading until the source is exhausted or `max_pages` pages have
    /// been fetched. Returns the number of pages loaded.
    pub async fn load_all(&mut self, max_pages: usize) -> Result<usize, FetchError> {
        let mut pages = 0;
        while pages < max_pages && self.can_load_more() {
            self.load_more().await?;
            pages += 1;
        }
        Ok(pages)
    }
}
