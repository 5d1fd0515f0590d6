mod common;

use common::{DAY0, GatedSource, HOUR, ScriptedSource, ev, options_at};
use daybook::{DateRange, EventPage, Section, SectionQuery};
use futures::StreamExt;

fn query() -> SectionQuery {
    SectionQuery::new(DateRange::starting(DAY0))
}

#[tokio::test]
async fn new_subscriber_gets_current_snapshot_first() {
    let mut section = Section::with_options(
        ScriptedSource::default(),
        query(),
        options_at(DAY0),
        Some([ev(1, DAY0 + HOUR)].as_slice()),
        Some(1),
    );
    let mut sub = section.subscribe();

    let first = sub.next().await.unwrap();
    assert_eq!(*first, *section.snapshot());
    assert_eq!(first.event_count(), 1);
    assert!(sub.drain().is_empty());
}

#[tokio::test]
async fn loading_flag_is_visible_while_fetch_is_pending() {
    let (release, source) = GatedSource::new();
    let mut section = Section::with_options(source, query(), options_at(DAY0), None, Some(5));
    let mut sub = section.subscribe();

    {
        let load = section.load_more();
        tokio::pin!(load);
        assert!(futures::poll!(&mut load).is_pending());

        let seen = sub.drain();
        assert_eq!(seen.len(), 2);
        assert!(!seen[0].loading_more);
        assert!(seen[1].loading_more);
        assert!(seen[1].buckets.is_empty());

        release
            .send(Ok(EventPage::last(vec![ev(6, DAY0 + 2 * HOUR)])))
            .unwrap();
        load.await.unwrap();
    }

    // A single publication carries the new buckets and the cleared flag.
    let seen = sub.drain();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].loading_more);
    assert_eq!(seen[0].event_count(), 1);
    assert!(!seen[0].can_load_more);
}

#[tokio::test]
async fn dropping_an_inflight_load_clears_the_flag() {
    let (_release, source) = GatedSource::new();
    let mut section = Section::with_options(
        source,
        query(),
        options_at(DAY0),
        Some([ev(1, DAY0 + HOUR)].as_slice()),
        Some(1),
    );
    let before = section.snapshot();
    let mut sub = section.subscribe();

    {
        let load = section.load_more();
        tokio::pin!(load);
        assert!(futures::poll!(&mut load).is_pending());
    }

    let after = section.snapshot();
    assert!(!after.loading_more);
    assert_eq!(*after, *before);

    let flags: Vec<bool> = sub.drain().iter().map(|s| s.loading_more).collect();
    assert_eq!(flags, vec![false, true, false]);
}

#[tokio::test]
async fn every_subscriber_sees_every_publication() {
    let source = ScriptedSource::new(vec![
        Ok(EventPage::with_cursor(vec![ev(2, DAY0 + HOUR)], 2)),
        Ok(EventPage::last(vec![ev(3, DAY0 + 2 * HOUR)])),
    ]);
    let mut section = Section::with_options(source, query(), options_at(DAY0), None, Some(1));
    let mut a = section.subscribe();
    let mut b = section.subscribe();
    assert_ne!(a.id(), b.id());

    section.load_all(5).await.unwrap();

    let seen_a = a.drain();
    let seen_b = b.drain();
    // initial + (loading, loaded) per page
    assert_eq!(seen_a.len(), 5);
    assert_eq!(seen_a, seen_b);
    assert_eq!(seen_a.last().unwrap().event_count(), 2);
}

#[tokio::test]
async fn unsubscribed_stream_ends() {
    let source = ScriptedSource::new(vec![Ok(EventPage::last(Vec::new()))]);
    let mut section = Section::with_options(source, query(), options_at(DAY0), None, Some(1));
    let mut kept = section.subscribe();
    let mut gone = section.subscribe();

    assert!(section.unsubscribe(gone.id()));
    assert!(!section.unsubscribe(gone.id()));

    section.load_more().await.unwrap();

    assert_eq!(kept.drain().len(), 3);
    // Only the snapshot delivered at subscription time, then end of stream.
    assert!(gone.next().await.is_some());
    assert!(gone.next().await.is_none());
}

#[tokio::test]
async fn dropping_the_section_closes_streams() {
    let section_sub = {
        let mut section =
            Section::with_options(ScriptedSource::default(), query(), options_at(DAY0), None, None);
        section.subscribe()
    };
    let mut sub = section_sub;
    assert!(sub.next().await.is_some());
    assert!(sub.next().await.is_none());
}
