// File: ./src/group.rs
// Day bucketing for one batch, and how a batch joins the accumulated buckets.
use crate::clock::Clock;
use crate::model::{ClassifiedEvent, DayBucket};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Day-keyed buckets in first-seen order.
#[derive(Debug, Default)]
struct DayGroups {
    days: IndexMap<i64, Vec<ClassifiedEvent>>,
}

impl DayGroups {
    fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, day_timestamp: i64, event: ClassifiedEvent) {
        self.days.entry(day_timestamp).or_default().push(event);
    }

    fn into_buckets(self) -> Vec<DayBucket> {
        self.days
            .into_iter()
            .map(|(day_timestamp, events)| DayBucket {
                day_timestamp,
                events,
            })
            .collect()
    }
}

/// Partition `events` by local day. Bucket order is the first-occurrence
/// order of each day in this batch, not chronological.
pub fn group<I>(events: I, clock: &dyn Clock) -> Vec<DayBucket>
where
    I: IntoIterator<Item = ClassifiedEvent>,
{
    let mut groups = DayGroups::new();
    for event in events {
        groups.push(clock.start_of_day(event.timesort()), event);
    }
    groups.into_buckets()
}

/// How a freshly grouped page joins the buckets already accumulated.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BucketMerge {
    /// Append the page's buckets as they are. Two pages touching the same
    /// day yield two buckets for that day.
    #[default]
    PerPage,
    /// Fold events into an existing bucket for the same day; only new days
    /// are appended.
    ByDay,
}

pub fn merge_into(existing: &mut Vec<DayBucket>, page: Vec<DayBucket>, policy: BucketMerge) {
    match policy {
        BucketMerge::PerPage => existing.extend(page),
        BucketMerge::ByDay => {
            for bucket in page {
                match existing
                    .iter_mut()
                    .find(|b| b.day_timestamp == bucket.day_timestamp)
                {
                    Some(target) => target.events.extend(bucket.events),
                    None => existing.push(bucket),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{StaticCatalog, classify};
    use crate::clock::{FixedClock, SECONDS_PER_DAY};
    use crate::model::RawEvent;

    const DAY0: i64 = 1_709_596_800;
    const HOUR: i64 = 3600;

    fn classified(id: i64, ts: i64) -> ClassifiedEvent {
        classify(&RawEvent::new(id, "e", ts, "due"), DAY0, &StaticCatalog::default())
    }

    fn days(buckets: &[DayBucket]) -> Vec<i64> {
        buckets.iter().map(|b| b.day_timestamp).collect()
    }

    #[test]
    fn one_bucket_per_day_in_first_seen_order() {
        let clock = FixedClock::utc(DAY0);
        let batch = vec![
            classified(1, DAY0 + SECONDS_PER_DAY + HOUR),
            classified(2, DAY0 + HOUR),
            classified(3, DAY0 + SECONDS_PER_DAY + 5 * HOUR),
            classified(4, DAY0 + 2 * HOUR),
        ];
        let buckets = group(batch, &clock);

        assert_eq!(days(&buckets), vec![DAY0 + SECONDS_PER_DAY, DAY0]);
        assert_eq!(buckets[0].event_ids(), vec![1, 3]);
        assert_eq!(buckets[1].event_ids(), vec![2, 4]);
    }

    #[test]
    fn reordering_keeps_bucket_membership() {
        let clock = FixedClock::utc(DAY0);
        let a = vec![
            classified(1, DAY0 + HOUR),
            classified(2, DAY0 + 26 * HOUR),
            classified(3, DAY0 + 3 * HOUR),
        ];
        let mut b = a.clone();
        b.reverse();

        let membership = |buckets: Vec<DayBucket>| {
            let mut out: Vec<(i64, Vec<i64>)> = buckets
                .into_iter()
                .map(|bucket| {
                    let mut ids = bucket.event_ids();
                    ids.sort();
                    (bucket.day_timestamp, ids)
                })
                .collect();
            out.sort();
            out
        };
        assert_eq!(membership(group(a, &clock)), membership(group(b, &clock)));
    }

    #[test]
    fn empty_batch_has_no_buckets() {
        let clock = FixedClock::utc(DAY0);
        assert!(group(Vec::new(), &clock).is_empty());
    }

    #[test]
    fn per_page_merge_keeps_duplicate_days() {
        let clock = FixedClock::utc(DAY0);
        let mut acc = group(vec![classified(1, DAY0 + HOUR)], &clock);
        let page = group(
            vec![classified(2, DAY0 + 2 * HOUR), classified(3, DAY0 + 30 * HOUR)],
            &clock,
        );
        merge_into(&mut acc, page, BucketMerge::PerPage);

        assert_eq!(days(&acc), vec![DAY0, DAY0, DAY0 + SECONDS_PER_DAY]);
    }

    #[test]
    fn by_day_merge_folds_matching_days() {
        let clock = FixedClock::utc(DAY0);
        let mut acc = group(vec![classified(1, DAY0 + HOUR)], &clock);
        let page = group(
            vec![classified(2, DAY0 + 2 * HOUR), classified(3, DAY0 + 30 * HOUR)],
            &clock,
        );
        merge_into(&mut acc, page, BucketMerge::ByDay);

        assert_eq!(days(&acc), vec![DAY0, DAY0 + SECONDS_PER_DAY]);
        assert_eq!(acc[0].event_ids(), vec![1, 2]);
        assert_eq!(acc[1].event_ids(), vec![3]);
    }
}
