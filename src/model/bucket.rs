use crate::model::event::ClassifiedEvent;
use serde::{Deserialize, Serialize};

/// Events sharing one local calendar day.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DayBucket {
    /// Start of day (site timezone) for every event in the bucket.
    pub day_timestamp: i64,
    pub events: Vec<ClassifiedEvent>,
}

impl DayBucket {
    pub fn new(day_timestamp: i64) -> Self {
        Self {
            day_timestamp,
            events: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn event_ids(&self) -> Vec<i64> {
        self.events.iter().map(|e| e.id()).collect()
    }
}
