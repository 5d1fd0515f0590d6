// File: ./src/model/event.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event types evaluated per calendar day instead of per second.
pub const OPENING_EVENT_TYPES: [&str; 2] = ["open", "opensubmission"];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct EventIcon {
    pub component: String,
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alttext: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CourseRef {
    pub id: i64,
    #[serde(default)]
    pub fullname: String,
}

/// An event as delivered by an [`EventSource`](crate::source::EventSource).
///
/// Fields the engine does not interpret are kept in `extra` and passed
/// through untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// Epoch seconds. Drives ordering and the day bucket.
    pub timesort: i64,
    #[serde(default)]
    pub eventtype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulename: Option<String>,
    #[serde(default)]
    pub icon: EventIcon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<CourseRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawEvent {
    pub fn new(id: i64, name: &str, timesort: i64, eventtype: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            timesort,
            eventtype: eventtype.to_string(),
            modulename: None,
            icon: EventIcon::default(),
            course: None,
            extra: Map::new(),
        }
    }

    /// "open"/"opensubmission" events only matter from tomorrow onwards.
    pub fn is_opening(&self) -> bool {
        OPENING_EVENT_TYPES.contains(&self.eventtype.as_str())
    }

    pub fn course_id(&self) -> Option<i64> {
        self.course.as_ref().map(|c| c.id)
    }

    /// Module key, falling back to the icon component when unset.
    pub fn module_key(&self) -> &str {
        match self.modulename.as_deref() {
            Some(m) if !m.is_empty() => m,
            _ => &self.icon.component,
        }
    }
}

/// A [`RawEvent`] plus the fields derived at classification time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClassifiedEvent {
    pub event: RawEvent,
    pub module_name: String,
    pub overdue: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_title: Option<String>,
}

impl ClassifiedEvent {
    pub fn id(&self) -> i64 {
        self.event.id
    }

    pub fn timesort(&self) -> i64 {
        self.event.timesort
    }
}
