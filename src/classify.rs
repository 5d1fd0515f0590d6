// File: ./src/classify.rs
// Admission predicate and derived-field mapping for raw events.
use crate::clock::Clock;
use crate::model::{ClassifiedEvent, RawEvent};
use crate::window::DateWindow;
use std::collections::HashMap;

/// Display lookups for activity modules (icons, translated names).
pub trait ModuleCatalog: Send + Sync {
    fn icon_url(&self, component: &str) -> Option<String>;
    fn module_title(&self, module: &str) -> Option<String>;
}

/// Catalog backed by a base URL and a fixed title table.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    icon_base: Option<String>,
    titles: HashMap<String, String>,
}

impl StaticCatalog {
    pub fn new(icon_base: Option<String>, titles: HashMap<String, String>) -> Self {
        Self { icon_base, titles }
    }
}

impl ModuleCatalog for StaticCatalog {
    fn icon_url(&self, component: &str) -> Option<String> {
        if component.is_empty() {
            return None;
        }
        let base = self.icon_base.as_deref()?;
        let module = component.strip_prefix("mod_").unwrap_or(component);
        Some(format!("{}/{}/icon.svg", base.trim_end_matches('/'), module))
    }

    fn module_title(&self, module: &str) -> Option<String> {
        self.titles.get(module).cloned()
    }
}

/// Whether `event` belongs in a section filtered by `overdue` over `window`.
pub fn admits(event: &RawEvent, overdue: bool, window: &DateWindow, clock: &dyn Clock) -> bool {
    if !window.contains(event.timesort) {
        return false;
    }

    // Openings are compared by calendar day: only days after today count.
    if event.is_opening() {
        return clock.start_of_day(event.timesort) > window.midnight;
    }

    // Overdue sections over-fetch everything due today; the final cut is made here against `now`.
    !overdue || event.timesort < window.now
}

/// Derive the presentation-independent fields of `event` as of `now`.
pub fn classify(event: &RawEvent, now: i64, catalog: &dyn ModuleCatalog) -> ClassifiedEvent {
    let module_name = event.module_key().to_string();
    ClassifiedEvent {
        overdue: event.timesort < now,
        icon_url: catalog.icon_url(&event.icon.component),
        icon_title: catalog.module_title(&module_name),
        module_name,
        event: event.clone(),
    }
}
