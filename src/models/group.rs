//! Grouped result model

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::event::Event;

/// A labeled section of ordered events
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventGroup {
    pub label: String,
    /// Local calendar day, set only for day-bucketed orderings
    pub date: Option<NaiveDate>,
    pub events: Vec<Event>,
}

impl EventGroup {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Concatenate the events of `groups` in group order
pub fn flatten(groups: &[EventGroup]) -> Vec<&Event> {
    groups.iter().flat_map(|group| group.events.iter()).collect()
}
