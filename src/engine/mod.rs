//! Query engine module
//!
//! Pure, synchronous building blocks: distance, attendance counting,
//! ordering, sectioning and labeling. Nothing in here performs I/O.

pub mod geo;
pub mod participation;
pub mod sort;
pub mod grouping;
pub mod labels;

pub use geo::{distance_km, EARTH_RADIUS_KM};
pub use participation::{effective_count, is_effective};
pub use sort::sort_events;
pub use grouping::{group_events, DayZone, GroupingContext, MAX_UTC_OFFSET_MINUTES};
pub use labels::{label, resolve_label, GroupLabel, LabelRenderer, EnglishLabels, LocalizedLabels};

use crate::models::{Event, EventGroup, FilterCriteria};

/// Order `events` per `criteria` and section the result
pub fn arrange(events: &[Event], criteria: &FilterCriteria, ctx: &GroupingContext<'_>) -> Vec<EventGroup> {
    let sorted = sort_events(events, criteria.sort(), criteria.distance_reference());
    group_events(sorted, criteria.sort(), ctx)
}
