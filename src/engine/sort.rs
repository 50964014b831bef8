//! Event ordering
//!
//! Every ordering is built on the standard library's stable sort, so events
//! with equal keys keep their input order and sorting twice is a no-op.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::engine::participation::effective_count;
use crate::models::criteria::SortMode;
use crate::models::event::{Coordinate, Event};

/// Return `events` ordered by `mode`. The input is left untouched.
///
/// `reference` is only consulted by [`SortMode::DistanceAscending`]; without
/// it that mode returns the input order unchanged.
pub fn sort_events(events: &[Event], mode: SortMode, reference: Option<Coordinate>) -> Vec<Event> {
    let mut sorted = events.to_vec();

    match mode {
        SortMode::DateAscending => sorted.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at)),
        SortMode::DateDescending => sorted.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at)),
        SortMode::RecencyDescending => sorted.sort_by(|a, b| recency(b).cmp(&recency(a))),
        SortMode::RecencyAscending => sorted.sort_by(|a, b| recency(a).cmp(&recency(b))),
        SortMode::CapacityDescending => sorted.sort_by(compare_capacity),
        SortMode::PopularityDescending => {
            sorted.sort_by_cached_key(|event| std::cmp::Reverse(effective_count(event)))
        }
        SortMode::DistanceAscending => match reference {
            Some(origin) => return sort_by_distance(sorted, origin),
            None => {
                debug!(count = sorted.len(), "No reference coordinate, keeping input order");
            }
        },
    }

    sorted
}

fn recency(event: &Event) -> DateTime<Utc> {
    let timestamp = event.recency_timestamp();
    debug_assert!(
        timestamp.is_some(),
        "event {} has neither upload nor creation time",
        event.id
    );
    timestamp.unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Unlimited capacity first, two unlimited events by date, otherwise larger first
fn compare_capacity(a: &Event, b: &Event) -> Ordering {
    match (a.capacity, b.capacity) {
        (None, None) => a.scheduled_at.cmp(&b.scheduled_at),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => y.cmp(&x),
    }
}

fn sort_by_distance(events: Vec<Event>, origin: Coordinate) -> Vec<Event> {
    let mut keyed: Vec<(f64, Event)> = events
        .into_iter()
        .map(|event| (origin.distance_to(&event.location), event))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    keyed.into_iter().map(|(_, event)| event).collect()
}
