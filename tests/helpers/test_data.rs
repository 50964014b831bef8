//! Test data helpers for creating events
//!
//! All fixtures are anchored on a fixed "now" so day labels are predictable.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

use EventLens::engine::DayZone;
use EventLens::models::{Coordinate, Event, FilterCriteria, Participant, ParticipantKind, ParticipantStatus};
use EventLens::services::Clock;

/// Sunday, April 14 2024, 10:00 UTC
pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 14, 10, 0, 0).unwrap()
}

pub fn fixed_clock() -> Clock {
    Arc::new(reference_now)
}

pub fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

/// Day boundary at UTC midnight, independent of the host zone
pub fn utc_days() -> DayZone {
    DayZone::Fixed(utc())
}

pub fn moscow() -> Coordinate {
    Coordinate::new(55.7558, 37.6173)
}

/// A valid event scheduled `hours` after [`reference_now`]
pub fn create_test_event(id: &str, hours: i64) -> Event {
    Event {
        id: id.to_string(),
        title: format!("Swing night {}", id),
        description: Some("Social dance with a live band".to_string()),
        scheduled_at: reference_now() + Duration::hours(hours),
        uploaded_at: None,
        created_at: Some(reference_now() - Duration::days(7)),
        location: moscow(),
        capacity: None,
        creator_id: "organizer".to_string(),
        participants: Vec::new(),
        image: None,
        category_id: Some("social".to_string()),
        sub_category_ids: Default::default(),
    }
}

/// `accepted` registered users who accepted, plus `invited` pending invites
pub fn create_test_participants(accepted: usize, invited: usize) -> Vec<Participant> {
    let accepted = (0..accepted).map(|i| Participant::new(format!("dancer-{}", i), ParticipantStatus::Accepted, ParticipantKind::User));
    let invited = (0..invited).map(|i| Participant::new(format!("guest-{}", i), ParticipantStatus::Invited, ParticipantKind::User));
    accepted.chain(invited).collect()
}

/// Criteria that differ only by search text, used to key gated responses
pub fn search_criteria(search: &str) -> FilterCriteria {
    FilterCriteria::builder().search(search).build().unwrap()
}

pub fn ids(events: &[Event]) -> Vec<&str> {
    events.iter().map(|e| e.id.as_str()).collect()
}
