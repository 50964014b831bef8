//! Sectioning of ordered events

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};

use crate::engine::labels::{resolve_label, LabelRenderer};
use crate::models::criteria::SortMode;
use crate::models::event::Event;
use crate::models::group::EventGroup;
use crate::utils::errors::{EventLensError, Result};
use crate::utils::helpers::format_timestamp;

/// Widest UTC offset in use anywhere, in minutes
pub const MAX_UTC_OFFSET_MINUTES: i32 = 18 * 60;

/// Time zone whose midnight separates day groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayZone {
    /// The host's zone, including daylight-saving changes
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl DayZone {
    /// Fixed zone for `minutes` east of UTC, or the host zone when unset
    pub fn from_offset_minutes(minutes: Option<i32>) -> Result<Self> {
        match minutes {
            None => Ok(DayZone::Local),
            Some(minutes) => minutes
                .checked_mul(60)
                .filter(|_| minutes.abs() <= MAX_UTC_OFFSET_MINUTES)
                .and_then(FixedOffset::east_opt)
                .map(DayZone::Fixed)
                .ok_or_else(|| {
                    EventLensError::Config(format!("UTC offset of {} minutes is out of range", minutes))
                }),
        }
    }

    /// Calendar day of `at` in this zone
    pub fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        match self {
            DayZone::Local => at.with_timezone(&Local).date_naive(),
            DayZone::Fixed(offset) => at.with_timezone(offset).date_naive(),
        }
    }

    /// Display form of `at` in this zone
    pub fn format_timestamp(&self, at: DateTime<Utc>) -> String {
        match self {
            DayZone::Local => format_timestamp(at, &Local),
            DayZone::Fixed(offset) => format_timestamp(at, offset),
        }
    }
}

/// Where calendar days start and which day counts as today
pub struct GroupingContext<'a> {
    pub today: NaiveDate,
    pub zone: DayZone,
    pub labels: &'a dyn LabelRenderer,
}

impl<'a> GroupingContext<'a> {
    pub fn at(now: DateTime<Utc>, zone: DayZone, labels: &'a dyn LabelRenderer) -> Self {
        Self {
            today: zone.day_of(now),
            zone,
            labels,
        }
    }

    /// Calendar day of `at` in the grouping zone
    pub fn local_day(&self, at: DateTime<Utc>) -> NaiveDate {
        self.zone.day_of(at)
    }
}

/// Split already-ordered events into labeled groups.
///
/// Date modes produce one group per run of events sharing a local day, in
/// input order, so a descending sort yields the latest day first. Every other
/// mode produces a single captioned group. No events means no groups.
pub fn group_events(sorted: Vec<Event>, mode: SortMode, ctx: &GroupingContext<'_>) -> Vec<EventGroup> {
    if sorted.is_empty() {
        return Vec::new();
    }

    if !mode.is_date_mode() {
        return vec![EventGroup {
            label: ctx.labels.render(&resolve_label(mode, None, ctx.today)),
            date: None,
            events: sorted,
        }];
    }

    let mut runs: Vec<(NaiveDate, Vec<Event>)> = Vec::new();
    for event in sorted {
        let day = ctx.local_day(event.scheduled_at);
        match runs.last_mut() {
            Some((current, events)) if *current == day => events.push(event),
            _ => runs.push((day, vec![event])),
        }
    }

    runs.into_iter()
        .map(|(day, events)| EventGroup {
            label: ctx.labels.render(&resolve_label(mode, Some(day), ctx.today)),
            date: Some(day),
            events,
        })
        .collect()
}
