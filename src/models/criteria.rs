//! Filter criteria model
//!
//! `FilterCriteria` is an immutable, validated snapshot of what the user asked
//! for. Edits go through [`FilterCriteriaBuilder`] and produce a new value;
//! malformed input is rejected at `build()` and never reaches the engine.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::event::{Coordinate, Event};
use crate::utils::errors::{EventLensError, Result};
use crate::utils::helpers::normalize_whitespace;

/// Radius used when the user has not picked one
pub const DEFAULT_RADIUS_KM: f64 = 25.0;

/// Ordering applied to the retrieved events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    #[default]
    DateAscending,
    DateDescending,
    DistanceAscending,
    RecencyDescending,
    RecencyAscending,
    CapacityDescending,
    PopularityDescending,
}

impl SortMode {
    pub const ALL: [SortMode; 7] = [
        SortMode::DateAscending,
        SortMode::DateDescending,
        SortMode::DistanceAscending,
        SortMode::RecencyDescending,
        SortMode::RecencyAscending,
        SortMode::CapacityDescending,
        SortMode::PopularityDescending,
    ];

    /// Whether results in this mode are bucketed by calendar day
    pub fn is_date_mode(&self) -> bool {
        matches!(self, SortMode::DateAscending | SortMode::DateDescending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::DateAscending => "date-ascending",
            SortMode::DateDescending => "date-descending",
            SortMode::DistanceAscending => "distance-ascending",
            SortMode::RecencyDescending => "recency-descending",
            SortMode::RecencyAscending => "recency-ascending",
            SortMode::CapacityDescending => "capacity-descending",
            SortMode::PopularityDescending => "popularity-descending",
        }
    }
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = EventLensError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        SortMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| EventLensError::InvalidInput(format!("Unknown sort mode: {}", s)))
    }
}

/// Inclusive scheduled-time window; either side may be open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateWindow {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl DateWindow {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<Self> {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(EventLensError::InvalidCriteria(format!(
                    "date window ends ({}) before it starts ({})",
                    end.to_rfc3339(),
                    start.to_rfc3339()
                )));
            }
        }

        Ok(Self { start, end })
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| at >= start) && self.end.map_or(true, |end| at <= end)
    }
}

/// Validated snapshot of the user's constraints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterCriteria {
    coordinate: Option<Coordinate>,
    radius_km: f64,
    search: String,
    dates: DateWindow,
    category_id: Option<String>,
    sub_category_ids: BTreeSet<String>,
    sort: SortMode,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            coordinate: None,
            radius_km: DEFAULT_RADIUS_KM,
            search: String::new(),
            dates: DateWindow::unbounded(),
            category_id: None,
            sub_category_ids: BTreeSet::new(),
            sort: SortMode::default(),
        }
    }
}

impl FilterCriteria {
    pub fn builder() -> FilterCriteriaBuilder {
        FilterCriteriaBuilder::default()
    }

    /// Builder seeded with this snapshot, for wholesale replacement
    pub fn to_builder(&self) -> FilterCriteriaBuilder {
        FilterCriteriaBuilder {
            coordinate: self.coordinate,
            radius_km: self.radius_km,
            search: self.search.clone(),
            start: self.dates.start,
            end: self.dates.end,
            category_id: self.category_id.clone(),
            sub_category_ids: self.sub_category_ids.clone(),
            sort: self.sort,
        }
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn dates(&self) -> DateWindow {
        self.dates
    }

    pub fn category_id(&self) -> Option<&str> {
        self.category_id.as_deref()
    }

    pub fn sub_category_ids(&self) -> &BTreeSet<String> {
        &self.sub_category_ids
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    /// Reference point for distance ordering, if that ordering can apply
    pub fn distance_reference(&self) -> Option<Coordinate> {
        match self.sort {
            SortMode::DistanceAscending => self.coordinate,
            _ => None,
        }
    }

    /// The part of the criteria the event source cares about
    pub fn retrieval_query(&self) -> RetrievalQuery {
        let search = normalize_whitespace(&self.search);
        RetrievalQuery {
            near: self.coordinate.map(|center| NearFilter {
                center,
                radius_km: self.radius_km,
            }),
            search: (!search.is_empty()).then_some(search),
            dates: self.dates,
            category_id: self.category_id.clone(),
            sub_category_ids: self.sub_category_ids.clone(),
        }
    }
}

/// Collects edits and validates them into a [`FilterCriteria`]
#[derive(Debug, Clone)]
pub struct FilterCriteriaBuilder {
    coordinate: Option<Coordinate>,
    radius_km: f64,
    search: String,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    category_id: Option<String>,
    sub_category_ids: BTreeSet<String>,
    sort: SortMode,
}

impl Default for FilterCriteriaBuilder {
    fn default() -> Self {
        FilterCriteria::default().to_builder()
    }
}

impl FilterCriteriaBuilder {
    pub fn coordinate(mut self, coordinate: Option<Coordinate>) -> Self {
        self.coordinate = coordinate;
        self
    }

    pub fn radius_km(mut self, radius_km: f64) -> Self {
        self.radius_km = radius_km;
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn starts_after(mut self, start: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self
    }

    pub fn ends_before(mut self, end: Option<DateTime<Utc>>) -> Self {
        self.end = end;
        self
    }

    pub fn category(mut self, category_id: Option<String>) -> Self {
        self.category_id = category_id;
        // Sub-categories belong to a category; switching invalidates them.
        self.sub_category_ids.clear();
        self
    }

    pub fn sub_categories<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_category_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    pub fn build(self) -> Result<FilterCriteria> {
        if let Some(coordinate) = self.coordinate {
            if !coordinate.is_valid() {
                return Err(EventLensError::InvalidCriteria(format!(
                    "coordinate {} is out of range",
                    coordinate
                )));
            }
        }

        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            return Err(EventLensError::InvalidCriteria(format!(
                "radius must be a positive number of kilometers, got {}",
                self.radius_km
            )));
        }

        let dates = DateWindow::new(self.start, self.end)?;

        Ok(FilterCriteria {
            coordinate: self.coordinate,
            radius_km: self.radius_km,
            search: self.search,
            dates,
            category_id: self.category_id.filter(|id| !id.trim().is_empty()),
            sub_category_ids: self.sub_category_ids,
            sort: self.sort,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NearFilter {
    pub center: Coordinate,
    pub radius_km: f64,
}

/// Criteria subset handed to an event source; never carries the ordering
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RetrievalQuery {
    pub near: Option<NearFilter>,
    pub search: Option<String>,
    pub dates: DateWindow,
    pub category_id: Option<String>,
    pub sub_category_ids: BTreeSet<String>,
}

impl RetrievalQuery {
    /// Reference filtering used by the local event sources
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(near) = &self.near {
            if near.center.distance_to(&event.location) > near.radius_km {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_title = event.title.to_lowercase().contains(&needle);
            let in_description = event
                .description
                .as_deref()
                .map_or(false, |d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }

        if !self.dates.contains(event.scheduled_at) {
            return false;
        }

        if let Some(category_id) = &self.category_id {
            if event.category_id.as_ref() != Some(category_id) {
                return false;
            }
        }

        if !self.sub_category_ids.is_empty()
            && self.sub_category_ids.is_disjoint(&event.sub_category_ids)
        {
            return false;
        }

        true
    }
}
