//! Query coordinator
//!
//! Owns the current [`FilterCriteria`], drives the event source and publishes
//! sorted, grouped results to the presentation layer.
//!
//! Every retrieval is tagged with a sequence number issued under the state
//! lock. A response is only applied if its number is still the latest one, so
//! a slow answer to an old request can never overwrite a newer result. The
//! lock is never held while the source is being awaited.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::debug;

use crate::config::Settings;
use crate::engine::{self, DayZone, EnglishLabels, GroupingContext, LabelRenderer};
use crate::models::criteria::{FilterCriteria, FilterCriteriaBuilder, RetrievalQuery, SortMode};
use crate::models::event::Event;
use crate::models::group::EventGroup;
use crate::services::location::LocationProvider;
use crate::services::retrieval::EventSource;
use crate::utils::errors::{EventLensError, Result, RetrievalError};
use crate::utils::logging;

/// Source of the current time, used to decide what "today" is
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryState {
    /// Nothing requested yet
    Idle,
    /// Waiting on the source after a criteria change
    Loading,
    /// Waiting on the source after an explicit refresh
    Refreshing,
    Ready,
}

/// Non-fatal problem shown alongside the result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryIssue {
    RetrievalFailed(RetrievalError),
    LocationUnavailable(String),
}

impl fmt::Display for QueryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryIssue::RetrievalFailed(e) => write!(f, "could not load events: {}", e),
            QueryIssue::LocationUnavailable(reason) => write!(f, "location unavailable: {}", reason),
        }
    }
}

/// What the presentation layer renders
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub state: QueryState,
    pub criteria: FilterCriteria,
    pub groups: Arc<[EventGroup]>,
    pub issue: Option<QueryIssue>,
    /// Sequence number of the request these groups belong to
    pub sequence: u64,
}

impl QuerySnapshot {
    pub fn is_loading(&self) -> bool {
        matches!(self.state, QueryState::Loading | QueryState::Refreshing)
    }

    pub fn event_count(&self) -> usize {
        self.groups.iter().map(EventGroup::len).sum()
    }
}

/// Result of one coordinator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Groups were rebuilt and published
    Published { sequence: u64, events: usize, groups: usize },
    /// A newer request was issued before this one resolved; nothing changed
    Superseded { sequence: u64, latest: u64 },
    /// Recorded; applied when the in-flight request `latest` resolves
    Deferred { latest: u64 },
    /// The collaborator failed; the issue was published with the result
    Failed { sequence: u64, issue: QueryIssue },
}

struct CoordinatorState {
    snapshot: QuerySnapshot,
    /// Last sequence number handed out
    issued: u64,
    /// Events from the last applied retrieval, kept for local re-sorting
    events: Arc<Vec<Event>>,
}

pub struct QueryCoordinator {
    source: Arc<dyn EventSource>,
    labels: Arc<dyn LabelRenderer>,
    zone: DayZone,
    clock: Clock,
    state: Mutex<CoordinatorState>,
    updates: watch::Sender<QuerySnapshot>,
}

impl QueryCoordinator {
    pub fn new(source: Arc<dyn EventSource>, initial: FilterCriteria) -> Self {
        let snapshot = QuerySnapshot {
            state: QueryState::Idle,
            criteria: initial,
            groups: Arc::from(Vec::new()),
            issue: None,
            sequence: 0,
        };
        let (updates, _) = watch::channel(snapshot.clone());

        Self {
            source,
            labels: Arc::new(EnglishLabels),
            zone: DayZone::default(),
            clock: Arc::new(Utc::now),
            state: Mutex::new(CoordinatorState {
                snapshot,
                issued: 0,
                events: Arc::new(Vec::new()),
            }),
            updates,
        }
    }

    /// Coordinator with defaults taken from `settings`
    pub fn from_settings(settings: &Settings, source: Arc<dyn EventSource>) -> Result<Self> {
        let initial = FilterCriteria::builder()
            .radius_km(settings.query.default_radius_km)
            .sort(settings.query.default_sort)
            .build()?;
        let zone = DayZone::from_offset_minutes(settings.query.utc_offset_minutes)?;

        Ok(Self::new(source, initial).with_day_zone(zone))
    }

    pub fn with_labels(mut self, labels: Arc<dyn LabelRenderer>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_day_zone(mut self, zone: DayZone) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Zone whose midnight separates day groups
    pub fn day_zone(&self) -> DayZone {
        self.zone
    }

    /// Latest published state
    pub fn snapshot(&self) -> QuerySnapshot {
        self.updates.borrow().clone()
    }

    /// Receive every published state
    pub fn subscribe(&self) -> watch::Receiver<QuerySnapshot> {
        self.updates.subscribe()
    }

    /// Replace the criteria wholesale and retrieve matching events
    pub async fn set_criteria(&self, criteria: FilterCriteria) -> QueryOutcome {
        let (sequence, query) = {
            let mut state = self.state.lock().await;
            self.begin(&mut state, Some(criteria), false)
        };
        self.complete(sequence, query).await
    }

    /// Apply an edit to the current criteria.
    ///
    /// Invalid edits are rejected before anything is dispatched.
    pub async fn edit_criteria<F>(&self, edit: F) -> Result<QueryOutcome>
    where
        F: FnOnce(FilterCriteriaBuilder) -> FilterCriteriaBuilder,
    {
        let (sequence, query) = {
            let mut state = self.state.lock().await;
            let criteria = edit(state.snapshot.criteria.to_builder()).build()?;
            self.begin(&mut state, Some(criteria), false)
        };
        Ok(self.complete(sequence, query).await)
    }

    /// Re-run the current criteria.
    ///
    /// Only a coordinator showing results enters Refreshing; before the first
    /// answer a refresh is an ordinary load.
    pub async fn refresh(&self) -> QueryOutcome {
        let (sequence, query) = {
            let mut state = self.state.lock().await;
            self.begin(&mut state, None, true)
        };
        self.complete(sequence, query).await
    }

    /// Change only the ordering.
    ///
    /// Ordering is not a retrieval concern, so the last retrieved events are
    /// re-sorted locally. While a retrieval is in flight the new mode is
    /// recorded and applied when that response arrives.
    pub async fn set_sort_mode(&self, mode: SortMode) -> Result<QueryOutcome> {
        let mut state = self.state.lock().await;
        let criteria = state.snapshot.criteria.to_builder().sort(mode).build()?;

        match state.snapshot.state {
            QueryState::Idle => {
                let (sequence, query) = self.begin(&mut state, Some(criteria), false);
                drop(state);
                Ok(self.complete(sequence, query).await)
            }
            QueryState::Loading | QueryState::Refreshing => {
                debug!(sort = %mode, "Retrieval in flight, deferring re-sort");
                state.snapshot.criteria = criteria;
                self.publish(&state);
                Ok(QueryOutcome::Deferred { latest: state.issued })
            }
            QueryState::Ready => {
                let events = Arc::clone(&state.events);
                let groups = self.arrange(&events, &criteria);
                let group_count = groups.len();
                state.snapshot.criteria = criteria;
                state.snapshot.groups = Arc::from(groups);
                self.publish(&state);
                Ok(QueryOutcome::Published {
                    sequence: state.snapshot.sequence,
                    events: events.len(),
                    groups: group_count,
                })
            }
        }
    }

    /// Center the criteria on the device's position.
    ///
    /// A failed lookup is published as [`QueryIssue::LocationUnavailable`] and
    /// leaves the criteria as they were; only an invalid `radius_km` is an error.
    pub async fn use_current_location(
        &self,
        provider: &dyn LocationProvider,
        radius_km: Option<f64>,
    ) -> Result<QueryOutcome> {
        match provider.current_location().await {
            Ok(coordinate) => {
                self.edit_criteria(|builder| {
                    let builder = builder.coordinate(Some(coordinate));
                    match radius_km {
                        Some(radius_km) => builder.radius_km(radius_km),
                        None => builder,
                    }
                })
                .await
            }
            Err(e) => {
                let reason = match e {
                    EventLensError::LocationUnavailable(reason) => reason,
                    other => other.to_string(),
                };
                logging::log_location_unavailable(&reason);

                let mut state = self.state.lock().await;
                let issue = QueryIssue::LocationUnavailable(reason);
                state.snapshot.issue = Some(issue.clone());
                self.publish(&state);
                Ok(QueryOutcome::Failed {
                    sequence: state.snapshot.sequence,
                    issue,
                })
            }
        }
    }

    /// Issue the next sequence number and publish the pending state.
    ///
    /// Callers hold the state lock across whatever produced `criteria`.
    fn begin(
        &self,
        state: &mut CoordinatorState,
        criteria: Option<FilterCriteria>,
        refresh: bool,
    ) -> (u64, RetrievalQuery) {
        state.issued += 1;
        let sequence = state.issued;
        if let Some(criteria) = criteria {
            state.snapshot.criteria = criteria;
        }

        let showing_results = matches!(state.snapshot.state, QueryState::Ready | QueryState::Refreshing);
        state.snapshot.state = if refresh && showing_results {
            QueryState::Refreshing
        } else {
            QueryState::Loading
        };
        state.snapshot.issue = None;
        self.publish(state);

        logging::log_query_dispatched(
            sequence,
            state.snapshot.state == QueryState::Refreshing,
            state.snapshot.criteria.coordinate().is_some(),
            Some(state.snapshot.criteria.search()).filter(|s| !s.is_empty()),
        );
        (sequence, state.snapshot.criteria.retrieval_query())
    }

    async fn complete(&self, sequence: u64, query: RetrievalQuery) -> QueryOutcome {
        let started = Instant::now();
        let result = self.source.fetch_events(&query).await;

        let mut state = self.state.lock().await;
        if state.issued != sequence {
            logging::log_stale_response(sequence, state.issued);
            return QueryOutcome::Superseded {
                sequence,
                latest: state.issued,
            };
        }

        state.snapshot.state = QueryState::Ready;
        state.snapshot.sequence = sequence;

        match result {
            Ok(events) => {
                let events = Self::drop_invalid(events);
                // The sort mode may have changed while the request was in flight.
                let groups = self.arrange(&events, &state.snapshot.criteria);
                let (event_count, group_count) = (events.len(), groups.len());

                state.events = Arc::new(events);
                state.snapshot.groups = Arc::from(groups);
                self.publish(&state);

                logging::log_query_completed(
                    sequence,
                    event_count,
                    group_count,
                    started.elapsed().as_millis() as u64,
                );
                QueryOutcome::Published {
                    sequence,
                    events: event_count,
                    groups: group_count,
                }
            }
            Err(e) => {
                logging::log_retrieval_failure(sequence, &e.to_string());

                let issue = QueryIssue::RetrievalFailed(e);
                state.events = Arc::new(Vec::new());
                state.snapshot.groups = Arc::from(Vec::new());
                state.snapshot.issue = Some(issue.clone());
                self.publish(&state);

                QueryOutcome::Failed { sequence, issue }
            }
        }
    }

    fn drop_invalid(events: Vec<Event>) -> Vec<Event> {
        events
            .into_iter()
            .filter(|event| match event.validate() {
                Ok(()) => true,
                Err(e) => {
                    let reason = match &e {
                        EventLensError::InvalidEvent { reason, .. } => reason.clone(),
                        other => other.to_string(),
                    };
                    logging::log_invalid_event(&event.id, &reason);
                    false
                }
            })
            .collect()
    }

    fn arrange(&self, events: &[Event], criteria: &FilterCriteria) -> Vec<EventGroup> {
        let now = (self.clock)();
        let ctx = GroupingContext::at(now, self.zone, self.labels.as_ref());
        engine::arrange(events, criteria, &ctx)
    }

    fn publish(&self, state: &CoordinatorState) {
        self.updates.send_replace(state.snapshot.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::Coordinate;
    use crate::services::location::FixedLocationProvider;
    use crate::services::retrieval::InMemoryEventSource;
    use async_trait::async_trait;
    use chrono::{Offset, TimeZone};

    struct FailingSource;

    #[async_trait]
    impl EventSource for FailingSource {
        async fn fetch_events(
            &self,
            _query: &crate::models::criteria::RetrievalQuery,
        ) -> crate::utils::errors::RetrievalResult<Vec<Event>> {
            Err(RetrievalError::ServiceUnavailable)
        }
    }

    fn event(id: &str, day: u32, location: Coordinate) -> Event {
        Event {
            id: id.to_string(),
            title: format!("Dance {}", id),
            description: None,
            scheduled_at: Utc.with_ymd_and_hms(2024, 9, day, 19, 0, 0).unwrap(),
            uploaded_at: None,
            created_at: Some(Utc.with_ymd_and_hms(2024, 8, day, 10, 0, 0).unwrap()),
            location,
            capacity: None,
            creator_id: "host".to_string(),
            participants: vec![],
            image: None,
            category_id: None,
            sub_category_ids: Default::default(),
        }
    }

    fn fixed_clock() -> Clock {
        Arc::new(|| Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap())
    }

    fn coordinator(events: Vec<Event>) -> QueryCoordinator {
        QueryCoordinator::new(Arc::new(InMemoryEventSource::new(events)), FilterCriteria::default())
            .with_clock(fixed_clock())
            .with_day_zone(DayZone::Fixed(Utc.fix()))
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let coordinator = coordinator(vec![]);
        let snapshot = coordinator.snapshot();
        assert_eq!(snapshot.state, QueryState::Idle);
        assert_eq!(snapshot.sequence, 0);
        assert!(snapshot.groups.is_empty());
    }

    #[tokio::test]
    async fn test_set_criteria_publishes_groups() {
        let origin = Coordinate::new(0.0, 0.0);
        let coordinator = coordinator(vec![event("b", 2, origin), event("a", 1, origin), event("c", 2, origin)]);

        let outcome = coordinator.set_criteria(FilterCriteria::default()).await;
        assert_eq!(outcome, QueryOutcome::Published { sequence: 1, events: 3, groups: 2 });

        let snapshot = coordinator.snapshot();
        assert_eq!(snapshot.state, QueryState::Ready);
        assert_eq!(snapshot.groups[0].label, "Today");
        assert_eq!(snapshot.groups[1].label, "Tomorrow");
        let ids: Vec<&str> = snapshot.groups[1].events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["b", "c"]);
    }

    #[tokio::test]
    async fn test_invalid_events_are_dropped() {
        let mut broken = event("broken", 3, Coordinate::new(0.0, 0.0));
        broken.created_at = None;
        let coordinator = coordinator(vec![broken, event("ok", 3, Coordinate::new(0.0, 0.0))]);

        let outcome = coordinator.set_criteria(FilterCriteria::default()).await;
        assert_eq!(outcome, QueryOutcome::Published { sequence: 1, events: 1, groups: 1 });
    }

    #[tokio::test]
    async fn test_failure_returns_to_ready_with_empty_result() {
        let coordinator = QueryCoordinator::new(Arc::new(FailingSource), FilterCriteria::default());

        let outcome = coordinator.set_criteria(FilterCriteria::default()).await;
        assert_eq!(
            outcome,
            QueryOutcome::Failed {
                sequence: 1,
                issue: QueryIssue::RetrievalFailed(RetrievalError::ServiceUnavailable),
            }
        );

        let snapshot = coordinator.snapshot();
        assert_eq!(snapshot.state, QueryState::Ready);
        assert!(snapshot.groups.is_empty());
        assert!(snapshot.issue.is_some());
    }

    #[tokio::test]
    async fn test_invalid_edit_is_rejected_before_dispatch() {
        let coordinator = coordinator(vec![]);
        let result = coordinator.edit_criteria(|b| b.radius_km(-3.0)).await;
        assert!(matches!(result, Err(EventLensError::InvalidCriteria(_))));
        assert_eq!(coordinator.snapshot().state, QueryState::Idle);
        assert_eq!(coordinator.snapshot().sequence, 0);
    }

    #[tokio::test]
    async fn test_sort_mode_change_reuses_last_events() {
        let near = event("near", 2, Coordinate::new(0.0, 0.1));
        let far = event("far", 1, Coordinate::new(0.0, 2.0));
        let coordinator = coordinator(vec![far, near]);

        coordinator
            .set_criteria(FilterCriteria::builder().coordinate(Some(Coordinate::new(0.0, 0.0))).radius_km(500.0).build().unwrap())
            .await;
        let outcome = coordinator.set_sort_mode(SortMode::DistanceAscending).await.unwrap();
        assert_eq!(outcome, QueryOutcome::Published { sequence: 1, events: 2, groups: 1 });

        let snapshot = coordinator.snapshot();
        assert_eq!(snapshot.groups[0].label, "Nearest first");
        assert_eq!(snapshot.groups[0].events[0].id, "near");
    }

    #[tokio::test]
    async fn test_location_failure_is_published_not_returned() {
        let coordinator = coordinator(vec![]);
        let outcome = coordinator
            .use_current_location(&FixedLocationProvider::new(None), None)
            .await
            .unwrap();
        assert!(matches!(outcome, QueryOutcome::Failed { issue: QueryIssue::LocationUnavailable(_), .. }));
        assert_eq!(coordinator.snapshot().criteria.coordinate(), None);
    }

    #[tokio::test]
    async fn test_location_success_updates_criteria() {
        let here = Coordinate::new(59.93, 30.33);
        let coordinator = coordinator(vec![event("local", 2, here)]);
        let outcome = coordinator
            .use_current_location(&FixedLocationProvider::new(Some(here)), Some(5.0))
            .await
            .unwrap();
        assert_eq!(outcome, QueryOutcome::Published { sequence: 1, events: 1, groups: 1 });

        let criteria = coordinator.snapshot().criteria;
        assert_eq!(criteria.coordinate(), Some(here));
        assert_eq!(criteria.radius_km(), 5.0);
    }

    #[tokio::test]
    async fn test_day_zone_defaults_to_host_and_honors_override() {
        let source: Arc<dyn EventSource> = Arc::new(InMemoryEventSource::default());
        let mut settings = Settings::default();
        let default_zone = QueryCoordinator::from_settings(&settings, Arc::clone(&source)).unwrap();
        assert_eq!(default_zone.day_zone(), DayZone::Local);

        settings.query.utc_offset_minutes = Some(180);
        let moscow = QueryCoordinator::from_settings(&settings, source).unwrap();
        let expected = chrono::FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(moscow.day_zone(), DayZone::Fixed(expected));
    }

    #[tokio::test]
    async fn test_default_zone_splits_days_at_host_midnight() {
        let origin = Coordinate::new(0.0, 0.0);
        let mut late = event("late", 14, origin);
        late.scheduled_at = Utc.with_ymd_and_hms(2024, 9, 14, 20, 30, 0).unwrap();
        let mut later = event("later", 14, origin);
        later.scheduled_at = Utc.with_ymd_and_hms(2024, 9, 14, 22, 0, 0).unwrap();

        let coordinator = QueryCoordinator::new(
            Arc::new(InMemoryEventSource::new(vec![late.clone(), later.clone()])),
            FilterCriteria::default(),
        )
        .with_clock(fixed_clock());
        coordinator.set_criteria(FilterCriteria::default()).await;

        let days: Vec<_> = coordinator.snapshot().groups.iter().filter_map(|g| g.date).collect();
        let mut expected = vec![DayZone::Local.day_of(late.scheduled_at)];
        if DayZone::Local.day_of(later.scheduled_at) != expected[0] {
            expected.push(DayZone::Local.day_of(later.scheduled_at));
        }
        assert_eq!(days, expected);
    }
}
