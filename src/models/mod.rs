//! Data models module
//!
//! This module contains all data structures used throughout the crate

pub mod event;
pub mod criteria;
pub mod group;

// Re-export commonly used models
pub use event::{Event, Participant, ParticipantStatus, ParticipantKind, Coordinate};
pub use criteria::{FilterCriteria, FilterCriteriaBuilder, DateWindow, SortMode, RetrievalQuery, NearFilter, DEFAULT_RADIUS_KM};
pub use group::EventGroup;
