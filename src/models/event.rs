//! Event model

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::errors::{EventLensError, Result};

/// A point on the globe in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Whether both components are finite and inside their valid ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to `other` in kilometers
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        crate::engine::geo::distance_km(*self, *other)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Invited,
    Requested,
    Accepted,
    Declined,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    User,
    NonUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub status: ParticipantStatus,
    #[serde(default = "default_participant_kind")]
    pub kind: ParticipantKind,
}

fn default_participant_kind() -> ParticipantKind {
    ParticipantKind::User
}

impl Participant {
    pub fn new(id: impl Into<String>, status: ParticipantStatus, kind: ParticipantKind) -> Self {
        Self {
            id: id.into(),
            status,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub location: Coordinate,
    /// `None` means unlimited
    #[serde(default)]
    pub capacity: Option<u32>,
    pub creator_id: String,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub sub_category_ids: BTreeSet<String>,
}

impl Event {
    /// Upload time if present, otherwise creation time.
    pub fn recency_timestamp(&self) -> Option<DateTime<Utc>> {
        self.uploaded_at.or(self.created_at)
    }

    /// Number of participants counted as attending
    pub fn effective_participants(&self) -> usize {
        crate::engine::participation::effective_count(self)
    }

    /// Check the invariants the ordering engine relies on
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(EventLensError::InvalidEvent {
                event_id: self.id.clone(),
                reason: "identifier is empty".to_string(),
            });
        }

        if self.recency_timestamp().is_none() {
            return Err(EventLensError::InvalidEvent {
                event_id: self.id.clone(),
                reason: "neither upload nor creation time is set".to_string(),
            });
        }

        if !self.location.is_valid() {
            return Err(EventLensError::InvalidEvent {
                event_id: self.id.clone(),
                reason: format!("location {} is out of range", self.location),
            });
        }

        Ok(())
    }
}
