//! Device location collaborator

use async_trait::async_trait;

use crate::models::event::Coordinate;
use crate::utils::errors::{EventLensError, Result};

/// Source of the user's current position
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Fails with [`EventLensError::LocationUnavailable`] when permission is
    /// denied or no fix can be obtained.
    async fn current_location(&self) -> Result<Coordinate>;
}

/// Location supplied up front, e.g. from command line flags
#[derive(Debug, Clone, Default)]
pub struct FixedLocationProvider {
    location: Option<Coordinate>,
}

impl FixedLocationProvider {
    pub fn new(location: Option<Coordinate>) -> Self {
        Self { location }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_location(&self) -> Result<Coordinate> {
        match self.location {
            Some(location) if location.is_valid() => Ok(location),
            Some(location) => Err(EventLensError::LocationUnavailable(format!(
                "reported position {} is out of range",
                location
            ))),
            None => Err(EventLensError::LocationUnavailable("no position fix".to_string())),
        }
    }
}
