//! Event retrieval sources
//!
//! The coordinator only depends on the [`EventSource`] trait. This module also
//! provides the sources the binary can be configured with: an in-memory list,
//! a JSON file on disk and a JSON-over-HTTP backend.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::models::criteria::RetrievalQuery;
use crate::models::event::Event;
use crate::utils::errors::{EventLensError, Result, RetrievalError, RetrievalResult};

/// Anything that can produce the events matching a [`RetrievalQuery`]
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_events(&self, query: &RetrievalQuery) -> RetrievalResult<Vec<Event>>;
}

/// Events held in memory, filtered locally
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventSource {
    events: Vec<Event>,
}

impl InMemoryEventSource {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Seed from a JSON array on disk, read once
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let events = read_events(path).await?;
        info!(path = %path.display(), count = events.len(), "Loaded events into memory");
        Ok(Self::new(events))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl EventSource for InMemoryEventSource {
    async fn fetch_events(&self, query: &RetrievalQuery) -> RetrievalResult<Vec<Event>> {
        let matching: Vec<Event> = self.events.iter().filter(|e| query.matches(e)).cloned().collect();
        debug!(total = self.events.len(), matching = matching.len(), "Filtered in-memory events");
        Ok(matching)
    }
}

/// Events read from a JSON array on disk on every fetch
#[derive(Debug, Clone)]
pub struct FileEventSource {
    path: PathBuf,
}

impl FileEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl EventSource for FileEventSource {
    async fn fetch_events(&self, query: &RetrievalQuery) -> RetrievalResult<Vec<Event>> {
        let events = read_events(&self.path).await?;

        let total = events.len();
        let matching: Vec<Event> = events.into_iter().filter(|e| query.matches(e)).collect();
        debug!(path = %self.path.display(), total = total, matching = matching.len(), "Filtered events from file");
        Ok(matching)
    }
}

async fn read_events(path: &Path) -> RetrievalResult<Vec<Event>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RetrievalError::ServiceUnavailable
        } else {
            RetrievalError::RequestFailed(format!("{}: {}", path.display(), e))
        }
    })?;

    serde_json::from_str(&content).map_err(|e| RetrievalError::InvalidResponse(e.to_string()))
}

/// Remote event backend that filters server-side
#[derive(Debug, Clone)]
pub struct HttpEventSource {
    client: Client,
    base_url: Url,
}

impl HttpEventSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("EventLens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(EventLensError::Http)?;

        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
        })
    }

    /// Full request URL for `query`
    pub fn request_url(&self, query: &RetrievalQuery) -> Result<Url> {
        let mut url = self.base_url.join("events")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(search) = &query.search {
                pairs.append_pair("q", search);
            }
            if let Some(near) = &query.near {
                pairs.append_pair("lat", &near.center.latitude.to_string());
                pairs.append_pair("lon", &near.center.longitude.to_string());
                pairs.append_pair("radius_km", &near.radius_km.to_string());
            }
            if let Some(start) = query.dates.start() {
                pairs.append_pair("from", &start.to_rfc3339());
            }
            if let Some(end) = query.dates.end() {
                pairs.append_pair("to", &end.to_rfc3339());
            }
            if let Some(category_id) = &query.category_id {
                pairs.append_pair("category", category_id);
            }
            for sub_category_id in &query.sub_category_ids {
                pairs.append_pair("sub_category", sub_category_id);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn fetch_events(&self, query: &RetrievalQuery) -> RetrievalResult<Vec<Event>> {
        let url = self
            .request_url(query)
            .map_err(|e| RetrievalError::RequestFailed(e.to_string()))?;

        debug!(url = %url, "Requesting events");

        let response = self.client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RetrievalError::Timeout
                } else if e.is_connect() {
                    RetrievalError::ServiceUnavailable
                } else {
                    RetrievalError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::RequestFailed(format!("HTTP {}: {}", status, error_text)));
        }

        response
            .json::<Vec<Event>>()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::criteria::FilterCriteria;
    use crate::models::event::Coordinate;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_request_url_carries_only_set_filters() {
        let source = HttpEventSource::new("http://localhost:9000/api", Duration::from_secs(1)).unwrap();

        let bare = source.request_url(&FilterCriteria::default().retrieval_query()).unwrap();
        assert_eq!(bare.as_str(), "http://localhost:9000/api/events");

        let criteria = FilterCriteria::builder()
            .search("lindy hop")
            .coordinate(Some(Coordinate::new(55.75, 37.62)))
            .radius_km(10.0)
            .starts_after(Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()))
            .category(Some("social".to_string()))
            .sub_categories(["balboa", "lindy"])
            .build()
            .unwrap();
        let url = source.request_url(&criteria.retrieval_query()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(pairs.contains(&("q".to_string(), "lindy hop".to_string())));
        assert!(pairs.contains(&("radius_km".to_string(), "10".to_string())));
        assert!(pairs.contains(&("from".to_string(), "2024-05-01T00:00:00+00:00".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "to"));
        assert_eq!(pairs.iter().filter(|(k, _)| k == "sub_category").count(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let source = FileEventSource::new("/definitely/not/here/events.json");
        let result = source.fetch_events(&RetrievalQuery::default()).await;
        assert_eq!(result.unwrap_err(), RetrievalError::ServiceUnavailable);
    }

    #[tokio::test]
    async fn test_malformed_file_is_invalid_response() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = FileEventSource::new(&path).fetch_events(&RetrievalQuery::default()).await;
        assert!(matches!(result, Err(RetrievalError::InvalidResponse(_))));
    }
}
