//! Event source whose responses are released by the test
//!
//! Each response is keyed by the query's search text. A fetch for a key that
//! has a gate waits until the test sends a result through it; a fetch for an
//! unknown key answers immediately with no events.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use EventLens::models::{Event, RetrievalQuery};
use EventLens::services::EventSource;
use EventLens::utils::errors::{RetrievalError, RetrievalResult};

pub type Gate = oneshot::Sender<RetrievalResult<Vec<Event>>>;

#[derive(Default)]
pub struct GatedEventSource {
    gates: Mutex<HashMap<String, oneshot::Receiver<RetrievalResult<Vec<Event>>>>>,
    calls: AtomicUsize,
    queries: Mutex<Vec<RetrievalQuery>>,
}

impl GatedEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold the next fetch for `search` until the returned sender fires
    pub fn gate(&self, search: &str) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(search.to_string(), rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<RetrievalQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSource for GatedEventSource {
    async fn fetch_events(&self, query: &RetrievalQuery) -> RetrievalResult<Vec<Event>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());

        let key = query.search.clone().unwrap_or_default();
        let gate = self.gates.lock().unwrap().remove(&key);
        match gate {
            Some(rx) => rx.await.unwrap_or(Err(RetrievalError::ServiceUnavailable)),
            None => Ok(Vec::new()),
        }
    }
}
