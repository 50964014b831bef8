//! Mock event backend for testing
//!
//! Uses wiremock to stand in for the remote service read by the HTTP event
//! source.

use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use EventLens::models::Event;

/// Mock event backend serving `/api/events`
pub struct EventMockServer {
    pub server: MockServer,
}

impl EventMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to configure the HTTP source with
    pub fn base_url(&self) -> String {
        format!("{}/api", self.server.uri())
    }

    /// Answer every events request with `events`
    pub async fn mock_events(&self, events: &[Event]) {
        Mock::given(method("GET"))
            .and(path("/api/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(events)))
            .mount(&self.server)
            .await;
    }

    /// Answer every events request with `status`
    pub async fn mock_error(&self, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path("/api/events"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Answer with a body that is not an event list
    pub async fn mock_malformed(&self) {
        Mock::given(method("GET"))
            .and(path("/api/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "events": "soon" })))
            .mount(&self.server)
            .await;
    }

    pub async fn reset(&self) {
        self.server.reset().await;
    }
}
