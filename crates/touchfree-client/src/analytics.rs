//! Analytics session state
//!
//! At most one session is active per client. Event counts accumulate for the
//! lifetime of the session and are re-sent in full on every heartbeat; they
//! are only cleared when the session stops.

use std::collections::BTreeMap;
use std::time::Instant;

use uuid::Uuid;

use crate::protocol::{AnalyticsEventsRequest, AnalyticsRequestType, AnalyticsSessionRequest};

#[derive(Debug)]
pub struct AnalyticsSession {
    session_id: String,
    started_at: Instant,
    events: BTreeMap<String, u64>,
}

impl AnalyticsSession {
    /// New session with an ID of the form `application:uuid`
    pub fn new(application_name: &str) -> Self {
        Self {
            session_id: format!("{}:{}", application_name, Uuid::new_v4()),
            started_at: Instant::now(),
            events: BTreeMap::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn record(&mut self, event: &str) {
        *self.events.entry(event.to_string()).or_insert(0) += 1;
    }

    pub fn events(&self) -> &BTreeMap<String, u64> {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn session_request(
        &self,
        request_id: String,
        request_type: AnalyticsRequestType,
    ) -> AnalyticsSessionRequest {
        AnalyticsSessionRequest {
            request_id,
            session_id: self.session_id.clone(),
            request_type,
        }
    }

    pub fn events_request(&self, request_id: String) -> AnalyticsEventsRequest {
        AnalyticsEventsRequest {
            request_id,
            session_id: self.session_id.clone(),
            session_events: self.events.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_prefixed_with_application() {
        let session = AnalyticsSession::new("kiosk");
        let (app, id) = session.session_id().split_once(':').unwrap();
        assert_eq!(app, "kiosk");
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_sessions_are_unique() {
        let a = AnalyticsSession::new("kiosk");
        let b = AnalyticsSession::new("kiosk");
        assert_ne!(a.session_id(), b.session_id());
    }

    #[test]
    fn test_counts_accumulate_until_cleared() {
        let mut session = AnalyticsSession::new("kiosk");
        session.record("click");
        session.record("click");
        session.record("hover");

        let request = session.events_request("r".to_string());
        assert_eq!(request.session_events["click"], 2);
        assert_eq!(request.session_events["hover"], 1);

        // Heartbeats do not reset counts
        assert_eq!(session.events().len(), 2);

        session.clear();
        assert!(session.events_request("r2".to_string()).session_events.is_empty());
    }

    #[test]
    fn test_session_request_payload() {
        let session = AnalyticsSession::new("kiosk");
        let request = session.session_request("r".to_string(), AnalyticsRequestType::Start);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["requestType"], "START");
        assert_eq!(json["sessionID"], session.session_id());
    }
}
