//! Receivers that resolve pending callbacks
//!
//! All of them share one shape: queue decoded responses, and on each tick
//! match the oldest one against a registry. What differs is which registry
//! they resolve against and what happens to a response nobody asked for,
//! so both are plain function pointers.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::{decode, Drainable, Receiver, TickContext};
use crate::error::ClientError;
use crate::events::{ClientEvent, Dispatch};
use crate::protocol::{
    ActionCode, ConfigState, Correlated, LicenseChangeResponse, LicenseStateResponse,
    ServiceStatus, TrackingStateResponse, WebSocketResponse,
};
use crate::registry::{RegistrySelector, Resolution};

/// Called with a response that matched no pending request
type Unmatched<T> = fn(T, &mut TickContext<'_>);

pub struct CallbackReceiver<T> {
    name: &'static str,
    codes: &'static [ActionCode],
    queue: Drainable<T>,
    registry: RegistrySelector<T>,
    unmatched: Unmatched<T>,
}

impl<T> CallbackReceiver<T>
where
    T: Correlated + DeserializeOwned + Send + 'static,
{
    pub fn new(
        name: &'static str,
        codes: &'static [ActionCode],
        registry: RegistrySelector<T>,
        unmatched: Unmatched<T>,
    ) -> Self {
        Self {
            name,
            codes,
            queue: Drainable::default(),
            registry,
            unmatched,
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl<T> Receiver for CallbackReceiver<T>
where
    T: Correlated + DeserializeOwned + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn action_codes(&self) -> &[ActionCode] {
        self.codes
    }

    fn receive(&mut self, action: ActionCode, content: Value) -> Result<(), ClientError> {
        let response = decode(self.name, action, content)?;
        self.queue.push(response);
        Ok(())
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        let Some(response) = self.queue.pop() else {
            return;
        };

        match (self.registry)(ctx.registries).resolve(response) {
            Resolution::Success => {}
            Resolution::NoCallbacksFound(response) => (self.unmatched)(response, ctx),
            Resolution::MissingRequestId(response) => {
                warn!(receiver = self.name, "Response carried no requestID");
                (self.unmatched)(response, ctx)
            }
        }
    }
}

fn log_unmatched<T: Correlated>(response: T, _ctx: &mut TickContext<'_>) {
    warn!(
        request_id = response.request_id(),
        "Received a response with no matching pending request"
    );
}

/// Unsolicited service status is a broadcast, not an error
fn publish_service_status(status: ServiceStatus, ctx: &mut TickContext<'_>) {
    if let Some(state) = status.tracking_service_state {
        ctx.defer(Dispatch::Event(ClientEvent::TrackingServiceStateChanged(state)));
    }
    ctx.defer(Dispatch::Event(ClientEvent::ServiceStatusChanged(status)));
}

fn publish_license_state(response: LicenseStateResponse, ctx: &mut TickContext<'_>) {
    ctx.defer(Dispatch::Event(ClientEvent::LicenseStateChanged(
        response.license_state,
    )));
}

/// Acknowledgements for configuration, status, config-file and quick setup requests
pub fn response_receiver() -> CallbackReceiver<WebSocketResponse> {
    CallbackReceiver::new(
        "response",
        &[
            ActionCode::ConfigurationResponse,
            ActionCode::ServiceStatusResponse,
            ActionCode::ConfigurationFileChangeResponse,
            ActionCode::QuickSetupResponse,
        ],
        |registries| &mut registries.response,
        log_unmatched,
    )
}

pub fn config_state_receiver() -> CallbackReceiver<ConfigState> {
    CallbackReceiver::new(
        "config-state",
        &[
            ActionCode::ConfigurationState,
            ActionCode::ConfigurationFileState,
            ActionCode::QuickSetupConfig,
        ],
        |registries| &mut registries.config_state,
        log_unmatched,
    )
}

pub fn service_status_receiver() -> CallbackReceiver<ServiceStatus> {
    CallbackReceiver::new(
        "service-status",
        &[ActionCode::ServiceStatus],
        |registries| &mut registries.service_status,
        publish_service_status,
    )
}

pub fn tracking_state_receiver() -> CallbackReceiver<TrackingStateResponse> {
    CallbackReceiver::new(
        "tracking-state",
        &[ActionCode::TrackingState],
        |registries| &mut registries.tracking_state,
        log_unmatched,
    )
}

/// The service echoes analytics requests back with the same action code
pub fn analytics_receiver() -> CallbackReceiver<WebSocketResponse> {
    CallbackReceiver::new(
        "analytics",
        &[
            ActionCode::AnalyticsSessionRequest,
            ActionCode::AnalyticsUpdateSessionEventsRequest,
        ],
        |registries| &mut registries.analytics,
        log_unmatched,
    )
}

pub fn license_state_receiver() -> CallbackReceiver<LicenseStateResponse> {
    CallbackReceiver::new(
        "license-state",
        &[ActionCode::LicenseState, ActionCode::LicenseStateResponse],
        |registries| &mut registries.license_state,
        publish_license_state,
    )
}

pub fn license_change_receiver() -> CallbackReceiver<LicenseChangeResponse> {
    CallbackReceiver::new(
        "license-change",
        &[ActionCode::LicenseChangeResponse],
        |registries| &mut registries.license_change,
        log_unmatched,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::HandshakeState;
    use crate::protocol::{LicenseState, TrackingServiceState};
    use crate::registry::Registries;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use touchfree_config::TimingConfig;

    struct Harness {
        registries: Registries,
        handshake: HandshakeState,
        deferred: VecDeque<Dispatch>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                registries: Registries::new(&TimingConfig::default()),
                handshake: HandshakeState::default(),
                deferred: VecDeque::new(),
            }
        }

        fn tick(&mut self, receiver: &mut dyn Receiver) {
            let mut ctx = TickContext {
                registries: &mut self.registries,
                handshake: &mut self.handshake,
                deferred: &mut self.deferred,
            };
            receiver.tick(&mut ctx);
        }
    }

    #[test]
    fn test_receive_defers_until_tick() {
        let mut harness = Harness::new();
        let seen: Arc<Mutex<Vec<String>>> = Arc::default();
        let log = Arc::clone(&seen);
        harness
            .registries
            .response
            .register(
                "r1",
                Box::new(move |result| {
                    log.lock().unwrap().push(result.unwrap().message);
                }),
            )
            .unwrap();

        let mut receiver = response_receiver();
        receiver
            .receive(
                ActionCode::ConfigurationResponse,
                json!({ "requestID": "r1", "status": "Success", "message": "saved" }),
            )
            .unwrap();

        // Receiving only buffers
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(receiver.pending(), 1);

        harness.tick(&mut receiver);
        assert_eq!(*seen.lock().unwrap(), vec!["saved".to_string()]);
        assert!(harness.registries.response.is_empty());
    }

    #[test]
    fn test_one_response_per_tick() {
        let mut harness = Harness::new();
        let mut receiver = response_receiver();
        for id in ["a", "b"] {
            receiver
                .receive(
                    ActionCode::ServiceStatusResponse,
                    json!({ "requestID": id, "status": "Success" }),
                )
                .unwrap();
        }

        harness.tick(&mut receiver);
        assert_eq!(receiver.pending(), 1);
        harness.tick(&mut receiver);
        assert_eq!(receiver.pending(), 0);
    }

    #[test]
    fn test_unsolicited_service_status_publishes_events() {
        let mut harness = Harness::new();
        let mut receiver = service_status_receiver();
        receiver
            .receive(
                ActionCode::ServiceStatus,
                json!({ "requestID": "", "trackingServiceState": "CONNECTED" }),
            )
            .unwrap();

        harness.tick(&mut receiver);
        let events: Vec<_> = harness.deferred.drain(..).collect();
        assert_eq!(
            events[0],
            Dispatch::Event(ClientEvent::TrackingServiceStateChanged(
                TrackingServiceState::Connected
            ))
        );
        assert!(matches!(
            events[1],
            Dispatch::Event(ClientEvent::ServiceStatusChanged(_))
        ));
    }

    #[test]
    fn test_requested_service_status_does_not_broadcast() {
        let mut harness = Harness::new();
        harness
            .registries
            .service_status
            .register("s1", Box::new(|_| {}))
            .unwrap();

        let mut receiver = service_status_receiver();
        receiver
            .receive(
                ActionCode::ServiceStatus,
                json!({ "requestID": "s1", "trackingServiceState": "NO_CAMERA" }),
            )
            .unwrap();
        harness.tick(&mut receiver);
        assert!(harness.deferred.is_empty());
    }

    #[test]
    fn test_unsolicited_license_state_publishes_event() {
        let mut harness = Harness::new();
        let mut receiver = license_state_receiver();
        receiver
            .receive(
                ActionCode::LicenseState,
                json!({ "requestID": "", "licenseState": "CAMERA_UNLICENSED" }),
            )
            .unwrap();
        harness.tick(&mut receiver);
        assert_eq!(
            harness.deferred.pop_front(),
            Some(Dispatch::Event(ClientEvent::LicenseStateChanged(
                LicenseState::CameraUnlicensed
            )))
        );
    }

    #[test]
    fn test_malformed_content_is_rejected_at_receive() {
        let mut receiver = license_change_receiver();
        let err = receiver
            .receive(ActionCode::LicenseChangeResponse, json!({ "requestID": 5 }))
            .unwrap_err();
        assert!(matches!(err, ClientError::MalformedMessage { .. }));
        assert_eq!(receiver.pending(), 0);
    }
}
