//! Inbound message routing
//!
//! The route table is built once from the receivers' declared action codes
//! and never changes afterwards. Construction fails if two receivers claim
//! the same code, so routing is always unambiguous.

use std::collections::HashMap;

use touchfree_config::TimingConfig;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::protocol::{ActionCode, RawEnvelope};
use crate::receiver::{
    callbacks, edge, HandshakeReceiver, InputActionReceiver, Receiver, TickContext,
};

pub struct MessageRouter {
    receivers: Vec<Box<dyn Receiver>>,
    routes: HashMap<ActionCode, usize>,
}

impl MessageRouter {
    /// Build a router over `receivers`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::EmptyReceiver` if a receiver declares no codes.
    /// Returns `ClientError::OverlappingActionCode` if two receivers share one.
    pub fn new(receivers: Vec<Box<dyn Receiver>>) -> Result<Self, ClientError> {
        let mut routes: HashMap<ActionCode, usize> = HashMap::new();

        for (index, receiver) in receivers.iter().enumerate() {
            if receiver.action_codes().is_empty() {
                return Err(ClientError::EmptyReceiver {
                    receiver: receiver.name(),
                });
            }

            for &code in receiver.action_codes() {
                if let Some(&existing) = routes.get(&code) {
                    return Err(ClientError::OverlappingActionCode {
                        code,
                        first: receivers[existing].name(),
                        second: receiver.name(),
                    });
                }
                routes.insert(code, index);
            }
        }

        debug!(
            receivers = receivers.len(),
            routes = routes.len(),
            "Built message route table"
        );
        Ok(Self { receivers, routes })
    }

    /// The standard receiver set
    pub fn with_default_receivers(timing: &TimingConfig) -> Result<Self, ClientError> {
        let receivers: Vec<Box<dyn Receiver>> = vec![
            Box::new(HandshakeReceiver::default()),
            Box::new(callbacks::response_receiver()),
            Box::new(callbacks::config_state_receiver()),
            Box::new(callbacks::service_status_receiver()),
            Box::new(callbacks::tracking_state_receiver()),
            Box::new(edge::hand_presence_receiver()),
            Box::new(edge::interaction_zone_receiver()),
            Box::new(InputActionReceiver::new(timing.input_action_cull_to)),
            Box::new(callbacks::analytics_receiver()),
            Box::new(callbacks::license_state_receiver()),
            Box::new(callbacks::license_change_receiver()),
        ];
        Self::new(receivers)
    }

    /// Name of the receiver that owns `code`
    pub fn receiver_for(&self, code: ActionCode) -> Option<&'static str> {
        self.routes
            .get(&code)
            .map(|&index| self.receivers[index].name())
    }

    /// Parse one text frame and hand it to its receiver.
    ///
    /// Codes this client does not know, or knows but never receives, are
    /// logged and dropped. Only undecodable messages are errors.
    pub fn route(&mut self, text: &str) -> Result<(), ClientError> {
        let envelope: RawEnvelope =
            serde_json::from_str(text).map_err(|source| ClientError::MalformedMessage {
                context: "message envelope".to_string(),
                source,
            })?;

        let code = match envelope.action.parse::<ActionCode>() {
            Ok(code) => code,
            Err(err) => {
                debug!(%err, "Dropping message");
                return Ok(());
            }
        };

        let Some(&index) = self.routes.get(&code) else {
            warn!(action = %code, "No receiver for action code");
            return Ok(());
        };

        self.receivers[index].receive(code, envelope.content)
    }

    /// Give every receiver one tick, in registration order.
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) {
        for receiver in &mut self.receivers {
            receiver.tick(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::HandshakeState;
    use crate::registry::Registries;
    use serde_json::Value;
    use std::collections::VecDeque;

    struct Stub {
        name: &'static str,
        codes: &'static [ActionCode],
        received: Vec<ActionCode>,
    }

    impl Stub {
        fn boxed(name: &'static str, codes: &'static [ActionCode]) -> Box<dyn Receiver> {
            Box::new(Stub {
                name,
                codes,
                received: Vec::new(),
            })
        }
    }

    impl Receiver for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        fn action_codes(&self) -> &[ActionCode] {
            self.codes
        }

        fn receive(&mut self, action: ActionCode, _content: Value) -> Result<(), ClientError> {
            self.received.push(action);
            Ok(())
        }

        fn tick(&mut self, _ctx: &mut TickContext<'_>) {}
    }

    #[test]
    fn test_default_receivers_are_disjoint() {
        let router = MessageRouter::with_default_receivers(&TimingConfig::default()).unwrap();

        assert_eq!(router.receiver_for(ActionCode::VersionHandshakeResponse), Some("handshake"));
        assert_eq!(router.receiver_for(ActionCode::QuickSetupResponse), Some("response"));
        assert_eq!(router.receiver_for(ActionCode::QuickSetupConfig), Some("config-state"));
        assert_eq!(router.receiver_for(ActionCode::LicenseStateResponse), Some("license-state"));
        assert_eq!(router.receiver_for(ActionCode::LicenseChangeResponse), Some("license-change"));
        assert_eq!(router.receiver_for(ActionCode::InputAction), Some("input-action"));

        // Outbound-only codes have no receiver
        assert_eq!(router.receiver_for(ActionCode::VersionHandshake), None);
        assert_eq!(router.receiver_for(ActionCode::AddLicenseKey), None);
    }

    #[test]
    fn test_overlapping_codes_rejected() {
        let result = MessageRouter::new(vec![
            Stub::boxed("first", &[ActionCode::ServiceStatus, ActionCode::TrackingState]),
            Stub::boxed("second", &[ActionCode::TrackingState]),
        ]);

        match result {
            Err(ClientError::OverlappingActionCode { code, first, second }) => {
                assert_eq!(code, ActionCode::TrackingState);
                assert_eq!(first, "first");
                assert_eq!(second, "second");
            }
            Err(e) => panic!("Expected OverlappingActionCode, got {:?}", e),
            Ok(_) => panic!("Expected OverlappingActionCode, got a router"),
        }
    }

    #[test]
    fn test_empty_receiver_rejected() {
        let result = MessageRouter::new(vec![Stub::boxed("empty", &[])]);
        assert!(matches!(
            result,
            Err(ClientError::EmptyReceiver { receiver: "empty" })
        ));
    }

    #[test]
    fn test_route_unknown_code_is_dropped() {
        let mut router =
            MessageRouter::new(vec![Stub::boxed("status", &[ActionCode::ServiceStatus])]).unwrap();

        router
            .route(r#"{"action":"SOMETHING_NEW","content":{}}"#)
            .unwrap();
        router
            .route(r#"{"action":"TRACKING_STATE","content":{}}"#)
            .unwrap();
    }

    #[test]
    fn test_route_malformed_envelope() {
        let mut router = MessageRouter::new(vec![Stub::boxed("status", &[ActionCode::ServiceStatus])]).unwrap();
        let err = router.route("not json").unwrap_err();
        assert!(matches!(err, ClientError::MalformedMessage { .. }));
    }

    #[test]
    fn test_route_reaches_receiver_and_tick_is_deferred() {
        let mut router =
            MessageRouter::with_default_receivers(&TimingConfig::default()).unwrap();
        let mut registries = Registries::new(&TimingConfig::default());
        let mut handshake = HandshakeState::default();
        let mut deferred = VecDeque::new();

        router
            .route(r#"{"action":"HAND_PRESENCE_EVENT","content":{"state":"HAND_FOUND"}}"#)
            .unwrap();
        assert!(deferred.is_empty());

        let mut ctx = TickContext {
            registries: &mut registries,
            handshake: &mut handshake,
            deferred: &mut deferred,
        };
        router.tick(&mut ctx);
        assert_eq!(deferred.len(), 1);
    }
}
