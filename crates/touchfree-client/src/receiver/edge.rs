//! Edge-triggered state receivers (hand presence, interaction zone)

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{decode, LatestValue, Receiver, TickContext};
use crate::error::ClientError;
use crate::events::{ClientEvent, Dispatch};
use crate::protocol::{
    ActionCode, HandPresenceEvent, HandPresenceState, InteractionZoneEvent, InteractionZoneState,
};

/// Keeps only the latest state and publishes each change once
pub struct EdgeReceiver<P, S> {
    name: &'static str,
    codes: &'static [ActionCode],
    state: fn(P) -> S,
    to_event: fn(S) -> ClientEvent,
    slot: LatestValue<S>,
}

impl<P, S> EdgeReceiver<P, S>
where
    P: DeserializeOwned,
    S: PartialEq + Clone + Send,
{
    pub fn new(
        name: &'static str,
        codes: &'static [ActionCode],
        state: fn(P) -> S,
        to_event: fn(S) -> ClientEvent,
    ) -> Self {
        Self {
            name,
            codes,
            state,
            to_event,
            slot: LatestValue::default(),
        }
    }

    pub fn current(&self) -> Option<&S> {
        self.slot.current()
    }
}

impl<P, S> Receiver for EdgeReceiver<P, S>
where
    P: DeserializeOwned,
    S: PartialEq + Clone + Send,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn action_codes(&self) -> &[ActionCode] {
        self.codes
    }

    fn receive(&mut self, action: ActionCode, content: Value) -> Result<(), ClientError> {
        let payload: P = decode(self.name, action, content)?;
        self.slot.set((self.state)(payload));
        Ok(())
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        if let Some(state) = self.slot.take_pending() {
            ctx.defer(Dispatch::Event((self.to_event)(state)));
        }
    }
}

pub fn hand_presence_receiver() -> EdgeReceiver<HandPresenceEvent, HandPresenceState> {
    EdgeReceiver::new(
        "hand-presence",
        &[ActionCode::HandPresenceEvent],
        |event: HandPresenceEvent| event.state,
        |state: HandPresenceState| match state {
            HandPresenceState::HandFound => ClientEvent::HandFound,
            HandPresenceState::HandsLost => ClientEvent::HandsLost,
        },
    )
}

pub fn interaction_zone_receiver() -> EdgeReceiver<InteractionZoneEvent, InteractionZoneState> {
    EdgeReceiver::new(
        "interaction-zone",
        &[ActionCode::InteractionZoneEvent],
        |event: InteractionZoneEvent| event.state,
        |state: InteractionZoneState| match state {
            InteractionZoneState::HandEntered => ClientEvent::HandEntered,
            InteractionZoneState::HandExited => ClientEvent::HandExited,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::HandshakeState;
    use crate::registry::Registries;
    use serde_json::json;
    use std::collections::VecDeque;
    use touchfree_config::TimingConfig;

    fn tick(receiver: &mut dyn Receiver, deferred: &mut VecDeque<Dispatch>) {
        let mut registries = Registries::new(&TimingConfig::default());
        let mut handshake = HandshakeState::default();
        let mut ctx = TickContext {
            registries: &mut registries,
            handshake: &mut handshake,
            deferred,
        };
        receiver.tick(&mut ctx);
    }

    fn presence(state: &str) -> Value {
        json!({ "state": state })
    }

    #[test]
    fn test_repeated_state_publishes_once() {
        let mut receiver = hand_presence_receiver();
        let mut deferred = VecDeque::new();

        receiver.receive(ActionCode::HandPresenceEvent, presence("HAND_FOUND")).unwrap();
        tick(&mut receiver, &mut deferred);
        receiver.receive(ActionCode::HandPresenceEvent, presence("HAND_FOUND")).unwrap();
        tick(&mut receiver, &mut deferred);
        tick(&mut receiver, &mut deferred);

        assert_eq!(
            deferred.into_iter().collect::<Vec<_>>(),
            vec![Dispatch::Event(ClientEvent::HandFound)]
        );
    }

    #[test]
    fn test_alternating_states_each_publish() {
        let mut receiver = hand_presence_receiver();
        let mut deferred = VecDeque::new();

        for state in ["HAND_FOUND", "HANDS_LOST", "HAND_FOUND"] {
            receiver.receive(ActionCode::HandPresenceEvent, presence(state)).unwrap();
            tick(&mut receiver, &mut deferred);
        }

        assert_eq!(
            deferred.into_iter().collect::<Vec<_>>(),
            vec![
                Dispatch::Event(ClientEvent::HandFound),
                Dispatch::Event(ClientEvent::HandsLost),
                Dispatch::Event(ClientEvent::HandFound),
            ]
        );
    }

    #[test]
    fn test_burst_between_ticks_keeps_latest() {
        let mut receiver = interaction_zone_receiver();
        let mut deferred = VecDeque::new();

        receiver
            .receive(ActionCode::InteractionZoneEvent, json!({ "state": "HAND_ENTERED" }))
            .unwrap();
        receiver
            .receive(ActionCode::InteractionZoneEvent, json!({ "state": "HAND_EXITED" }))
            .unwrap();
        tick(&mut receiver, &mut deferred);

        assert_eq!(
            deferred.into_iter().collect::<Vec<_>>(),
            vec![Dispatch::Event(ClientEvent::HandExited)]
        );
        assert_eq!(receiver.current(), Some(&InteractionZoneState::HandExited));
    }

    #[test]
    fn test_numeric_states_decode() {
        let mut receiver = hand_presence_receiver();
        let mut deferred = VecDeque::new();

        receiver.receive(ActionCode::HandPresenceEvent, json!({ "state": 0 })).unwrap();
        tick(&mut receiver, &mut deferred);
        receiver.receive(ActionCode::HandPresenceEvent, json!({ "state": 1 })).unwrap();
        tick(&mut receiver, &mut deferred);

        assert_eq!(
            deferred.into_iter().collect::<Vec<_>>(),
            vec![
                Dispatch::Event(ClientEvent::HandFound),
                Dispatch::Event(ClientEvent::HandsLost),
            ]
        );
    }
}
