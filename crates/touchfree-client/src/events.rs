//! Events published to subscribers
//!
//! Receivers never publish directly. They push a [`Dispatch`] onto the
//! deferred queue during a tick, and the controller flushes that queue once
//! the tick has finished, so no subscriber runs while a receiver is
//! mid-drain.

use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::protocol::{InputAction, LicenseState, ServiceStatus, TrackingServiceState};

/// Something a consumer of the client can observe
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "detail", rename_all = "snake_case")]
pub enum ClientEvent {
    /// The handshake succeeded on a freshly opened channel
    Connected {
        service_version: Option<String>,
        api_version: Option<String>,
    },
    /// The channel closed
    Disconnected { reason: Option<String> },
    HandFound,
    HandsLost,
    HandEntered,
    HandExited,
    /// Decoded input action, before any plugin has seen it
    InputActionRaw(InputAction),
    /// Input action after the plugin chain
    InputAction(InputAction),
    TrackingServiceStateChanged(TrackingServiceState),
    ServiceStatusChanged(ServiceStatus),
    LicenseStateChanged(LicenseState),
    /// Binary hand render frame, type prefix included
    HandData {
        #[serde(rename = "bytes", serialize_with = "serialize_len")]
        frame: Arc<Vec<u8>>,
    },
}

fn serialize_len<S: Serializer>(frame: &Arc<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(frame.len() as u64)
}

/// Work queued by receivers and flushed after the tick
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Event(ClientEvent),
    /// Emitted raw, then run through the plugin chain and emitted again
    InputAction(InputAction),
}
