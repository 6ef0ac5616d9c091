//! Pending-request correlation and expiry
//!
//! Every request that expects an answer parks a callback in the registry for
//! its response kind, keyed by `requestID`. A callback leaves its registry
//! exactly once: either a response with the same ID resolves it, or the
//! periodic sweep drops it after the registry's timeout. Expired callbacks
//! are never invoked.
//!
//! Entries are kept in insertion order and the sweep stops at the first entry
//! that has not expired, which relies on insertion order tracking creation
//! time. Nothing may reorder the entries.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use touchfree_config::TimingConfig;
use tracing::debug;

use crate::error::ClientError;
use crate::protocol::{
    ConfigState, Correlated, HandshakeResponse, LicenseChangeResponse, LicenseStateResponse,
    ServiceStatus, TrackingStateResponse, WebSocketResponse,
};

/// Callback invoked with the service's response, or with a locally generated
/// failure when the request never reached the service.
pub type Callback<T> = Box<dyn FnOnce(Result<T, WebSocketResponse>) + Send>;

/// Which registry a pending request lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    Handshake,
    Response,
    ConfigState,
    ServiceStatus,
    TrackingState,
    Analytics,
    LicenseState,
    LicenseChange,
}

impl ResponseKind {
    pub fn name(&self) -> &'static str {
        match self {
            ResponseKind::Handshake => "handshake",
            ResponseKind::Response => "response",
            ResponseKind::ConfigState => "config-state",
            ResponseKind::ServiceStatus => "service-status",
            ResponseKind::TrackingState => "tracking-state",
            ResponseKind::Analytics => "analytics",
            ResponseKind::LicenseState => "license-state",
            ResponseKind::LicenseChange => "license-change",
        }
    }
}

/// Outcome of matching a response against a registry.
///
/// When nothing was resolved the response is handed back, so the caller can
/// treat it as an unsolicited broadcast.
#[derive(Debug, PartialEq)]
pub enum Resolution<T> {
    /// A pending callback matched and has been invoked
    Success,
    /// No pending request carries this ID
    NoCallbacksFound(T),
    /// The response has an empty `requestID`
    MissingRequestId(T),
}

struct PendingRequest<T> {
    request_id: String,
    created_at: Instant,
    callback: Callback<T>,
}

/// In-flight requests of one response kind
pub struct CallbackRegistry<T> {
    kind: ResponseKind,
    timeout: Duration,
    pending: VecDeque<PendingRequest<T>>,
}

impl<T: Correlated> CallbackRegistry<T> {
    pub fn new(kind: ResponseKind, timeout: Duration) -> Self {
        Self {
            kind,
            timeout,
            pending: VecDeque::new(),
        }
    }

    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Park `callback` under `request_id`, timestamped now.
    pub fn register(
        &mut self,
        request_id: impl Into<String>,
        callback: Callback<T>,
    ) -> Result<(), ClientError> {
        self.register_at(request_id, Instant::now(), callback)
    }

    /// Park `callback` under `request_id` with an explicit creation time.
    ///
    /// Fails if the ID is already pending in this registry; the callback is
    /// dropped in that case.
    pub fn register_at(
        &mut self,
        request_id: impl Into<String>,
        created_at: Instant,
        callback: Callback<T>,
    ) -> Result<(), ClientError> {
        let request_id = request_id.into();
        if self.contains(&request_id) {
            return Err(ClientError::DuplicateRequestId {
                request_id,
                registry: self.kind.name(),
            });
        }

        self.pending.push_back(PendingRequest {
            request_id,
            created_at,
            callback,
        });
        Ok(())
    }

    /// Remove the entry for `request_id` and invoke it with `response`.
    pub fn resolve(&mut self, response: T) -> Resolution<T> {
        if response.request_id().is_empty() {
            return Resolution::MissingRequestId(response);
        }

        match self.remove(response.request_id()) {
            Some(callback) => {
                callback(Ok(response));
                Resolution::Success
            }
            None => Resolution::NoCallbacksFound(response),
        }
    }

    /// Take a callback out without invoking it
    pub(crate) fn remove(&mut self, request_id: &str) -> Option<Callback<T>> {
        let index = self
            .pending
            .iter()
            .position(|pending| pending.request_id == request_id)?;
        self.pending.remove(index).map(|pending| pending.callback)
    }

    pub fn contains(&self, request_id: &str) -> bool {
        self.pending
            .iter()
            .any(|pending| pending.request_id == request_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every entry older than the timeout. Returns how many were dropped.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let mut removed = 0;

        while let Some(oldest) = self.pending.front() {
            let age = now.saturating_duration_since(oldest.created_at);
            if age <= self.timeout {
                break;
            }

            debug!(
                registry = self.kind.name(),
                request_id = %oldest.request_id,
                age_ms = age.as_millis() as u64,
                "Dropping expired request"
            );
            self.pending.pop_front();
            removed += 1;
        }

        removed
    }
}

/// One registry per response kind
pub struct Registries {
    pub handshake: CallbackRegistry<HandshakeResponse>,
    pub response: CallbackRegistry<WebSocketResponse>,
    pub config_state: CallbackRegistry<ConfigState>,
    pub service_status: CallbackRegistry<ServiceStatus>,
    pub tracking_state: CallbackRegistry<TrackingStateResponse>,
    pub analytics: CallbackRegistry<WebSocketResponse>,
    pub license_state: CallbackRegistry<LicenseStateResponse>,
    pub license_change: CallbackRegistry<LicenseChangeResponse>,
}

/// Selects one registry out of [`Registries`]
pub type RegistrySelector<T> = fn(&mut Registries) -> &mut CallbackRegistry<T>;

impl Registries {
    pub fn new(timing: &TimingConfig) -> Self {
        let timeout = timing.callback_timeout;
        Self {
            handshake: CallbackRegistry::new(ResponseKind::Handshake, timeout),
            response: CallbackRegistry::new(ResponseKind::Response, timeout),
            config_state: CallbackRegistry::new(ResponseKind::ConfigState, timeout),
            service_status: CallbackRegistry::new(ResponseKind::ServiceStatus, timeout),
            tracking_state: CallbackRegistry::new(ResponseKind::TrackingState, timeout),
            analytics: CallbackRegistry::new(ResponseKind::Analytics, timeout),
            license_state: CallbackRegistry::new(ResponseKind::LicenseState, timeout),
            license_change: CallbackRegistry::new(
                ResponseKind::LicenseChange,
                timing.license_change_timeout,
            ),
        }
    }

    /// Sweep every registry. Returns the total number of dropped entries.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let removed = self.handshake.sweep(now)
            + self.response.sweep(now)
            + self.config_state.sweep(now)
            + self.service_status.sweep(now)
            + self.tracking_state.sweep(now)
            + self.analytics.sweep(now)
            + self.license_state.sweep(now)
            + self.license_change.sweep(now);

        if removed > 0 {
            debug!(removed, "Requests expired without a response");
        }
        removed
    }

    /// Total number of requests still waiting for a response
    pub fn pending_count(&self) -> usize {
        self.handshake.len()
            + self.response.len()
            + self.config_state.len()
            + self.service_status.len()
            + self.tracking_state.len()
            + self.analytics.len()
            + self.license_state.len()
            + self.license_change.len()
    }
}
