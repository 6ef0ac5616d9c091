//! Connection controller
//!
//! `ConnectionController` is the synchronous core of the client. It owns the
//! open channel, the handshake state, the callback registries, the message
//! router and the deferred dispatch queue. Nothing in here blocks or awaits:
//! the async driver in [`crate::client`] feeds it channel events, commands
//! and timer ticks one at a time, which is what makes receive and drain
//! mutually exclusive without any locking.
//!
//! ## Connection lifecycle
//!
//! 1. `connect()` opens a channel under a fresh connection ID and resets the
//!    handshake state
//! 2. `Opened` sends exactly one handshake request
//! 3. The handshake receiver applies the response on its next tick;
//!    success publishes `Connected`
//! 4. `Closed` (or `disconnect()`) drops the channel and resets the handshake
//!
//! The client is connected only while the channel is open AND the handshake
//! has completed. Requests sent at any other time fail immediately through
//! their callback.
//!
//! ## Requests
//!
//! Every request helper generates a fresh `requestID`, registers its callback
//! in the registry for the expected response kind, then sends. The callback
//! is invoked exactly once with the response, or synchronously with a local
//! failure if the request could not be sent. A request that times out is
//! dropped silently by the sweep and its callback never runs.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use touchfree_config::{Config, ServiceConfig};
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::analytics::AnalyticsSession;
use crate::channel::{ChannelEvent, ChannelEventReceiver, ChannelEventSender, Frame, MessageChannel, Transport};
use crate::error::ClientError;
use crate::events::{ClientEvent, Dispatch};
use crate::handshake::HandshakeState;
use crate::plugin::{InputActionPlugin, PluginChain};
use crate::protocol::{
    classify_binary, ActionCode, AnalyticsRequestType, BinaryFrame, ConfigState, Correlated,
    HandDataStreamRequest, HandshakeRequest, HandshakeResponse, InteractionConfig, Lens,
    LicenseChangeResponse, LicenseKeyRequest, LicenseStateResponse, PhysicalConfig,
    QuickSetupPosition, QuickSetupRequest, RequestEnvelope, ServiceStatus, SimpleRequest,
    TrackingStateRequest, TrackingStateResponse, WebSocketResponse, API_VERSION,
};
use crate::receiver::TickContext;
use crate::registry::{Callback, Registries, RegistrySelector};
use crate::router::MessageRouter;

/// Capacity of the event broadcast channel; slow subscribers lag past this
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

const MISSING_REQUEST_ID: &str = "Request failed. This is due to a missing requestID";
const NOT_CONNECTED: &str = "Request failed. Not connected to the TouchFree service";
const DUPLICATE_REQUEST_ID: &str = "Request failed. The requestID is already pending";

/// What a request needs before it may be sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    /// Only the handshake itself is sent before the handshake completes
    ChannelOpen,
    Connected,
}

struct Connection {
    id: u64,
    url: String,
    channel: Box<dyn MessageChannel>,
    open: bool,
}

/// Drops hand frames arriving faster than the configured interval
struct HandDataLimiter {
    min_interval: Duration,
    last: Option<Instant>,
}

impl HandDataLimiter {
    fn admit(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.min_interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

pub struct ConnectionController {
    config: Config,
    transport: Arc<dyn Transport>,
    channel_tx: mpsc::UnboundedSender<(u64, ChannelEvent)>,
    connection: Option<Connection>,
    next_connection_id: u64,
    handshake: HandshakeState,
    router: MessageRouter,
    registries: Registries,
    deferred: VecDeque<Dispatch>,
    plugins: PluginChain,
    analytics: Option<AnalyticsSession>,
    events: broadcast::Sender<ClientEvent>,
    hand_data: HandDataLimiter,
}

impl ConnectionController {
    /// Create a controller and the receiver its channels report into.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::OverlappingActionCode` or
    /// `ClientError::EmptyReceiver` if the receiver set is inconsistent.
    pub fn new(
        config: Config,
        transport: Arc<dyn Transport>,
    ) -> Result<(Self, ChannelEventReceiver), ClientError> {
        let (channel_tx, channel_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let controller = Self {
            router: MessageRouter::with_default_receivers(&config.timing)?,
            registries: Registries::new(&config.timing),
            hand_data: HandDataLimiter {
                min_interval: config.timing.hand_data_min_interval,
                last: None,
            },
            config,
            transport,
            channel_tx,
            connection: None,
            next_connection_id: 0,
            handshake: HandshakeState::default(),
            deferred: VecDeque::new(),
            plugins: PluginChain::default(),
            analytics: None,
            events,
        };
        Ok((controller, channel_rx))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<ClientEvent> {
        self.events.clone()
    }

    pub fn add_plugin(&mut self, plugin: Box<dyn InputActionPlugin>) {
        self.plugins.push(plugin);
    }

    // Connection lifecycle

    /// Open a channel to the configured service, replacing any existing one.
    pub fn connect(&mut self) {
        if self.connection.is_some() {
            self.disconnect();
        }

        self.next_connection_id += 1;
        let id = self.next_connection_id;
        self.handshake.reset();

        let url = self.config.service.url();
        info!(%url, connection_id = id, "Connecting to the TouchFree service");
        let events = ChannelEventSender::new(id, self.channel_tx.clone());
        let channel = self.transport.open(&url, events);

        self.connection = Some(Connection {
            id,
            url,
            channel,
            open: false,
        });
    }

    /// Point the controller at a different service and reconnect.
    pub fn connect_to(&mut self, service: ServiceConfig) {
        self.config.service = service;
        self.connect();
    }

    /// Close the channel. Late events from it are ignored.
    pub fn disconnect(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };

        info!(url = %connection.url, connection_id = connection.id, "Disconnecting");
        connection.channel.close();
        self.handshake.reset();
        self.deferred.push_back(Dispatch::Event(ClientEvent::Disconnected {
            reason: Some("disconnected by client".to_string()),
        }));
    }

    /// Channel open and handshake complete
    pub fn is_connected(&self) -> bool {
        self.is_channel_open() && self.handshake.complete
    }

    fn is_channel_open(&self) -> bool {
        self.connection.as_ref().is_some_and(|c| c.open)
    }

    pub fn connection_id(&self) -> Option<u64> {
        self.connection.as_ref().map(|c| c.id)
    }

    pub fn handshake(&self) -> &HandshakeState {
        &self.handshake
    }

    pub fn pending_requests(&self) -> usize {
        self.registries.pending_count()
    }

    /// Apply one event reported by a channel.
    pub fn handle_channel_event(&mut self, connection_id: u64, event: ChannelEvent) {
        let Some(connection) = self.connection.as_mut().filter(|c| c.id == connection_id) else {
            trace!(connection_id, "Ignoring event from a replaced connection");
            return;
        };

        match event {
            ChannelEvent::Opened => {
                connection.open = true;
                self.request_handshake();
            }
            ChannelEvent::Text(text) => {
                if let Err(err) = self.router.route(&text) {
                    warn!(error = %err, "Dropping inbound message");
                }
            }
            ChannelEvent::Binary(bytes) => self.handle_binary(bytes, Instant::now()),
            ChannelEvent::Closed { reason } => {
                if connection.open {
                    warn!(
                        reason = reason.as_deref().unwrap_or("none"),
                        "Connection to the TouchFree service closed"
                    );
                } else {
                    warn!(
                        url = %connection.url,
                        reason = reason.as_deref().unwrap_or("none"),
                        "Could not connect to the TouchFree service"
                    );
                }
                self.connection = None;
                self.handshake.reset();
                self.deferred
                    .push_back(Dispatch::Event(ClientEvent::Disconnected { reason }));
            }
        }
    }

    fn request_handshake(&mut self) {
        if self.handshake.requested || self.handshake.complete {
            debug!("Handshake already requested for this connection");
            return;
        }

        let request = HandshakeRequest {
            request_id: new_request_id(),
            api_version: API_VERSION.to_string(),
        };
        let envelope = match build(ActionCode::VersionHandshake, &request) {
            Ok(envelope) => envelope,
            Err(err) => {
                error!(error = %err, "Failed to build handshake request");
                return;
            }
        };

        self.handshake.requested = true;
        self.send_tracked(
            envelope,
            |registries| &mut registries.handshake,
            Box::new(|result: Result<HandshakeResponse, WebSocketResponse>| {
                if let Err(response) = result {
                    error!(message = %response.message, "Handshake request was not sent");
                }
            }),
            Gate::ChannelOpen,
        );
    }

    fn handle_binary(&mut self, bytes: Vec<u8>, now: Instant) {
        match classify_binary(&bytes) {
            BinaryFrame::HandRenderData(_) => {
                if self.hand_data.admit(now) {
                    self.deferred.push_back(Dispatch::Event(ClientEvent::HandData {
                        frame: Arc::new(bytes),
                    }));
                } else {
                    trace!("Skipping hand frame inside the minimum interval");
                }
            }
            BinaryFrame::Unknown(kind) => debug!(kind, "Ignoring binary frame of unknown type"),
            BinaryFrame::Truncated => debug!(len = bytes.len(), "Ignoring truncated binary frame"),
        }
    }

    // Timers

    /// Give every receiver one tick.
    pub fn tick(&mut self) {
        let mut ctx = TickContext {
            registries: &mut self.registries,
            handshake: &mut self.handshake,
            deferred: &mut self.deferred,
        };
        self.router.tick(&mut ctx);
    }

    /// Drop expired requests. Their callbacks are not invoked.
    pub fn sweep(&mut self, now: Instant) -> usize {
        self.registries.sweep(now)
    }

    /// Publish everything queued since the last flush. Returns how many
    /// dispatches were processed.
    pub fn dispatch_deferred(&mut self) -> usize {
        let mut processed = 0;
        while let Some(dispatch) = self.deferred.pop_front() {
            match dispatch {
                Dispatch::Event(event) => self.publish(event),
                Dispatch::InputAction(action) => {
                    self.publish(ClientEvent::InputActionRaw(action));
                    if let Some(action) = self.plugins.run(action) {
                        self.publish(ClientEvent::InputAction(action));
                    }
                }
            }
            processed += 1;
        }
        processed
    }

    fn publish(&self, event: ClientEvent) {
        if self.events.send(event).is_err() {
            trace!("No subscribers for client event");
        }
    }

    // Sending

    /// Send a request whose answer is a generic response.
    pub fn send_request(&mut self, envelope: RequestEnvelope, callback: Callback<WebSocketResponse>) {
        self.send_tracked(
            envelope,
            |registries| &mut registries.response,
            callback,
            Gate::Connected,
        );
    }

    /// Send a request nobody waits for.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotConnected` before the handshake completes, or
    /// the channel's error if the frame could not be sent.
    pub fn send_untracked(&mut self, envelope: RequestEnvelope) -> Result<(), ClientError> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let text = encode(&envelope)?;
        self.send_text(text)
    }

    fn send_text(&mut self, text: String) -> Result<(), ClientError> {
        let connection = self.connection.as_mut().ok_or(ClientError::NotConnected)?;
        connection.channel.send(Frame::Text(text))
    }

    fn send_tracked<T: Correlated>(
        &mut self,
        envelope: RequestEnvelope,
        registry: RegistrySelector<T>,
        callback: Callback<T>,
        gate: Gate,
    ) -> bool {
        let original = match encode(&envelope) {
            Ok(text) => text,
            Err(err) => {
                error!(action = %envelope.action, error = %err, "Failed to encode request");
                callback(Err(WebSocketResponse::failure(
                    envelope.request_id().unwrap_or_default(),
                    err.to_string(),
                    "",
                )));
                return false;
            }
        };

        let request_id = envelope.request_id().unwrap_or_default().to_string();
        if request_id.is_empty() {
            warn!(action = %envelope.action, "{}", MISSING_REQUEST_ID);
            callback(Err(WebSocketResponse::failure("", MISSING_REQUEST_ID, original)));
            return false;
        }

        let ready = match gate {
            Gate::ChannelOpen => self.is_channel_open(),
            Gate::Connected => self.is_connected(),
        };
        if !ready {
            warn!(action = %envelope.action, %request_id, "Not connected; request not sent");
            callback(Err(WebSocketResponse::failure(request_id, NOT_CONNECTED, original)));
            return false;
        }

        let pending = registry(&mut self.registries);
        if pending.contains(&request_id) {
            warn!(
                %request_id,
                registry = pending.kind().name(),
                "Request ID is already pending"
            );
            callback(Err(WebSocketResponse::failure(request_id, DUPLICATE_REQUEST_ID, original)));
            return false;
        }
        if let Err(err) = pending.register(request_id.clone(), callback) {
            error!(error = %err, "Failed to register request");
            return false;
        }

        trace!(action = %envelope.action, %request_id, "Sending request");
        if let Err(err) = self.send_text(original.clone()) {
            warn!(action = %envelope.action, %request_id, error = %err, "Failed to send request");
            if let Some(callback) = registry(&mut self.registries).remove(&request_id) {
                callback(Err(WebSocketResponse::failure(
                    request_id,
                    format!("Request failed. {}", err),
                    original,
                )));
            }
            return false;
        }
        true
    }

    // Request helpers. Each returns the generated requestID.

    pub fn request_service_status(
        &mut self,
        callback: Callback<ServiceStatus>,
    ) -> Result<String, ClientError> {
        let request_id = new_request_id();
        let envelope = build(ActionCode::RequestServiceStatus, &simple(&request_id))?;
        self.send_tracked(envelope, |r| &mut r.service_status, callback, Gate::Connected);
        Ok(request_id)
    }

    pub fn request_config_state(
        &mut self,
        callback: Callback<ConfigState>,
    ) -> Result<String, ClientError> {
        let request_id = new_request_id();
        let envelope = build(ActionCode::RequestConfigurationState, &simple(&request_id))?;
        self.send_tracked(envelope, |r| &mut r.config_state, callback, Gate::Connected);
        Ok(request_id)
    }

    /// Change the live configuration. Unset fields are left untouched.
    pub fn set_config_state(
        &mut self,
        interaction: InteractionConfig,
        physical: PhysicalConfig,
        callback: Callback<WebSocketResponse>,
    ) -> Result<String, ClientError> {
        let request_id = new_request_id();
        let content = ConfigState {
            request_id: request_id.clone(),
            interaction,
            physical,
        };
        let envelope = build(ActionCode::SetConfigurationState, &content)?;
        self.send_tracked(envelope, |r| &mut r.response, callback, Gate::Connected);
        Ok(request_id)
    }

    pub fn request_config_file_state(
        &mut self,
        callback: Callback<ConfigState>,
    ) -> Result<String, ClientError> {
        let request_id = new_request_id();
        let envelope = build(ActionCode::RequestConfigurationFile, &simple(&request_id))?;
        self.send_tracked(envelope, |r| &mut r.config_state, callback, Gate::Connected);
        Ok(request_id)
    }

    /// Change the configuration file on disk.
    pub fn set_config_file(
        &mut self,
        interaction: InteractionConfig,
        physical: PhysicalConfig,
        callback: Callback<WebSocketResponse>,
    ) -> Result<String, ClientError> {
        let request_id = new_request_id();
        let content = ConfigState {
            request_id: request_id.clone(),
            interaction,
            physical,
        };
        let envelope = build(ActionCode::SetConfigurationFile, &content)?;
        self.send_tracked(envelope, |r| &mut r.response, callback, Gate::Connected);
        Ok(request_id)
    }

    /// Reset the interaction config file to the service defaults. The
    /// service answers with the resulting configuration.
    pub fn reset_interaction_config(
        &mut self,
        callback: Callback<ConfigState>,
    ) -> Result<String, ClientError> {
        let request_id = new_request_id();
        let envelope = build(ActionCode::ResetInteractionConfigFile, &simple(&request_id))?;
        self.send_tracked(envelope, |r| &mut r.config_state, callback, Gate::Connected);
        Ok(request_id)
    }

    pub fn request_tracking_state(
        &mut self,
        callback: Callback<TrackingStateResponse>,
    ) -> Result<String, ClientError> {
        let request_id = new_request_id();
        let envelope = build(ActionCode::GetTrackingState, &simple(&request_id))?;
        self.send_tracked(envelope, |r| &mut r.tracking_state, callback, Gate::Connected);
        Ok(request_id)
    }

    /// Change tracking settings. The request's own ID is replaced.
    pub fn set_tracking_state(
        &mut self,
        mut request: TrackingStateRequest,
        callback: Callback<TrackingStateResponse>,
    ) -> Result<String, ClientError> {
        let request_id = new_request_id();
        request.request_id = request_id.clone();
        let envelope = build(ActionCode::SetTrackingState, &request)?;
        self.send_tracked(envelope, |r| &mut r.tracking_state, callback, Gate::Connected);
        Ok(request_id)
    }

    /// Run quick setup at `position`.
    ///
    /// The service answers twice under the same request ID: an
    /// acknowledgement and the resulting configuration. Both callbacks are
    /// registered before sending and resolve independently.
    pub fn quick_setup(
        &mut self,
        position: QuickSetupPosition,
        response_callback: Callback<WebSocketResponse>,
        config_callback: Callback<ConfigState>,
    ) -> Result<String, ClientError> {
        let request_id = new_request_id();
        let request = QuickSetupRequest {
            request_id: request_id.clone(),
            position,
        };
        let envelope = build(ActionCode::QuickSetup, &request)?;
        let original = encode(&envelope)?;

        if !self.is_connected() {
            warn!(%request_id, "Not connected; quick setup not sent");
            response_callback(Err(WebSocketResponse::failure(&request_id, NOT_CONNECTED, &original)));
            config_callback(Err(WebSocketResponse::failure(&request_id, NOT_CONNECTED, &original)));
            return Ok(request_id);
        }

        self.registries
            .response
            .register(request_id.clone(), response_callback)?;
        if let Err(err) = self
            .registries
            .config_state
            .register(request_id.clone(), config_callback)
        {
            self.registries.response.remove(&request_id);
            return Err(err);
        }

        if let Err(err) = self.send_text(original.clone()) {
            warn!(%request_id, error = %err, "Failed to send quick setup");
            let message = format!("Request failed. {}", err);
            if let Some(callback) = self.registries.response.remove(&request_id) {
                callback(Err(WebSocketResponse::failure(&request_id, &message, &original)));
            }
            if let Some(callback) = self.registries.config_state.remove(&request_id) {
                callback(Err(WebSocketResponse::failure(&request_id, &message, &original)));
            }
        }
        Ok(request_id)
    }

    pub fn request_license_state(
        &mut self,
        callback: Callback<LicenseStateResponse>,
    ) -> Result<String, ClientError> {
        let request_id = new_request_id();
        let envelope = build(ActionCode::GetLicenseState, &simple(&request_id))?;
        self.send_tracked(envelope, |r| &mut r.license_state, callback, Gate::Connected);
        Ok(request_id)
    }

    pub fn add_license_key(
        &mut self,
        license_key: &str,
        callback: Callback<LicenseChangeResponse>,
    ) -> Result<String, ClientError> {
        self.change_license(ActionCode::AddLicenseKey, license_key, callback)
    }

    pub fn remove_license_key(
        &mut self,
        license_key: &str,
        callback: Callback<LicenseChangeResponse>,
    ) -> Result<String, ClientError> {
        self.change_license(ActionCode::RemoveLicenseKey, license_key, callback)
    }

    fn change_license(
        &mut self,
        action: ActionCode,
        license_key: &str,
        callback: Callback<LicenseChangeResponse>,
    ) -> Result<String, ClientError> {
        let request_id = new_request_id();
        let request = LicenseKeyRequest {
            request_id: request_id.clone(),
            license_key: license_key.to_string(),
        };
        let envelope = build(action, &request)?;
        self.send_tracked(envelope, |r| &mut r.license_change, callback, Gate::Connected);
        Ok(request_id)
    }

    /// Enable or disable the binary hand data stream.
    pub fn set_hand_data_stream(&mut self, enabled: bool, lens: Lens) -> Result<(), ClientError> {
        let request = HandDataStreamRequest {
            request_id: new_request_id(),
            enabled,
            lens,
        };
        self.send_untracked(build(ActionCode::SetHandDataStreamState, &request)?)
    }

    // Analytics

    /// ID of the active analytics session
    pub fn analytics_session(&self) -> Option<&str> {
        self.analytics.as_ref().map(AnalyticsSession::session_id)
    }

    /// Start an analytics session and return its ID.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AnalyticsSessionActive` if a session is already
    /// running and `stop_current` is false; nothing changes in that case.
    /// With `stop_current` the running session is stopped first.
    ///
    /// If the START request cannot be sent, the callback fails and no session
    /// is left active.
    pub fn start_analytics_session(
        &mut self,
        application_name: &str,
        stop_current: bool,
        callback: Callback<WebSocketResponse>,
    ) -> Result<String, ClientError> {
        if let Some(active) = &self.analytics {
            if !stop_current {
                warn!(
                    session_id = active.session_id(),
                    "Analytics session already active; not starting another"
                );
                return Err(ClientError::AnalyticsSessionActive {
                    session_id: active.session_id().to_string(),
                });
            }
            self.stop_analytics_session(log_response("analytics session stop"))?;
        }

        let session = AnalyticsSession::new(application_name);
        let request = session.session_request(new_request_id(), AnalyticsRequestType::Start);
        let envelope = build(ActionCode::AnalyticsSessionRequest, &request)?;
        let session_id = session.session_id().to_string();

        // The session only becomes active once its START has gone out
        if self.send_tracked(envelope, |r| &mut r.analytics, callback, Gate::Connected) {
            info!(%session_id, "Starting analytics session");
            self.analytics = Some(session);
        }
        Ok(session_id)
    }

    /// Flush the final counts, then stop the active session.
    pub fn stop_analytics_session(
        &mut self,
        callback: Callback<WebSocketResponse>,
    ) -> Result<String, ClientError> {
        let Some(mut session) = self.analytics.take() else {
            warn!("No analytics session to stop");
            return Err(ClientError::NoAnalyticsSession);
        };

        self.send_analytics_events(&session)?;
        session.clear();

        let request = session.session_request(new_request_id(), AnalyticsRequestType::Stop);
        let envelope = build(ActionCode::AnalyticsSessionRequest, &request)?;
        info!(session_id = session.session_id(), "Stopping analytics session");
        self.send_tracked(envelope, |r| &mut r.analytics, callback, Gate::Connected);
        Ok(session.session_id().to_string())
    }

    /// Count one occurrence of `event` in the active session.
    pub fn record_analytics_event(&mut self, event: &str) {
        match &mut self.analytics {
            Some(session) => session.record(event),
            None => debug!(event, "No analytics session; event not recorded"),
        }
    }

    /// Send the accumulated counts of the active session, if any.
    pub fn analytics_heartbeat(&mut self) {
        let Some(session) = self.analytics.take() else {
            return;
        };
        if let Err(err) = self.send_analytics_events(&session) {
            warn!(error = %err, "Failed to send analytics heartbeat");
        }
        self.analytics = Some(session);
    }

    fn send_analytics_events(&mut self, session: &AnalyticsSession) -> Result<(), ClientError> {
        let request = session.events_request(new_request_id());
        let envelope = build(ActionCode::AnalyticsUpdateSessionEventsRequest, &request)?;
        self.send_tracked(
            envelope,
            |r| &mut r.analytics,
            log_response("analytics events"),
            Gate::Connected,
        );
        Ok(())
    }
}

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

fn simple(request_id: &str) -> SimpleRequest {
    SimpleRequest {
        request_id: request_id.to_string(),
    }
}

fn build<T: Serialize>(action: ActionCode, content: &T) -> Result<RequestEnvelope, ClientError> {
    RequestEnvelope::new(action, content).map_err(ClientError::SerializeFailed)
}

fn encode(envelope: &RequestEnvelope) -> Result<String, ClientError> {
    serde_json::to_string(envelope).map_err(ClientError::SerializeFailed)
}

/// Callback for internal requests whose outcome only matters for logs
fn log_response(what: &'static str) -> Callback<WebSocketResponse> {
    Box::new(move |result: Result<WebSocketResponse, WebSocketResponse>| match result {
        Ok(response) if response.is_success() => trace!(what, "Request acknowledged"),
        Ok(response) | Err(response) => {
            debug!(what, message = %response.message, "Request was not acknowledged")
        }
    })
}
