//! Async client handle and driver task
//!
//! [`TouchFreeClient`] is a cheap handle onto a spawned driver task that owns
//! the [`ConnectionController`]. The handle never touches engine state
//! directly: every call is shipped to the driver as a command and runs there
//! between ticks.
//!
//! ## Architecture
//!
//! ```text
//! +-----------------+  commands  +--------------+  frames  +-----------+
//! | TouchFreeClient | ---------> | driver task  | <------> | transport |
//! | (any task)      | <--------- | (controller) |          | task      |
//! +-----------------+  events    +--------------+          +-----------+
//! ```
//!
//! The driver selects over channel events, commands, the receiver tick, the
//! expiry sweep, and the analytics heartbeat (armed only while a session is
//! active). After each wakeup it flushes the controller's deferred dispatch
//! queue to subscribers.
//!
//! ## Request helpers
//!
//! Async helpers wrap the controller's callbacks around `oneshot` channels.
//! A request that the sweep drops without a response resolves to
//! `ClientError::RequestExpired`; a locally failed request resolves to
//! `ClientError::RequestFailed`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Interval, MissedTickBehavior};
use tokio_stream::wrappers::BroadcastStream;
use touchfree_config::{Config, ServiceConfig};
use tracing::{debug, info};

use crate::channel::{ChannelEventReceiver, Transport};
use crate::connection::ConnectionController;
use crate::error::ClientError;
use crate::events::ClientEvent;
use crate::plugin::InputActionPlugin;
use crate::protocol::{
    ActionCode, ConfigState, InteractionConfig, Lens, LicenseChangeResponse, LicenseStateResponse,
    PhysicalConfig, QuickSetupPosition, ServiceStatus, TrackingStateRequest,
    TrackingStateResponse, WebSocketResponse,
};
use crate::registry::Callback;
use crate::websocket::WebSocketTransport;

/// Stream of client events for one subscriber
pub type ClientEventStream = BroadcastStream<ClientEvent>;

type Job = Box<dyn FnOnce(&mut ConnectionController) + Send>;

enum Command {
    Run(Job),
    Shutdown,
}

pub struct TouchFreeClient {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<ClientEvent>,
    driver: JoinHandle<()>,
}

impl TouchFreeClient {
    /// Spawn a client that talks WebSocket. Does not connect yet.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: Config) -> Result<Self, ClientError> {
        Self::spawn_with_transport(config, Arc::new(WebSocketTransport))
    }

    pub fn spawn_with_transport(
        config: Config,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ClientError> {
        let (controller, channel_events) = ConnectionController::new(config, transport)?;
        let events = controller.event_sender();
        let (commands, command_rx) = mpsc::unbounded_channel();

        let driver = tokio::spawn(drive(controller, channel_events, command_rx));
        Ok(Self {
            commands,
            events,
            driver,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> ClientEventStream {
        BroadcastStream::new(self.subscribe())
    }

    fn run<F>(&self, job: F) -> Result<(), ClientError>
    where
        F: FnOnce(&mut ConnectionController) + Send + 'static,
    {
        self.commands
            .send(Command::Run(Box::new(job)))
            .map_err(|_| ClientError::DriverStopped)
    }

    async fn query<T, F>(&self, job: F) -> Result<T, ClientError>
    where
        T: Send + 'static,
        F: FnOnce(&mut ConnectionController) -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.run(move |controller| {
            let _ = tx.send(job(controller));
        })?;
        rx.await.map_err(|_| ClientError::DriverStopped)
    }

    /// Start a request on the driver and wait for its callback.
    async fn request<T, F>(&self, action: ActionCode, start: F) -> Result<T, ClientError>
    where
        T: Send + 'static,
        F: FnOnce(&mut ConnectionController, Callback<T>) -> Result<String, ClientError>
            + Send
            + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let callback: Callback<T> = Box::new(move |result| {
            let _ = tx.send(result);
        });

        self.query(move |controller| start(controller, callback))
            .await??;
        settle(action, rx).await
    }

    pub fn add_plugin(&self, plugin: Box<dyn InputActionPlugin>) -> Result<(), ClientError> {
        self.run(move |controller| controller.add_plugin(plugin))
    }

    pub fn connect(&self) -> Result<(), ClientError> {
        self.run(ConnectionController::connect)
    }

    pub fn connect_to(&self, service: ServiceConfig) -> Result<(), ClientError> {
        self.run(move |controller| controller.connect_to(service))
    }

    pub fn disconnect(&self) -> Result<(), ClientError> {
        self.run(ConnectionController::disconnect)
    }

    pub async fn is_connected(&self) -> Result<bool, ClientError> {
        self.query(|controller| controller.is_connected()).await
    }

    /// Wait for the handshake to complete.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotConnected` if `timeout` elapses first.
    pub async fn wait_until_connected(&self, timeout: Duration) -> Result<(), ClientError> {
        // Subscribe before checking so a Connected in between is not missed
        let mut events = self.subscribe();
        if self.is_connected().await? {
            return Ok(());
        }

        let wait = async {
            loop {
                match events.recv().await {
                    Ok(ClientEvent::Connected { .. }) => return Ok(()),
                    Ok(_) => {}
                    Err(RecvError::Lagged(_)) => {
                        if self.is_connected().await? {
                            return Ok(());
                        }
                    }
                    Err(RecvError::Closed) => return Err(ClientError::DriverStopped),
                }
            }
        };

        time::timeout(timeout, wait)
            .await
            .map_err(|_| ClientError::NotConnected)?
    }

    pub async fn request_service_status(&self) -> Result<ServiceStatus, ClientError> {
        self.request(ActionCode::RequestServiceStatus, |c, cb| {
            c.request_service_status(cb)
        })
        .await
    }

    pub async fn request_config_state(&self) -> Result<ConfigState, ClientError> {
        self.request(ActionCode::RequestConfigurationState, |c, cb| {
            c.request_config_state(cb)
        })
        .await
    }

    pub async fn set_config_state(
        &self,
        interaction: InteractionConfig,
        physical: PhysicalConfig,
    ) -> Result<WebSocketResponse, ClientError> {
        self.request(ActionCode::SetConfigurationState, move |c, cb| {
            c.set_config_state(interaction, physical, cb)
        })
        .await
    }

    pub async fn request_config_file_state(&self) -> Result<ConfigState, ClientError> {
        self.request(ActionCode::RequestConfigurationFile, |c, cb| {
            c.request_config_file_state(cb)
        })
        .await
    }

    pub async fn set_config_file(
        &self,
        interaction: InteractionConfig,
        physical: PhysicalConfig,
    ) -> Result<WebSocketResponse, ClientError> {
        self.request(ActionCode::SetConfigurationFile, move |c, cb| {
            c.set_config_file(interaction, physical, cb)
        })
        .await
    }

    pub async fn reset_interaction_config(&self) -> Result<ConfigState, ClientError> {
        self.request(ActionCode::ResetInteractionConfigFile, |c, cb| {
            c.reset_interaction_config(cb)
        })
        .await
    }

    pub async fn request_tracking_state(&self) -> Result<TrackingStateResponse, ClientError> {
        self.request(ActionCode::GetTrackingState, |c, cb| {
            c.request_tracking_state(cb)
        })
        .await
    }

    pub async fn set_tracking_state(
        &self,
        request: TrackingStateRequest,
    ) -> Result<TrackingStateResponse, ClientError> {
        self.request(ActionCode::SetTrackingState, move |c, cb| {
            c.set_tracking_state(request, cb)
        })
        .await
    }

    /// Run quick setup and wait for both the acknowledgement and the
    /// resulting configuration.
    pub async fn quick_setup(
        &self,
        position: QuickSetupPosition,
    ) -> Result<(WebSocketResponse, ConfigState), ClientError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        let (config_tx, config_rx) = oneshot::channel();
        let on_ack: Callback<WebSocketResponse> = Box::new(move |result| {
            let _ = ack_tx.send(result);
        });
        let on_config: Callback<ConfigState> = Box::new(move |result| {
            let _ = config_tx.send(result);
        });

        self.query(move |c| c.quick_setup(position, on_ack, on_config))
            .await??;

        let (ack, config) = tokio::join!(
            settle(ActionCode::QuickSetup, ack_rx),
            settle(ActionCode::QuickSetup, config_rx)
        );
        Ok((ack?, config?))
    }

    pub async fn request_license_state(&self) -> Result<LicenseStateResponse, ClientError> {
        self.request(ActionCode::GetLicenseState, |c, cb| {
            c.request_license_state(cb)
        })
        .await
    }

    pub async fn add_license_key(
        &self,
        license_key: &str,
    ) -> Result<LicenseChangeResponse, ClientError> {
        let key = license_key.to_string();
        self.request(ActionCode::AddLicenseKey, move |c, cb| {
            c.add_license_key(&key, cb)
        })
        .await
    }

    pub async fn remove_license_key(
        &self,
        license_key: &str,
    ) -> Result<LicenseChangeResponse, ClientError> {
        let key = license_key.to_string();
        self.request(ActionCode::RemoveLicenseKey, move |c, cb| {
            c.remove_license_key(&key, cb)
        })
        .await
    }

    pub async fn set_hand_data_stream(&self, enabled: bool, lens: Lens) -> Result<(), ClientError> {
        self.query(move |c| c.set_hand_data_stream(enabled, lens))
            .await?
    }

    /// Start an analytics session and wait for the service to acknowledge
    /// it. Returns the session ID.
    pub async fn start_analytics_session(
        &self,
        application_name: &str,
        stop_current: bool,
    ) -> Result<String, ClientError> {
        let application_name = application_name.to_string();
        let (tx, rx) = oneshot::channel();
        let callback: Callback<WebSocketResponse> = Box::new(move |result| {
            let _ = tx.send(result);
        });

        let session_id = self
            .query(move |c| c.start_analytics_session(&application_name, stop_current, callback))
            .await??;
        acknowledged(settle(ActionCode::AnalyticsSessionRequest, rx).await?)?;
        Ok(session_id)
    }

    /// Flush final counts and stop the active session.
    pub async fn stop_analytics_session(&self) -> Result<(), ClientError> {
        let (tx, rx) = oneshot::channel();
        let callback: Callback<WebSocketResponse> = Box::new(move |result| {
            let _ = tx.send(result);
        });

        self.query(move |c| c.stop_analytics_session(callback))
            .await??;
        acknowledged(settle(ActionCode::AnalyticsSessionRequest, rx).await?)
    }

    pub fn record_analytics_event(&self, event: &str) -> Result<(), ClientError> {
        let event = event.to_string();
        self.run(move |c| c.record_analytics_event(&event))
    }

    /// Stop the driver. An active analytics session is stopped and the
    /// channel closed first.
    pub async fn shutdown(self) -> Result<(), ClientError> {
        let _ = self.commands.send(Command::Shutdown);
        self.driver.await.map_err(|_| ClientError::DriverStopped)
    }
}

/// Turn a callback's oneshot into the caller's result
async fn settle<T>(
    action: ActionCode,
    rx: oneshot::Receiver<Result<T, WebSocketResponse>>,
) -> Result<T, ClientError> {
    match rx.await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(failure)) => Err(ClientError::RequestFailed {
            message: failure.message,
        }),
        // Callback dropped unanswered: swept, or the driver stopped
        Err(_) => Err(ClientError::RequestExpired { action }),
    }
}

fn acknowledged(response: WebSocketResponse) -> Result<(), ClientError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(ClientError::RequestFailed {
            message: response.message,
        })
    }
}

/// Heartbeat timer bound to one analytics session
struct Heartbeat {
    session_id: String,
    interval: Interval,
}

async fn next_heartbeat(heartbeat: &mut Option<Heartbeat>) {
    match heartbeat {
        Some(heartbeat) => {
            heartbeat.interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Keep exactly one heartbeat timer per active session.
fn sync_heartbeat(controller: &ConnectionController, heartbeat: &mut Option<Heartbeat>, period: Duration) {
    match (controller.analytics_session(), heartbeat.as_ref()) {
        (Some(active), Some(current)) if current.session_id == active => {}
        (Some(active), _) => {
            debug!(session_id = active, "Arming analytics heartbeat");
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            *heartbeat = Some(Heartbeat {
                session_id: active.to_string(),
                interval,
            });
        }
        (None, Some(_)) => {
            debug!("Disarming analytics heartbeat");
            *heartbeat = None;
        }
        (None, None) => {}
    }
}

fn timer(period: Duration) -> Interval {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn drive(
    mut controller: ConnectionController,
    mut channel_events: ChannelEventReceiver,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let timing = controller.config().timing.clone();
    let heartbeat_period = controller.config().analytics.heartbeat_interval;

    let mut tick = timer(timing.tick_interval());
    let mut sweep = timer(timing.callback_sweep_interval);
    let mut heartbeat: Option<Heartbeat> = None;

    debug!("Client driver started");
    loop {
        tokio::select! {
            Some((connection_id, event)) = channel_events.recv() => {
                controller.handle_channel_event(connection_id, event);
            }
            command = commands.recv() => match command {
                Some(Command::Run(job)) => job(&mut controller),
                Some(Command::Shutdown) | None => break,
            },
            _ = tick.tick() => controller.tick(),
            _ = sweep.tick() => {
                controller.sweep(std::time::Instant::now());
            }
            _ = next_heartbeat(&mut heartbeat) => controller.analytics_heartbeat(),
        }

        sync_heartbeat(&controller, &mut heartbeat, heartbeat_period);
        controller.dispatch_deferred();
    }

    if controller.analytics_session().is_some() {
        let _ = controller.stop_analytics_session(Box::new(|_| {}));
    }
    controller.disconnect();
    controller.dispatch_deferred();
    info!("Client driver stopped");
}
