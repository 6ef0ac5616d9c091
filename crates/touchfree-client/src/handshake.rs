//! Handshake bookkeeping for the current connection

use tracing::{error, info, warn};

use crate::events::{ClientEvent, Dispatch};
use crate::protocol::{ConfigAdvisory, HandshakeResponse, ResponseStatus};

/// Substring the service puts in a successful handshake's message when the
/// client's API version is older than its own
const HANDSHAKE_WARNING: &str = "Handshake Warning";

/// How the most recent handshake ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeOutcome {
    Connected,
    ConnectedWithWarning,
    Failed,
}

/// Per-connection handshake state. Reset whenever a new connection starts.
#[derive(Debug, Default)]
pub struct HandshakeState {
    /// A handshake request is in flight; suppresses duplicates
    pub requested: bool,
    pub complete: bool,
    pub service_version: Option<String>,
    pub api_version: Option<String>,
    pub last_outcome: Option<HandshakeOutcome>,
}

impl HandshakeState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record the service's handshake response.
    ///
    /// A successful result marks the connection complete and queues exactly
    /// one `Connected` event. The configuration advisory is reported
    /// independently of the handshake status.
    pub fn apply(
        &mut self,
        response: &HandshakeResponse,
        deferred: &mut impl Extend<Dispatch>,
    ) -> HandshakeOutcome {
        self.requested = false;

        match response.configuration_status {
            Some(ConfigAdvisory::Error) => {
                error!("TouchFree service failed to load its configuration")
            }
            Some(ConfigAdvisory::Default) => {
                warn!("TouchFree service is running with its default configuration")
            }
            _ => {}
        }

        if response.status != ResponseStatus::Success {
            error!(
                status = ?response.status,
                message = %response.message,
                "Handshake with the TouchFree service failed"
            );
            self.last_outcome = Some(HandshakeOutcome::Failed);
            return HandshakeOutcome::Failed;
        }

        let outcome = if response.message.contains(HANDSHAKE_WARNING) {
            warn!(message = %response.message, "Handshake completed with a warning");
            HandshakeOutcome::ConnectedWithWarning
        } else {
            info!(
                service_version = response.touchfree_version.as_deref().unwrap_or("unknown"),
                api_version = response.api_version.as_deref().unwrap_or("unknown"),
                "Connected to the TouchFree service"
            );
            HandshakeOutcome::Connected
        };

        let already_complete = self.complete;
        self.complete = true;
        self.service_version = response.touchfree_version.clone();
        self.api_version = response.api_version.clone();
        self.last_outcome = Some(outcome);

        if !already_complete {
            deferred.extend(Some(Dispatch::Event(ClientEvent::Connected {
                service_version: self.service_version.clone(),
                api_version: self.api_version.clone(),
            })));
        }
        outcome
    }
}
