//! Error types for the TouchFree client

use thiserror::Error;

use crate::protocol::ActionCode;

/// Errors that can occur while talking to the TouchFree service
#[derive(Debug, Error)]
pub enum ClientError {
    /// No channel is open, or the handshake has not completed
    #[error("Not connected to the TouchFree service")]
    NotConnected,

    /// A request ID is already pending in the target registry
    #[error("Request ID {request_id} is already pending in the {registry} registry")]
    DuplicateRequestId {
        request_id: String,
        registry: &'static str,
    },

    /// Two receivers claim the same action code
    #[error("Action code {code} is claimed by both the {first} and {second} receivers")]
    OverlappingActionCode {
        code: ActionCode,
        first: &'static str,
        second: &'static str,
    },

    /// A receiver was declared without any action codes
    #[error("The {receiver} receiver does not accept any action codes")]
    EmptyReceiver { receiver: &'static str },

    /// An inbound message could not be decoded
    #[error("Failed to decode {context}: {source}")]
    MalformedMessage {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// An outbound message could not be encoded
    #[error("Failed to serialize request: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    /// The channel closed before a frame could be sent
    #[error("Channel to the TouchFree service is closed")]
    ChannelClosed,

    /// The pending request was swept, or the client shut down, before a
    /// response arrived
    #[error("{action} request expired before the service responded")]
    RequestExpired { action: ActionCode },

    /// The service answered, but reported a failure
    #[error("TouchFree service rejected the request: {message}")]
    RequestFailed { message: String },

    /// The driver task has shut down
    #[error("The client driver has stopped")]
    DriverStopped,

    /// `start_analytics_session` while a session is already running
    #[error("Analytics session {session_id} is already active")]
    AnalyticsSessionActive { session_id: String },

    /// `stop_analytics_session` without a running session
    #[error("No analytics session is active")]
    NoAnalyticsSession,
}
