//! Message channel abstraction
//!
//! The controller never talks to a socket directly. A [`Transport`] opens a
//! [`MessageChannel`] for outbound frames and reports everything that
//! happens on it as [`ChannelEvent`]s through a [`ChannelEventSender`].
//!
//! Each opened channel gets a connection ID. Events carry that ID so the
//! controller can discard late events from a channel it has already
//! replaced.

use tokio::sync::mpsc;

use crate::error::ClientError;

/// Outbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// Something that happened on an open channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    Text(String),
    Binary(Vec<u8>),
    /// Closed by either side, or failed to open
    Closed { reason: Option<String> },
}

/// Receiving half paired with [`ChannelEventSender`]
pub type ChannelEventReceiver = mpsc::UnboundedReceiver<(u64, ChannelEvent)>;

/// Reports events for one connection back to the controller
#[derive(Debug, Clone)]
pub struct ChannelEventSender {
    connection_id: u64,
    tx: mpsc::UnboundedSender<(u64, ChannelEvent)>,
}

impl ChannelEventSender {
    pub(crate) fn new(connection_id: u64, tx: mpsc::UnboundedSender<(u64, ChannelEvent)>) -> Self {
        Self { connection_id, tx }
    }

    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    /// Returns false once the controller has gone away.
    pub fn send(&self, event: ChannelEvent) -> bool {
        self.tx.send((self.connection_id, event)).is_ok()
    }
}

/// Outbound half of an open (or opening) channel
pub trait MessageChannel: Send {
    fn send(&mut self, frame: Frame) -> Result<(), ClientError>;

    /// Ask the channel to close. A `Closed` event follows once it has.
    fn close(&mut self);
}

/// Opens channels to a service URL
pub trait Transport: Send + Sync {
    /// Start opening a channel. Must not block; the outcome arrives as an
    /// `Opened` or `Closed` event.
    fn open(&self, url: &str, events: ChannelEventSender) -> Box<dyn MessageChannel>;
}
