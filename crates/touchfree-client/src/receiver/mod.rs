//! Message receivers
//!
//! A receiver owns a disjoint set of action codes. The router hands it every
//! inbound message carrying one of those codes via [`Receiver::receive`],
//! which only decodes and buffers. Nothing observable happens until the
//! periodic [`Receiver::tick`], which drains the buffer and resolves
//! callbacks or queues events.
//!
//! ## Buffering
//!
//! Two buffer shapes cover every receiver:
//!
//! - [`Drainable`]: FIFO queue, one item handled per tick
//! - [`LatestValue`]: single slot with a processed flag, used for
//!   edge-triggered state where only the most recent value matters
//!
//! ## Deferred dispatch
//!
//! Ticks never publish events directly. They push onto
//! [`TickContext::deferred`], and the controller flushes that queue after the
//! tick returns. A subscriber can therefore call back into the client without
//! observing a receiver half way through its drain.

pub mod callbacks;
pub mod edge;
mod handshake;
mod input;

use std::collections::VecDeque;

use serde_json::Value;

pub use callbacks::CallbackReceiver;
pub use edge::EdgeReceiver;
pub use handshake::HandshakeReceiver;
pub use input::{InputActionQueue, InputActionReceiver};

use crate::error::ClientError;
use crate::events::Dispatch;
use crate::handshake::HandshakeState;
use crate::protocol::ActionCode;
use crate::registry::Registries;

/// Mutable client state a receiver may touch while ticking
pub struct TickContext<'a> {
    pub registries: &'a mut Registries,
    pub handshake: &'a mut HandshakeState,
    pub deferred: &'a mut VecDeque<Dispatch>,
}

impl TickContext<'_> {
    pub fn defer(&mut self, dispatch: Dispatch) {
        self.deferred.push_back(dispatch);
    }
}

/// A consumer of one or more action codes
pub trait Receiver: Send {
    /// Short name used in logs and routing errors
    fn name(&self) -> &'static str;

    /// Codes this receiver owns. Must be non-empty and disjoint from every
    /// other registered receiver.
    fn action_codes(&self) -> &[ActionCode];

    /// Decode and buffer one message. Must not invoke callbacks or publish.
    fn receive(&mut self, action: ActionCode, content: Value) -> Result<(), ClientError>;

    /// Handle buffered messages.
    fn tick(&mut self, ctx: &mut TickContext<'_>);
}

/// FIFO buffer drained one item per tick
#[derive(Debug)]
pub struct Drainable<T> {
    items: VecDeque<T>,
}

impl<T> Default for Drainable<T> {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }
}

impl<T> Drainable<T> {
    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Latest-value slot for edge-triggered state.
///
/// A value is delivered at most once. Storing the value that was just
/// delivered again is a no-op; storing anything else re-arms the slot. Only
/// the stored slot is compared, so `A, B, A` with ticks in between delivers
/// all three.
#[derive(Debug)]
pub struct LatestValue<T> {
    slot: Option<T>,
    processed: bool,
}

impl<T> Default for LatestValue<T> {
    fn default() -> Self {
        Self {
            slot: None,
            processed: true,
        }
    }
}

impl<T: PartialEq + Clone> LatestValue<T> {
    pub fn set(&mut self, value: T) {
        if self.processed && self.slot.as_ref() == Some(&value) {
            return;
        }
        self.slot = Some(value);
        self.processed = false;
    }

    /// The pending value, marking it processed
    pub fn take_pending(&mut self) -> Option<T> {
        if self.processed {
            return None;
        }
        self.processed = true;
        self.slot.clone()
    }

    pub fn is_pending(&self) -> bool {
        !self.processed
    }

    pub fn current(&self) -> Option<&T> {
        self.slot.as_ref()
    }
}

/// Decode `content` as `T`, naming the receiver in the error
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    receiver: &'static str,
    action: ActionCode,
    content: Value,
) -> Result<T, ClientError> {
    serde_json::from_value(content).map_err(|source| ClientError::MalformedMessage {
        context: format!("{} content for the {} receiver", action, receiver),
        source,
    })
}
