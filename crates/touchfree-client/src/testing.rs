//! In-memory transport for engine tests

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use crate::channel::{ChannelEventSender, Frame, MessageChannel, Transport};
use crate::error::ClientError;

#[derive(Default)]
struct State {
    opened: Vec<(String, ChannelEventSender)>,
    sent: Vec<(u64, Frame)>,
    closed: Vec<u64>,
    fail_sends: bool,
}

/// Records every channel it opens and every frame sent through them
#[derive(Clone, Default)]
pub(crate) struct MemoryTransport {
    state: Arc<Mutex<State>>,
}

impl MemoryTransport {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub(crate) fn opened_urls(&self) -> Vec<String> {
        self.state().opened.iter().map(|(url, _)| url.clone()).collect()
    }

    /// Event sender handed to the most recently opened channel
    pub(crate) fn last_sender(&self) -> ChannelEventSender {
        self.state().opened.last().unwrap().1.clone()
    }

    /// Text frames sent so far, parsed as JSON, draining the record
    pub(crate) fn take_sent(&self) -> Vec<Value> {
        self.state()
            .sent
            .drain(..)
            .filter_map(|(_, frame)| match frame {
                Frame::Text(text) => Some(serde_json::from_str(&text).unwrap()),
                Frame::Binary(_) => None,
            })
            .collect()
    }

    pub(crate) fn closed(&self) -> Vec<u64> {
        self.state().closed.clone()
    }

    pub(crate) fn fail_sends(&self, fail: bool) {
        self.state().fail_sends = fail;
    }
}

impl Transport for MemoryTransport {
    fn open(&self, url: &str, events: ChannelEventSender) -> Box<dyn MessageChannel> {
        let connection_id = events.connection_id();
        self.state().opened.push((url.to_string(), events));
        Box::new(MemoryChannel {
            connection_id,
            transport: self.clone(),
        })
    }
}

struct MemoryChannel {
    connection_id: u64,
    transport: MemoryTransport,
}

impl MessageChannel for MemoryChannel {
    fn send(&mut self, frame: Frame) -> Result<(), ClientError> {
        let mut state = self.transport.state();
        if state.fail_sends {
            return Err(ClientError::ChannelClosed);
        }
        state.sent.push((self.connection_id, frame));
        Ok(())
    }

    fn close(&mut self) {
        self.transport.state().closed.push(self.connection_id);
    }
}
