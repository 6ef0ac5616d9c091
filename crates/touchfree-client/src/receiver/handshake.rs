//! Version handshake response receiver

use serde_json::Value;
use tracing::warn;

use super::{decode, Drainable, Receiver, TickContext};
use crate::error::ClientError;
use crate::protocol::{ActionCode, HandshakeResponse};

/// Resolves the pending handshake and updates the connection's handshake
/// state before the caller's callback sees the response.
#[derive(Default)]
pub struct HandshakeReceiver {
    queue: Drainable<HandshakeResponse>,
}

impl Receiver for HandshakeReceiver {
    fn name(&self) -> &'static str {
        "handshake"
    }

    fn action_codes(&self) -> &[ActionCode] {
        &[ActionCode::VersionHandshakeResponse]
    }

    fn receive(&mut self, action: ActionCode, content: Value) -> Result<(), ClientError> {
        let response = decode(self.name(), action, content)?;
        self.queue.push(response);
        Ok(())
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        let Some(response) = self.queue.pop() else {
            return;
        };

        // Only a handshake this connection asked for may change its state
        let Some(callback) = ctx.registries.handshake.remove(&response.request_id) else {
            if response.request_id.is_empty() {
                warn!("Handshake response carried no requestID");
            } else {
                warn!(
                    request_id = %response.request_id,
                    "Ignoring handshake response with no pending request"
                );
            }
            return;
        };

        ctx.handshake.apply(&response, &mut *ctx.deferred);
        callback(Ok(response));
    }
}
