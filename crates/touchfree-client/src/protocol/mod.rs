//! TouchFree wire protocol
//!
//! Text frames carry JSON envelopes of the form
//! `{ "action": <ActionCode>, "content": { ... } }`. Binary frames start with
//! a little-endian `i32` identifying the binary message type.
//!
//! ## Modules
//!
//! - `action`: the closed set of action codes
//! - `messages`: envelope and payload types
//! - `input`: input action wire format and bitmask decoding
//! - `binary`: binary frame classification

mod action;
mod binary;
mod input;
mod messages;

pub use action::{ActionCode, UnknownActionCode};
pub use binary::{classify_binary, BinaryFrame, HAND_RENDER_DATA};
pub use input::{flags, HandChirality, HandType, InputAction, InputType, WireInputAction};
pub use messages::*;
