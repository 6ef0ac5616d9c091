//! Binary frame classification

/// Binary message type of hand render data
pub const HAND_RENDER_DATA: i32 = 1;

/// A binary frame after its type prefix has been inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryFrame<'a> {
    /// Hand render data; the slice is the whole frame, prefix included
    HandRenderData(&'a [u8]),
    /// A type this client does not understand
    Unknown(i32),
    /// Shorter than the 4-byte type prefix
    Truncated,
}

/// Read the little-endian type prefix of a binary frame.
pub fn classify_binary(frame: &[u8]) -> BinaryFrame<'_> {
    let Some(prefix) = frame.get(..4) else {
        return BinaryFrame::Truncated;
    };
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(prefix);

    match i32::from_le_bytes(bytes) {
        HAND_RENDER_DATA => BinaryFrame::HandRenderData(frame),
        other => BinaryFrame::Unknown(other),
    }
}
