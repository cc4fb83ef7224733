//! Text frame encoding and decoding.

use crate::events::{ClientEvent, ServerEvent};

/// Largest inbound text frame accepted, in bytes. Every client intent fits
/// comfortably in this.
pub const MAX_FRAME_LEN: usize = 4 * 1024;

/// Error type for codec operations
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Frame exceeds [`MAX_FRAME_LEN`]
    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),

    /// Frame is not a known event or its payload is malformed
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Display name failed validation
    #[error("Invalid name: {0}")]
    InvalidName(&'static str),
}

/// Decode a client intent from a text frame
///
/// # Errors
///
/// Returns an error if the frame is oversized, is not valid JSON, names an
/// unknown event, or carries an invalid payload (including off-deck votes).
pub fn decode_client_event(frame: &str) -> Result<ClientEvent, ProtocolError> {
    if frame.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(frame.len()));
    }
    Ok(serde_json::from_str(frame)?)
}

/// Encode a server event to a text frame
///
/// # Errors
///
/// Returns an error if serialization fails
pub fn encode_server_event(event: &ServerEvent) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(event)?)
}
