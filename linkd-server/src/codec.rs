//! Line framing
//!
//! One JSON-encoded [`Message`] per line, in both directions.

use linkd_bus::{BusError, Message};

/// Encode a frame, newline included
pub fn encode(message: &Message) -> Result<String, BusError> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Decode one line (without its newline)
pub fn decode(line: &str) -> Result<Message, BusError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(BusError::MalformedFrame("empty frame".to_string()));
    }
    Ok(serde_json::from_str(line)?)
}
