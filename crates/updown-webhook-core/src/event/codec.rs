//! JSON decoding and encoding of event batches.

use super::WireEvent;

/// Errors raised while decoding a request body
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Request body is not a valid event batch: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode a request body into events, preserving source order
///
/// The body must be a JSON array of event objects. Payload objects that are
/// irrelevant to an event's kind are accepted here; rejecting events is the
/// job of validation.
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] if the body is not JSON, is not an
/// array, or a field has the wrong type (including unparseable timestamps).
pub fn decode_batch(body: &[u8]) -> Result<Vec<WireEvent>, DecodeError> {
    Ok(serde_json::from_slice(body)?)
}

/// Encode events into the same JSON shape that [`decode_batch`] accepts
pub fn encode_batch(batch: &[WireEvent]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(batch)
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
