#![forbid(unsafe_code)]

//! JSON wire codec for grid batches.
//!
//! A batch crosses the host/rendering boundary as one JSON array:
//!
//! ```json
//! [
//!   {"kind": "Insert", "y": 0, "html": "<span class=\"col0\">a</span>"},
//!   {"kind": "Update", "y": 0, "x": 0, "html": "<span class=\"col0\">b</span>"},
//!   {"kind": "Remove", "y": 0, "x": 0}
//! ]
//! ```
//!
//! The whole array is decoded before anything is applied, so a malformed
//! batch never leaves a partially applied grid behind.

use thiserror::Error;

use crate::mutation::GridMutation;

/// Batch decoding/encoding failure.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("invalid grid batch JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a JSON batch into typed mutations, preserving order.
pub fn decode_batch(json: &str) -> Result<Vec<GridMutation>, WireError> {
    Ok(serde_json::from_str(json)?)
}

/// Encode mutations into the JSON batch shape.
pub fn encode_batch(mutations: &[GridMutation]) -> Result<String, WireError> {
    Ok(serde_json::to_string(mutations)?)
}
