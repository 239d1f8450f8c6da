//! Hidden header carried inside every zero-metadata payload.
//!
//! The header never appears on the wire in clear; it is framed into the
//! padded payload and only parsed after the AEAD tag verifies. Wire keys are
//! single letters to keep the framed content small. The encoding is private
//! to this implementation (only the peer that wrote a header reads it).

use serde::{Deserialize, Serialize};

use crate::error::RatchetError;

/// Length of the random per-message id.
const MESSAGE_ID_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiddenHeader {
    /// Sender identity, as supplied at ratchet construction.
    #[serde(rename = "s")]
    pub sender_id: String,

    /// Ratchet step this message was sealed at (1-based).
    #[serde(rename = "n")]
    pub step: u64,

    /// Unix-seconds send timestamp.
    #[serde(rename = "t")]
    pub sent_at: i64,

    /// Short random id for display and dedup; no cryptographic meaning.
    #[serde(rename = "i")]
    pub message_id: String,
}

impl HiddenHeader {
    /// Stamp a header for a message about to be sealed at `step`.
    pub fn new(sender_id: &str, step: u64) -> Self {
        Self {
            sender_id: sender_id.to_string(),
            step,
            sent_at: chrono::Utc::now().timestamp(),
            message_id: short_message_id(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, RatchetError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RatchetError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// First 8 characters of a v4 UUID.
pub(crate) fn short_message_id() -> String {
    let id = uuid::Uuid::new_v4().to_string();
    id[..MESSAGE_ID_LEN].to_string()
}
