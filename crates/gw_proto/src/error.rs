use thiserror::Error;

use gw_crypto::CryptoError;

#[derive(Debug, Error)]
pub enum RatchetError {
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    #[error("Replay or stale message: step {target} is not ahead of current step {current}")]
    ReplayOrStale { target: u64, current: u64 },

    #[error("Skip distance {distance} exceeds safety limit {limit}")]
    SkipTooLarge { distance: u64, limit: u64 },

    #[error("Skipped-key store full: {stored} held, {requested} more requested (limit {limit})")]
    SkipStoreOverflow {
        stored: usize,
        requested: u64,
        limit: usize,
    },

    #[error("Unknown beacon {beacon}: no cached key matches this packet")]
    UnknownBeacon { beacon: String },

    #[error("Payload too large: {size} bytes of content, fixed payload is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Invalid shared secret: expected {expected} bytes, got {actual}")]
    BadInput { expected: usize, actual: usize },

    #[error("Header serialisation error: {0}")]
    Header(#[from] serde_json::Error),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
