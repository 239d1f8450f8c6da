//! gw_proto - Ghostwire symmetric ratchet protocol
//!
//! Two coexisting packet variants over the same HKDF-SHA256 / AES-256-GCM
//! substrate (see `gw_crypto`):
//!
//! - **V1, metadata-in-clear** ([`ratchet`]): per-message random salt, caller
//!   supplied AAD, sequence numbers bound via a `seq:` field in the AAD.
//!   Packet: `salt(16) || nonce(12) || ciphertext || tag(16)`.
//! - **V2, zero-metadata** ([`zero_metadata`]): the header travels encrypted
//!   inside a fixed 512-byte padded payload, every packet is exactly 556
//!   bytes, and a blinded 16-byte beacon lets the receiver find the matching
//!   key in O(1) without trial decryption. Root refresh reseeds the chain for
//!   post-compromise secrecy.
//!
//! Both receivers tolerate out-of-order delivery by caching skipped message
//! keys, with hard bounds so a hostile peer cannot force unbounded key
//! derivation or storage.
//!
//! # Module layout
//! - `packet`        - wire layouts for both variants
//! - `codec`         - fixed-size padded payload (V2 inner layout)
//! - `header`        - the hidden header carried inside V2 payloads
//! - `ratchet`       - V1 sender/receiver state machines
//! - `zero_metadata` - V2 sender/receiver state machines
//! - `error`         - unified error type

pub mod codec;
pub mod error;
pub mod header;
pub mod packet;
pub mod ratchet;
pub mod zero_metadata;

pub use error::RatchetError;
pub use header::HiddenHeader;
pub use ratchet::{ReceiverRatchet, SenderRatchet};
pub use zero_metadata::{ZeroMetadataReceiver, ZeroMetadataSender};
