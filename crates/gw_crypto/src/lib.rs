//! gw_crypto - Ghostwire cryptographic primitives
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - All key material lives in [`SecretBuf`] and is zeroized on drop.
//! - Derivation produces a new owned buffer; the source is either consumed
//!   and wiped (chain keys) or wiped after use (message keys).
//!
//! # Module layout
//! - `buffer` - zero-on-drop 32-byte secret container
//! - `kdf`    - HKDF-SHA256 key derivation
//! - `aead`   - AES-256-GCM encrypt/decrypt with detached tag
//! - `chain`  - symmetric ratchet chain (key + step counter)
//! - `error`  - unified error type

pub mod aead;
pub mod buffer;
pub mod chain;
pub mod error;
pub mod kdf;

pub use buffer::{SecretBuf, KEY_LEN};
pub use chain::Chain;
pub use error::CryptoError;
