//! Symmetric ratchet chain.
//!
//! A [`Chain`] owns the current chain key plus a step counter. Advancing it
//! derives two independent keys from the current chain key:
//!
//!   MK  = HKDF(CK, info = "RATCHET-MESSAGE-KEY")   - used once, then wiped
//!   CK' = HKDF(CK, info = "RATCHET-CHAIN-KEY")     - replaces CK, which is wiped
//!
//! The two info labels keep the derivations domain-separated: knowing a
//! message key reveals nothing about the chain key that produced it, and
//! vice versa. After `n` advances the chain key is the n-fold chain
//! derivation of the seed, so two chains grown from the same seed stay in
//! lockstep.

use crate::buffer::SecretBuf;
use crate::error::CryptoError;
use crate::kdf;

const CHAIN_INFO: &[u8] = b"RATCHET-CHAIN-KEY";
const MESSAGE_INFO: &[u8] = b"RATCHET-MESSAGE-KEY";

/// Chain key plus the number of advances performed on it.
///
/// Step `n` (1-based) names the message key produced by the n-th advance.
pub struct Chain {
    key: SecretBuf,
    step: u64,
}

impl Chain {
    /// Seed a fresh chain at step 0.
    pub fn new(key: SecretBuf) -> Self {
        Self { key, step: 0 }
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    /// Derive the next message key and move the chain forward one step.
    ///
    /// The previous chain key is wiped when it is replaced. The caller owns
    /// the returned message key and is responsible for letting it drop (or
    /// wiping it) once the message is sealed or opened.
    pub fn advance(&mut self) -> Result<SecretBuf, CryptoError> {
        let mk = kdf::derive_key(self.key.as_bytes(), None, MESSAGE_INFO)?;
        let next = kdf::derive_key(self.key.as_bytes(), None, CHAIN_INFO)?;
        self.key = next;
        self.step += 1;
        Ok(mk)
    }

    /// Replace the chain key and reset the counter to 0. Used by root
    /// refresh; the old key is wiped on drop.
    pub fn reseed(&mut self, key: SecretBuf) {
        self.key = key;
        self.step = 0;
    }

    /// Independent copy for lookahead walks. Advancing the shadow never
    /// touches this chain; the shadow's key material wipes itself on drop.
    pub fn shadow(&self) -> Chain {
        Chain {
            key: self.key.clone(),
            step: self.step,
        }
    }
}
