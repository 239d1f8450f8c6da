//! Metadata-in-clear symmetric ratchet (V1).
//!
//! State separation:
//!   CK - chain key (advances on every message, old key wiped)
//!   MK - message key (derived from CK, used once, then wiped)
//!
//! The sender derives a fresh AES key per message from MK plus a random
//! 16-byte salt, so even the one-time message key never touches the cipher
//! directly. Sequence numbers travel in the caller's AAD as a `seq:<n>`
//! field; the packet itself carries no counters.
//!
//! Forward secrecy: old chain keys and message keys are deleted. There is no
//! DH step in this variant; both sides must be seeded from the same 32-byte
//! shared secret (e.g. a PQ KEM output).

use std::collections::HashMap;

use zeroize::Zeroizing;

use gw_crypto::aead;
use gw_crypto::kdf;
use gw_crypto::{Chain, SecretBuf, KEY_LEN};

use crate::error::RatchetError;
use crate::header::short_message_id;
use crate::packet::{random_salt, V1Packet};

/// HKDF info label for the per-packet AES key.
const PACKET_KEY_INFO: &[u8] = b"AES-GCM-256-KEY";

/// Maximum steps the receiver will fast-forward for a single packet.
/// Limits key-derivation work a hostile AAD can trigger.
const MAX_SKIP_RANGE: u64 = 1000;

/// Maximum skipped keys held in memory across all gaps.
const MAX_STORED_KEYS: usize = 2000;

/// Build the canonical metadata AAD the receiver knows how to parse:
/// `sender:<id>|seq:<n>|ts:<unix-secs>|id:<8 random chars>`.
pub fn metadata_aad(sender_id: &str, seq: u64) -> String {
    format!(
        "sender:{sender_id}|seq:{seq}|ts:{}|id:{}",
        chrono::Utc::now().timestamp(),
        short_message_id()
    )
}

fn seed_chain(shared_secret: &[u8]) -> Result<Chain, RatchetError> {
    let key = SecretBuf::from_slice(shared_secret).map_err(|_| RatchetError::BadInput {
        expected: KEY_LEN,
        actual: shared_secret.len(),
    })?;
    Ok(Chain::new(key))
}

// ── Sender ───────────────────────────────────────────────────────────────────

/// Sending side of the V1 ratchet.
pub struct SenderRatchet {
    chain: Chain,
}

impl SenderRatchet {
    /// `shared_secret` must be exactly 32 bytes.
    pub fn new(shared_secret: &[u8]) -> Result<Self, RatchetError> {
        Ok(Self {
            chain: seed_chain(shared_secret)?,
        })
    }

    /// Number of messages sealed so far.
    pub fn step(&self) -> u64 {
        self.chain.step()
    }

    /// Seal `plaintext` under the next message key.
    ///
    /// Packet layout: `salt(16) || nonce(12) || ciphertext || tag(16)`, so
    /// the wire size is `plaintext.len() + 44`. The AAD is authenticated but
    /// NOT transmitted; the caller delivers it out of band.
    pub fn encrypt(&mut self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, RatchetError> {
        let mk = self.chain.advance()?;
        let salt = random_salt();
        let nonce = aead::random_nonce();

        let aes_key = kdf::derive_key(mk.as_bytes(), Some(&salt), PACKET_KEY_INFO)?;
        let (ciphertext, tag) = aead::seal(&aes_key, &nonce, aad, plaintext)?;

        Ok(V1Packet::assemble(&salt, &nonce, &ciphertext, &tag))
    }
}

// ── Receiver ─────────────────────────────────────────────────────────────────

/// Receiving side of the V1 ratchet, tolerant of out-of-order delivery.
pub struct ReceiverRatchet {
    chain: Chain,
    skipped: HashMap<u64, SecretBuf>,
}

impl ReceiverRatchet {
    /// `shared_secret` must be exactly 32 bytes and match the sender's.
    pub fn new(shared_secret: &[u8]) -> Result<Self, RatchetError> {
        Ok(Self {
            chain: seed_chain(shared_secret)?,
            skipped: HashMap::new(),
        })
    }

    /// Highest step the chain has advanced through. Never decreases.
    pub fn step(&self) -> u64 {
        self.chain.step()
    }

    /// Skipped message keys currently held for not-yet-seen packets.
    pub fn skipped_key_count(&self) -> usize {
        self.skipped.len()
    }

    /// Open a packet, catching the chain up or consuming a stored skipped
    /// key as needed.
    ///
    /// The target step comes from a `seq:<n>` field in the AAD when present
    /// (digits up to the next `|` or end of string); anything unparsable
    /// silently falls back to `step + 1`, i.e. in-order delivery. A key
    /// consumed by a packet that then fails authentication is NOT put back:
    /// that step is burned.
    pub fn decrypt(
        &mut self,
        packet: &[u8],
        aad: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, RatchetError> {
        let pkt = V1Packet::parse(packet)?;
        let target = target_step_from_aad(aad, self.chain.step() + 1);
        let mk = self.take_message_key(target)?;

        let aes_key = kdf::derive_key(mk.as_bytes(), Some(pkt.salt), PACKET_KEY_INFO)?;
        Ok(aead::open(&aes_key, pkt.nonce, aad, pkt.ciphertext, pkt.tag)?)
    }

    /// Produce the message key for `target`, advancing the chain and storing
    /// intermediate keys when the packet is from the future.
    ///
    /// All bounds are checked before the chain moves, so a rejected packet
    /// leaves the ratchet exactly as it was.
    fn take_message_key(&mut self, target: u64) -> Result<SecretBuf, RatchetError> {
        if let Some(mk) = self.skipped.remove(&target) {
            tracing::debug!(step = target, "using stored key for skipped step");
            return Ok(mk);
        }

        let current = self.chain.step();
        if target <= current {
            return Err(RatchetError::ReplayOrStale { target, current });
        }

        let distance = target - current;
        if distance > MAX_SKIP_RANGE {
            return Err(RatchetError::SkipTooLarge {
                distance,
                limit: MAX_SKIP_RANGE,
            });
        }
        if self.skipped.len() as u64 + distance > MAX_STORED_KEYS as u64 {
            return Err(RatchetError::SkipStoreOverflow {
                stored: self.skipped.len(),
                requested: distance,
                limit: MAX_STORED_KEYS,
            });
        }

        if distance > 1 {
            tracing::debug!(from = current, to = target, "catching up ratchet chain");
        }
        loop {
            let mk = self.chain.advance()?;
            if self.chain.step() == target {
                return Ok(mk);
            }
            self.skipped.insert(self.chain.step(), mk);
        }
    }
}

/// Extract the target step from a `seq:<digits>` field in the AAD.
fn target_step_from_aad(aad: &[u8], fallback: u64) -> u64 {
    let text = String::from_utf8_lossy(aad);
    let Some(at) = text.find("seq:") else {
        return fallback;
    };
    let segment = text[at + 4..].split('|').next().unwrap_or("");
    segment.parse().unwrap_or(fallback)
}
