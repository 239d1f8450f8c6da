//! Zero-metadata symmetric ratchet (V2).
//!
//! Everything an observer could correlate on is hidden: the header (sender,
//! step, timestamp, id) is encrypted inside the payload, every packet is
//! exactly 556 bytes, and the only cleartext identifier is a 16-byte
//! *beacon*, `HKDF(MK, info = "MESSAGE-LOOKUP-ID")`. The beacon is a blind
//! pseudorandom value to anyone without the chain, but the receiver keeps a
//! lookup table of beacons for every skipped key plus the next [`MAX_SKIP`]
//! lookahead keys, so packets are matched to keys in O(1) with no trial
//! decryption.
//!
//! Root refresh mixes caller-supplied entropy into the root key
//! (`HKDF(root || entropy, info = "ROOT-REFRESH")`) and restarts the chain
//! from the result. An attacker who captured the old state cannot follow
//! across a refresh, which is what heals the session after a compromise.

use std::collections::HashMap;

use zeroize::Zeroizing;

use gw_crypto::aead;
use gw_crypto::kdf;
use gw_crypto::{Chain, SecretBuf, KEY_LEN};

use crate::codec;
use crate::error::RatchetError;
use crate::header::HiddenHeader;
use crate::packet::{V2Packet, BEACON_LEN};

/// HKDF info label for the per-message AES key.
const PAYLOAD_KEY_INFO: &[u8] = b"AES-GCM-256-ZERO-METADATA";

/// HKDF info label for the blinded lookup beacon.
const LOOKUP_INFO: &[u8] = b"MESSAGE-LOOKUP-ID";

/// HKDF info label for root refresh.
const ROOT_REFRESH_INFO: &[u8] = b"ROOT-REFRESH";

/// Lookahead window: how many future message keys are indexed by beacon.
/// Also the furthest a single packet can pull the chain forward.
pub const MAX_SKIP: u64 = 100;

/// Maximum skipped keys retained; oldest are evicted (and wiped) beyond this.
pub const MAX_CACHE: usize = 50;

/// Beacon for a message key: the public identifier a packet carries.
fn beacon_for(mk: &SecretBuf) -> Result<[u8; BEACON_LEN], RatchetError> {
    let mut beacon = [0u8; BEACON_LEN];
    kdf::hkdf_expand(mk.as_bytes(), None, LOOKUP_INFO, &mut beacon)?;
    Ok(beacon)
}

/// `HKDF(root || entropy, info = "ROOT-REFRESH")`, identical on both sides.
fn refreshed_root(root: &SecretBuf, entropy: &[u8; 32]) -> Result<SecretBuf, RatchetError> {
    let mut ikm = Zeroizing::new([0u8; 2 * KEY_LEN]);
    ikm[..KEY_LEN].copy_from_slice(root.as_bytes());
    ikm[KEY_LEN..].copy_from_slice(entropy);
    Ok(kdf::derive_key(&ikm[..], None, ROOT_REFRESH_INFO)?)
}

fn seed_from_secret(shared_secret: &[u8]) -> Result<SecretBuf, RatchetError> {
    SecretBuf::from_slice(shared_secret).map_err(|_| RatchetError::BadInput {
        expected: KEY_LEN,
        actual: shared_secret.len(),
    })
}

// ── Sender ───────────────────────────────────────────────────────────────────

/// Sending side of the zero-metadata ratchet.
pub struct ZeroMetadataSender {
    root_key: SecretBuf,
    chain: Chain,
    sender_id: String,
}

impl ZeroMetadataSender {
    /// `shared_secret` must be exactly 32 bytes. `sender_id` only ever
    /// appears inside the encrypted hidden header.
    pub fn new(shared_secret: &[u8], sender_id: impl Into<String>) -> Result<Self, RatchetError> {
        let root_key = seed_from_secret(shared_secret)?;
        Ok(Self {
            chain: Chain::new(root_key.clone()),
            root_key,
            sender_id: sender_id.into(),
        })
    }

    /// Number of messages sealed on the current chain.
    pub fn step(&self) -> u64 {
        self.chain.step()
    }

    /// Mix fresh entropy into the root key and restart the chain from it.
    pub fn refresh_root(&mut self, entropy: &[u8; 32]) -> Result<(), RatchetError> {
        let new_root = refreshed_root(&self.root_key, entropy)?;
        self.chain.reseed(new_root.clone());
        self.root_key = new_root;
        tracing::debug!("root key refreshed, chain restarted");
        Ok(())
    }

    /// Seal `plaintext` into a fixed 556-byte packet:
    /// `beacon(16) || nonce(12) || tag(16) || ciphertext(512)`.
    ///
    /// The size check happens before the chain advances, so a message too
    /// large for the fixed payload is rejected without burning a step.
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, RatchetError> {
        let header = HiddenHeader::new(&self.sender_id, self.chain.step() + 1);
        let header_bytes = header.to_bytes()?;
        let padded = Zeroizing::new(codec::compose_padded(&header_bytes, plaintext)?);

        let mk = self.chain.advance()?;
        let aes_key = kdf::derive_key(mk.as_bytes(), None, PAYLOAD_KEY_INFO)?;
        let beacon = beacon_for(&mk)?;
        let nonce = aead::random_nonce();
        let (ciphertext, tag) = aead::seal(&aes_key, &nonce, &[], &padded)?;

        Ok(V2Packet::assemble(&beacon, &nonce, &ciphertext, &tag))
    }
}

// ── Receiver ─────────────────────────────────────────────────────────────────

/// Receiving side of the zero-metadata ratchet.
///
/// Holds skipped message keys (bounded by [`MAX_CACHE`]) and the beacon
/// lookup table, which is rebuilt after construction, every successful
/// decrypt, and every root refresh. The table always covers every skipped
/// key plus [`MAX_SKIP`] lookahead keys derived on a shadow chain; the real
/// chain never moves during a rebuild.
pub struct ZeroMetadataReceiver {
    root_key: SecretBuf,
    chain: Chain,
    skipped: HashMap<u64, SecretBuf>,
    lookup: HashMap<[u8; BEACON_LEN], (SecretBuf, u64)>,
}

impl ZeroMetadataReceiver {
    /// `shared_secret` must be exactly 32 bytes and match the sender's.
    pub fn new(shared_secret: &[u8]) -> Result<Self, RatchetError> {
        let root_key = seed_from_secret(shared_secret)?;
        let mut receiver = Self {
            chain: Chain::new(root_key.clone()),
            root_key,
            skipped: HashMap::new(),
            lookup: HashMap::new(),
        };
        receiver.rebuild_lookup_cache()?;
        Ok(receiver)
    }

    /// Highest step the chain has advanced through on the current root.
    pub fn step(&self) -> u64 {
        self.chain.step()
    }

    pub fn skipped_key_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn cached_beacon_count(&self) -> usize {
        self.lookup.len()
    }

    /// Whether a packet carrying this beacon would currently be accepted.
    pub fn has_beacon(&self, beacon: &[u8]) -> bool {
        <&[u8; BEACON_LEN]>::try_from(beacon)
            .map(|b| self.lookup.contains_key(b))
            .unwrap_or(false)
    }

    /// Mix fresh entropy into the root key, restart the chain, drop all
    /// skipped keys, and rebuild the lookup table.
    pub fn refresh_root(&mut self, entropy: &[u8; 32]) -> Result<(), RatchetError> {
        let new_root = refreshed_root(&self.root_key, entropy)?;
        self.chain.reseed(new_root.clone());
        self.root_key = new_root;
        self.skipped.clear();
        self.rebuild_lookup_cache()?;
        tracing::debug!("root key refreshed, skipped keys dropped");
        Ok(())
    }

    /// Open a packet and return the hidden header alongside the message.
    pub fn decrypt_with_header(
        &mut self,
        packet: &[u8],
    ) -> Result<(HiddenHeader, Zeroizing<Vec<u8>>), RatchetError> {
        let pkt = V2Packet::parse(packet)?;

        let target = match self.lookup.get(pkt.beacon) {
            Some(&(_, step)) => step,
            None => {
                return Err(RatchetError::UnknownBeacon {
                    beacon: hex::encode(pkt.beacon),
                })
            }
        };

        let mk = self.take_message_key(target, pkt.beacon)?;

        // A key consumed here is gone even if authentication fails below:
        // a packet corrupted in transit burns its step.
        let aes_key = kdf::derive_key(mk.as_bytes(), None, PAYLOAD_KEY_INFO)?;
        let padded = aead::open(&aes_key, pkt.nonce, &[], pkt.ciphertext, pkt.tag)?;

        let (header_bytes, message) = codec::split_padded(&padded)?;
        let header = HiddenHeader::from_bytes(header_bytes)?;
        let message = Zeroizing::new(message.to_vec());

        self.rebuild_lookup_cache()?;
        tracing::debug!(
            sender = %header.sender_id,
            step = header.step,
            id = %header.message_id,
            "zero-metadata packet opened"
        );
        Ok((header, message))
    }

    /// Open a packet, discarding the hidden header.
    pub fn decrypt(&mut self, packet: &[u8]) -> Result<Zeroizing<Vec<u8>>, RatchetError> {
        self.decrypt_with_header(packet).map(|(_, message)| message)
    }

    /// Produce the message key for `target`, either from the skipped store
    /// or by advancing the real chain and banking the intermediate keys.
    fn take_message_key(
        &mut self,
        target: u64,
        beacon: &[u8; BEACON_LEN],
    ) -> Result<SecretBuf, RatchetError> {
        if let Some(mk) = self.skipped.remove(&target) {
            tracing::debug!(step = target, "beacon matched a stored skipped key");
            return Ok(mk);
        }

        let mut delivered = None;
        if self.chain.step() < target {
            tracing::debug!(from = self.chain.step(), to = target, "catching up chain");
        }
        while self.chain.step() < target {
            let key = self.chain.advance()?;
            if self.chain.step() == target {
                delivered = Some(key);
            } else {
                self.skipped.insert(self.chain.step(), key);
            }
        }
        self.evict_oldest_skipped();

        // The lookup table only indexes skipped keys and future steps, so a
        // matched beacon always lands in one of the two arms above.
        delivered.ok_or_else(|| RatchetError::UnknownBeacon {
            beacon: hex::encode(beacon),
        })
    }

    /// Keep the skipped store inside [`MAX_CACHE`], wiping the oldest first.
    fn evict_oldest_skipped(&mut self) {
        while self.skipped.len() > MAX_CACHE {
            let Some(&oldest) = self.skipped.keys().min() else {
                break;
            };
            self.skipped.remove(&oldest);
            tracing::debug!(step = oldest, "evicted oldest skipped key");
        }
    }

    /// Rebuild the beacon table: one entry per skipped key, plus the next
    /// [`MAX_SKIP`] keys walked on a shadow chain. The shadow's key material
    /// wipes itself when the walk ends.
    fn rebuild_lookup_cache(&mut self) -> Result<(), RatchetError> {
        self.lookup.clear();

        for (&step, key) in &self.skipped {
            self.lookup.insert(beacon_for(key)?, (key.clone(), step));
        }

        let mut shadow = self.chain.shadow();
        for _ in 0..MAX_SKIP {
            let mk = shadow.advance()?;
            let beacon = beacon_for(&mk)?;
            self.lookup.insert(beacon, (mk, shadow.step()));
        }

        tracing::trace!(entries = self.lookup.len(), "lookup cache rebuilt");
        Ok(())
    }
}
