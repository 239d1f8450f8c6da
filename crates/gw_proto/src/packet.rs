//! Wire layouts for the two packet variants.
//!
//! V1 (metadata-in-clear), variable length `|plaintext| + 44`:
//!
//!   [ salt (16) | nonce (12) | ciphertext | tag (16) ]
//!
//! V2 (zero-metadata), fixed 556 bytes:
//!
//!   [ beacon (16) | nonce (12) | tag (16) | ciphertext (512) ]
//!
//! Parsing returns borrowed views into the packet; nothing here touches key
//! material.

use rand::RngCore;

use gw_crypto::aead::{NONCE_LEN, TAG_LEN};

use crate::codec::FIXED_PAYLOAD_SIZE;
use crate::error::RatchetError;

/// Per-message random salt length (V1).
pub const SALT_LEN: usize = 16;

/// Blinded lookup beacon length (V2).
pub const BEACON_LEN: usize = 16;

/// Fresh random 16-byte salt from the OS CSPRNG.
pub fn random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

// ── V1 ───────────────────────────────────────────────────────────────────────

/// Borrowed view of a V1 packet.
#[derive(Debug)]
pub struct V1Packet<'a> {
    pub salt: &'a [u8; SALT_LEN],
    pub nonce: &'a [u8; NONCE_LEN],
    pub ciphertext: &'a [u8],
    pub tag: &'a [u8; TAG_LEN],
}

impl<'a> V1Packet<'a> {
    /// Fixed overhead around the ciphertext: salt + nonce + tag = 44 bytes.
    pub const OVERHEAD: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

    pub fn parse(packet: &'a [u8]) -> Result<Self, RatchetError> {
        if packet.len() < Self::OVERHEAD {
            return Err(RatchetError::MalformedPacket(format!(
                "{} bytes, need at least {}",
                packet.len(),
                Self::OVERHEAD
            )));
        }
        let (salt, rest) = packet.split_at(SALT_LEN);
        let (nonce, rest) = rest.split_at(NONCE_LEN);
        let (ciphertext, tag) = rest.split_at(rest.len() - TAG_LEN);
        Ok(Self {
            salt: salt.try_into().expect("length checked above"),
            nonce: nonce.try_into().expect("length checked above"),
            ciphertext,
            tag: tag.try_into().expect("length checked above"),
        })
    }

    pub fn assemble(
        salt: &[u8; SALT_LEN],
        nonce: &[u8; NONCE_LEN],
        ciphertext: &[u8],
        tag: &[u8; TAG_LEN],
    ) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::OVERHEAD + ciphertext.len());
        out.extend_from_slice(salt);
        out.extend_from_slice(nonce);
        out.extend_from_slice(ciphertext);
        out.extend_from_slice(tag);
        out
    }
}

// ── V2 ───────────────────────────────────────────────────────────────────────

/// Borrowed view of a V2 packet.
#[derive(Debug)]
pub struct V2Packet<'a> {
    pub beacon: &'a [u8; BEACON_LEN],
    pub nonce: &'a [u8; NONCE_LEN],
    pub tag: &'a [u8; TAG_LEN],
    pub ciphertext: &'a [u8],
}

impl<'a> V2Packet<'a> {
    /// Every V2 packet is exactly this long: 16 + 12 + 16 + 512 = 556.
    pub const LEN: usize = BEACON_LEN + NONCE_LEN + TAG_LEN + FIXED_PAYLOAD_SIZE;

    pub fn parse(packet: &'a [u8]) -> Result<Self, RatchetError> {
        if packet.len() != Self::LEN {
            return Err(RatchetError::MalformedPacket(format!(
                "{} bytes, zero-metadata packets are exactly {}",
                packet.len(),
                Self::LEN
            )));
        }
        let (beacon, rest) = packet.split_at(BEACON_LEN);
        let (nonce, rest) = rest.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);
        Ok(Self {
            beacon: beacon.try_into().expect("length checked above"),
            nonce: nonce.try_into().expect("length checked above"),
            tag: tag.try_into().expect("length checked above"),
            ciphertext,
        })
    }

    pub fn assemble(
        beacon: &[u8; BEACON_LEN],
        nonce: &[u8; NONCE_LEN],
        ciphertext: &[u8],
        tag: &[u8; TAG_LEN],
    ) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(beacon);
        out.extend_from_slice(nonce);
        out.extend_from_slice(tag);
        out.extend_from_slice(ciphertext);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v1_roundtrip() {
        let salt = [1u8; SALT_LEN];
        let nonce = [2u8; NONCE_LEN];
        let tag = [3u8; TAG_LEN];
        let wire = V1Packet::assemble(&salt, &nonce, b"ciphertext", &tag);
        assert_eq!(wire.len(), b"ciphertext".len() + V1Packet::OVERHEAD);

        let pkt = V1Packet::parse(&wire).unwrap();
        assert_eq!(pkt.salt, &salt);
        assert_eq!(pkt.nonce, &nonce);
        assert_eq!(pkt.ciphertext, b"ciphertext");
        assert_eq!(pkt.tag, &tag);
    }

    #[test]
    fn v1_empty_ciphertext_parses() {
        let wire = V1Packet::assemble(&[0; SALT_LEN], &[0; NONCE_LEN], &[], &[0; TAG_LEN]);
        assert_eq!(wire.len(), V1Packet::OVERHEAD);
        let pkt = V1Packet::parse(&wire).unwrap();
        assert!(pkt.ciphertext.is_empty());
    }

    #[test]
    fn v1_rejects_truncated() {
        assert!(matches!(
            V1Packet::parse(&[0u8; 43]),
            Err(RatchetError::MalformedPacket(_))
        ));
    }

    #[test]
    fn v2_roundtrip() {
        let beacon = [4u8; BEACON_LEN];
        let nonce = [5u8; NONCE_LEN];
        let tag = [6u8; TAG_LEN];
        let ct = [7u8; FIXED_PAYLOAD_SIZE];
        let wire = V2Packet::assemble(&beacon, &nonce, &ct, &tag);
        assert_eq!(wire.len(), V2Packet::LEN);

        let pkt = V2Packet::parse(&wire).unwrap();
        assert_eq!(pkt.beacon, &beacon);
        assert_eq!(pkt.nonce, &nonce);
        assert_eq!(pkt.tag, &tag);
        assert_eq!(pkt.ciphertext, &ct);
    }

    #[test]
    fn v2_rejects_any_other_length() {
        assert!(V2Packet::parse(&[0u8; V2Packet::LEN - 1]).is_err());
        assert!(V2Packet::parse(&vec![0u8; V2Packet::LEN + 1]).is_err());
        assert!(V2Packet::parse(&[]).is_err());
    }
}
