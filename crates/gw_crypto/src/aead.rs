//! Authenticated encryption: AES-256-GCM with detached tag.
//!
//! Key: 32 bytes. Nonce: 12 bytes (random, never reused - every key in the
//! protocol encrypts exactly one message). Tag: 16 bytes.
//!
//! The tag is returned separately from the ciphertext because the two packet
//! formats place it differently: V1 appends it, V2 puts it before the
//! ciphertext.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::AeadInPlace;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::buffer::SecretBuf;
use crate::error::CryptoError;

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext`, authenticating `aad` alongside it.
///
/// Returns (ciphertext, tag). Empty plaintext and empty AAD are both valid.
pub fn seal(
    key: &SecretBuf,
    nonce: &[u8; NONCE_LEN],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_LEN]), CryptoError> {
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::AeadEncrypt)?;

    let mut buf = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), aad, &mut buf)
        .map_err(|_| CryptoError::AeadEncrypt)?;

    Ok((buf, tag.into()))
}

/// Decrypt and verify. A tag mismatch (wrong key, wrong AAD, or corrupted
/// bytes) yields [`CryptoError::AeadDecrypt`].
pub fn open(
    key: &SecretBuf,
    nonce: &[u8; NONCE_LEN],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::AeadDecrypt)?;

    let mut buf = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce),
            aad,
            &mut buf,
            GenericArray::from_slice(tag),
        )
        .map_err(|_| CryptoError::AeadDecrypt)?;

    Ok(Zeroizing::new(buf))
}

/// Fresh random 96-bit nonce from the OS CSPRNG.
pub fn random_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SecretBuf {
        SecretBuf::new([0x11; 32])
    }

    #[test]
    fn seal_open_roundtrip() {
        let nonce = random_nonce();
        let (ct, tag) = seal(&key(), &nonce, b"meta", b"hello world").unwrap();
        assert_eq!(ct.len(), 11);
        let pt = open(&key(), &nonce, b"meta", &ct, &tag).unwrap();
        assert_eq!(pt.as_slice(), b"hello world");
    }

    #[test]
    fn empty_plaintext_is_valid() {
        let nonce = random_nonce();
        let (ct, tag) = seal(&key(), &nonce, &[], &[]).unwrap();
        assert!(ct.is_empty());
        let pt = open(&key(), &nonce, &[], &ct, &tag).unwrap();
        assert!(pt.is_empty());
    }

    #[test]
    fn corrupted_ciphertext_fails_auth() {
        let nonce = random_nonce();
        let (mut ct, tag) = seal(&key(), &nonce, &[], b"payload").unwrap();
        ct[0] ^= 0x01;
        assert!(matches!(
            open(&key(), &nonce, &[], &ct, &tag),
            Err(CryptoError::AeadDecrypt)
        ));
    }

    #[test]
    fn wrong_aad_fails_auth() {
        let nonce = random_nonce();
        let (ct, tag) = seal(&key(), &nonce, b"right", b"payload").unwrap();
        assert!(open(&key(), &nonce, b"wrong", &ct, &tag).is_err());
    }

    #[test]
    fn wrong_key_fails_auth() {
        let nonce = random_nonce();
        let (ct, tag) = seal(&key(), &nonce, &[], b"payload").unwrap();
        let other = SecretBuf::new([0x22; 32]);
        assert!(open(&other, &nonce, &[], &ct, &tag).is_err());
    }
}
