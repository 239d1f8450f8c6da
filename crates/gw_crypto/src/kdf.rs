//! HKDF-SHA256 key derivation (RFC 5869, extract-then-expand).

use hkdf::Hkdf;
use sha2::Sha256;

use crate::buffer::SecretBuf;
use crate::error::CryptoError;

/// Expand `ikm` + `info` into `output.len()` bytes of key material.
///
/// `salt` of `None` uses a zero-filled block of hash length, which is what
/// every intra-ratchet derivation in the protocol does; packet-level V1
/// derivations pass the per-message random salt.
pub fn hkdf_expand(
    ikm: &[u8],
    salt: Option<&[u8]>,
    info: &[u8],
    output: &mut [u8],
) -> Result<(), CryptoError> {
    let hk = Hkdf::<Sha256>::new(salt, ikm);
    hk.expand(info, output)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))
}

/// Derive a fresh 32-byte key, written directly into a [`SecretBuf`] so the
/// output never exists outside a wiped-on-drop container.
pub fn derive_key(ikm: &[u8], salt: Option<&[u8]>, info: &[u8]) -> Result<SecretBuf, CryptoError> {
    let mut key = SecretBuf::zeroed();
    hkdf_expand(ikm, salt, info, key.as_mut_bytes())?;
    Ok(key)
}
