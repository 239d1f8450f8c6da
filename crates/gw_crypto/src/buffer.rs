//! Zero-on-drop secret buffer.
//!
//! Every chain key, message key and root key in the protocol is routed
//! through [`SecretBuf`]. The wipe goes through the `zeroize` crate, which
//! uses volatile writes followed by a compiler fence, so the clear cannot
//! be elided by the optimizer.

use zeroize::Zeroize;

use crate::error::CryptoError;

/// Length of every symmetric key in the protocol (AES-256 / HKDF output).
pub const KEY_LEN: usize = 32;

/// Fixed-size mutable secret container, zeroized on drop and on [`wipe`].
///
/// `Clone` exists for the few places the protocol needs an owned duplicate:
/// seeding a chain from a retained root key, the zero-metadata receiver's
/// lookup cache, and its shadow chain. Every copy wipes itself
/// independently. Everywhere else, ownership moves.
///
/// [`wipe`]: SecretBuf::wipe
#[derive(Clone)]
pub struct SecretBuf([u8; KEY_LEN]);

impl SecretBuf {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// An all-zero buffer, typically filled in place by a KDF.
    pub fn zeroed() -> Self {
        Self([0u8; KEY_LEN])
    }

    /// Fails with [`CryptoError::InvalidKey`] unless `bytes` is exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKey(format!("expected {KEY_LEN} bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8; KEY_LEN] {
        &mut self.0
    }

    /// Overwrite the contents with zeros immediately.
    pub fn wipe(&mut self) {
        self.0.zeroize();
    }
}

impl Drop for SecretBuf {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for SecretBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecretBuf").field(&"[REDACTED]").finish()
    }
}

/// Constant-time comparison to prevent timing side channels.
impl PartialEq for SecretBuf {
    fn eq(&self, other: &Self) -> bool {
        let mut diff = 0u8;
        for (x, y) in self.0.iter().zip(other.0.iter()) {
            diff |= x ^ y;
        }
        diff == 0
    }
}

impl Eq for SecretBuf {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wipe_clears_contents() {
        let mut buf = SecretBuf::new([0xAB; KEY_LEN]);
        buf.wipe();
        assert_eq!(buf.as_bytes(), &[0u8; KEY_LEN]);
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        assert!(SecretBuf::from_slice(&[0u8; 16]).is_err());
        assert!(SecretBuf::from_slice(&[0u8; 33]).is_err());
        assert!(SecretBuf::from_slice(&[0u8; 32]).is_ok());
    }

    #[test]
    fn debug_redacts_contents() {
        let buf = SecretBuf::new([0x42; KEY_LEN]);
        let rendered = format!("{buf:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("42"));
    }

    #[test]
    fn equality_compares_contents() {
        let a = SecretBuf::new([1; KEY_LEN]);
        let b = SecretBuf::new([1; KEY_LEN]);
        let c = SecretBuf::new([2; KEY_LEN]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
