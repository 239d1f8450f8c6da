//! Fixed-size padded payload, the plaintext under the V2 AEAD.
//!
//! Layout, always exactly [`FIXED_PAYLOAD_SIZE`] bytes:
//!
//!   [ header_len: u32 BE | header | message_len: u32 BE | message | padding ]
//!
//! The padding is uniform random, not zeros, so a padded payload is
//! indistinguishable from noise end to end. The receiver discards it after
//! reading the two length-prefixed fields.

use rand::RngCore;

use crate::error::RatchetError;

/// Every V2 payload is padded to exactly this many bytes before encryption.
pub const FIXED_PAYLOAD_SIZE: usize = 512;

const LEN_PREFIX: usize = 4;

/// Compose `header` and `message` into a fully padded payload.
///
/// Fails with [`RatchetError::PayloadTooLarge`] when the framed content does
/// not fit, leaving the caller free to check before it commits any state.
pub fn compose_padded(header: &[u8], message: &[u8]) -> Result<Vec<u8>, RatchetError> {
    let content_len = LEN_PREFIX + header.len() + LEN_PREFIX + message.len();
    if content_len > FIXED_PAYLOAD_SIZE {
        return Err(RatchetError::PayloadTooLarge {
            size: content_len,
            limit: FIXED_PAYLOAD_SIZE,
        });
    }

    let mut out = Vec::with_capacity(FIXED_PAYLOAD_SIZE);
    out.extend_from_slice(&(header.len() as u32).to_be_bytes());
    out.extend_from_slice(header);
    out.extend_from_slice(&(message.len() as u32).to_be_bytes());
    out.extend_from_slice(message);

    let mut padding = vec![0u8; FIXED_PAYLOAD_SIZE - content_len];
    rand::rngs::OsRng.fill_bytes(&mut padding);
    out.extend_from_slice(&padding);

    Ok(out)
}

/// Split a decrypted payload into its (header, message) views.
///
/// Trailing padding is ignored. The payload is AEAD-authenticated before it
/// reaches this point, so a bounds violation here means a peer running a
/// different framing, not tampering.
pub fn split_padded(padded: &[u8]) -> Result<(&[u8], &[u8]), RatchetError> {
    let header_len = read_len(padded, 0)?;
    let header_end = LEN_PREFIX + header_len;
    let message_len = read_len(padded, header_end)?;
    let message_start = header_end + LEN_PREFIX;

    Ok((
        &padded[LEN_PREFIX..header_end],
        &padded[message_start..message_start + message_len],
    ))
}

fn read_len(padded: &[u8], offset: usize) -> Result<usize, RatchetError> {
    let end = offset + LEN_PREFIX;
    if end > padded.len() {
        return Err(RatchetError::MalformedPacket(
            "payload truncated before length prefix".into(),
        ));
    }
    let bytes: [u8; 4] = padded[offset..end].try_into().expect("length checked above");
    let len = u32::from_be_bytes(bytes) as usize;
    if len > padded.len() - end {
        return Err(RatchetError::MalformedPacket(format!(
            "payload field of {len} bytes overruns {} byte payload",
            padded.len()
        )));
    }
    Ok(len)
}
