//! Key transport encoding
//!
//! A file key travels out-of-band from its ciphertext, base64-encoded,
//! in one of two delivery modes:
//!
//! - *Owner-authenticated*: sent once with the ciphertext at upload time
//!   over the authenticated channel, and re-fetched from there for later
//!   previews and downloads. Never cached locally.
//! - *Guest/link*: embedded in the shared-file descriptor resolved from a
//!   capability token (only after password verification when the link is
//!   protected) and never persisted beyond the current session.
//!
//! Decoding tolerates the URL-safe alphabet and missing padding, since
//! keys round-trip through URL and header contexts on the way here.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zeroize::Zeroize;

use crate::engine::FileKey;
use crate::KEY_SIZE;
use vlink_core::{ShareError, ShareResult};

/// Encode a file key as standard base64 for transport.
pub fn encode_key(key: &FileKey) -> String {
    STANDARD.encode(key.as_bytes())
}

/// Decode a transport-encoded file key.
///
/// Accepts standard or URL-safe alphabets, with or without padding.
/// Anything that does not decode to exactly 32 bytes is rejected.
pub fn decode_key(encoded: &str) -> ShareResult<FileKey> {
    let mut normalized = encoded.trim().replace('-', "+").replace('_', "/");
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }

    let mut bytes = STANDARD
        .decode(normalized.as_bytes())
        .map_err(|e| ShareError::KeyFormat(format!("invalid base64: {e}")))?;

    if bytes.len() != KEY_SIZE {
        let len = bytes.len();
        bytes.zeroize();
        return Err(ShareError::KeyFormat(format!(
            "key is {len} bytes, expected {KEY_SIZE}"
        )));
    }

    let mut key_bytes = [0u8; KEY_SIZE];
    key_bytes.copy_from_slice(&bytes);
    bytes.zeroize();

    Ok(FileKey::from_bytes(key_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_file_key;

    #[test]
    fn test_encode_decode_roundtrip() {
        let key = generate_file_key().unwrap();
        let encoded = encode_key(&key);
        let decoded = decode_key(&encoded).unwrap();
        assert_eq!(key.as_bytes(), decoded.as_bytes());
    }

    #[test]
    fn test_decode_url_safe_alphabet() {
        let key = FileKey::from_bytes([0xFBu8; KEY_SIZE]);
        let url_safe = encode_key(&key).replace('+', "-").replace('/', "_");
        let decoded = decode_key(&url_safe).unwrap();
        assert_eq!(key.as_bytes(), decoded.as_bytes());
    }

    #[test]
    fn test_decode_unpadded() {
        let key = generate_file_key().unwrap();
        let unpadded = encode_key(&key).trim_end_matches('=').to_string();
        let decoded = decode_key(&unpadded).unwrap();
        assert_eq!(key.as_bytes(), decoded.as_bytes());
    }

    #[test]
    fn test_decode_wrong_length() {
        let result = decode_key(&STANDARD.encode([0u8; 16]));
        assert!(matches!(result, Err(ShareError::KeyFormat(_))));
    }

    #[test]
    fn test_decode_garbage() {
        let result = decode_key("not!!valid@@base64");
        assert!(matches!(result, Err(ShareError::KeyFormat(_))));
    }
}
