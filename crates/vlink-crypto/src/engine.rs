//! AES-256-GCM encryption/decryption of whole file payloads
//!
//! Nonce and tag lengths are fixed, so decryption computes offsets
//! directly; no separators are stored in the payload.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

use crate::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use vlink_core::{ShareError, ShareResult};

/// A per-file 256-bit encryption key. Zeroized on drop, never logged.
///
/// A key is created once per file version at encryption time and is
/// never mutated or reused for another version.
#[derive(Clone)]
pub struct FileKey {
    bytes: [u8; KEY_SIZE],
}

impl FileKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for FileKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random 256-bit file encryption key from the OS CSPRNG.
///
/// Fails only when the platform cannot supply secure randomness.
pub fn generate_file_key() -> ShareResult<FileKey> {
    let mut bytes = [0u8; KEY_SIZE];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| ShareError::CryptoUnavailable(format!("OS RNG unavailable: {e}")))?;
    Ok(FileKey::from_bytes(bytes))
}

/// Encrypt a file payload with AES-256-GCM.
///
/// Draws a fresh random 96-bit nonce per call.
///
/// Returns: `[12-byte nonce][ciphertext][16-byte tag]`
pub fn encrypt_file(key: &FileKey, plaintext: &[u8]) -> ShareResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|e| ShareError::CryptoUnavailable(format!("OS RNG unavailable: {e}")))?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| ShareError::CryptoUnavailable("AEAD encryption failed".into()))?;

    let mut payload = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    payload.extend_from_slice(&nonce_bytes);
    payload.extend_from_slice(&ciphertext);
    Ok(payload)
}

/// Decrypt a file payload produced by [`encrypt_file`].
///
/// Input: `[12-byte nonce][ciphertext][16-byte tag]`
///
/// Tag verification happens atomically with decryption; any mismatch, as
/// well as a payload too short to contain a nonce and tag, fails closed
/// with [`ShareError::AuthenticationFailed`]. Partially decrypted or
/// unauthenticated bytes are never returned.
pub fn decrypt_file(key: &FileKey, payload: &[u8]) -> ShareResult<Vec<u8>> {
    if payload.len() < NONCE_SIZE + TAG_SIZE {
        return Err(ShareError::AuthenticationFailed);
    }

    let (nonce_bytes, ciphertext) = payload.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| ShareError::AuthenticationFailed)
}


#[cfg(test)]
mod proptest_suite {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn roundtrip_any_plaintext(data in prop::collection::vec(any::<u8>(), 0..4096)) {
            let key = generate_file_key().unwrap();
            let payload = encrypt_file(&key, &data).unwrap();
            let decrypted = decrypt_file(&key, &payload).unwrap();
            prop_assert_eq!(decrypted, data);
        }

        #[test]
        fn any_bit_flip_is_detected(
            data in prop::collection::vec(any::<u8>(), 1..512),
            pos in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let key = generate_file_key().unwrap();
            let mut payload = encrypt_file(&key, &data).unwrap();
            let idx = pos.index(payload.len());
            payload[idx] ^= 1 << bit;
            prop_assert!(matches!(
                decrypt_file(&key, &payload),
                Err(ShareError::AuthenticationFailed)
            ));
        }
    }
}
