//! vlink-crypto: client-side file encryption for VaultLink
//!
//! Pipeline: plaintext → AES-256-GCM (fresh random 96-bit nonce) → upload
//!
//! Encrypted payload format (binary):
//! ```text
//! [12 bytes: random nonce][N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//!
//! One `FileKey` encrypts exactly one file version; the key travels
//! out-of-band from the ciphertext (see [`carrier`]). Content type is
//! carried in transport metadata, never inside the payload.

pub mod carrier;
pub mod engine;

pub use carrier::{decode_key, encode_key};
pub use engine::{decrypt_file, encrypt_file, generate_file_key, FileKey};

/// Size of a file key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;
