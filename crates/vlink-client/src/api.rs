//! Client-visible contract of the external share API
//!
//! The server owns persistence, password verification, and the
//! authoritative access count; this trait is the seam the rest of the
//! client composes around. Implementations map transport failures onto
//! the [`ShareError`](vlink_core::ShareError) taxonomy so callers never
//! see raw protocol errors.

use async_trait::async_trait;

use vlink_core::types::{FileRecord, ShareLinkRequest, ShareLinkResponse, SharedFileInfo};
use vlink_core::ShareResult;

/// Raw (still encrypted) bytes of a shared file, as fetched by a guest.
#[derive(Debug, Clone)]
pub struct EncryptedDownload {
    pub bytes: Vec<u8>,
    /// Content type reported by the transport, if any.
    pub content_type: Option<String>,
}

/// Ciphertext plus its transport-encoded key, fetched over the
/// owner-authenticated channel.
#[derive(Clone)]
pub struct OwnerContent {
    pub bytes: Vec<u8>,
    /// Absent for files stored unencrypted.
    pub key: Option<String>,
    pub content_type: Option<String>,
}

impl std::fmt::Debug for OwnerContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerContent")
            .field("bytes", &self.bytes.len())
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("content_type", &self.content_type)
            .finish()
    }
}

#[async_trait]
pub trait ShareLinkApi: Send + Sync {
    /// Fetch the shared-file descriptor for a capability token.
    ///
    /// `bearer` unlocks the `key` field on password-protected links.
    /// Errors: `CapabilityExpired` for unknown/expired links,
    /// `CapabilityExhausted` once the access limit is reached.
    async fn fetch_shared_file(
        &self,
        token: &str,
        bearer: Option<&str>,
    ) -> ShareResult<SharedFileInfo>;

    /// Redeem a password against the external verifier.
    ///
    /// Returns the bearer access token on success; `PasswordIncorrect`
    /// on mismatch (the password is not retried or stored anywhere).
    async fn verify_password(&self, token: &str, password: &str) -> ShareResult<String>;

    /// Download the encrypted bytes for a shared file.
    ///
    /// Errors: `GrantRevokedOrExpired` when the server rejects the bearer.
    async fn download_shared(
        &self,
        token: &str,
        bearer: Option<&str>,
    ) -> ShareResult<EncryptedDownload>;

    /// Issue a new share link for an owned file (authenticated).
    ///
    /// The returned token is opaque; the client performs no validation of
    /// its structure beyond treating it as an identifier.
    async fn create_share_link(
        &self,
        file_id: &str,
        request: &ShareLinkRequest,
    ) -> ShareResult<ShareLinkResponse>;

    /// Upload an encrypted payload together with its transport-encoded
    /// key over the authenticated channel (authenticated).
    async fn upload_file(
        &self,
        name: &str,
        mime_type: &str,
        payload: Vec<u8>,
        key_b64: &str,
    ) -> ShareResult<FileRecord>;

    /// Fetch ciphertext and key together for an owned file (authenticated).
    async fn fetch_file_content(&self, file_id: &str) -> ShareResult<OwnerContent>;
}
