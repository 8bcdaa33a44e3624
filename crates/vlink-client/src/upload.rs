//! Owner-authenticated flows: encrypted upload and preview/download
//!
//! The file key is generated client-side at upload time, transmitted once
//! with the ciphertext over the authenticated channel, and dropped; it is
//! never cached locally. Later previews re-fetch key and ciphertext
//! together from the API.

use tracing::info;

use crate::api::ShareLinkApi;
use crate::preview::{classify_preview, PreviewKind};
use vlink_core::types::FileRecord;
use vlink_core::ShareResult;
use vlink_crypto::{decode_key, decrypt_file, encode_key, encrypt_file, generate_file_key};

/// Observer contract for upload progress: discrete percentage updates,
/// independent of any event-loop mechanism. Closures implement it.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, percent: u8);
}

impl<F> ProgressObserver for F
where
    F: Fn(u8) + Send + Sync,
{
    fn on_progress(&self, percent: u8) {
        self(percent)
    }
}

/// A decrypted owner preview/download.
pub struct DecryptedContent {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub preview: PreviewKind,
}

/// Encrypt a file under a fresh key and upload it with the key over the
/// authenticated channel.
///
/// Progress is reported at the stage boundaries: 0 (started), 50
/// (encrypted, upload starting), 100 (uploaded).
pub async fn upload_encrypted<A: ShareLinkApi + ?Sized>(
    api: &A,
    name: &str,
    mime_type: &str,
    plaintext: &[u8],
    progress: Option<&dyn ProgressObserver>,
) -> ShareResult<FileRecord> {
    report(progress, 0);

    let key = generate_file_key()?;
    let payload = encrypt_file(&key, plaintext)?;
    let key_b64 = encode_key(&key);
    report(progress, 50);

    // The key leaves scope right after this call; it is never cached.
    let record = api.upload_file(name, mime_type, payload, &key_b64).await?;
    report(progress, 100);

    info!(file_id = %record.id, name = %record.name, "uploaded encrypted file");
    Ok(record)
}

/// Fetch an owned file for preview/download: key and ciphertext arrive
/// together from the authenticated API, are combined locally, and the
/// plaintext is classified for rendering.
pub async fn fetch_decrypted<A: ShareLinkApi + ?Sized>(
    api: &A,
    file: &FileRecord,
) -> ShareResult<DecryptedContent> {
    let content = api.fetch_file_content(&file.id).await?;

    let bytes = match &content.key {
        Some(key_b64) => {
            let key = decode_key(key_b64)?;
            decrypt_file(&key, &content.bytes)?
        }
        // Files stored before encryption was enabled come back as-is.
        None => content.bytes,
    };

    let content_type = file
        .mime_type
        .clone()
        .or(content.content_type)
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let preview = classify_preview(&content_type);

    Ok(DecryptedContent {
        bytes,
        content_type,
        preview,
    })
}

fn report(progress: Option<&dyn ProgressObserver>, percent: u8) {
    if let Some(observer) = progress {
        observer.on_progress(percent);
    }
}
