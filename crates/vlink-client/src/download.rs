//! Guest download coordinator
//!
//! Drives the full guest flow for one capability token:
//! descriptor fetch → password branch → bearer → ciphertext fetch →
//! decrypt → content-type restore. The descriptor is re-fetched after
//! every completed or failed attempt, because concurrent guests race the
//! same capability and the local access count is never authoritative.

use tracing::{debug, info};

use crate::api::ShareLinkApi;
use crate::broker::AccessTokenBroker;
use crate::preview::{classify_preview, PreviewKind};
use crate::store::TokenStore;
use vlink_core::types::SharedFileInfo;
use vlink_core::{ShareError, ShareResult};
use vlink_crypto::{decode_key, decrypt_file};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A completed guest download: decrypted bytes plus restored metadata.
#[derive(Debug)]
pub struct GuestDownload {
    pub file: SharedFileInfo,
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub preview: PreviewKind,
}

pub struct GuestDownloadCoordinator<A: ShareLinkApi, S: TokenStore> {
    api: A,
    broker: AccessTokenBroker<S>,
}

impl<A: ShareLinkApi, S: TokenStore> GuestDownloadCoordinator<A, S> {
    pub fn new(api: A, token: impl Into<String>, store: S) -> Self {
        Self {
            broker: AccessTokenBroker::new(token, store),
            api,
        }
    }

    pub fn broker(&self) -> &AccessTokenBroker<S> {
        &self.broker
    }

    /// Fetch (or refresh) the shared-file descriptor.
    pub async fn fetch_info(&mut self) -> ShareResult<&SharedFileInfo> {
        self.broker.resolve(&self.api).await
    }

    /// Redeem the password, then refresh the descriptor so the file key
    /// (withheld until verification) becomes available.
    pub async fn submit_password(&mut self, password: &str) -> ShareResult<()> {
        self.broker.submit_password(&self.api, password).await?;
        self.broker.resolve(&self.api).await?;
        Ok(())
    }

    /// Download, decrypt, and classify the shared file.
    ///
    /// A `401` rejection of the bearer purges the cached grant and
    /// surfaces [`ShareError::GrantRevokedOrExpired`]; the coordinator
    /// never auto-retries; redemption (and the password prompt, if the
    /// link is protected) is the caller's move.
    pub async fn download(&mut self) -> ShareResult<GuestDownload> {
        // Start from a fresh descriptor: concurrent guests may have
        // consumed accesses since the last look, and the issuer is the
        // only authority on whether the capability is still alive.
        let info = self.broker.resolve(&self.api).await?.clone();

        if info.is_password_protected && self.broker.bearer().is_none() {
            return Err(ShareError::PasswordRequired);
        }

        let bearer = self.broker.bearer().map(str::to_owned);
        let blob = match self
            .api
            .download_shared(self.broker.token(), bearer.as_deref())
            .await
        {
            Ok(blob) => blob,
            Err(
                err @ (ShareError::GrantRevokedOrExpired
                | ShareError::CapabilityExpired
                | ShareError::CapabilityExhausted),
            ) => {
                // Downstream rejection kills the grant: purge it and
                // report. The next attempt must redeem anew.
                self.broker.invalidate()?;
                self.refresh_descriptor().await;
                return Err(err);
            }
            Err(err) => {
                self.refresh_descriptor().await;
                return Err(err);
            }
        };

        let decrypted = (|| {
            let key_b64 = info.key.as_ref().ok_or_else(|| {
                ShareError::KeyFormat("descriptor did not include a file key".into())
            })?;
            let key = decode_key(key_b64)?;
            decrypt_file(&key, &blob.bytes)
        })();

        // The attempt consumed a server-side access whether or not the
        // payload decrypted; reconcile before reporting either way.
        self.refresh_descriptor().await;
        let plaintext = decrypted?;

        let content_type = info
            .mime_type
            .clone()
            .or(blob.content_type)
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());
        let preview = classify_preview(&content_type);

        info!(
            token = %self.broker.token(),
            bytes = plaintext.len(),
            content_type = %content_type,
            "guest download decrypted"
        );

        let file = self.broker.descriptor().cloned().unwrap_or(info);

        Ok(GuestDownload {
            file,
            bytes: plaintext,
            content_type,
            preview,
        })
    }

    /// Post-attempt descriptor refresh. Failures are expected here (the
    /// attempt itself may have exhausted the link) and do not undo a
    /// download that already succeeded.
    async fn refresh_descriptor(&mut self) {
        if let Err(err) = self.broker.resolve(&self.api).await {
            debug!(
                token = %self.broker.token(),
                error = %err,
                "descriptor refresh after attempt failed"
            );
        }
    }
}
