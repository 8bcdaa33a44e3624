//! reqwest binding of the share API
//!
//! Maps HTTP statuses onto the error taxonomy: `404` → expired/unknown
//! link, `403` → access limit reached, `401` → wrong password (on
//! redemption) or revoked grant (on download). No retry or backoff lives
//! here; transient transport failures surface as `Api` errors.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::api::{EncryptedDownload, OwnerContent, ShareLinkApi};
use vlink_core::types::{FileRecord, ShareLinkRequest, ShareLinkResponse, SharedFileInfo};
use vlink_core::{ShareError, ShareResult};

#[derive(Clone)]
pub struct HttpShareLinkApi {
    client: reqwest::Client,
    base_url: String,
    /// Identity-provider credential for owner endpoints.
    auth_bearer: Option<String>,
}

impl HttpShareLinkApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            auth_bearer: None,
        }
    }

    /// Attach the owner bearer credential for authenticated endpoints.
    pub fn with_auth(mut self, bearer: impl Into<String>) -> Self {
        self.auth_bearer = Some(bearer.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn owner_bearer(&self) -> ShareResult<&str> {
        self.auth_bearer
            .as_deref()
            .ok_or_else(|| ShareError::Api("owner endpoint requires an authenticated bearer".into()))
    }
}

#[derive(Deserialize)]
struct VerifyPasswordResponse {
    access_token: String,
}

#[async_trait]
impl ShareLinkApi for HttpShareLinkApi {
    async fn fetch_shared_file(
        &self,
        token: &str,
        bearer: Option<&str>,
    ) -> ShareResult<SharedFileInfo> {
        let mut req = self.client.get(self.url(&format!("/api/files/shared/{token}/")));
        if let Some(bearer) = bearer {
            req = req.bearer_auth(bearer);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| ShareError::Api(format!("descriptor fetch failed: {e}")))?;

        match resp.status() {
            s if s.is_success() => resp
                .json::<SharedFileInfo>()
                .await
                .map_err(|e| ShareError::Api(format!("malformed descriptor: {e}"))),
            StatusCode::FORBIDDEN => Err(ShareError::CapabilityExhausted),
            StatusCode::NOT_FOUND => Err(ShareError::CapabilityExpired),
            s => Err(ShareError::Api(format!("descriptor fetch: status {s}"))),
        }
    }

    async fn verify_password(&self, token: &str, password: &str) -> ShareResult<String> {
        let resp = self
            .client
            .post(self.url(&format!("/api/sharelinks/{token}/verify-password/")))
            .json(&serde_json::json!({ "password": password }))
            .send()
            .await
            .map_err(|e| ShareError::Api(format!("password redemption failed: {e}")))?;

        match resp.status() {
            s if s.is_success() => {
                let body: VerifyPasswordResponse = resp
                    .json()
                    .await
                    .map_err(|e| ShareError::Api(format!("malformed redemption response: {e}")))?;
                Ok(body.access_token)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ShareError::PasswordIncorrect),
            StatusCode::BAD_REQUEST => {
                // The verifier reports both kinds of dead link as 400;
                // split them on the message it sends.
                let body = resp.text().await.unwrap_or_default();
                if body.contains("maximum access") || body.contains("access limit") {
                    Err(ShareError::CapabilityExhausted)
                } else {
                    Err(ShareError::CapabilityExpired)
                }
            }
            StatusCode::NOT_FOUND => Err(ShareError::CapabilityExpired),
            s => Err(ShareError::Api(format!("password redemption: status {s}"))),
        }
    }

    async fn download_shared(
        &self,
        token: &str,
        bearer: Option<&str>,
    ) -> ShareResult<EncryptedDownload> {
        let mut req = self
            .client
            .get(self.url(&format!("/api/files/download/{token}/")));
        if let Some(bearer) = bearer {
            req = req.bearer_auth(bearer);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| ShareError::Api(format!("download failed: {e}")))?;

        match resp.status() {
            s if s.is_success() => {
                let content_type = resp
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let bytes = resp
                    .bytes()
                    .await
                    .map_err(|e| ShareError::Api(format!("reading download body: {e}")))?;
                Ok(EncryptedDownload {
                    bytes: bytes.to_vec(),
                    content_type,
                })
            }
            StatusCode::UNAUTHORIZED => Err(ShareError::GrantRevokedOrExpired),
            StatusCode::FORBIDDEN => Err(ShareError::CapabilityExhausted),
            StatusCode::NOT_FOUND => Err(ShareError::CapabilityExpired),
            s => Err(ShareError::Api(format!("download: status {s}"))),
        }
    }

    async fn create_share_link(
        &self,
        file_id: &str,
        request: &ShareLinkRequest,
    ) -> ShareResult<ShareLinkResponse> {
        let bearer = self.owner_bearer()?;
        let resp = self
            .client
            .post(self.url(&format!("/api/files/{file_id}/share-link/")))
            .bearer_auth(bearer)
            .json(request)
            .send()
            .await
            .map_err(|e| ShareError::Api(format!("share link issuance failed: {e}")))?;

        if resp.status().is_success() {
            resp.json::<ShareLinkResponse>()
                .await
                .map_err(|e| ShareError::Api(format!("malformed issuance response: {e}")))
        } else {
            Err(ShareError::Api(format!(
                "share link issuance: status {}",
                resp.status()
            )))
        }
    }

    async fn upload_file(
        &self,
        name: &str,
        mime_type: &str,
        payload: Vec<u8>,
        key_b64: &str,
    ) -> ShareResult<FileRecord> {
        let bearer = self.owner_bearer()?;

        let part = Part::bytes(payload)
            .file_name(name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| ShareError::Api(format!("building upload part: {e}")))?;
        let form = Form::new()
            .part("file", part)
            .text("original_filename", name.to_string())
            .text("mime_type", mime_type.to_string())
            .text("encryption_key", key_b64.to_string());

        let resp = self
            .client
            .post(self.url("/api/files/upload/"))
            .bearer_auth(bearer)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ShareError::Api(format!("upload failed: {e}")))?;

        if resp.status().is_success() {
            resp.json::<FileRecord>()
                .await
                .map_err(|e| ShareError::Api(format!("malformed upload response: {e}")))
        } else {
            Err(ShareError::Api(format!("upload: status {}", resp.status())))
        }
    }

    async fn fetch_file_content(&self, file_id: &str) -> ShareResult<OwnerContent> {
        let bearer = self.owner_bearer()?;
        let resp = self
            .client
            .get(self.url(&format!("/api/files/{file_id}/content/")))
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| ShareError::Api(format!("content fetch failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(ShareError::Api(format!(
                "content fetch: status {}",
                resp.status()
            )));
        }

        let key = resp
            .headers()
            .get("x-encryption-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ShareError::Api(format!("reading content body: {e}")))?;

        Ok(OwnerContent {
            bytes: bytes.to_vec(),
            key,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let api = HttpShareLinkApi::new("https://files.example.com/");
        assert_eq!(
            api.url("/api/files/shared/abc/"),
            "https://files.example.com/api/files/shared/abc/"
        );
    }

    #[test]
    fn test_owner_bearer_required() {
        let api = HttpShareLinkApi::new("https://files.example.com");
        assert!(api.owner_bearer().is_err());

        let api = api.with_auth("owner-token");
        assert_eq!(api.owner_bearer().unwrap(), "owner-token");
    }
}
