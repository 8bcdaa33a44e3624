//! Shared in-process double of the share API.
//!
//! Single-file fake with server-side semantics mirrored from the real
//! issuer: authoritative access counting, bearer book-keeping, key
//! withheld until verification. Interior mutex so clones share state the
//! way concurrent guests share one capability.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use vlink_client::api::{EncryptedDownload, OwnerContent, ShareLinkApi};
use vlink_core::types::{
    format_size, FileRecord, ShareLinkRequest, ShareLinkResponse, SharedFileInfo,
};
use vlink_core::{ShareError, ShareResult};
use vlink_crypto::{encode_key, encrypt_file, generate_file_key};

const FILE_ID: &str = "f-1";
const UPLOADED_AT: &str = "2024-03-01T10:00:00Z";
const EXPIRES_AT: &str = "2024-03-02T10:00:00Z";

struct State {
    name: String,
    mime_type: String,
    /// Encrypted payload as stored server-side.
    payload: Vec<u8>,
    /// Transport-encoded file key; `None` for pre-encryption legacy files.
    key_b64: Option<String>,
    password: Option<String>,
    max_access_count: Option<u32>,
    access_count: u32,
    /// Whether the issuer consumes an access at redemption time (rather
    /// than at download time). Its enforcement point is its own affair;
    /// both variants exist, so the fake supports both.
    redeem_consumes_access: bool,
    expired: bool,
    bearers: HashSet<String>,
    bearer_seq: u32,
}

impl State {
    fn is_exhausted(&self) -> bool {
        match self.max_access_count {
            Some(max) => self.access_count >= max,
            None => false,
        }
    }

    fn check_valid(&self) -> ShareResult<()> {
        if self.expired {
            return Err(ShareError::CapabilityExpired);
        }
        if self.is_exhausted() {
            return Err(ShareError::CapabilityExhausted);
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct MockShareApi {
    inner: Arc<Mutex<State>>,
}

impl MockShareApi {
    /// A share with `plaintext` already encrypted server-side.
    pub fn seeded(name: &str, mime_type: &str, plaintext: &[u8]) -> Self {
        let key = generate_file_key().unwrap();
        let payload = encrypt_file(&key, plaintext).unwrap();
        Self::with_state(name, mime_type, payload, Some(encode_key(&key)))
    }

    /// A share stored before encryption was enabled: raw bytes, no key.
    pub fn seeded_unencrypted(name: &str, mime_type: &str, plaintext: &[u8]) -> Self {
        Self::with_state(name, mime_type, plaintext.to_vec(), None)
    }

    /// No file yet; populated by `upload_file`.
    pub fn empty() -> Self {
        Self::with_state("", "", Vec::new(), None)
    }

    fn with_state(name: &str, mime_type: &str, payload: Vec<u8>, key_b64: Option<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                payload,
                key_b64,
                password: None,
                max_access_count: None,
                access_count: 0,
                redeem_consumes_access: false,
                expired: false,
                bearers: HashSet::new(),
                bearer_seq: 0,
            })),
        }
    }

    pub fn with_password(self, password: &str) -> Self {
        self.inner.lock().unwrap().password = Some(password.to_string());
        self
    }

    pub fn with_max_access(self, max: u32) -> Self {
        self.inner.lock().unwrap().max_access_count = Some(max);
        self
    }

    pub fn with_redeem_consuming_access(self) -> Self {
        self.inner.lock().unwrap().redeem_consumes_access = true;
        self
    }

    /// Simulate server-side bearer expiry/revocation.
    pub fn revoke_bearers(&self) {
        self.inner.lock().unwrap().bearers.clear();
    }

    /// Flip one ciphertext byte in place, as a tampering storage layer would.
    pub fn corrupt_payload(&self) {
        let mut state = self.inner.lock().unwrap();
        let last = state.payload.len() - 1;
        state.payload[last] ^= 0x01;
    }

    pub fn expire(&self) {
        self.inner.lock().unwrap().expired = true;
    }

    pub fn access_count(&self) -> u32 {
        self.inner.lock().unwrap().access_count
    }

    pub fn stored_payload(&self) -> Vec<u8> {
        self.inner.lock().unwrap().payload.clone()
    }

    pub fn stored_key(&self) -> Option<String> {
        self.inner.lock().unwrap().key_b64.clone()
    }
}

#[async_trait]
impl ShareLinkApi for MockShareApi {
    async fn fetch_shared_file(
        &self,
        _token: &str,
        bearer: Option<&str>,
    ) -> ShareResult<SharedFileInfo> {
        let state = self.inner.lock().unwrap();
        state.check_valid()?;

        let verified = match &state.password {
            None => true,
            Some(_) => bearer.is_some_and(|b| state.bearers.contains(b)),
        };

        Ok(SharedFileInfo {
            id: FILE_ID.into(),
            name: state.name.clone(),
            size: state.payload.len() as u64,
            formatted_size: format_size(state.payload.len() as u64),
            uploaded_at: UPLOADED_AT.into(),
            mime_type: Some(state.mime_type.clone()),
            is_password_protected: state.password.is_some(),
            max_access_count: state.max_access_count,
            access_count: state.access_count,
            expires_at: EXPIRES_AT.into(),
            key: if verified { state.key_b64.clone() } else { None },
        })
    }

    async fn verify_password(&self, _token: &str, password: &str) -> ShareResult<String> {
        let mut state = self.inner.lock().unwrap();
        state.check_valid()?;

        match &state.password {
            Some(expected) if expected == password => {}
            _ => return Err(ShareError::PasswordIncorrect),
        }

        state.bearer_seq += 1;
        let bearer = format!("bearer-{}", state.bearer_seq);
        state.bearers.insert(bearer.clone());
        if state.redeem_consumes_access {
            state.access_count += 1;
        }
        Ok(bearer)
    }

    async fn download_shared(
        &self,
        _token: &str,
        bearer: Option<&str>,
    ) -> ShareResult<EncryptedDownload> {
        let mut state = self.inner.lock().unwrap();
        state.check_valid()?;

        if state.password.is_some() {
            let authorized = bearer.is_some_and(|b| state.bearers.contains(b));
            if !authorized {
                return Err(ShareError::GrantRevokedOrExpired);
            }
        }

        state.access_count += 1;
        Ok(EncryptedDownload {
            bytes: state.payload.clone(),
            content_type: Some("application/octet-stream".into()),
        })
    }

    async fn create_share_link(
        &self,
        _file_id: &str,
        request: &ShareLinkRequest,
    ) -> ShareResult<ShareLinkResponse> {
        let mut state = self.inner.lock().unwrap();
        state.password = request.password.clone();
        state.max_access_count = request.max_access_count;
        state.access_count = 0;
        Ok(ShareLinkResponse {
            token: "tok-1".into(),
            expires_at: EXPIRES_AT.into(),
        })
    }

    async fn upload_file(
        &self,
        name: &str,
        mime_type: &str,
        payload: Vec<u8>,
        key_b64: &str,
    ) -> ShareResult<FileRecord> {
        let mut state = self.inner.lock().unwrap();
        state.name = name.to_string();
        state.mime_type = mime_type.to_string();
        state.payload = payload;
        state.key_b64 = Some(key_b64.to_string());

        Ok(FileRecord {
            id: FILE_ID.into(),
            name: state.name.clone(),
            mime_type: Some(state.mime_type.clone()),
            file_size: state.payload.len() as u64,
            formatted_size: format_size(state.payload.len() as u64),
            uploaded_at: UPLOADED_AT.into(),
        })
    }

    async fn fetch_file_content(&self, _file_id: &str) -> ShareResult<OwnerContent> {
        let state = self.inner.lock().unwrap();
        if state.payload.is_empty() && state.key_b64.is_none() {
            return Err(ShareError::Api("no such file".into()));
        }
        Ok(OwnerContent {
            bytes: state.payload.clone(),
            key: state.key_b64.clone(),
            content_type: Some("application/octet-stream".into()),
        })
    }
}
