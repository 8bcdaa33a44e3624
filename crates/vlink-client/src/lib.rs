//! vlink-client: share-capability redemption and end-to-end encrypted
//! file transfer flows
//!
//! The external share API is reached through the [`ShareLinkApi`] trait so
//! tests substitute an in-process double; [`HttpShareLinkApi`] binds it to
//! the real REST surface. [`AccessTokenBroker`] owns the capability state
//! machine, [`GuestDownloadCoordinator`] drives the guest flow end to end,
//! and [`upload`] holds the owner-authenticated flows.

pub mod api;
pub mod broker;
pub mod download;
pub mod http;
pub mod preview;
pub mod store;
pub mod upload;

pub use api::{EncryptedDownload, OwnerContent, ShareLinkApi};
pub use broker::{AccessTokenBroker, BrokerState};
pub use download::{GuestDownload, GuestDownloadCoordinator};
pub use http::HttpShareLinkApi;
pub use preview::{classify_preview, PreviewKind};
pub use store::{access_token_cache_key, JsonTokenStore, MemoryTokenStore, TokenStore};
pub use upload::{fetch_decrypted, upload_encrypted, DecryptedContent, ProgressObserver};
