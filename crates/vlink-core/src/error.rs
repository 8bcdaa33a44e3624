use thiserror::Error;

pub type ShareResult<T> = Result<T, ShareError>;

/// Failure taxonomy for the encryption engine and the share-link flows.
///
/// Crypto and authorization failures are never retried automatically;
/// callers branch on the variant to render distinct messaging per kind.
#[derive(Debug, Error)]
pub enum ShareError {
    /// The platform cannot supply secure randomness or the AEAD primitive.
    #[error("secure crypto unavailable: {0}")]
    CryptoUnavailable(String),

    /// AEAD tag mismatch or structurally invalid payload. The payload is
    /// corrupt or tampered; no plaintext is ever returned for it.
    #[error("payload authentication failed: data is corrupt or tampered")]
    AuthenticationFailed,

    /// Key material received from the server does not decode to a valid key.
    #[error("malformed key material: {0}")]
    KeyFormat(String),

    /// The share link does not exist anymore or its expiry has passed.
    #[error("share link is no longer valid (expired)")]
    CapabilityExpired,

    /// The share link reached its maximum access count.
    #[error("share link is no longer valid (access limit reached)")]
    CapabilityExhausted,

    /// The link is password-protected and no verified grant is held yet.
    #[error("password required to access this share link")]
    PasswordRequired,

    /// The submitted password was rejected. The caller may resubmit; the
    /// rejected password is discarded and never retried automatically.
    #[error("incorrect password")]
    PasswordIncorrect,

    /// The server rejected a previously issued bearer grant. The cached
    /// grant is purged; a fresh redemption is required.
    #[error("access grant revoked or expired")]
    GrantRevokedOrExpired,

    #[error("share api error: {0}")]
    Api(String),

    #[error("token cache error: {0}")]
    Cache(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
