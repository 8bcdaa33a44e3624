use serde::{Deserialize, Serialize};

/// Lifetime of a redeemed access grant. The issuer caches bearer tokens
/// for one hour; the client mirrors that so a stale grant is dropped
/// locally instead of being presented.
pub const DEFAULT_GRANT_TTL_SECS: u64 = 3600;

/// Guest-visible descriptor of a shared file, as returned by the share API
/// for a capability token.
///
/// `access_count` is monotonically non-decreasing; the authoritative count
/// lives server-side and a locally cached value is never trusted.
/// Timestamps are kept as the opaque RFC 3339 strings the server sends;
/// the client displays them but never does date arithmetic on them.
#[derive(Clone, Serialize, Deserialize)]
pub struct SharedFileInfo {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub formatted_size: String,
    pub uploaded_at: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub is_password_protected: bool,
    #[serde(default)]
    pub max_access_count: Option<u32>,
    pub access_count: u32,
    pub expires_at: String,
    /// Transport-encoded file key. Present only when the link is not
    /// password-protected, or after password verification.
    #[serde(default)]
    pub key: Option<String>,
}

impl SharedFileInfo {
    /// Whether the server-reported count has reached the configured limit.
    pub fn is_exhausted(&self) -> bool {
        match self.max_access_count {
            Some(max) => self.access_count >= max,
            None => false,
        }
    }
}

impl std::fmt::Debug for SharedFileInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedFileInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("size", &self.size)
            .field("is_password_protected", &self.is_password_protected)
            .field("max_access_count", &self.max_access_count)
            .field("access_count", &self.access_count)
            .field("expires_at", &self.expires_at)
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Short-lived bearer credential redeemed from a share capability.
///
/// Created on successful redemption, purged on any authorization failure
/// or local invalidation, never revived. Only the bearer string is ever
/// persisted to the token cache.
#[derive(Clone)]
pub struct AccessGrant {
    pub bearer: String,
    pub capability_token: String,
    /// Unix seconds at redemption time.
    pub issued_at: u64,
    pub ttl_secs: u64,
}

impl AccessGrant {
    pub fn new(bearer: String, capability_token: &str, issued_at: u64) -> Self {
        Self {
            bearer,
            capability_token: capability_token.to_string(),
            issued_at,
            ttl_secs: DEFAULT_GRANT_TTL_SECS,
        }
    }

    /// Whether the grant's own lifetime has lapsed. The issuer remains
    /// authoritative; this only stops the client presenting a bearer it
    /// already knows to be stale.
    pub fn is_expired(&self, now_unix: u64) -> bool {
        now_unix >= self.issued_at.saturating_add(self.ttl_secs)
    }
}

impl std::fmt::Debug for AccessGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGrant")
            .field("bearer", &"[REDACTED]")
            .field("capability_token", &self.capability_token)
            .field("issued_at", &self.issued_at)
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

/// Issuance request for a new share link.
#[derive(Clone, Serialize, Deserialize)]
pub struct ShareLinkRequest {
    pub expires_in_hours: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_access_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl std::fmt::Debug for ShareLinkRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareLinkRequest")
            .field("expires_in_hours", &self.expires_in_hours)
            .field("max_access_count", &self.max_access_count)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Issuance response. The token is opaque to the client; it is treated as
/// an identifier and never parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareLinkResponse {
    pub token: String,
    pub expires_at: String,
}

/// Owner-visible metadata for an uploaded file, over the authenticated
/// channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub file_size: u64,
    pub formatted_size: String,
    pub uploaded_at: String,
}

/// Human-readable size, matching what the share API reports in
/// `formatted_size`.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_parse_minimal() {
        let json = r#"{
            "id": "f-1",
            "name": "report.pdf",
            "size": 2048,
            "formatted_size": "2.0 KB",
            "uploaded_at": "2024-03-01T10:00:00Z",
            "is_password_protected": false,
            "access_count": 0,
            "expires_at": "2024-03-02T10:00:00Z",
            "key": "AAAA"
        }"#;
        let info: SharedFileInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.name, "report.pdf");
        assert!(!info.is_password_protected);
        assert_eq!(info.max_access_count, None);
        assert!(!info.is_exhausted());
        assert_eq!(info.key.as_deref(), Some("AAAA"));
    }

    #[test]
    fn test_descriptor_exhaustion() {
        let mut info: SharedFileInfo = serde_json::from_str(
            r#"{
                "id": "f-2",
                "name": "a.txt",
                "size": 1,
                "formatted_size": "1.0 B",
                "uploaded_at": "2024-03-01T10:00:00Z",
                "is_password_protected": true,
                "max_access_count": 3,
                "access_count": 2,
                "expires_at": "2024-03-02T10:00:00Z"
            }"#,
        )
        .unwrap();
        assert!(!info.is_exhausted());
        info.access_count = 3;
        assert!(info.is_exhausted());
        assert_eq!(info.key, None, "protected descriptor carries no key");
    }

    #[test]
    fn test_grant_expiry() {
        let grant = AccessGrant::new("bearer-1".into(), "tok", 1000);
        assert!(!grant.is_expired(1000));
        assert!(!grant.is_expired(1000 + DEFAULT_GRANT_TTL_SECS - 1));
        assert!(grant.is_expired(1000 + DEFAULT_GRANT_TTL_SECS));
    }

    #[test]
    fn test_grant_debug_redacts_bearer() {
        let grant = AccessGrant::new("super-secret".into(), "tok", 0);
        let dbg = format!("{grant:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn test_share_link_request_omits_empty_fields() {
        let req = ShareLinkRequest {
            expires_in_hours: 24,
            max_access_count: None,
            password: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"expires_in_hours":24}"#);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.0 B");
        assert_eq!(format_size(1023), "1023.0 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.0 GB");
        assert_eq!(format_size(2 * 1024 * 1024 * 1024 * 1024), "2.0 TB");
    }
}
