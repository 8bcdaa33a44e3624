//! Access-token broker: redeems a share capability into a bearer grant
//!
//! State machine:
//! ```text
//! Unresolved → {PasswordRequired | Granted} → {Denied | Expired}
//! ```
//!
//! `Denied` and `Expired` are terminal until external action: the user
//! resubmits a password, or the owner issues a new capability. A grant is
//! cached only after a full redemption round-trip succeeds; a rejected
//! bearer is purged and never silently retried.

use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::api::ShareLinkApi;
use crate::store::{access_token_cache_key, TokenStore};
use vlink_core::types::{AccessGrant, SharedFileInfo};
use vlink_core::{ShareError, ShareResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerState {
    /// Descriptor not fetched yet.
    Unresolved,
    /// The link is password-protected and no verified grant is held.
    PasswordRequired,
    /// A usable grant (or no grant needed) is in hand.
    Granted,
    /// The issuer refused redemption (expired or exhausted capability).
    Denied,
    /// A previously granted bearer was rejected downstream; the cached
    /// grant has been purged.
    Expired,
}

pub struct AccessTokenBroker<S: TokenStore> {
    token: String,
    store: S,
    state: BrokerState,
    grant: Option<AccessGrant>,
    descriptor: Option<SharedFileInfo>,
}

impl<S: TokenStore> AccessTokenBroker<S> {
    pub fn new(token: impl Into<String>, store: S) -> Self {
        Self {
            token: token.into(),
            store,
            state: BrokerState::Unresolved,
            grant: None,
            descriptor: None,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn state(&self) -> BrokerState {
        self.state
    }

    pub fn descriptor(&self) -> Option<&SharedFileInfo> {
        self.descriptor.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch (or refresh) the capability descriptor and settle the state.
    ///
    /// Unprotected links go straight to `Granted` with no redemption call.
    /// Protected links resume a cached grant when one exists for this
    /// token, otherwise wait in `PasswordRequired`.
    pub async fn resolve<A: ShareLinkApi + ?Sized>(
        &mut self,
        api: &A,
    ) -> ShareResult<&SharedFileInfo> {
        let cached = self.store.get(&access_token_cache_key(&self.token));
        let bearer = self
            .grant
            .as_ref()
            .map(|g| g.bearer.clone())
            .or_else(|| cached.clone());

        let info = match api.fetch_shared_file(&self.token, bearer.as_deref()).await {
            Ok(info) => info,
            Err(err @ (ShareError::CapabilityExpired | ShareError::CapabilityExhausted)) => {
                self.state = BrokerState::Denied;
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        if !info.is_password_protected {
            self.grant = None;
            self.state = BrokerState::Granted;
        } else if self.grant.is_some() {
            self.state = BrokerState::Granted;
        } else if let Some(bearer) = cached {
            // Resume the previously redeemed grant; the issuer remains the
            // judge of whether it is still good.
            self.grant = Some(AccessGrant::new(bearer, &self.token, now_unix()));
            self.state = BrokerState::Granted;
        } else if self.state != BrokerState::Expired {
            self.state = BrokerState::PasswordRequired;
        }
        // An Expired broker stays Expired across refreshes: only a fresh
        // redemption moves it forward.

        debug!(token = %self.token, state = ?self.state, "resolved share descriptor");
        Ok(self.descriptor.insert(info))
    }

    /// Redeem a password with the external verifier.
    ///
    /// On success the fresh grant is persisted under
    /// `file_access_token_<token>`, only after the full round-trip. On
    /// `PasswordIncorrect` the submitted password is dropped immediately;
    /// nothing is cached and nothing is retried.
    pub async fn submit_password<A: ShareLinkApi + ?Sized>(
        &mut self,
        api: &A,
        password: &str,
    ) -> ShareResult<()> {
        match self.state {
            BrokerState::Unresolved => {
                return Err(ShareError::Api("descriptor not resolved yet".into()))
            }
            BrokerState::Granted => return Ok(()),
            BrokerState::PasswordRequired | BrokerState::Denied | BrokerState::Expired => {}
        }

        match api.verify_password(&self.token, password).await {
            Ok(bearer) => {
                let grant = AccessGrant::new(bearer, &self.token, now_unix());
                self.store
                    .set(&access_token_cache_key(&self.token), &grant.bearer)?;
                self.grant = Some(grant);
                self.state = BrokerState::Granted;
                debug!(token = %self.token, "password redemption granted");
                Ok(())
            }
            Err(err @ ShareError::PasswordIncorrect) => {
                self.state = BrokerState::PasswordRequired;
                Err(err)
            }
            Err(err @ (ShareError::CapabilityExpired | ShareError::CapabilityExhausted)) => {
                self.state = BrokerState::Denied;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// The bearer to present on downloads, if one is held and not locally
    /// stale. Unprotected links hold no grant and present nothing.
    pub fn bearer(&self) -> Option<&str> {
        match (&self.state, &self.grant) {
            (BrokerState::Granted, Some(grant)) if !grant.is_expired(now_unix()) => {
                Some(grant.bearer.as_str())
            }
            _ => None,
        }
    }

    /// Purge the cached grant after a downstream rejection.
    ///
    /// Transitions to `Expired`; a new redemption (re-prompting for the
    /// password if required) is mandatory before the next download.
    pub fn invalidate(&mut self) -> ShareResult<()> {
        self.grant = None;
        self.state = BrokerState::Expired;
        self.store.delete(&access_token_cache_key(&self.token))?;
        debug!(token = %self.token, "grant invalidated, cache entry purged");
        Ok(())
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
