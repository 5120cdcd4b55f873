//! Pending authorization requests
//!
//! Server-side store that issues one-time authorization requests at the start
//! of a login and redeems them in the identity provider callback. Each record
//! is keyed by its `state` token, holds the PKCE verifier and nonce, and lives
//! for at most [`AUTHORIZATION_REQUEST_TTL`].
//!
//! Expired records are swept lazily on every [`create`] and [`consume`];
//! [`purge_expired`] lets a caller sweep on a schedule as well. A record older
//! than the TTL is never returned, whether or not a sweep has run.
//!
//! [`create`]: AuthorizationRequestStore::create
//! [`consume`]: AuthorizationRequestStore::consume
//! [`purge_expired`]: AuthorizationRequestStore::purge_expired

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::pkce::{code_challenge, generate_code_verifier, generate_nonce, generate_state};
use crate::time::{Clock, SystemClock};

/// Lifetime of a pending authorization request (10 minutes)
pub const AUTHORIZATION_REQUEST_TTL: Duration = Duration::from_secs(600);

/// Tokens handed out when a login starts
///
/// `state` and `code_challenge` go into the redirect to the identity
/// provider. `nonce` goes there too; `code_verifier` is returned so callers
/// can assert on it in tests but is otherwise only needed at redemption.
#[derive(Clone)]
pub struct IssuedAuthorizationRequest {
    /// Key of the pending record, echoed back by the provider
    pub state: String,
    /// Expected `nonce` claim of the ID token
    pub nonce: String,
    /// PKCE verifier retained for the token exchange
    pub code_verifier: String,
    /// S256 challenge of `code_verifier`
    pub code_challenge: String,
}

impl std::fmt::Debug for IssuedAuthorizationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedAuthorizationRequest")
            .field("state", &"[REDACTED]")
            .field("nonce", &"[REDACTED]")
            .field("code_verifier", &"[REDACTED]")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}

/// Values recovered when the callback redeems a request
#[derive(Clone, PartialEq, Eq)]
pub struct RedeemedAuthorizationRequest {
    /// Destination recorded when the login started
    pub return_to: String,
    /// Verifier to send with the authorization code
    pub code_verifier: String,
    /// Nonce the ID token must carry
    pub nonce: String,
}

impl std::fmt::Debug for RedeemedAuthorizationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedeemedAuthorizationRequest")
            .field("return_to", &self.return_to)
            .field("code_verifier", &"[REDACTED]")
            .field("nonce", &"[REDACTED]")
            .finish()
    }
}

#[derive(Zeroize, ZeroizeOnDrop)]
struct PendingRequest {
    return_to: String,
    code_verifier: String,
    nonce: String,
    #[zeroize(skip)]
    created_at: Instant,
}

impl PendingRequest {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) > ttl
    }
}

/// Lock-guarded map of pending authorization requests
///
/// Built once at startup and shared through application state. No lock is
/// ever held across an await point.
pub struct AuthorizationRequestStore {
    pending: Mutex<HashMap<String, PendingRequest>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl AuthorizationRequestStore {
    /// Store on the system clock with the standard TTL
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store on a custom clock with the standard TTL
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { pending: Mutex::new(HashMap::new()), clock, ttl: AUTHORIZATION_REQUEST_TTL }
    }

    /// Issue a new pending request for `return_to`
    ///
    /// Generates fresh `state`, `nonce` and verifier, derives the challenge,
    /// sweeps expired records and inserts the new one.
    pub fn create(&self, return_to: impl Into<String>) -> IssuedAuthorizationRequest {
        let return_to = return_to.into();
        let code_verifier = generate_code_verifier();
        let challenge = code_challenge(&code_verifier);
        let nonce = generate_nonce();
        let now = self.clock.now();

        let mut pending = self.pending.lock();
        Self::sweep(&mut pending, now, self.ttl);

        // `state` must stay unique among live records
        let mut state = generate_state();
        while pending.contains_key(&state) {
            state = generate_state();
        }

        pending.insert(
            state.clone(),
            PendingRequest {
                return_to,
                code_verifier: code_verifier.clone(),
                nonce: nonce.clone(),
                created_at: now,
            },
        );

        IssuedAuthorizationRequest { state, nonce, code_verifier, code_challenge: challenge }
    }

    /// Redeem the request issued under `state`, at most once
    ///
    /// Returns `None` when the state is unknown, already redeemed or older
    /// than the TTL. A hit removes the record in the same critical section as
    /// the lookup.
    pub fn consume(&self, state: &str) -> Option<RedeemedAuthorizationRequest> {
        let now = self.clock.now();

        // The sweep runs under the same lock and `now`, so a removed record is live
        let mut record = {
            let mut pending = self.pending.lock();
            Self::sweep(&mut pending, now, self.ttl);
            pending.remove(state)?
        };

        Some(RedeemedAuthorizationRequest {
            return_to: std::mem::take(&mut record.return_to),
            code_verifier: std::mem::take(&mut record.code_verifier),
            nonce: std::mem::take(&mut record.nonce),
        })
    }

    /// Remove every expired record, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut pending = self.pending.lock();
        Self::sweep(&mut pending, now, self.ttl)
    }

    /// Number of records physically present, expired or not
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// True when no record is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Time-to-live applied to records
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn sweep(pending: &mut HashMap<String, PendingRequest>, now: Instant, ttl: Duration) -> usize {
        let before = pending.len();
        pending.retain(|_, record| !record.is_expired(now, ttl));
        before - pending.len()
    }
}

impl Default for AuthorizationRequestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AuthorizationRequestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationRequestStore")
            .field("pending", &self.len())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::MockClock;

    fn store_with_clock() -> (AuthorizationRequestStore, MockClock) {
        let clock = MockClock::new();
        (AuthorizationRequestStore::with_clock(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn consume_returns_what_create_stored() {
        let store = AuthorizationRequestStore::new();
        let issued = store.create("/docs/report.pdf");

        let redeemed = store.consume(&issued.state).expect("record should be redeemable");
        assert_eq!(redeemed.return_to, "/docs/report.pdf");
        assert_eq!(redeemed.code_verifier, issued.code_verifier);
        assert_eq!(redeemed.nonce, issued.nonce);
    }

    #[test]
    fn challenge_is_derived_from_issued_verifier() {
        let store = AuthorizationRequestStore::new();
        let issued = store.create("/");
        assert_eq!(issued.code_challenge, code_challenge(&issued.code_verifier));
    }

    #[test]
    fn second_consume_is_not_found() {
        let store = AuthorizationRequestStore::new();
        let issued = store.create("/");

        assert!(store.consume(&issued.state).is_some());
        assert!(store.consume(&issued.state).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_state_is_not_found() {
        let store = AuthorizationRequestStore::new();
        store.create("/");
        assert!(store.consume("not-a-state").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn record_at_exactly_ttl_is_still_redeemable() {
        let (store, clock) = store_with_clock();
        let issued = store.create("/");

        clock.advance(AUTHORIZATION_REQUEST_TTL);
        assert!(store.consume(&issued.state).is_some());
    }

    #[test]
    fn record_past_ttl_is_never_returned() {
        let (store, clock) = store_with_clock();
        let issued = store.create("/buckets");

        clock.advance(AUTHORIZATION_REQUEST_TTL + Duration::from_millis(1));
        assert!(store.consume(&issued.state).is_none());
    }

    #[test]
    fn consume_sweeps_expired_record_before_lookup() {
        let (store, clock) = store_with_clock();
        let expired = store.create("/old");
        clock.advance(Duration::from_secs(300));
        let live = store.create("/new");

        clock.advance(Duration::from_secs(301));
        assert!(store.consume(&expired.state).is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.consume(&live.state).map(|r| r.return_to), Some("/new".to_string()));
        assert!(store.is_empty());
    }

    #[test]
    fn create_sweeps_expired_records() {
        let (store, clock) = store_with_clock();
        store.create("/a");
        store.create("/b");

        clock.advance(Duration::from_secs(601));
        let fresh = store.create("/c");

        assert_eq!(store.len(), 1);
        assert_eq!(store.consume(&fresh.state).map(|r| r.return_to), Some("/c".to_string()));
    }

    #[test]
    fn purge_expired_reports_removed_count() {
        let (store, clock) = store_with_clock();
        store.create("/old-1");
        store.create("/old-2");
        clock.advance(Duration::from_secs(300));
        let young = store.create("/young");

        clock.advance(Duration::from_secs(301));
        assert_eq!(store.purge_expired(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.consume(&young.state).is_some());
    }

    #[test]
    fn each_create_issues_distinct_tokens() {
        let store = AuthorizationRequestStore::new();
        let a = store.create("/");
        let b = store.create("/");

        assert_ne!(a.state, b.state);
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.code_verifier, b.code_verifier);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let store = AuthorizationRequestStore::new();
        let issued = store.create("/");
        let rendered = format!("{issued:?}");

        assert!(!rendered.contains(&issued.state));
        assert!(!rendered.contains(&issued.code_verifier));
        assert!(!rendered.contains(&issued.nonce));
    }
}
