//! PKCE (Proof Key for Code Exchange) and opaque token generation
//!
//! Implements the S256 method of RFC 7636. All tokens are drawn from the
//! thread-local CSPRNG and encoded as URL-safe base64 without padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Random bytes behind a `state` token (192 bits)
pub const STATE_BYTES: usize = 24;
/// Random bytes behind a `nonce` (192 bits)
pub const NONCE_BYTES: usize = 24;
/// Random bytes behind a code verifier (384 bits, 64 encoded characters)
pub const CODE_VERIFIER_BYTES: usize = 48;

/// The only challenge method this crate produces
pub const CHALLENGE_METHOD: &str = "S256";

/// Generate `len` random bytes encoded as URL-safe base64 without padding
#[must_use]
pub fn generate_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a `state` token for CSRF protection
#[must_use]
pub fn generate_state() -> String {
    generate_token(STATE_BYTES)
}

/// Generate a nonce binding the ID token to this login attempt
#[must_use]
pub fn generate_nonce() -> String {
    generate_token(NONCE_BYTES)
}

/// Generate a code verifier
///
/// 48 random bytes encode to 64 characters, inside the 43-128 range RFC 7636
/// requires.
#[must_use]
pub fn generate_code_verifier() -> String {
    generate_token(CODE_VERIFIER_BYTES)
}

/// Derive the S256 code challenge: `BASE64URL(SHA256(ASCII(code_verifier)))`
///
/// # Examples
/// ```
/// use s3manager_common::auth::pkce::code_challenge;
///
/// assert_eq!(
///     code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
///     "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
/// );
/// ```
#[must_use]
pub fn code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Short one-way digest of a secret token, for correlating log lines
///
/// The first 8 characters of the URL-safe base64 SHA-256 of `token`. Reveals
/// nothing of the token itself.
#[must_use]
pub fn fingerprint(token: &str) -> String {
    let mut digest = code_challenge(token);
    digest.truncate(8);
    digest
}

/// Verifier and its derived challenge
#[derive(Clone)]
pub struct PkcePair {
    /// Kept server-side until token exchange
    pub code_verifier: String,
    /// Sent in the authorization request
    pub code_challenge: String,
}

impl PkcePair {
    /// Generate a fresh verifier and its challenge
    #[must_use]
    pub fn generate() -> Self {
        let code_verifier = generate_code_verifier();
        let code_challenge = code_challenge(&code_verifier);
        Self { code_verifier, code_challenge }
    }

    /// Always `"S256"`
    #[must_use]
    pub const fn challenge_method(&self) -> &'static str {
        CHALLENGE_METHOD
    }
}

impl std::fmt::Debug for PkcePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkcePair")
            .field("code_verifier", &"[REDACTED]")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}
