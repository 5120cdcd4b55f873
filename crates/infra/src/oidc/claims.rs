//! JWT payload decoding
//!
//! Reads claims from ID and access tokens without verifying signatures.
//! Nothing here is used for authorization decisions beyond nonce binding and
//! role discovery.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use s3manager_core::auth::IdTokenClaims;
use serde_json::Value;

use super::client::OidcError;

/// Role names Keycloak adds to every account
const KEYCLOAK_BUILTIN_ROLES: [&str; 2] = ["uma_authorization", "offline_access"];

/// Decode the payload segment of a compact JWT
///
/// # Errors
/// Returns [`OidcError::InvalidToken`] when the token is not three
/// dot-separated segments or the payload is not base64url-encoded JSON.
pub fn decode_jwt_payload(token: &str) -> Result<Value, OidcError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(OidcError::InvalidToken("invalid JWT format".into()));
    };

    // Some issuers pad the segments even though JWS forbids it
    let payload_bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).map_err(|err| {
        OidcError::InvalidToken(format!("failed to decode JWT payload: {err}"))
    })?;

    serde_json::from_slice(&payload_bytes)
        .map_err(|err| OidcError::InvalidToken(format!("failed to parse JWT payload: {err}")))
}

/// Decode the identity claims of an ID token
///
/// # Errors
/// See [`decode_jwt_payload`].
pub fn decode_id_token(id_token: &str) -> Result<IdTokenClaims, OidcError> {
    let payload = decode_jwt_payload(id_token)?;
    serde_json::from_value(payload)
        .map_err(|err| OidcError::InvalidToken(format!("unexpected ID token claims: {err}")))
}

/// String entries of an array claim at `pointer` (JSON Pointer syntax)
pub fn string_array(payload: &Value, pointer: &str) -> Vec<String> {
    payload
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Roles carried in a Keycloak access token
///
/// Collects `realm_access.roles`, `resource_access.<client_id>.roles` and
/// `groups`, then drops Keycloak's built-in roles.
pub fn keycloak_roles(payload: &Value, client_id: &str) -> Vec<String> {
    let client_pointer = format!("/resource_access/{}/roles", escape_pointer(client_id));

    string_array(payload, "/realm_access/roles")
        .into_iter()
        .chain(string_array(payload, &client_pointer))
        .chain(string_array(payload, "/groups"))
        .filter(|role| !role.starts_with("default-") && !KEYCLOAK_BUILTIN_ROLES.contains(&role.as_str()))
        .collect()
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
pub(crate) fn encode_test_jwt(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}
