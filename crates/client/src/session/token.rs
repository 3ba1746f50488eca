//! Identity recovery from a persisted bearer token.
//!
//! The backend issues JWTs. On restart the claims are decoded (signature is
//! NOT verified; the backend still authorizes every request) to rebuild the
//! display identity and roles without an extra round trip.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use shopfront_core::Role;

/// Clock skew tolerated when checking `exp`, in seconds.
const EXPIRY_LEEWAY_SECS: u64 = 30;

/// Why a persisted token could not be turned back into an identity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenDecodeError {
    #[error("token is not a JWT")]
    Malformed,
    #[error("token segments are not valid base64url")]
    Encoding,
    #[error("token payload is not a JSON claim set")]
    Claims,
    #[error("token has no subject")]
    MissingSubject,
    #[error("token has expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenDecodeError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            ErrorKind::Base64(_) => Self::Encoding,
            ErrorKind::Json(_) | ErrorKind::Utf8(_) => Self::Claims,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed,
        }
    }
}

/// Identity fields carried by the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub username: String,
    pub roles: BTreeSet<Role>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct Claims {
    sub: Option<String>,
    username: Option<String>,
    exp: Option<i64>,
    #[serde(default)]
    roles: Option<Value>,
    #[serde(default)]
    authorities: Option<Value>,
}

/// Claim checks applied on restore: expiry only, no signature.
fn restore_validation() -> Validation {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = true;
    validation.leeway = EXPIRY_LEEWAY_SECS;
    validation.validate_aud = false;
    // Tokens without `exp` never expire client-side.
    validation.required_spec_claims.clear();
    validation
}

/// Decode the identity carried by `token`, rejecting it if expired.
///
/// # Errors
///
/// Returns `TokenDecodeError` if the token is not a readable JWT, has no
/// subject, or has expired.
pub fn decode_identity(token: &str) -> Result<TokenIdentity, TokenDecodeError> {
    let claims =
        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &restore_validation())?
            .claims;

    let username = claims
        .username
        .or(claims.sub)
        .filter(|name| !name.is_empty())
        .ok_or(TokenDecodeError::MissingSubject)?;

    let mut roles = BTreeSet::new();
    for claim in [claims.roles, claims.authorities].into_iter().flatten() {
        collect_roles(&claim, &mut roles);
    }

    Ok(TokenIdentity {
        username,
        roles,
        expires_at: claims.exp.and_then(|exp| DateTime::from_timestamp(exp, 0)),
    })
}

/// Accepts `"ROLE_A,ROLE_B"`, `["ROLE_A"]` and `[{"authority": "ROLE_A"}]`.
fn collect_roles(claim: &Value, roles: &mut BTreeSet<Role>) {
    match claim {
        Value::String(s) => roles.extend(
            s.split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(Role::from),
        ),
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(map) => {
                        if let Some(Value::String(authority)) = map.get("authority") {
                            roles.insert(Role::from(authority.as_str()));
                        }
                    }
                    other => collect_roles(other, roles),
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header};

    use super::*;

    fn jwt(claims: &Value) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(b"backend-secret"),
        )
        .unwrap()
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    #[test]
    fn test_decodes_subject_and_authority_objects() {
        let token = jwt(&serde_json::json!({
            "sub": "alice",
            "exp": now() + 3600,
            "authorities": [{"authority": "ROLE_ADMIN"}, {"authority": "ROLE_USER"}]
        }));
        let identity = decode_identity(&token).unwrap();
        assert_eq!(identity.username, "alice");
        assert!(identity.roles.contains(&Role::Admin));
        assert!(identity.roles.contains(&Role::Customer));
        assert_eq!(identity.expires_at.map(|at| at.timestamp()), Some(now() + 3600));
    }

    #[test]
    fn test_username_claim_preferred_over_subject() {
        let token = jwt(&serde_json::json!({"sub": "42", "username": "bob"}));
        assert_eq!(decode_identity(&token).unwrap().username, "bob");
    }

    #[test]
    fn test_decodes_comma_separated_roles() {
        let token = jwt(&serde_json::json!({"sub": "bob", "roles": "ROLE_USER, ROLE_ADMIN"}));
        let identity = decode_identity(&token).unwrap();
        assert_eq!(identity.roles.len(), 2);
        assert!(identity.expires_at.is_none());
    }

    #[test]
    fn test_no_roles_claim_means_no_roles() {
        let token = jwt(&serde_json::json!({"sub": "carol"}));
        assert!(decode_identity(&token).unwrap().roles.is_empty());
    }

    #[test]
    fn test_signature_is_not_checked() {
        let token = jwt(&serde_json::json!({"sub": "alice"}));
        let (unsigned, _) = token.rsplit_once('.').unwrap();
        let forged = format!("{unsigned}.bm90LWEtc2lnbmF0dXJl");
        assert_eq!(decode_identity(&forged).unwrap().username, "alice");
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = jwt(&serde_json::json!({"sub": "alice", "exp": now() - 3600}));
        assert_eq!(decode_identity(&token), Err(TokenDecodeError::Expired));
    }

    #[test]
    fn test_expiry_within_leeway_accepted() {
        let token = jwt(&serde_json::json!({"sub": "alice", "exp": now() - 5}));
        assert!(decode_identity(&token).is_ok());
    }

    #[test]
    fn test_malformed_tokens() {
        assert_eq!(decode_identity("opaque-token"), Err(TokenDecodeError::Malformed));
        assert_eq!(
            decode_identity("eyJhbGciOiJIUzI1NiJ9.!!!.c2ln"),
            Err(TokenDecodeError::Encoding)
        );
        // {"alg":"HS256"} . "hello"
        assert_eq!(
            decode_identity("eyJhbGciOiJIUzI1NiJ9.aGVsbG8.c2ln"),
            Err(TokenDecodeError::Claims)
        );
        let anonymous = jwt(&serde_json::json!({"exp": now() + 60}));
        assert_eq!(
            decode_identity(&anonymous),
            Err(TokenDecodeError::MissingSubject)
        );
    }
}
