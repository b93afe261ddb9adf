//! Signed bearer tokens for owner sessions.
//!
//! Tokens are stateless: `v1.<owner_id>.<expires_unix>.<hmac>` where the
//! HMAC-SHA256 covers everything before the last dot. Rotating
//! `MOBILE_ORDER_TOKEN_SECRET` invalidates every issued token.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::Sha256;

use mobile_order_core::OwnerId;

use super::AuthError;
use crate::config::AuthConfig;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION: &str = "v1";

/// A freshly issued token and its expiry.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    /// Value for the `Authorization: Bearer` header.
    pub token: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies owner bearer tokens.
#[derive(Clone)]
pub struct TokenSigner {
    key: SecretString,
    ttl_secs: i64,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl TokenSigner {
    /// Create a signer with the given key and token lifetime.
    #[must_use]
    pub fn new(key: SecretString, ttl: Duration) -> Self {
        Self {
            key,
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        }
    }

    /// Create a signer from the server's auth configuration.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.token_secret.clone(), config.token_ttl)
    }

    /// Issue a token for `owner_id` valid from now.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidKey` if the HMAC key cannot be used.
    pub fn issue(&self, owner_id: OwnerId) -> Result<IssuedToken, AuthError> {
        self.issue_at(owner_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidKey` if the HMAC key cannot be used.
    pub fn issue_at(&self, owner_id: OwnerId, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let expires = now.timestamp().saturating_add(self.ttl_secs);
        let payload = format!("{TOKEN_VERSION}.{owner_id}.{expires}");

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(IssuedToken {
            token: format!("{payload}.{signature}"),
            expires_at: DateTime::from_timestamp(expires, 0).unwrap_or(DateTime::<Utc>::MAX_UTC),
        })
    }

    /// Verify a token and return the owner it was issued to.
    ///
    /// # Errors
    ///
    /// Returns `MalformedToken`, `InvalidSignature` or `Expired`.
    pub fn verify(&self, token: &str) -> Result<OwnerId, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedToken`, `InvalidSignature` or `Expired`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<OwnerId, AuthError> {
        let (payload, signature) = token.rsplit_once('.').ok_or(AuthError::MalformedToken)?;

        let mut parts = payload.split('.');
        let (Some(version), Some(owner), Some(expires), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::MalformedToken);
        };

        if version != TOKEN_VERSION {
            return Err(AuthError::MalformedToken);
        }

        let signature = hex::decode(signature).map_err(|_| AuthError::MalformedToken)?;
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        // Constant-time comparison
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidSignature)?;

        let owner_id = owner
            .parse::<i32>()
            .map_err(|_| AuthError::MalformedToken)?;
        let expires = expires
            .parse::<i64>()
            .map_err(|_| AuthError::MalformedToken)?;

        if now.timestamp() >= expires {
            return Err(AuthError::Expired);
        }

        Ok(OwnerId::new(owner_id))
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|_| AuthError::InvalidKey)
    }
}

/// Extract the token from an `Authorization` header value.
///
/// # Errors
///
/// Returns `AuthError::MissingToken` unless the value uses the `Bearer` scheme
/// with a non-empty token.
pub fn parse_bearer(header: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header.trim().split_once(' ').ok_or(AuthError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingToken);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(
            SecretString::from("k8#Qz!2vLm@9pX&4rT$6wY^1nB*3cF%7"),
            Duration::from_secs(3600),
        )
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_issue_then_verify() {
        let signer = signer();
        let issued = signer.issue_at(OwnerId::new(42), noon()).unwrap();
        assert!(issued.token.starts_with("v1.42."));
        assert_eq!(issued.expires_at, noon() + chrono::Duration::hours(1));
        assert_eq!(
            signer.verify_at(&issued.token, noon()).unwrap(),
            OwnerId::new(42)
        );
    }

    #[test]
    fn test_expired_token() {
        let signer = signer();
        let issued = signer.issue_at(OwnerId::new(1), noon()).unwrap();
        let later = noon() + chrono::Duration::hours(1);
        assert!(matches!(
            signer.verify_at(&issued.token, later),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn test_tampered_owner_rejected() {
        let signer = signer();
        let issued = signer.issue_at(OwnerId::new(1), noon()).unwrap();
        let tampered = issued.token.replacen("v1.1.", "v1.2.", 1);
        assert!(matches!(
            signer.verify_at(&tampered, noon()),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_other_key_rejected() {
        let issued = signer().issue_at(OwnerId::new(1), noon()).unwrap();
        let other = TokenSigner::new(
            SecretString::from("Zx9!Lq2@Wm4#Rt6$Yp8%Vb1^Nc3&Hd5*"),
            Duration::from_secs(3600),
        );
        assert!(matches!(
            other.verify_at(&issued.token, noon()),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        let signer = signer();
        for token in ["", "garbage", "v1.1.2", "v2.1.2.abcd", "v1.1.2.not-hex", "v1.a.b.c.d"] {
            assert!(
                matches!(
                    signer.verify_at(token, noon()),
                    Err(AuthError::MalformedToken)
                ),
                "{token:?}"
            );
        }
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc").unwrap(), "abc");
        assert_eq!(parse_bearer("bearer  abc ").unwrap(), "abc");
        assert!(matches!(parse_bearer("Basic abc"), Err(AuthError::MissingToken)));
        assert!(matches!(parse_bearer("Bearer "), Err(AuthError::MissingToken)));
        assert!(matches!(parse_bearer("abc"), Err(AuthError::MissingToken)));
    }
}
