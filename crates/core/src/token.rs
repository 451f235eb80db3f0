//! Access token inspection
//!
//! Tokens are compact three-segment strings (`header.payload.signature`).
//! Only the payload is read here, to find the `exp` claim; signatures are
//! verified by the backend, never by the client.

use crate::clock::Clock;
use crate::error::TokenError;
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

const LENIENT_PADDING: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Payloads are normally base64url, but older issuers emit the standard alphabet
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_PADDING);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_PADDING);

/// Claims carried in the token payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiry as seconds since the Unix epoch
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Any other claims the issuer added
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenClaims {
    /// Absolute expiry instant
    pub fn expires_at(&self) -> Result<DateTime<Utc>, TokenError> {
        DateTime::from_timestamp(self.exp, 0).ok_or(TokenError::ExpiryOutOfRange(self.exp))
    }
}

/// Result of inspecting an access token against a clock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// No token, or an empty one
    Missing,
    Valid { expires_at: DateTime<Utc> },
    Expired { expired_at: DateTime<Utc> },
    /// The token could not be decoded
    Invalid(TokenError),
}

impl TokenStatus {
    /// Missing and undecodable tokens count as expired
    pub fn is_expired(&self) -> bool {
        !matches!(self, Self::Valid { .. })
    }
}

/// Decode the payload segment of a token into its claims
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Segments {
            found: segments.len(),
        });
    }

    let payload = segments[1];
    let bytes = URL_SAFE_LENIENT
        .decode(payload)
        .or_else(|_| STANDARD_LENIENT.decode(payload))
        .map_err(|e| TokenError::Encoding(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| TokenError::Payload(e.to_string()))
}

/// Classify a token as missing, valid, expired or invalid
pub fn inspect_token(token: Option<&str>, clock: &dyn Clock) -> TokenStatus {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return TokenStatus::Missing;
    };

    let expiry = decode_claims(token).and_then(|claims| claims.expires_at());
    match expiry {
        Ok(expires_at) if expires_at < clock.now() => TokenStatus::Expired {
            expired_at: expires_at,
        },
        Ok(expires_at) => TokenStatus::Valid { expires_at },
        Err(err) => {
            warn!("Access token could not be decoded, treating it as expired: {}", err);
            TokenStatus::Invalid(err)
        }
    }
}

/// True when the token is absent, undecodable, or its expiry lies strictly in the past
pub fn is_token_expired(token: Option<&str>, clock: &dyn Clock) -> bool {
    inspect_token(token, clock).is_expired()
}

#[cfg(test)]
pub(crate) mod test_tokens {
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    /// Build an unsigned token whose payload carries the given `exp`
    pub fn token_expiring_at(exp: i64) -> String {
        token_with_payload(&format!(r#"{{"sub":"emp-1","exp":{exp}}}"#))
    }

    pub fn token_with_payload(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_tokens::{token_expiring_at, token_with_payload};
    use super::*;
    use crate::clock::FixedClock;
    use base64::engine::general_purpose::STANDARD;

    const NOW: i64 = 1_700_000_000;

    fn clock() -> FixedClock {
        FixedClock::at_timestamp(NOW).unwrap()
    }

    #[test]
    fn test_absent_token_is_expired() {
        assert!(is_token_expired(None, &clock()));
        assert!(is_token_expired(Some(""), &clock()));
        assert_eq!(inspect_token(None, &clock()), TokenStatus::Missing);
    }

    #[test]
    fn test_past_expiry_is_expired() {
        let token = token_expiring_at(NOW - 60);
        assert!(is_token_expired(Some(&token), &clock()));
        assert!(matches!(
            inspect_token(Some(&token), &clock()),
            TokenStatus::Expired { .. }
        ));
    }

    #[test]
    fn test_future_expiry_is_valid() {
        let token = token_expiring_at(NOW + 3600);
        assert!(!is_token_expired(Some(&token), &clock()));
    }

    #[test]
    fn test_expiry_equal_to_now_is_not_expired() {
        let token = token_expiring_at(NOW);
        assert!(!is_token_expired(Some(&token), &clock()));
    }

    #[test]
    fn test_decode_claims_keeps_extra_claims() {
        let token = token_with_payload(r#"{"exp":42,"iat":40,"auth":"ADMIN"}"#);
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.exp, 42);
        assert_eq!(claims.iat, Some(40));
        assert_eq!(claims.sub, None);
        assert_eq!(claims.extra.get("auth"), Some(&serde_json::json!("ADMIN")));
    }

    #[test]
    fn test_decode_accepts_standard_alphabet() {
        let payload = STANDARD.encode(r#"{"exp":1700003600,"sub":"a?b>c"}"#);
        let token = format!("header.{payload}.sig");
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.exp, 1_700_003_600);
    }

    #[test]
    fn test_wrong_segment_count_is_an_error() {
        assert_eq!(
            decode_claims("only.two"),
            Err(TokenError::Segments { found: 2 })
        );
        assert_eq!(
            decode_claims("a.b.c.d"),
            Err(TokenError::Segments { found: 4 })
        );
    }

    #[test]
    fn test_undecodable_payload_is_invalid_and_expired() {
        let status = inspect_token(Some("header.!!!.sig"), &clock());
        assert!(matches!(status, TokenStatus::Invalid(TokenError::Encoding(_))));
        assert!(status.is_expired());
    }

    #[test]
    fn test_missing_exp_is_invalid() {
        let token = token_with_payload(r#"{"sub":"emp-1"}"#);
        assert!(matches!(
            decode_claims(&token),
            Err(TokenError::Payload(_))
        ));
        assert!(is_token_expired(Some(&token), &clock()));
    }
}
