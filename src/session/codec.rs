//! Session token codec
//!
//! Tokens are compact JWTs (`header.payload.signature`) signed with HMAC-SHA256
//! under the process-wide [`SessionSecret`]. The signature is checked before the
//! payload is parsed, so nothing in an unauthenticated payload reaches serde.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use super::claims::{SessionClaims, WireClaims};
use super::secret::SessionSecret;

type HmacSha256 = Hmac<Sha256>;

/// Signing algorithm advertised in the token header
pub const TOKEN_ALGORITHM: &str = "HS256";

/// Reasons a token failed to decode
///
/// These never reach a client. Callers collapse every variant to "no session".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is not valid yet")]
    NotYetValid,
}

#[derive(Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    #[serde(default)]
    typ: Option<String>,
}

/// Encodes and verifies signed session tokens
#[derive(Clone, Debug)]
pub struct TokenCodec {
    secret: SessionSecret,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: SessionSecret) -> Self {
        Self { secret }
    }

    /// Serialize and sign the claims
    ///
    /// # Errors
    ///
    /// Returns an error if the header or payload cannot be serialized
    pub fn encode(&self, claims: &SessionClaims) -> Result<String> {
        let header = TokenHeader {
            alg: TOKEN_ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        };

        let header_json = serde_json::to_vec(&header).context("Failed to serialize token header")?;
        let payload_json = serde_json::to_vec(&WireClaims::from(claims))
            .context("Failed to serialize session claims")?;

        let message = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(payload_json)
        );
        let signature = URL_SAFE_NO_PAD.encode(self.mac(message.as_bytes()).finalize().into_bytes());

        Ok(format!("{message}.{signature}"))
    }

    /// Verify and decode a token against the current time
    ///
    /// # Errors
    ///
    /// See [`TokenCodec::decode_at`]
    pub fn decode(&self, token: &str) -> Result<SessionClaims, DecodeError> {
        self.decode_at(token, Utc::now())
    }

    /// Verify and decode a token as of `now`
    ///
    /// # Errors
    ///
    /// - [`DecodeError::Malformed`] if the token structure, header or payload cannot be parsed,
    ///   or the payload has no subject
    /// - [`DecodeError::BadSignature`] if the MAC does not match
    /// - [`DecodeError::Expired`] if `now` is at or past the expiry
    /// - [`DecodeError::NotYetValid`] if `now` is before the issue time
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, DecodeError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(DecodeError::Malformed);
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| DecodeError::Malformed)?;

        let signed_len = header_b64.len() + 1 + payload_b64.len();
        self.mac(&token.as_bytes()[..signed_len])
            .verify_slice(&signature)
            .map_err(|_| DecodeError::BadSignature)?;

        let header: TokenHeader = decode_segment(header_b64)?;
        if header.alg != TOKEN_ALGORITHM {
            return Err(DecodeError::Malformed);
        }

        let claims = decode_segment::<WireClaims>(payload_b64)?
            .into_claims()
            .ok_or(DecodeError::Malformed)?;

        if claims.is_expired_at(now) {
            return Err(DecodeError::Expired);
        }
        if now < claims.issued_at {
            return Err(DecodeError::NotYetValid);
        }

        Ok(claims)
    }

    fn mac(&self, message: &[u8]) -> HmacSha256 {
        // HMAC accepts keys of any length
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.secret.as_bytes())
            .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts any key length"));
        mac.update(message);
        mac
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, DecodeError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| DecodeError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| DecodeError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn codec() -> TokenCodec {
        TokenCodec::new(SessionSecret::from_config("test-session-secret-for-codec").unwrap())
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn claims() -> SessionClaims {
        SessionClaims::issue(
            "user-1",
            Some("app-42"),
            Some("Alice"),
            at(1_700_000_000),
            Duration::hours(1),
        )
        .unwrap()
    }

    /// Sign an arbitrary payload with the codec's key
    fn sign_raw(codec: &TokenCodec, header: &serde_json::Value, payload: &serde_json::Value) -> String {
        let message = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(payload.to_string())
        );
        let sig = URL_SAFE_NO_PAD.encode(codec.mac(message.as_bytes()).finalize().into_bytes());
        format!("{message}.{sig}")
    }

    #[test]
    fn test_round_trip() {
        let codec = codec();
        let original = claims();
        let token = codec.encode(&original).unwrap();

        assert_eq!(token.split('.').count(), 3);
        let decoded = codec.decode_at(&token, at(1_700_000_001)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_wire_format_uses_client_field_names() {
        let token = codec().encode(&claims()).unwrap();
        let payload_b64 = token.split('.').nth(1).unwrap();
        let payload: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload_b64).unwrap()).unwrap();

        assert_eq!(payload["openId"], "user-1");
        assert_eq!(payload["appId"], "app-42");
        assert_eq!(payload["name"], "Alice");
        assert_eq!(payload["iat"], 1_700_000_000);
        assert_eq!(payload["exp"], 1_700_003_600);
    }

    #[test]
    fn test_expired_at_boundary() {
        let codec = codec();
        let original = claims();
        let token = codec.encode(&original).unwrap();

        assert!(codec
            .decode_at(&token, original.expires_at - Duration::seconds(1))
            .is_ok());
        assert_eq!(
            codec.decode_at(&token, original.expires_at),
            Err(DecodeError::Expired)
        );
    }

    #[test]
    fn test_not_yet_valid() {
        let codec = codec();
        let token = codec.encode(&claims()).unwrap();
        assert_eq!(
            codec.decode_at(&token, at(1_699_999_000)),
            Err(DecodeError::NotYetValid)
        );
    }

    #[test]
    fn test_wrong_secret_is_bad_signature() {
        let token = codec().encode(&claims()).unwrap();
        let other = TokenCodec::new(SessionSecret::from_config("another-secret-entirely").unwrap());

        assert_eq!(
            other.decode_at(&token, at(1_700_000_001)),
            Err(DecodeError::BadSignature)
        );
    }

    #[test]
    fn test_structure_errors_are_malformed() {
        let codec = codec();
        let now = at(1_700_000_001);

        assert_eq!(codec.decode_at("", now), Err(DecodeError::Malformed));
        assert_eq!(codec.decode_at("a.b", now), Err(DecodeError::Malformed));
        assert_eq!(codec.decode_at("a.b.c.d", now), Err(DecodeError::Malformed));
        assert_eq!(codec.decode_at("a.b.!!!", now), Err(DecodeError::Malformed));
    }

    #[test]
    fn test_signed_payload_without_subject_is_malformed() {
        let codec = codec();
        let token = sign_raw(
            &codec,
            &json!({"alg": "HS256", "typ": "JWT"}),
            &json!({"appId": "", "name": "Mallory", "iat": 1_700_000_000, "exp": 1_800_000_000}),
        );

        assert_eq!(
            codec.decode_at(&token, at(1_700_000_001)),
            Err(DecodeError::Malformed)
        );
    }

    #[test]
    fn test_signed_token_with_other_algorithm_is_malformed() {
        let codec = codec();
        let token = sign_raw(
            &codec,
            &json!({"alg": "none"}),
            &json!({"openId": "user-1", "iat": 1_700_000_000, "exp": 1_800_000_000}),
        );

        assert_eq!(
            codec.decode_at(&token, at(1_700_000_001)),
            Err(DecodeError::Malformed)
        );
    }

    #[test]
    fn test_single_character_flip_never_decodes() {
        let codec = codec();
        let token = codec.encode(&claims()).unwrap();
        let now = at(1_700_000_001);

        for (i, original) in token.char_indices() {
            let replacement = if original == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(i..=i, &replacement.to_string());

            let result = codec.decode_at(&tampered, now);
            assert!(
                matches!(result, Err(DecodeError::BadSignature | DecodeError::Malformed)),
                "flipping index {i} produced {result:?}"
            );
        }
    }
}
