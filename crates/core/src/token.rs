//! Preview access token codec.
//!
//! A token is the URL-safe base64 encoding of `<project_id>:<issued_at_millis>`.
//! The encoding is reversible and carries no integrity protection: anyone
//! holding a token can decode it, and anyone can mint one for a guessed
//! project id. Lifetime is enforced by the backend through the preview code
//! record, never by the token itself.
//!
//! [`TokenCodec`] optionally layers an HMAC-SHA256 signature on top
//! (`<payload>.<hex mac>`). When a secret is configured, unsigned or
//! tampered tokens fail with [`DecodeError::BadSignature`].

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{TimeZone, Utc};

use crate::hashing::{hmac_sha256_hex, verify_hmac_sha256_hex};
use crate::types::{ProjectId, Timestamp};

/// Separates the project id from the issuance timestamp inside the payload.
pub const TOKEN_DELIMITER: char = ':';

/// Separates the encoded payload from its signature in signed tokens.
///
/// Not part of the URL-safe base64 alphabet, so it never appears in a payload.
pub const SIGNATURE_SEPARATOR: char = '.';

/// Fields recovered from a decoded token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub project_id: ProjectId,
    pub issued_at: Timestamp,
}

/// Why a token could not be decoded.
///
/// Callers surface every variant to users as "invalid or expired" so that
/// forgery and corruption are indistinguishable from the outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The payload decoded but did not split into exactly two valid fields.
    #[error("Token payload is malformed")]
    Malformed,

    /// The outer encoding could not be decoded at all.
    #[error("Token is not decodable")]
    NotDecodable,

    /// A signature was required and was missing or did not match.
    #[error("Token signature is invalid")]
    BadSignature,
}

/// Issue an unsigned token for `project_id` stamped with the current time.
pub fn issue(project_id: &str) -> String {
    issue_at(project_id, Utc::now())
}

/// Issue an unsigned token with an explicit issuance time.
pub fn issue_at(project_id: &str, issued_at: Timestamp) -> String {
    let payload = format!(
        "{project_id}{TOKEN_DELIMITER}{}",
        issued_at.timestamp_millis()
    );
    URL_SAFE_NO_PAD.encode(payload.as_bytes())
}

/// Query parameter that carries a token in preview links.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// `url` with `token` appended as its `token` query parameter.
pub fn link_with_token(url: &str, token: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{TOKEN_QUERY_PARAM}={token}")
}

/// The `token` query parameter of a preview link, if present and non-empty.
pub fn token_from_link(url: &str) -> Option<&str> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == TOKEN_QUERY_PARAM)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Decode an unsigned token.
pub fn decode(token: &str) -> Result<TokenClaims, DecodeError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|_| DecodeError::NotDecodable)?;
    let payload = String::from_utf8(bytes).map_err(|_| DecodeError::NotDecodable)?;

    let fields: Vec<&str> = payload.split(TOKEN_DELIMITER).collect();
    let [project_id, millis] = fields.as_slice() else {
        return Err(DecodeError::Malformed);
    };
    if project_id.is_empty() {
        return Err(DecodeError::Malformed);
    }

    let millis: i64 = millis.parse().map_err(|_| DecodeError::Malformed)?;
    let issued_at = Utc
        .timestamp_millis_opt(millis)
        .single()
        .ok_or(DecodeError::Malformed)?;

    Ok(TokenClaims {
        project_id: (*project_id).to_string(),
        issued_at,
    })
}

/// Token codec with optional HMAC signing.
#[derive(Debug, Clone, Default)]
pub struct TokenCodec {
    secret: Option<String>,
}

impl TokenCodec {
    /// Codec that issues and accepts bare reversible tokens.
    pub fn unsigned() -> Self {
        Self { secret: None }
    }

    /// Codec that signs issued tokens and rejects unsigned ones.
    pub fn signed(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
        }
    }

    /// Build from an optional secret; an empty secret counts as absent.
    pub fn from_secret(secret: Option<String>) -> Self {
        match secret {
            Some(s) if !s.is_empty() => Self::signed(s),
            _ => Self::unsigned(),
        }
    }

    pub fn is_signed(&self) -> bool {
        self.secret.is_some()
    }

    /// Issue a token for `project_id` at the current time.
    pub fn issue(&self, project_id: &str) -> String {
        self.issue_at(project_id, Utc::now())
    }

    /// Issue a token with an explicit issuance time.
    pub fn issue_at(&self, project_id: &str, issued_at: Timestamp) -> String {
        let payload = issue_at(project_id, issued_at);
        match &self.secret {
            Some(secret) => {
                let mac = hmac_sha256_hex(secret, payload.as_bytes());
                format!("{payload}{SIGNATURE_SEPARATOR}{mac}")
            }
            None => payload,
        }
    }

    /// Decode a token, checking its signature when the codec is signed.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, DecodeError> {
        let token = token.trim();
        match &self.secret {
            Some(secret) => {
                let (payload, mac) = token
                    .rsplit_once(SIGNATURE_SEPARATOR)
                    .ok_or(DecodeError::BadSignature)?;
                if !verify_hmac_sha256_hex(secret, payload.as_bytes(), mac) {
                    return Err(DecodeError::BadSignature);
                }
                decode(payload)
            }
            None => decode(token),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn encode_raw(payload: &str) -> String {
        URL_SAFE_NO_PAD.encode(payload.as_bytes())
    }

    #[test]
    fn round_trip_preserves_project_and_time() {
        let before = Utc::now();
        let token = issue("P123");
        let claims = decode(&token).expect("freshly issued token must decode");

        assert_eq!(claims.project_id, "P123");
        let drift = (claims.issued_at - before).num_milliseconds().abs();
        assert!(drift < 1_000, "issued_at drifted by {drift}ms");
    }

    #[test]
    fn round_trip_for_varied_project_ids() {
        for id in ["a", "P123", "proj-2024_x", "9f1c6a4e-7b1d-4c55-a1c0-7e2b4f0d9a11"] {
            let claims = decode(&issue(id)).unwrap();
            assert_eq!(claims.project_id, id);
        }
    }

    #[test]
    fn issue_at_is_deterministic() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(issue_at("P1", at), issue_at("P1", at));
        assert_eq!(decode(&issue_at("P1", at)).unwrap().issued_at, at);
    }

    #[test]
    fn payload_without_delimiter_is_malformed() {
        for raw in ["", "garbage", "P123", "1700000000000", "no delimiter here"] {
            assert_matches!(decode(&encode_raw(raw)), Err(DecodeError::Malformed));
        }
    }

    #[test]
    fn payload_with_extra_fields_is_malformed() {
        assert_matches!(
            decode(&encode_raw("P1:123:456")),
            Err(DecodeError::Malformed)
        );
    }

    #[test]
    fn non_numeric_timestamp_is_malformed() {
        assert_matches!(decode(&encode_raw("P1:yesterday")), Err(DecodeError::Malformed));
    }

    #[test]
    fn empty_project_id_is_malformed() {
        assert_matches!(decode(&encode_raw(":123")), Err(DecodeError::Malformed));
    }

    #[test]
    fn invalid_base64_is_not_decodable() {
        assert_matches!(decode("not base64!!"), Err(DecodeError::NotDecodable));
    }

    #[test]
    fn invalid_utf8_is_not_decodable() {
        let token = URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0x3a, 0x31]);
        assert_matches!(decode(&token), Err(DecodeError::NotDecodable));
    }

    #[test]
    fn unsigned_token_can_be_forged_for_any_project() {
        let forged = encode_raw("P999:1700000000000");
        assert_eq!(decode(&forged).unwrap().project_id, "P999");
    }

    #[test]
    fn links_carry_the_token_as_a_query_parameter() {
        let token = issue("P123");
        let link = link_with_token("https://cadenza.test/preview/P123", &token);
        assert_eq!(link, format!("https://cadenza.test/preview/P123?token={token}"));
        assert_eq!(token_from_link(&link), Some(token.as_str()));

        let link = link_with_token("https://cadenza.test/preview/P123?lang=pt", "abc");
        assert_eq!(link, "https://cadenza.test/preview/P123?lang=pt&token=abc");
        assert_eq!(token_from_link(&link), Some("abc"));
    }

    #[test]
    fn links_without_a_token_yield_none() {
        assert_eq!(token_from_link("https://cadenza.test/preview/P123"), None);
        assert_eq!(token_from_link("https://cadenza.test/preview/P123?token="), None);
        assert_eq!(token_from_link("https://cadenza.test/preview/P123?lang=pt#token=x"), None);
    }

    #[test]
    fn signed_codec_round_trips() {
        let codec = TokenCodec::signed("server-secret");
        let token = codec.issue("P123");
        assert!(token.contains(SIGNATURE_SEPARATOR));
        assert_eq!(codec.decode(&token).unwrap().project_id, "P123");
    }

    #[test]
    fn signed_codec_rejects_unsigned_token() {
        let codec = TokenCodec::signed("server-secret");
        assert_matches!(codec.decode(&issue("P123")), Err(DecodeError::BadSignature));
    }

    #[test]
    fn signed_codec_rejects_tampered_payload() {
        let codec = TokenCodec::signed("server-secret");
        let token = codec.issue("P123");
        let (_, mac) = token.rsplit_once(SIGNATURE_SEPARATOR).unwrap();
        let forged = format!("{}.{mac}", issue("P999"));
        assert_matches!(codec.decode(&forged), Err(DecodeError::BadSignature));
    }

    #[test]
    fn signed_codec_rejects_other_secret() {
        let token = TokenCodec::signed("alpha").issue("P123");
        assert_matches!(
            TokenCodec::signed("bravo").decode(&token),
            Err(DecodeError::BadSignature)
        );
    }

    #[test]
    fn empty_secret_means_unsigned() {
        let codec = TokenCodec::from_secret(Some(String::new()));
        assert!(!codec.is_signed());
        assert_eq!(codec.decode(&codec.issue("P1")).unwrap().project_id, "P1");
    }
}
