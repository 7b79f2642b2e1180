//! Unverified JWT payload decoding.
//!
//! The client only sniffs claims (member id, item category); signature
//! checks belong to the server. Decoding never fails loudly: any problem is
//! logged and yields `None`, which callers treat as "no claims".

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};

use crate::value::to_nullable_number;

pub type Claims = Map<String, Value>;

/// Decode the payload segment of `token` into a JSON object.
pub fn decode_jwt_payload(token: &str) -> Option<Claims> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload)) = (parts.next(), parts.next()) else {
        return None;
    };

    let mut base64 = payload.replace('-', "+").replace('_', "/");
    while base64.len() % 4 != 0 {
        base64.push('=');
    }

    let bytes = match STANDARD.decode(base64.as_bytes()) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "failed to decode token payload");
            return None;
        }
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(claims)) => Some(claims),
        Ok(_) => {
            tracing::warn!("token payload is not a JSON object");
            None
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to parse token payload");
            None
        }
    }
}

/// First numeric claim among `keys`.
pub fn numeric_claim(claims: &Claims, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| to_nullable_number(claims.get(*key)))
}

/// The member id carried by an access token (`memberId`, `sub` or `userId`).
pub fn member_id_from_token(token: &str) -> Option<i64> {
    decode_jwt_payload(token).and_then(|claims| numeric_claim(&claims, &["memberId", "sub", "userId"]))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    /// Unsigned token with the given payload, encoded the way the server does.
    pub(crate) fn make_token(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn decodes_url_safe_payload_without_padding() {
        let token = make_token(&serde_json::json!({"sub": "42", "role": "COUNCIL", "name": "학생회~?>"}));
        let claims = decode_jwt_payload(&token).unwrap();
        assert_eq!(claims["role"], "COUNCIL");
        assert_eq!(claims["name"], "학생회~?>");
    }

    #[test]
    fn member_id_claim_priority() {
        let token = make_token(&serde_json::json!({"memberId": 7, "sub": "99"}));
        assert_eq!(member_id_from_token(&token), Some(7));
        let token = make_token(&serde_json::json!({"sub": "99"}));
        assert_eq!(member_id_from_token(&token), Some(99));
        let token = make_token(&serde_json::json!({"sub": "user@example.com", "userId": 5}));
        assert_eq!(member_id_from_token(&token), Some(5));
    }

    #[test]
    fn malformed_tokens_yield_none() {
        assert!(decode_jwt_payload("").is_none());
        assert!(decode_jwt_payload("single-segment").is_none());
        assert!(decode_jwt_payload("a.!!!.c").is_none());
        let not_json = format!("x.{}.y", URL_SAFE_NO_PAD.encode("plain text"));
        assert!(decode_jwt_payload(&not_json).is_none());
        let array = format!("x.{}.y", URL_SAFE_NO_PAD.encode("[1,2]"));
        assert!(decode_jwt_payload(&array).is_none());
    }

    #[test]
    fn two_segments_are_enough() {
        let body = URL_SAFE_NO_PAD.encode(r#"{"memberId":3}"#);
        assert_eq!(member_id_from_token(&format!("h.{body}")), Some(3));
    }
}
