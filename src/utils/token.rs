use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorMessage, HttpError};

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

pub fn create_token(
    user_id: i64,
    secret: &[u8],
    expires_in_minutes: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::minutes(expires_in_minutes)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
}

/// Decodes a bearer token and returns the user id it carries.
pub fn decode_token<T: Into<String>>(token: T, secret: &[u8]) -> Result<i64, HttpError> {
    let decoded = decode::<TokenClaims>(
        &token.into(),
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|_| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    decoded
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn token_roundtrip_preserves_user_id() {
        let token = create_token(42, SECRET, 60).unwrap();
        assert_eq!(decode_token(token, SECRET).unwrap(), 42);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_token(42, b"other-secret", 60).unwrap();
        assert!(decode_token(token, SECRET).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_token(42, SECRET, -5).unwrap();
        assert!(decode_token(token, SECRET).is_err());
    }
}
