use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, AppResult};

/// Session claims. `sub` is the user id; nothing else identifies the caller.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn generate_token(&self, user_id: &str) -> AppResult<String> {
        let issued_at = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (issued_at + self.ttl).timestamp(),
            iat: issued_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Could not sign session token: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                Err(AppError::Unauthenticated("Session expired".to_string()))
            }
            Err(e) => Err(AppError::Unauthenticated(format!("Invalid token: {}", e))),
        }
    }

    pub fn extract_user_id(&self, token: &str) -> AppResult<String> {
        self.verify_token(token).map(|claims| claims.sub)
    }
}
