//! services/api/src/web/token.rs
//!
//! HS256 bearer tokens. A token names the user and carries the role it was
//! issued with, so authorization needs no database round trip.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use timekeeper_core::{User, Viewer};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// JWT claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    pub email: String,
    pub role: String,
    pub full_name: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn viewer(&self) -> ApiResult<Viewer> {
        let user_id = Uuid::parse_str(&self.sub)
            .map_err(|_| ApiError::unauthorized("Invalid token"))?;
        let role = self
            .role
            .parse()
            .map_err(|_| ApiError::unauthorized("Invalid token"))?;
        Ok(Viewer::new(user_id, role))
    }
}

/// Signing and verification keys derived from the shared secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, lifetime_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::hours(lifetime_hours),
        }
    }

    pub fn issue(&self, user: &User) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            full_name: user.full_name.clone(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("JWT encode: {e}")))
    }

    pub fn decode(&self, token: &str) -> ApiResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "exp", "iat"]);
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::unauthorized("Token expired")
                }
                _ => ApiError::unauthorized("Invalid token"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timekeeper_core::Role;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "jane@example.com".to_string(),
            full_name: "Jane Doe".to_string(),
            role: Role::Admin,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn jwt_roundtrip() {
        let keys = TokenKeys::new("test-secret", 24);
        let user = user();
        let token = keys.issue(&user).unwrap();
        let claims = keys.decode(&token).unwrap();

        assert_eq!(claims.email, "jane@example.com");
        assert_eq!(claims.full_name, "Jane Doe");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        let viewer = claims.viewer().unwrap();
        assert_eq!(viewer.user_id, user.id);
        assert_eq!(viewer.role, Role::Admin);
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let token = TokenKeys::new("one-secret", 1).issue(&user()).unwrap();
        assert!(TokenKeys::new("another-secret", 1).decode(&token).is_err());
        assert!(TokenKeys::new("one-secret", 1).decode("garbage").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::new("test-secret", -2);
        let token = keys.issue(&user()).unwrap();
        assert!(keys.decode(&token).is_err());
    }
}
