//! Handshake token verification.
//!
//! The portal's auth service issues HS256 JWTs after the OAuth login,
//! with the user id nested under `user`:
//!
//! ```json
//! { "user": { "id": "65f0c2...", "role": "Student" }, "iat": 1709287200, "exp": 1709892000 }
//! ```
//!
//! A connection that presents such a token gets `user.id` bound as its
//! principal.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: ClaimsUser,
    pub exp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimsUser {
    pub id: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token expired")]
    Expired,

    #[error("token invalid: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("token carries no user id")]
    MissingUserId,
}

pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        TokenVerifier {
            key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Validate `token` and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            if matches!(e.kind(), ErrorKind::ExpiredSignature) {
                AuthError::Expired
            } else {
                AuthError::Invalid(e)
            }
        })?;

        let id = data.claims.user.id;
        if id.is_empty() {
            return Err(AuthError::MissingUserId);
        }
        Ok(id)
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"campus-secret";

    fn token_for(id: &str, exp: u64, secret: &[u8]) -> String {
        let claims = Claims {
            user: ClaimsUser {
                id: id.to_string(),
                role: Some("Student".to_string()),
            },
            exp,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    fn in_one_hour() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    #[test]
    fn accepts_valid_token() {
        let verifier = TokenVerifier::new(SECRET);
        let token = token_for("alice", in_one_hour(), SECRET);
        assert_eq!(verifier.verify(&token).unwrap(), "alice");
    }

    #[test]
    fn rejects_wrong_secret() {
        let verifier = TokenVerifier::new(SECRET);
        let token = token_for("alice", in_one_hour(), b"other");
        assert!(matches!(verifier.verify(&token), Err(AuthError::Invalid(_))));
    }

    #[test]
    fn rejects_expired_token() {
        let verifier = TokenVerifier::new(SECRET);
        let token = token_for("alice", 1_000, SECRET);
        assert!(matches!(verifier.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn rejects_empty_user_id() {
        let verifier = TokenVerifier::new(SECRET);
        let token = token_for("", in_one_hour(), SECRET);
        assert!(matches!(verifier.verify(&token), Err(AuthError::MissingUserId)));
    }

    #[test]
    fn rejects_garbage() {
        let verifier = TokenVerifier::new(SECRET);
        assert!(matches!(verifier.verify("not-a-jwt"), Err(AuthError::Invalid(_))));
    }
}
