//! HS256 access and refresh tokens.
//!
//! Both token kinds share one signing secret and are told apart by the `typ`
//! claim, so a refresh token is never accepted where an access token is
//! expected.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use skateparadise_core::UserId;

use crate::config::JwtConfig;
use crate::models::{CurrentUser, User};

const ISSUER: &str = "skateparadise";

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived token sent as `Authorization: Bearer`.
    Access,
    /// Long-lived token exchanged for a new access token.
    Refresh,
}

/// Claims carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: i64,
    pub username: String,
    pub staff: bool,
    pub typ: TokenType,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl Claims {
    /// The caller these claims identify.
    #[must_use]
    pub fn current_user(&self) -> CurrentUser {
        CurrentUser {
            id: UserId::new(self.sub),
            username: self.username.clone(),
            is_staff: self.staff,
        }
    }
}

/// Token verification and signing errors.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token's `exp` has passed.
    #[error("token has expired")]
    Expired,

    /// Bad signature, issuer or shape.
    #[error("invalid token")]
    Invalid,

    /// A valid token of the wrong kind.
    #[error("expected {expected:?} token, got {got:?}")]
    WrongType { expected: TokenType, got: TokenType },

    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
}

/// An access/refresh token pair.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signs and verifies tokens with the configured secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Build the service from JWT configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: Duration::minutes(config.access_token_minutes),
            refresh_ttl: Duration::hours(config.refresh_token_hours),
        }
    }

    /// Issue an access and a refresh token for `user`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if signing fails.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue(user, TokenType::Access)?,
            refresh: self.issue(user, TokenType::Refresh)?,
        })
    }

    /// Issue one token of the given type.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if signing fails.
    pub fn issue(&self, user: &User, typ: TokenType) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match typ {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user.id.as_i64(),
            username: user.username.clone(),
            staff: user.is_staff,
            typ,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: ISSUER.to_owned(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Encoding)
    }

    /// Verify a token and check its type.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired`, `TokenError::Invalid` or
    /// `TokenError::WrongType`.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        if data.claims.typ != expected {
            return Err(TokenError::WrongType {
                expected,
                got: data.claims.typ,
            });
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use skateparadise_core::Email;

    use super::*;

    fn config(access_minutes: i64) -> JwtConfig {
        JwtConfig {
            secret: SecretString::from("kJ8#mP2$vL9@nQ4&wR7*xT1!yU5^zA3%"),
            access_token_minutes: access_minutes,
            refresh_token_hours: 24,
        }
    }

    fn user(is_staff: bool) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(7),
            username: "tony".to_owned(),
            email: Email::parse("tony@hawk.com").unwrap(),
            first_name: String::new(),
            last_name: String::new(),
            state: None,
            city: None,
            address: None,
            phone: None,
            birth_date: None,
            is_staff,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_access_token_round_trip_carries_identity() {
        let tokens = TokenService::new(&config(30));
        let token = tokens.issue(&user(true), TokenType::Access).unwrap();

        let claims = tokens.verify(&token, TokenType::Access).unwrap();
        let current = claims.current_user();
        assert_eq!(current.id, UserId::new(7));
        assert_eq!(current.username, "tony");
        assert!(current.is_staff);
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let tokens = TokenService::new(&config(30));
        let pair = tokens.issue_pair(&user(false)).unwrap();

        assert!(matches!(
            tokens.verify(&pair.refresh, TokenType::Access),
            Err(TokenError::WrongType {
                expected: TokenType::Access,
                got: TokenType::Refresh
            })
        ));
        assert!(tokens.verify(&pair.refresh, TokenType::Refresh).is_ok());
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenService::new(&config(-5));
        let token = tokens.issue(&user(false), TokenType::Access).unwrap();

        assert!(matches!(
            tokens.verify(&token, TokenType::Access),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let tokens = TokenService::new(&config(30));
        let other = TokenService::new(&JwtConfig {
            secret: SecretString::from("Zq7!Lw3@Rt9#Yp2$Mn6%Bv1^Xc8&Kd4*"),
            access_token_minutes: 30,
            refresh_token_hours: 24,
        });
        let token = other.issue(&user(false), TokenType::Access).unwrap();

        assert!(matches!(
            tokens.verify(&token, TokenType::Access),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let tokens = TokenService::new(&config(30));
        assert!(matches!(
            tokens.verify("not.a.jwt", TokenType::Access),
            Err(TokenError::Invalid)
        ));
    }
}
