//! Authentication service.
//!
//! Username/password accounts with HS256 access and refresh tokens.

mod error;
pub mod tokens;

pub use error::AuthError;
pub use tokens::{Claims, TokenError, TokenPair, TokenService, TokenType};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use skateparadise_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, ProfileUpdate, UserRepository};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum username length.
const MAX_USERNAME_LENGTH: usize = 150;

/// Registration input.
#[derive(Debug, Clone)]
pub struct Registration<'r> {
    pub username: &'r str,
    pub email: &'r str,
    pub password: &'r str,
    pub first_name: Option<&'r str>,
    pub last_name: Option<&'r str>,
}

/// Authentication service.
///
/// Handles registration, login, token refresh and profile access.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenService) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the username or email is taken.
    pub async fn register(&self, registration: &Registration<'_>) -> Result<User, AuthError> {
        let username = validate_username(registration.username)?;
        let email = Email::parse(registration.email)?;
        validate_password(registration.password)?;
        let password_hash = hash_password(registration.password)?;

        let new = NewUser {
            username: username.to_owned(),
            email,
            password_hash,
            first_name: registration.first_name.unwrap_or_default().trim().to_owned(),
            last_name: registration.last_name.unwrap_or_default().trim().to_owned(),
        };

        let user = self.users.create(&new).await.map_err(|e| match e {
            RepositoryError::Conflict(message) => AuthError::UserAlreadyExists(message),
            other => AuthError::Repository(other),
        })?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check credentials and issue a token pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    pub async fn obtain_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenPair, AuthError> {
        let (user, password_hash) = self
            .users
            .get_credentials(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(self.tokens.issue_pair(&user)?)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The user is re-read so a revoked staff flag takes effect immediately.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if the refresh token is invalid or expired.
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.tokens.verify(refresh_token, TokenType::Refresh)?;
        let user = self.profile(UserId::new(claims.sub)).await?;
        Ok(self.tokens.issue(&user, TokenType::Access)?)
    }

    /// Get a user's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn profile(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Update a user's profile. Only the supplied fields change.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, AuthError> {
        self.users
            .update_profile(user_id, update)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }
}

fn validate_username(username: &str) -> Result<&str, AuthError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AuthError::InvalidUsername("username is required".to_owned()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername(format!(
            "username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    Ok(username)
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_verifies() {
        let hash = hash_password("kickflip-42").unwrap();
        assert!(verify_password("kickflip-42", &hash).is_ok());
        assert!(matches!(
            verify_password("heelflip-42", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_minimum_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("eightchr").is_ok());
    }

    #[test]
    fn test_username_trimmed_and_bounded() {
        assert_eq!(validate_username("  tony ").unwrap(), "tony");
        assert!(validate_username("   ").is_err());
        assert!(validate_username(&"x".repeat(151)).is_err());
    }
}
