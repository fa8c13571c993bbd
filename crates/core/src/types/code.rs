//! Client-facing opaque codes: cart codes and order tracking codes.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const UPPER_ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn random_string<R: Rng + ?Sized>(rng: &mut R, charset: &[u8], length: usize) -> String {
    (0..length)
        .filter_map(|_| charset.choose(rng).copied())
        .map(char::from)
        .collect()
}

/// Errors that can occur when parsing a code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    /// The code is empty.
    #[error("code cannot be empty")]
    Empty,
    /// The code is too long.
    #[error("code must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The code contains characters outside its alphabet.
    #[error("code contains invalid characters")]
    InvalidCharacter,
    /// The tracking code does not match `SP-XXXXXXXXXX`.
    #[error("tracking code must look like SP-XXXXXXXXXX")]
    Malformed,
}

/// Opaque token a guest client holds to identify its shopping cart.
///
/// Between 1 and 64 characters of `[A-Za-z0-9_-]`. The frontend generates
/// these; the server generates one for carts opened by an authenticated user
/// without a code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CartCode(String);

impl CartCode {
    /// Maximum code length.
    pub const MAX_LENGTH: usize = 64;

    /// Length of server-generated codes.
    pub const GENERATED_LENGTH: usize = 12;

    /// Parse a client-supplied cart code.
    ///
    /// # Errors
    ///
    /// Returns a `CodeError` if the code is empty, too long, or contains
    /// characters other than ASCII letters, digits, `_` and `-`.
    pub fn parse(s: &str) -> Result<Self, CodeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CodeError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(CodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(CodeError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    /// Generate a fresh random code.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(random_string(rng, ALPHANUMERIC, Self::GENERATED_LENGTH))
    }

    /// The code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CartCode {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CartCode> for String {
    fn from(code: CartCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for CartCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public order tracking code, `SP-` followed by ten uppercase alphanumerics.
///
/// Assigned once when the order is created and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingCode(String);

impl TrackingCode {
    /// Fixed prefix of every tracking code.
    pub const PREFIX: &'static str = "SP-";

    /// Number of random characters after the prefix.
    pub const SUFFIX_LENGTH: usize = 10;

    /// Generate a new tracking code.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(format!(
            "{}{}",
            Self::PREFIX,
            random_string(rng, UPPER_ALPHANUMERIC, Self::SUFFIX_LENGTH)
        ))
    }

    /// Parse a tracking code, accepting lowercase input.
    ///
    /// # Errors
    ///
    /// Returns `CodeError::Malformed` unless the input is `SP-` followed by
    /// exactly ten ASCII letters or digits.
    pub fn parse(s: &str) -> Result<Self, CodeError> {
        let normalized = s.trim().to_ascii_uppercase();
        let suffix = normalized
            .strip_prefix(Self::PREFIX)
            .ok_or(CodeError::Malformed)?;
        if suffix.len() != Self::SUFFIX_LENGTH || !suffix.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(CodeError::Malformed);
        }
        Ok(Self(normalized))
    }

    /// The code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TrackingCode {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TrackingCode> for String {
    fn from(code: TrackingCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
