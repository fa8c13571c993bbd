//! Product size labels (deck widths, shoe sizes, garment sizes).

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Size`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    /// The label is empty after trimming.
    #[error("size cannot be empty")]
    Empty,
    /// The label is too long.
    #[error("size must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A trimmed, non-empty size label such as `8.25`, `42` or `XL`.
///
/// Labels are compared exactly (after trimming): `xl` and `XL` are different
/// sizes, matching how the catalog declares them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Size(String);

impl Size {
    /// Maximum label length.
    pub const MAX_LENGTH: usize = 16;

    /// Parse a size label.
    ///
    /// # Errors
    ///
    /// Returns `SizeError::Empty` for blank input and `SizeError::TooLong`
    /// past [`Size::MAX_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, SizeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SizeError::Empty);
        }
        if s.chars().count() > Self::MAX_LENGTH {
            return Err(SizeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Parse an optional label where blank means "no size".
    ///
    /// Clients send `""` for sizeless products as often as they omit the
    /// field.
    ///
    /// # Errors
    ///
    /// Returns `SizeError::TooLong` for over-long labels.
    pub fn parse_optional(s: Option<&str>) -> Result<Option<Self>, SizeError> {
        match s.map(str::trim) {
            None | Some("") => Ok(None),
            Some(label) => Self::parse(label).map(Some),
        }
    }

    /// The label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Size {
    type Error = SizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Size> for String {
    fn from(size: Size) -> Self {
        size.0
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
