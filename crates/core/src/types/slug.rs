//! URL slugs derived from product names.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Fold a Latin-1 accented letter to its ASCII base letter(s).
fn fold(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'æ' => "ae",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'œ' => "oe",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}

/// Turn arbitrary text into a lowercase, hyphen-separated ASCII slug.
///
/// Accented Latin letters are folded to ASCII, other symbols are dropped,
/// and runs of whitespace or hyphens collapse to a single `-`.
///
/// ```
/// use skateparadise_core::slugify;
///
/// assert_eq!(slugify("Planche Élite 8.25\""), "planche-elite-825");
/// assert_eq!(slugify("  Roues -- 54mm  "), "roues-54mm");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else if let Some(folded) = fold(c) {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push_str(folded);
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }

    out.trim_matches('_').to_owned()
}

/// A product slug, unique across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive the base slug for a product name.
    ///
    /// Names with no sluggable characters fall back to `product`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let slug = slugify(name);
        if slug.is_empty() {
            Self("product".to_owned())
        } else {
            Self(slug)
        }
    }

    /// Pick the first free slug among `base`, `base-1`, `base-2`, ...
    ///
    /// `taken` holds the slugs already in the catalog that share this base.
    #[must_use]
    pub fn first_free(&self, taken: &HashSet<String>) -> Self {
        if !taken.contains(&self.0) {
            return self.clone();
        }
        (1_u32..)
            .map(|n| format!("{}-{n}", self.0))
            .find(|candidate| !taken.contains(candidate))
            .map_or_else(|| self.clone(), Self)
    }

    /// The slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Slug {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
