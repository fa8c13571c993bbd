//! Contact form submissions.

use sqlx::PgPool;

use skateparadise_core::Email;

use super::ShopError;
use crate::db::ContactRepository;
use crate::db::contact::NewContactMessage;
use crate::models::ContactMessage;

/// Longest accepted subject line.
const MAX_SUBJECT_LENGTH: usize = 200;

/// Longest accepted message body.
const MAX_MESSAGE_LENGTH: usize = 5_000;

/// Validate and store a contact form submission.
///
/// # Errors
///
/// Returns `ShopError::Validation` if a field is blank or too long, or the
/// email is malformed.
pub async fn submit(
    pool: &PgPool,
    name: &str,
    email: &str,
    subject: &str,
    message: &str,
) -> Result<ContactMessage, ShopError> {
    let new = NewContactMessage {
        name: required("name", name, MAX_SUBJECT_LENGTH)?,
        email: Email::parse(email).map_err(|e| ShopError::Validation(e.to_string()))?,
        subject: required("subject", subject, MAX_SUBJECT_LENGTH)?,
        message: required("message", message, MAX_MESSAGE_LENGTH)?,
    };

    let stored = ContactRepository::new(pool).insert(&new).await?;
    tracing::info!(
        contact_id = %stored.id,
        email = %stored.email,
        subject = %stored.subject,
        "Contact message received"
    );
    Ok(stored)
}

fn required(field: &str, value: &str, max: usize) -> Result<String, ShopError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ShopError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(ShopError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_owned())
}
