//! Contact message repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use skateparadise_core::{ContactMessageId, Email};

use super::RepositoryError;
use crate::models::ContactMessage;

#[derive(Debug, sqlx::FromRow)]
struct ContactMessageRow {
    id: ContactMessageId,
    name: String,
    email: String,
    subject: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ContactMessageRow> for ContactMessage {
    type Error = RepositoryError;

    fn try_from(row: ContactMessageRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| RepositoryError::corrupt("email", e))?;
        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            subject: row.subject,
            message: row.message,
            created_at: row.created_at,
        })
    }
}

/// Fields of a contact form submission.
#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub name: String,
    pub email: Email,
    pub subject: String,
    pub message: String,
}

/// Repository for contact form submissions.
pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a submission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, new: &NewContactMessage) -> Result<ContactMessage, RepositoryError> {
        let row = sqlx::query_as::<_, ContactMessageRow>(
            r"
            INSERT INTO shop.contact_message (name, email, subject, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, subject, message, created_at
            ",
        )
        .bind(&new.name)
        .bind(new.email.as_str())
        .bind(&new.subject)
        .bind(&new.message)
        .fetch_one(self.pool)
        .await?;

        ContactMessage::try_from(row)
    }
}
