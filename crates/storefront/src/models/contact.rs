//! Contact form submissions.

use chrono::{DateTime, Utc};

use skateparadise_core::{ContactMessageId, Email};

/// A stored contact form message.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub id: ContactMessageId,
    pub name: String,
    pub email: Email,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
