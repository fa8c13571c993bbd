//! User management commands.

use skateparadise_storefront::db::{RepositoryError, UserRepository};

use super::{CommandError, connect};

/// Grant or revoke staff access.
pub async fn set_staff(username: &str, is_staff: bool) -> Result<(), CommandError> {
    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .set_staff(username, is_staff)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CommandError::UnknownUser(username.to_owned()),
            other => CommandError::Repository(other),
        })?;

    tracing::info!(
        user_id = %user.id,
        username = %user.username,
        is_staff = user.is_staff,
        "Staff access updated"
    );
    Ok(())
}
