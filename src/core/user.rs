//! User business logic.
//!
//! Account registration and credentials belong to the external auth service;
//! these helpers only provision the owner row that habits and entries point at.

use crate::{
    core::caller::Caller,
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use tracing::{info, instrument};

const USERNAME_MAX_CHARS: usize = 150;

/// Creates a user row, rejecting blank, overlong or already-taken usernames.
pub async fn create_user<C: ConnectionTrait>(
    db: &C,
    username: &str,
    email: &str,
) -> Result<user::Model> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::invalid_field("username", "Username is required."));
    }
    if username.chars().count() > USERNAME_MAX_CHARS {
        return Err(Error::invalid_field(
            "username",
            format!("Ensure this field has no more than {USERNAME_MAX_CHARS} characters."),
        ));
    }

    let taken = User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .is_some();
    if taken {
        return Err(Error::invalid_field(
            "username",
            "A user with that username already exists.",
        ));
    }

    let user = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.trim().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = user.insert(db).await?;
    info!(user_id = result.id, "Created user");
    Ok(result)
}

/// Returns the caller's own user row.
#[instrument(skip(db))]
pub async fn get_user<C: ConnectionTrait>(db: &C, caller: &Caller) -> Result<user::Model> {
    User::find_by_id(caller.user_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            resource: "user",
            id: caller.user_id,
        })
}

/// Deletes the caller's user row. Their habits and entries go with it.
///
/// # Errors
/// Returns [`Error::NotFound`] if the caller has no user row.
#[instrument(skip(db))]
pub async fn delete_user<C: ConnectionTrait>(db: &C, caller: &Caller) -> Result<()> {
    let result = User::delete_many()
        .filter(user::Column::Id.eq(caller.user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            resource: "user",
            id: caller.user_id,
        });
    }

    info!(user_id = caller.user_id, "Deleted user");
    Ok(())
}
