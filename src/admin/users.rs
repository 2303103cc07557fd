use axum::{Extension, extract::State};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    admin::AdminState,
    auth::AuthenticatedUser,
    db::lock_connection,
    extract::{ApiJson, ApiPath, non_blank},
    response::ApiResponse,
    user::{
        PublicUser, Role, User, UserChanges, UserID, get_all_users, get_user_by_id,
        is_email_taken_by_other_user, update_user,
    },
};

/// Every user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserList {
    /// The users in the order they registered.
    pub users: Vec<PublicUser>,
}

/// A route handler for listing every user without their password hashes.
pub async fn list_users_endpoint(
    State(state): State<AdminState>,
) -> Result<ApiResponse<UserList>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let users = get_all_users(&connection)?
        .iter()
        .map(PublicUser::from)
        .collect();

    Ok(ApiResponse::ok(UserList { users }))
}

/// The body of a request to change a user.
///
/// Missing or blank fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserForm {
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
}

/// A route handler for changing the name, email or role of any user.
pub async fn update_user_endpoint(
    State(state): State<AdminState>,
    Extension(admin): Extension<AuthenticatedUser>,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(form): ApiJson<UpdateUserForm>,
) -> Result<ApiResponse<PublicUser>, Error> {
    let user_id = UserID::new(user_id);
    let connection = lock_connection(&state.db_connection)?;

    let user = change_user(user_id, form, &connection)?;
    tracing::info!("admin {} updated user {user_id}", admin.id);

    Ok(ApiResponse::ok(PublicUser::from(&user)))
}

fn change_user(
    user_id: UserID,
    form: UpdateUserForm,
    connection: &Connection,
) -> Result<User, Error> {
    let current = get_user_by_id(user_id, connection).map_err(|error| match error {
        Error::NotFound => Error::UserNotFound,
        error => error,
    })?;

    let role = match form.role.as_deref().map(str::trim) {
        None => current.role,
        Some(role) => Role::try_from(role)
            .map_err(|_| Error::Validation("Role must be either user or admin".to_owned()))?,
    };

    let changes = UserChanges {
        name: non_blank(form.name).unwrap_or(current.name),
        email: non_blank(form.email).unwrap_or(current.email),
        role,
    };

    if is_email_taken_by_other_user(&changes.email, user_id, connection)? {
        return Err(Error::EmailInUse);
    }

    update_user(user_id, &changes, connection)
}

/// A route handler for deleting a user together with all of their entries.
pub async fn delete_user_endpoint(
    State(state): State<AdminState>,
    Extension(admin): Extension<AuthenticatedUser>,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<ApiResponse<()>, Error> {
    let user_id = UserID::new(user_id);
    let connection = lock_connection(&state.db_connection)?;

    let deleted_expenses = delete_user_and_expenses(user_id, &connection)?;
    tracing::info!(
        "admin {} deleted user {user_id} and {deleted_expenses} of their entries",
        admin.id
    );

    Ok(ApiResponse::message(
        "User and their expenses deleted successfully",
    ))
}

type RowsAffected = usize;

/// Delete the user and their entries in one transaction.
///
/// Returns the number of entries that were deleted.
///
/// # Errors
/// This function will return a:
/// - [Error::UserNotFound] if `user_id` does not refer to a user, nothing is deleted,
/// - or [Error::SqlError] if there is some other SQL error.
fn delete_user_and_expenses(
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let transaction = connection.unchecked_transaction()?;

    let deleted_expenses =
        transaction.execute("DELETE FROM expense WHERE user_id = ?1", [user_id.as_i64()])?;
    let deleted_users = transaction.execute("DELETE FROM user WHERE id = ?1", [user_id.as_i64()])?;

    if deleted_users == 0 {
        // Dropping the transaction rolls it back.
        return Err(Error::UserNotFound);
    }

    transaction.commit()?;

    Ok(deleted_expenses)
}
