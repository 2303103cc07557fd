//! One-off creation of the first admin account.
//!
//! This is run from the `create_admin` binary at deploy time, never by the
//! server while it handles requests.

use rusqlite::Connection;

use crate::{
    Error, PasswordHash,
    user::{NewUser, Role, User, create_user, get_user_by_email},
};

/// What [provision_admin] did.
#[derive(Debug, Clone, PartialEq)]
pub enum ProvisionOutcome {
    /// A new admin was created.
    Created(User),
    /// A user with the email already existed and was left unchanged.
    AlreadyExists(User),
}

/// The user registered with `email`, if any.
///
/// Lets a caller skip asking for a password that [provision_admin] would ignore.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the database could not be queried.
pub fn find_existing_user(email: &str, connection: &Connection) -> Result<Option<User>, Error> {
    match get_user_by_email(email, connection) {
        Ok(user) => Ok(Some(user)),
        Err(Error::NotFound) => Ok(None),
        Err(error) => Err(error),
    }
}

/// Create an admin with `email` unless a user with that email already exists.
///
/// Running this again with the same email has no effect, even if the existing
/// user is not an admin or has a different password.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the database could not be queried or updated.
pub fn provision_admin(
    name: &str,
    email: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<ProvisionOutcome, Error> {
    if let Some(user) = find_existing_user(email, connection)? {
        return Ok(ProvisionOutcome::AlreadyExists(user));
    }

    create_user(
        NewUser {
            name: name.to_owned(),
            email: email.to_owned(),
            password_hash,
            role: Role::Admin,
        },
        connection,
    )
    .map(ProvisionOutcome::Created)
}
