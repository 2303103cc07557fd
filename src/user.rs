//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, PasswordHash, db::read_count};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// What a user is allowed to do.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can only see and change their own entries.
    #[default]
    User,
    /// Can see and change every user and every entry.
    Admin,
}

impl Role {
    /// The name used for the role in the database and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("invalid role \"{other}\"")),
        }
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Role::try_from(value.as_str()?).map_err(|error| FromSqlError::Other(error.into()))
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's display name.
    pub name: String,
    /// The user's email, stored in its normalized form.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// What the user is allowed to do.
    pub role: Role,
    /// When the user was created.
    pub created_at: OffsetDateTime,
}

/// The view of a user that is safe to send to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's display name.
    pub name: String,
    /// The user's email.
    pub email: String,
    /// What the user is allowed to do.
    pub role: Role,
    /// When the user was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// The data needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The user's display name.
    pub name: String,
    /// The user's email, normalized by [create_user].
    pub email: String,
    /// The hash of the user's password.
    pub password_hash: PasswordHash,
    /// What the user is allowed to do.
    pub role: Role,
}

/// The fields an admin can change on a user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserChanges {
    /// The new display name.
    pub name: String,
    /// The new email, normalized by [update_user].
    pub email: String,
    /// The new role.
    pub role: Role,
}

/// Normalize an email for storage and lookup.
///
/// Emails are matched case-insensitively, so they are stored trimmed and in
/// lower case.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

const USER_COLUMNS: &str = "id, name, email, password, role, created_at";

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        role: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if the email already belongs to a user,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO user (name, email, password, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {USER_COLUMNS}"
        ))?
        .query_row(
            (
                new_user.name.trim(),
                normalize_email(&new_user.email),
                new_user.password_hash.to_string(),
                new_user.role,
                created_at,
            ),
            map_user_row,
        )
        .map_err(Error::from)
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user ([Error::NotFound]),
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(Error::from)
}

/// Get the user whose email matches `email`, ignoring case and surrounding whitespace.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user ([Error::NotFound]),
/// - there was an error trying to access the store.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE email = :email"
        ))?
        .query_row(&[(":email", &normalize_email(email))], map_user_row)
        .map_err(Error::from)
}

/// Get every user ordered by when they were created.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_all_users(connection: &Connection) -> Result<Vec<User>, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user ORDER BY id"))?
        .query_map([], map_user_row)?
        .map(|maybe_user| maybe_user.map_err(Error::from))
        .collect()
}

/// Check whether `email` belongs to a user other than `user_id`.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn is_email_taken_by_other_user(
    email: &str,
    user_id: UserID,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS (SELECT 1 FROM user WHERE email = ?1 AND id != ?2)",
            (normalize_email(email), user_id.as_i64()),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Overwrite the name, email and role of the user `user_id`.
///
/// # Errors
///
/// Returns a:
/// - [Error::UserNotFound] if `user_id` does not belong to a user,
/// - [Error::EmailInUse] if the email belongs to another user,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn update_user(
    user_id: UserID,
    changes: &UserChanges,
    connection: &Connection,
) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "UPDATE user SET name = ?1, email = ?2, role = ?3 WHERE id = ?4
             RETURNING {USER_COLUMNS}"
        ))?
        .query_row(
            (
                changes.name.trim(),
                normalize_email(&changes.email),
                changes.role,
                user_id.as_i64(),
            ),
            map_user_row,
        )
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::UserNotFound,
            Error::DuplicateEmail => Error::EmailInUse,
            error => error,
        })
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], read_count)
        .map_err(|error| error.into())
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error, PasswordHash,
        db::initialize,
        user::{
            NewUser, Role, UserChanges, UserID, count_users, create_user, get_all_users,
            get_user_by_email, get_user_by_id, is_email_taken_by_other_user, update_user,
        },
    };

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize(&conn).expect("Could not initialize database");

        conn
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test User".to_owned(),
            email: email.to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            role: Role::User,
        }
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();

        let inserted_user = create_user(new_user("foo@bar.baz"), &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, "foo@bar.baz");
        assert_eq!(inserted_user.role, Role::User);
        assert_eq!(
            inserted_user.password_hash,
            PasswordHash::new_unchecked("hunter2")
        );
    }

    #[test]
    fn insert_normalizes_email() {
        let db_connection = get_db_connection();

        let inserted_user = create_user(new_user("  Foo@Bar.BAZ "), &db_connection).unwrap();

        assert_eq!(inserted_user.email, "foo@bar.baz");
    }

    #[test]
    fn insert_fails_on_duplicate_email() {
        let db_connection = get_db_connection();
        let first_user = create_user(new_user("foo@bar.baz"), &db_connection).unwrap();

        let result = create_user(new_user("FOO@bar.baz"), &db_connection);

        assert_eq!(result, Err(Error::DuplicateEmail));
        assert_eq!(
            get_user_by_id(first_user.id, &db_connection),
            Ok(first_user)
        );
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        let id = UserID::new(42);

        assert_eq!(get_user_by_id(id, &db_connection), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_user("foo@bar.baz"), &db_connection).unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_email_ignores_case() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_user("foo@bar.baz"), &db_connection).unwrap();

        let retrieved_user = get_user_by_email("Foo@Bar.Baz", &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn lists_users_in_creation_order() {
        let db_connection = get_db_connection();
        let first = create_user(new_user("a@bar.baz"), &db_connection).unwrap();
        let second = create_user(new_user("b@bar.baz"), &db_connection).unwrap();

        let users = get_all_users(&db_connection).unwrap();

        assert_eq!(users, vec![first, second]);
    }

    #[test]
    fn email_taken_ignores_same_user() {
        let db_connection = get_db_connection();
        let first = create_user(new_user("a@bar.baz"), &db_connection).unwrap();
        let second = create_user(new_user("b@bar.baz"), &db_connection).unwrap();

        assert!(!is_email_taken_by_other_user("a@bar.baz", first.id, &db_connection).unwrap());
        assert!(is_email_taken_by_other_user("A@bar.baz", second.id, &db_connection).unwrap());
    }

    #[test]
    fn update_changes_fields() {
        let db_connection = get_db_connection();
        let user = create_user(new_user("a@bar.baz"), &db_connection).unwrap();
        let changes = UserChanges {
            name: "Renamed".to_owned(),
            email: "New@Bar.Baz".to_owned(),
            role: Role::Admin,
        };

        let updated = update_user(user.id, &changes, &db_connection).unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.email, "new@bar.baz");
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.password_hash, user.password_hash);
    }

    #[test]
    fn update_fails_for_missing_user() {
        let db_connection = get_db_connection();
        let changes = UserChanges {
            name: "Nobody".to_owned(),
            email: "nobody@bar.baz".to_owned(),
            role: Role::User,
        };

        assert_eq!(
            update_user(UserID::new(42), &changes, &db_connection),
            Err(Error::UserNotFound)
        );
    }

    #[test]
    fn returns_correct_count() {
        let db_connection = get_db_connection();

        let count = count_users(&db_connection).expect("Could not get user count");
        assert_eq!(0, count, "Want zero users before insertion, got {count}");

        create_user(new_user("foo@bar.baz"), &db_connection).unwrap();

        let count = count_users(&db_connection).expect("Could not get user count");
        assert_eq!(1, count, "Want one user after insertion, got {count}");
    }
}
