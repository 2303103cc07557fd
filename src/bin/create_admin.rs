use std::{error::Error, io, process::exit};

use clap::Parser;
use rusqlite::Connection;

use expense_tracker::{
    DEFAULT_DB_PATH, PasswordHash, ProvisionOutcome, User, ValidatedPassword, database_path,
    find_existing_user, initialize_db, provision_admin,
};

/// A utility for creating the first admin account.
///
/// Running it again for an existing email leaves that user unchanged.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database. A leading `sqlite://` is ignored.
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DB_PATH)]
    db_path: String,

    /// The email the admin logs in with.
    #[arg(long)]
    email: String,

    /// The admin's display name.
    #[arg(long, default_value = "System Administrator")]
    name: String,

    /// The bcrypt cost for hashing the password.
    #[arg(long, default_value_t = PasswordHash::DEFAULT_COST)]
    cost: u32,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = database_path(&args.db_path);

    let connection = Connection::open(db_path)?;
    initialize_db(&connection)?;

    if let Some(user) = find_existing_user(&args.email, &connection)? {
        print_existing_user(&user);
        return Ok(());
    }

    println!("Creating admin {} in {db_path:?}", args.email);

    let Some(password_hash) = get_new_password_hash(args.cost) else {
        exit(1);
    };

    match provision_admin(&args.name, &args.email, password_hash, &connection)? {
        ProvisionOutcome::Created(admin) => {
            println!("Created admin {} with ID {}.", admin.email, admin.id);
        }
        ProvisionOutcome::AlreadyExists(user) => print_existing_user(&user),
    }

    Ok(())
}

fn print_existing_user(user: &User) {
    println!(
        "A user with the email {} already exists (ID {}, role {}). Nothing was changed.",
        user.email,
        user.id,
        user.role.as_str()
    );
}

fn get_new_password_hash(cost: u32) -> Option<PasswordHash> {
    loop {
        println!();

        let first_password = match rpassword::prompt_password("Enter the admin password: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        let password = match ValidatedPassword::new(&first_password) {
            Ok(password) => password,
            Err(error) => {
                print_error(error);
                continue;
            }
        };

        let second_password = match rpassword::prompt_password("Enter the same password again: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::new(password, cost) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => {
                print_error(format!("Could not hash password: {error}. Try again."));
            }
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
