mod log_in;
mod middleware;
mod password;
mod register_user;
mod token;

pub use log_in::post_log_in;
pub use middleware::{AuthenticatedUser, admin_guard, auth_guard};
pub use password::{PasswordHash, ValidatedPassword};
pub use register_user::{AuthPayload, register_user};
pub use token::{Claims, JwtKeys, TOKEN_DURATION, decode_token, encode_token};
