pub mod password;
pub mod session;
pub mod token;

pub use password::{hash_password, verify_password, PasswordError};
pub use session::{session_id_from_headers, SessionContext, SessionStore, SESSION_COOKIE};
