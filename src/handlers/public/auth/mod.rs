// handlers/public/auth/mod.rs - sign-in, registration, email verification and password reset

pub mod login;
pub mod logout;
pub mod register;
pub mod resend;
pub mod reset;
pub mod verify;

pub use login::{login_get, login_post};
pub use logout::logout;
pub use register::{register_get, register_post};
pub use resend::{resend_verification_get, resend_verification_post};
pub use reset::{forgot_password_get, forgot_password_post, reset_password_get, reset_password_post};
pub use verify::verify_email_get;
