// handlers/public/mod.rs - routes reachable without a verified session

pub mod auth;
pub mod health;

pub use auth::*;
pub use health::health_get;
