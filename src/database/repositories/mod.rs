//! One repository per entity. Each holds a clone of the [`Database`] gateway;
//! statements that also run inside multi-entity transactions are exposed as
//! free functions generic over [`sqlx::PgExecutor`].
//!
//! [`Database`]: crate::database::Database

pub mod password_reset_token;
pub mod payment;
pub mod property;
pub mod session;
pub mod tenancy;
pub mod tenant;
pub mod unit;
pub mod user;
pub mod verification_token;

pub use password_reset_token::PasswordResetTokenRepository;
pub use payment::{NewPayment, PaymentRepository};
pub use property::{NewProperty, PropertyRepository};
pub use session::SessionRepository;
pub use tenancy::{NewTenancy, TenancyRepository, TenancyUpdate};
pub use tenant::{NewTenant, TenantRepository};
pub use unit::{NewUnit, UnitRepository};
pub use user::{NewUser, ProfileUpdate, UserRepository};
pub use verification_token::VerificationTokenRepository;
