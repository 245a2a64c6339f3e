/// Error returned when a form value does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Shared plumbing for the Postgres enum types: string form, parsing and the
/// full variant list used to populate form selects.
macro_rules! pg_enum_strings {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::database::models::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($ty::$variant),)+
                    other => Err($crate::database::models::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

pub(crate) use pg_enum_strings;

pub mod password_reset_token;
pub mod payment;
pub mod property;
pub mod session;
pub mod tenancy;
pub mod tenant;
pub mod unit;
pub mod user;
pub mod verification_token;

pub use password_reset_token::PasswordResetToken;
pub use payment::{Payment, PaymentDetails, PaymentMethod, PaymentStatus, PaymentSummary, PaymentType, TenancyBalance};
pub use property::{Property, PropertySummary, PropertyType, PropertyWithStats};
pub use session::Session;
pub use tenancy::{Tenancy, TenancyDetails, TenancyStatus};
pub use tenant::{Tenant, TenantSummary, TenantWithStats};
pub use unit::{StatusChangeError, Unit, UnitStatus, UnitSummary, UnitWithProperty};
pub use user::User;
pub use verification_token::VerificationToken;
