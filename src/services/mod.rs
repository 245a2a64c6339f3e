pub mod auth_service;
pub mod dashboard_service;
pub mod leasing_service;
pub mod property_service;

pub use auth_service::{
    AuthError, AuthService, LoginOutcome, PasswordResetOutcome, RegistrationInput, ResendOutcome, ResetRequestOutcome,
    TokenDelivery, VerificationOutcome,
};
pub use dashboard_service::{DashboardOverview, DashboardService, ExpiringLease, RecentPayment};
pub use leasing_service::{LeasingError, LeasingService, Onboarding, UnitAssignment};
pub use property_service::{FloorPlan, PropertyService};
