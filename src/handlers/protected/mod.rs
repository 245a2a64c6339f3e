// handlers/protected/mod.rs - Pages that require a signed-in owner
//
// Every handler here takes `RequireAuth` or `RequireVerified`; records are
// always looked up through the caller's ownership chain
// (payment -> tenancy -> unit -> property -> owner).

pub mod dashboard;
pub mod payments;
pub mod profile;
pub mod properties;
pub mod tenants;
pub mod units;

pub use dashboard::dashboard_get;
pub use payments::*;
pub use profile::*;
pub use properties::*;
pub use tenants::*;
pub use units::*;
