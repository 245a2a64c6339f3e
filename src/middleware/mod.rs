pub mod response;
pub mod session;

pub use response::ApiResponse;
pub use session::{session_middleware, CurrentSession, RequireAuth, RequireVerified};
