pub mod auth;
pub mod require_admin;
pub mod response;
pub mod validate_session;

pub use auth::jwt_auth_middleware;
pub use require_admin::require_admin_middleware;
pub use response::{ApiResponse, ApiResult};
pub use validate_session::{validate_session_middleware, CurrentUser};
