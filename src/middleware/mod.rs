pub mod auth;
pub mod context;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use context::{resolve_request_context, RequestContext};
pub use response::ApiResponse;
