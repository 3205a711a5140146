//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame options, etc.)
//! 5. Session layer (tower-sessions with in-memory store)
//! 6. Session expiry (sign out when the backend rejects the token)

pub mod auth;
pub mod flash;
pub mod page;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AuthRejection, OptionalAuth, RequireAdmin, RequireAuth, RequireSeller, SessionExpired,
    clear_current_user, load_current_user, login_url, session_expiry_middleware,
    set_current_user, update_stored_user,
};
pub use flash::{push_toast, take_toasts};
pub use page::PageContext;
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
