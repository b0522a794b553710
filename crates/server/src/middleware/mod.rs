//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions)
//!
//! Authorization is not a layer: handlers ask for [`RequireUser`] or
//! [`RequireAdmin`] and the extractor rejects the request.

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{OptionalUser, RequireAdmin, RequireUser, clear_acting_user, set_acting_user};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
