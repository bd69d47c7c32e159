//! Authentication Module
//!
//! JWT session tokens and the middleware that enforces them.

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth, require_worker};
