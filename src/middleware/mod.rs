/// Request middleware: the authentication gate and the per-client rate
/// limiter.

mod auth_gate;
mod rate_limit;

pub use auth_gate::{AuthGate, AuthenticatedUser};
pub use rate_limit::{RateLimit, RateLimiter};
