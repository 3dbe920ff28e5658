mod admin;
mod auth;
mod health_check;

pub use admin::*;
pub use auth::*;
pub use health_check::*;
