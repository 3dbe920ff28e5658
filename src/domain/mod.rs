/// Domain entities and validation.
///
/// Entities are plain data; behavior that touches storage lives in services
/// that take an explicit store handle.

mod role;
mod user;
pub mod validators;

pub use role::{Permission, Role};
pub use user::User;
