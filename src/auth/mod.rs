/// Authentication core: password hashing, token issuance and validation,
/// one-time tokens, and the credential lifecycle service.

mod claims;
mod password;
mod reset_token;
mod service;
mod tokens;

pub use claims::Claims;
pub use password::{hash_password, verify_password};
pub use reset_token::{generate_opaque_token, hash_token};
pub use service::{AuthOutcome, AuthService, RegistrationOutcome};
pub use tokens::{
    generate_access_token, generate_refresh_token, issue_token_pair, refresh_expiry,
    validate_access_token, validate_refresh_token, TokenPair,
};
