//! Authentication module
//!
//! Token issuing, bcrypt password hashing, the lockout policy and the
//! request extractor for authenticated callers.

mod jwt;
pub mod lockout;
mod middleware;
mod password;

pub use jwt::{Claims, SecretKind, TokenIssuer, TokenPair};
pub use lockout::LockoutPolicy;
pub use middleware::{bearer_token, AuthUser};
pub use password::PasswordService;
