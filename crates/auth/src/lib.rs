//! `aurora-auth`: authentication/authorization boundary.
//!
//! This crate is decoupled from HTTP and storage: it validates access tokens
//! issued by an external identity provider and answers permission checks.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod roles;

pub use authorize::{AuthzError, Principal, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use permissions::Permission;
pub use roles::Role;
