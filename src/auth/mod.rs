//! Authentication for Goalpost
//!
//! Provides:
//! - JWT token generation and validation
//! - Password hashing with Argon2
//!
//! The services trust the caller handle extracted here unconditionally;
//! authorization (ownership, membership) happens per operation.

pub mod jwt;
pub mod password;

pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenValidationResult};
pub use password::{hash_password, verify_password};
