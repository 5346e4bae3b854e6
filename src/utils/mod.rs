//! Shared helpers: password hashing, JWT handling and validating extractors.

pub mod jwt;
pub mod password;
pub mod validate;
