//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no domain knowledge:
//! - Password hashing (Argon2id) and strong-password generation
//! - Random token material and constant-time comparison
//! - Client device classification from request headers

pub mod client;
pub mod crypto;
pub mod password;
