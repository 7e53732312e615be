//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate holds the smallest core of vocabulary shared by every backend
//! crate:
//! - Unified error type and result alias
//! - Typed entity identifiers
//!
//! **Design principle**: only things that are hard to change and mean the
//! same thing in every domain belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
