//! Client identification utilities
//!
//! Classifies the calling device from the `User-Agent` header. Used to pick
//! the refresh-token lifetime policy for a login session.

use std::fmt;

/// Coarse device class derived from the User-Agent string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceClass {
    #[default]
    Web,
    Mobile,
}

impl DeviceClass {
    /// Classify a request by its User-Agent header value.
    ///
    /// A missing header classifies as `Web`.
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        match user_agent {
            Some(ua) if ua.to_ascii_lowercase().contains("mobile") => DeviceClass::Mobile,
            _ => DeviceClass::Web,
        }
    }

    #[inline]
    pub const fn is_mobile(&self) -> bool {
        matches!(self, DeviceClass::Mobile)
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::Web => f.write_str("web"),
            DeviceClass::Mobile => f.write_str("mobile"),
        }
    }
}
