//! Access Policy
//!
//! Declarative table of which requests skip authentication and which
//! require a role beyond being logged in. The access filter consults this
//! table before touching the Authorization header.
//!
//! Patterns are literal paths with `**` matching any run of characters
//! (including `/` and the empty string). Methods compare case-insensitively.
//! First matching rule wins.

use crate::domain::value_object::user_role::UserRole;

/// Request that may pass without credentials
#[derive(Debug, Clone)]
pub struct BypassRule {
    pub method: &'static str,
    pub pattern: &'static str,
}

/// Request that requires a specific role
#[derive(Debug, Clone)]
pub struct RoleRule {
    pub method: &'static str,
    pub pattern: &'static str,
    pub required: UserRole,
}

/// Access policy table
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    bypass: Vec<BypassRule>,
    role_rules: Vec<RoleRule>,
}

impl Default for AccessPolicy {
    /// Storefront policy: public catalog browsing and the account
    /// endpoints a visitor needs before they can authenticate.
    fn default() -> Self {
        Self {
            bypass: vec![
                rule("GET", "/api/v1/products**"),
                rule("GET", "/api/v1/products/images/**"),
                rule("GET", "/api/v1/categories**"),
                rule("GET", "/api/v1/brands**"),
                rule("GET", "/api/v1/banners**"),
                rule("GET", "/api/v1/payment-methods**"),
                rule("GET", "/api/v1/shipping-methods**"),
                rule("GET", "/api/v1/feedbacks/product/**"),
                rule("POST", "/api/v1/users/register"),
                rule("POST", "/api/v1/users/login"),
                rule("POST", "/api/v1/users/refresh-token"),
                rule("GET", "/api/v1/users/email-unique"),
                rule("GET", "/api/v1/users/active-account"),
                rule("GET", "/api/v1/auth/social-login/**"),
                rule("GET", "/api/v1/auth/social/callback/**"),
                rule("GET", "/api/v1/health"),
            ],
            role_rules: vec![
                RoleRule {
                    method: "GET",
                    pattern: "/api/v1/users",
                    required: UserRole::Admin,
                },
                RoleRule {
                    method: "PUT",
                    pattern: "/api/v1/users/block/**",
                    required: UserRole::Admin,
                },
            ],
        }
    }
}

impl AccessPolicy {
    /// Policy with no bypass and no role rules: everything requires a login
    pub fn locked_down() -> Self {
        Self {
            bypass: Vec::new(),
            role_rules: Vec::new(),
        }
    }

    pub fn with_bypass(mut self, method: &'static str, pattern: &'static str) -> Self {
        self.bypass.push(rule(method, pattern));
        self
    }

    pub fn with_role_rule(
        mut self,
        method: &'static str,
        pattern: &'static str,
        required: UserRole,
    ) -> Self {
        self.role_rules.push(RoleRule {
            method,
            pattern,
            required,
        });
        self
    }

    /// Whether the request may pass without credentials
    pub fn is_bypassed(&self, method: &str, path: &str) -> bool {
        self.bypass
            .iter()
            .any(|r| r.method.eq_ignore_ascii_case(method) && matches_path(r.pattern, path))
    }

    /// Role required beyond authentication, if any
    pub fn required_role(&self, method: &str, path: &str) -> Option<UserRole> {
        self.role_rules
            .iter()
            .find(|r| r.method.eq_ignore_ascii_case(method) && matches_path(r.pattern, path))
            .map(|r| r.required)
    }
}

fn rule(method: &'static str, pattern: &'static str) -> BypassRule {
    BypassRule { method, pattern }
}

/// Match a path against a pattern where `**` matches any run of
/// characters, including slashes and the empty string.
pub fn matches_path(pattern: &str, path: &str) -> bool {
    let mut pieces = pattern.split("**");

    // A pattern without wildcards is an exact match
    let first = pieces.next().unwrap_or("");
    let rest: Vec<&str> = pieces.collect();
    if rest.is_empty() {
        return pattern == path;
    }

    let Some(mut remainder) = path.strip_prefix(first) else {
        return false;
    };

    for (i, piece) in rest.iter().enumerate() {
        if piece.is_empty() {
            // Trailing `**` swallows the rest
            if i == rest.len() - 1 {
                return true;
            }
            continue;
        }
        if i == rest.len() - 1 {
            return remainder.ends_with(piece);
        }
        match remainder.find(piece) {
            Some(pos) => remainder = &remainder[pos + piece.len()..],
            None => return false,
        }
    }

    true
}
