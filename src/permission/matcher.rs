//! Wildcard permission pattern matching.
//!
//! Granted patterns come in four shapes:
//!
//! - `*:*`: global grant, matches everything
//! - `module:action`: exact grant, e.g. `user:read`
//! - `module:*`: module wildcard, matches any action in the module
//! - `/prefix/*`: path wildcard, matches the prefix itself and anything
//!   under it, e.g. `/api/users/*` matches `/api/users` and
//!   `/api/users/123`
//!
//! There are no deny rules: a request is allowed as soon as any granted
//! pattern matches it, so evaluation order never changes the outcome. The
//! canonical precedence (global, exact, module wildcard, path wildcard) is
//! how the rules are documented and tested.

/// Returns whether any granted pattern satisfies the requested one.
pub fn has_permission(granted: &[String], requested: &str) -> bool {
    granted
        .iter()
        .any(|pattern| matches_pattern(pattern, requested))
}

/// Returns whether a single granted pattern satisfies the requested one.
pub fn matches_pattern(granted: &str, requested: &str) -> bool {
    // Global grant
    if granted == "*:*" {
        return true;
    }

    // Exact grant
    if granted == requested {
        return true;
    }

    // Module wildcard: "user:*" covers "user:create", "user:read", ...
    if let Some(module) = granted.strip_suffix(":*") {
        if requested
            .strip_prefix(module)
            .is_some_and(|rest| rest.starts_with(':'))
        {
            return true;
        }
    }

    // Path wildcard: "/api/users/*" covers "/api/users" and "/api/users/123"
    if let Some(prefix) = granted.strip_suffix("/*") {
        if requested == prefix {
            return true;
        }
        if requested
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
        {
            return true;
        }
    }

    false
}
