//! Cache key scheme shared by resolution, invalidation, and warmup.
//!
//! The exact formats matter: prefix deletion relies on them, and external
//! tooling inspects the same keys in Redis.

/// `user:permissions:<id>`: a user's resolved permission pattern list.
pub fn user_permissions(user_id: u64) -> String {
    format!("user:permissions:{user_id}")
}

/// `role:permissions:<id>`: a role's permission pattern list.
pub fn role_permissions(role_id: u64) -> String {
    format!("role:permissions:{role_id}")
}

/// `user:<id>:`: prefix covering every cache entry scoped to a user.
pub fn user_prefix(user_id: u64) -> String {
    format!("user:{user_id}:")
}

/// `role:<id>:`: prefix covering every cache entry scoped to a role.
pub fn role_prefix(role_id: u64) -> String {
    format!("role:{role_id}:")
}
