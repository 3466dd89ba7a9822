use serde::{Deserialize, Serialize};

/// A stored binding between an internal user and an external scrobbling
/// account.
///
/// `user_id` is immutable for the record's lifetime; `username` (the
/// external handle) and `session_key` may be rebound in place. Both
/// `user_id` and `username` are unique across records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserIdentity {
    pub user_id: i64,
    pub username: String,
    pub session_key: Option<String>,
    /// Unix timestamp of the first binding.
    pub created: i64,
}

/// Upsert input. On the create branch `username` is required; on the update
/// branch any subset of fields may be supplied and absent ones are left
/// untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityPayload {
    pub user_id: i64,
    pub username: Option<String>,
    pub session_key: Option<String>,
}
