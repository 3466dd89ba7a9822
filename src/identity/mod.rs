//! Linkage between internal user accounts and external scrobbling
//! identities.

pub mod manager;
pub mod models;
mod sqlite_identity_store;
mod store;

pub use manager::{IdentityManager, UpsertOutcome};
pub use models::{IdentityPayload, UserIdentity};
pub use sqlite_identity_store::SqliteIdentityStore;
pub use store::IdentityStore;

use thiserror::Error;

/// Errors surfaced by identity lookup and binding.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No identity record bound to the internal user id.
    #[error("no identity bound to user {0}")]
    NotFound(i64),

    /// The payload is not sufficient for the attempted operation.
    #[error("invalid identity payload: {0}")]
    Validation(&'static str),

    /// A uniqueness constraint fired: the user id or the external handle is
    /// already bound. This is also what a lost create race surfaces as.
    #[error("identity conflict: {0}")]
    Conflict(String),

    /// Database-level failure.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
