//! Create-or-update resolution for identity bindings.

use std::sync::Arc;

use tracing::debug;

use super::models::{IdentityPayload, UserIdentity};
use super::store::IdentityStore;
use super::IdentityError;

/// The branch an upsert took, so callers can answer created-vs-updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(UserIdentity),
    Updated(UserIdentity),
}

impl UpsertOutcome {
    pub fn identity(&self) -> &UserIdentity {
        match self {
            UpsertOutcome::Created(identity) | UpsertOutcome::Updated(identity) => identity,
        }
    }
}

pub struct IdentityManager {
    store: Arc<dyn IdentityStore>,
}

impl IdentityManager {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, user_id: i64) -> Result<Option<UserIdentity>, IdentityError> {
        self.store.get(user_id)
    }

    /// Binds or rebinds an external identity for `payload.user_id`.
    ///
    /// Existence is checked first and decides the branch: an existing record
    /// is updated in place (partial payloads allowed), otherwise a new one
    /// is created (full payload required). The two steps are not atomic; a
    /// concurrent create for the same user loses the race at the store's
    /// uniqueness constraint and comes back as [`IdentityError::Conflict`].
    pub fn upsert(&self, payload: IdentityPayload) -> Result<UpsertOutcome, IdentityError> {
        if self.store.exists(payload.user_id)? {
            debug!("rebinding identity for user {}", payload.user_id);
            self.store
                .update(
                    payload.user_id,
                    non_empty(payload.username.as_deref()),
                    payload.session_key.as_deref(),
                )
                .map(UpsertOutcome::Updated)
        } else {
            let username = non_empty(payload.username.as_deref())
                .ok_or(IdentityError::Validation("username is required to bind a new identity"))?;
            debug!("binding identity for user {}", payload.user_id);
            self.store
                .create(payload.user_id, username, payload.session_key.as_deref())
                .map(UpsertOutcome::Created)
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}
