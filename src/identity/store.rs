use super::models::UserIdentity;
use super::IdentityError;

/// Storage contract for identity records.
///
/// Implementations must enforce uniqueness on both the internal user id and
/// the external handle, reporting violations as [`IdentityError::Conflict`].
/// That constraint is the backstop that turns a lost check-then-act race in
/// the upsert path into an error instead of a duplicate record.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait IdentityStore: Send + Sync {
    /// Whether a record exists for the internal user id.
    fn exists(&self, user_id: i64) -> Result<bool, IdentityError>;

    /// Returns the record for the internal user id, or `Ok(None)`.
    fn get(&self, user_id: i64) -> Result<Option<UserIdentity>, IdentityError>;

    /// Inserts a new record. Fails with `Conflict` when the user id or the
    /// handle is already bound.
    fn create(
        &self,
        user_id: i64,
        username: &str,
        session_key: Option<&str>,
    ) -> Result<UserIdentity, IdentityError>;

    /// Updates the supplied fields of an existing record in place; `None`
    /// fields are left as they are. Fails with `NotFound` when no record
    /// exists for the user id.
    fn update(
        &self,
        user_id: i64,
        username: Option<&str>,
        session_key: Option<&str>,
    ) -> Result<UserIdentity, IdentityError>;
}
