use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::models::UserIdentity;
use super::store::IdentityStore;
use super::IdentityError;

/// V 0
const IDENTITY_TABLE_V_0: Table = Table {
    name: "scrobble_identity",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            is_primary_key = true,
            non_null = true
        ),
        sqlite_column!("username", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("session_key", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_scrobble_identity_username", "username")],
};

const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[IDENTITY_TABLE_V_0],
    migration: None,
}];

/// SQLite-backed [`IdentityStore`].
///
/// Uniqueness on `user_id` (primary key) and `username` (unique column) is
/// enforced by the database itself, so concurrent creates for the same user
/// degrade to a conflict error rather than a duplicate row.
pub struct SqliteIdentityStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteIdentityStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = if db_path.as_ref().exists() {
            Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            let conn = Connection::open(db_path)?;
            VERSIONED_SCHEMAS
                .last()
                .expect("at least one schema version")
                .create(&conn)?;
            conn
        };

        let version = VersionedSchema::read_version(&conn)
            .context("identity database has an unrecognized version")?;
        if version >= VERSIONED_SCHEMAS.len() {
            bail!("identity database version {} is too new", version);
        }
        VERSIONED_SCHEMAS[version].validate(&conn)?;
        VersionedSchema::migrate(VERSIONED_SCHEMAS, &conn, version)?;

        Ok(SqliteIdentityStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_identity(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserIdentity> {
        Ok(UserIdentity {
            user_id: row.get(0)?,
            username: row.get(1)?,
            session_key: row.get(2)?,
            created: row.get(3)?,
        })
    }

    fn get_locked(conn: &Connection, user_id: i64) -> Result<Option<UserIdentity>> {
        conn.query_row(
            "SELECT user_id, username, session_key, created
             FROM scrobble_identity WHERE user_id = ?1",
            params![user_id],
            Self::row_to_identity,
        )
        .optional()
        .context("failed to read identity record")
    }
}

fn map_constraint_violation(err: rusqlite::Error, detail: String) -> IdentityError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            IdentityError::Conflict(detail)
        }
        _ => IdentityError::Storage(anyhow::Error::new(err).context("identity write failed")),
    }
}

impl IdentityStore for SqliteIdentityStore {
    fn exists(&self, user_id: i64) -> Result<bool, IdentityError> {
        let conn = self.conn.lock().unwrap();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM scrobble_identity WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()
            .context("failed to probe identity record")?;
        Ok(found.is_some())
    }

    fn get(&self, user_id: i64) -> Result<Option<UserIdentity>, IdentityError> {
        let conn = self.conn.lock().unwrap();
        Ok(Self::get_locked(&conn, user_id)?)
    }

    fn create(
        &self,
        user_id: i64,
        username: &str,
        session_key: Option<&str>,
    ) -> Result<UserIdentity, IdentityError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO scrobble_identity (user_id, username, session_key)
             VALUES (?1, ?2, ?3)",
            params![user_id, username, session_key],
        )
        .map_err(|err| {
            map_constraint_violation(
                err,
                format!("user {} or handle '{}' already bound", user_id, username),
            )
        })?;

        Self::get_locked(&conn, user_id)?
            .context("identity record vanished right after insert")
            .map_err(IdentityError::Storage)
    }

    fn update(
        &self,
        user_id: i64,
        username: Option<&str>,
        session_key: Option<&str>,
    ) -> Result<UserIdentity, IdentityError> {
        let conn = self.conn.lock().unwrap();

        let affected = conn
            .execute(
                "UPDATE scrobble_identity SET
                     username = COALESCE(?2, username),
                     session_key = COALESCE(?3, session_key)
                 WHERE user_id = ?1",
                params![user_id, username, session_key],
            )
            .map_err(|err| {
                map_constraint_violation(
                    err,
                    format!("handle '{}' already bound", username.unwrap_or_default()),
                )
            })?;

        if affected == 0 {
            return Err(IdentityError::NotFound(user_id));
        }

        Self::get_locked(&conn, user_id)?
            .ok_or(IdentityError::NotFound(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteIdentityStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteIdentityStore::new(temp_dir.path().join("identity.db")).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn creates_and_reads_back_identity() {
        let (store, _temp_dir) = create_tmp_store();

        let identity = store.create(7, "listener", Some("sk-1")).unwrap();
        assert_eq!(identity.user_id, 7);
        assert_eq!(identity.username, "listener");
        assert_eq!(identity.session_key.as_deref(), Some("sk-1"));
        assert!(identity.created > 0);

        assert!(store.exists(7).unwrap());
        assert_eq!(store.get(7).unwrap().unwrap(), identity);
    }

    #[test]
    fn missing_identity_reads_as_none() {
        let (store, _temp_dir) = create_tmp_store();
        assert!(!store.exists(1).unwrap());
        assert!(store.get(1).unwrap().is_none());
    }

    #[test]
    fn duplicate_user_id_is_a_conflict() {
        let (store, _temp_dir) = create_tmp_store();
        store.create(7, "listener", None).unwrap();

        let second = store.create(7, "other_handle", None);
        assert!(matches!(second, Err(IdentityError::Conflict(_))));
    }

    #[test]
    fn duplicate_handle_is_a_conflict() {
        let (store, _temp_dir) = create_tmp_store();
        store.create(7, "listener", None).unwrap();

        let second = store.create(8, "listener", None);
        assert!(matches!(second, Err(IdentityError::Conflict(_))));
    }

    #[test]
    fn update_rebinds_only_supplied_fields() {
        let (store, _temp_dir) = create_tmp_store();
        store.create(7, "listener", Some("sk-1")).unwrap();

        let updated = store.update(7, Some("new_handle"), None).unwrap();
        assert_eq!(updated.username, "new_handle");
        assert_eq!(updated.session_key.as_deref(), Some("sk-1"));

        let updated = store.update(7, None, Some("sk-2")).unwrap();
        assert_eq!(updated.username, "new_handle");
        assert_eq!(updated.session_key.as_deref(), Some("sk-2"));
    }

    #[test]
    fn update_of_unknown_user_is_not_found() {
        let (store, _temp_dir) = create_tmp_store();
        let result = store.update(42, Some("handle"), None);
        assert!(matches!(result, Err(IdentityError::NotFound(42))));
    }

    #[test]
    fn update_to_taken_handle_is_a_conflict() {
        let (store, _temp_dir) = create_tmp_store();
        store.create(1, "first", None).unwrap();
        store.create(2, "second", None).unwrap();

        let result = store.update(2, Some("first"), None);
        assert!(matches!(result, Err(IdentityError::Conflict(_))));
    }

    #[test]
    fn reopens_existing_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("identity.db");

        {
            let store = SqliteIdentityStore::new(&db_path).unwrap();
            store.create(7, "listener", None).unwrap();
        }

        let store = SqliteIdentityStore::new(&db_path).unwrap();
        assert_eq!(store.get(7).unwrap().unwrap().username, "listener");
    }

    #[test]
    fn rejects_foreign_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("other.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute("CREATE TABLE unrelated (id INTEGER)", []).unwrap();
        }

        assert!(SqliteIdentityStore::new(&db_path).is_err());
    }
}
