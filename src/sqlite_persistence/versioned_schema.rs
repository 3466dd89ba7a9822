//! Declarative SQLite schema definitions with versioning.
//!
//! Tables are declared as consts, grouped into numbered [`VersionedSchema`]s.
//! A fresh database is created from the latest schema; an existing one is
//! validated against the schema matching its recorded version and then
//! stepped through the remaining migrations.

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};
use tracing::info;

pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

/// Offset added to the schema version stored in `PRAGMA user_version`, so a
/// plain SQLite file (user_version 0) is never mistaken for version 0 of
/// ours.
pub const BASE_DB_VERSION: usize = 77000;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // unused_mut: only mutated when optional field assignments are
            // passed (e.g. `non_null = true`)
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                is_unique: false,
                default_value: None,
                foreign_key: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
    Blob,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Blob => "BLOB",
        }
    }

    fn from_sql(sql: &str) -> Option<&'static SqlType> {
        match sql {
            "TEXT" => Some(&SqlType::Text),
            "INTEGER" => Some(&SqlType::Integer),
            "REAL" => Some(&SqlType::Real),
            "BLOB" => Some(&SqlType::Blob),
            _ => None,
        }
    }
}

#[allow(unused)]
pub enum ForeignKeyOnChange {
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
    Cascade,
}

pub struct ForeignKey {
    pub foreign_table: &'static str,
    pub foreign_column: &'static str,
    pub on_delete: ForeignKeyOnChange,
}

pub struct Column<'a> {
    pub name: &'a str,
    pub sql_type: &'a SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub is_unique: bool,
    pub default_value: Option<&'a str>,
    pub foreign_key: Option<&'a ForeignKey>,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column<'static>],
    pub indices: &'static [(&'static str, &'static str)],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut create_sql = format!("CREATE TABLE {} (", self.name);
        for (column_index, column) in self.columns.iter().enumerate() {
            if column_index > 0 {
                create_sql.push_str(", ");
            }
            create_sql.push_str(&format!("{} {}", column.name, column.sql_type.as_sql()));
            if column.is_primary_key {
                create_sql.push_str(" PRIMARY KEY");
            }
            if column.non_null {
                create_sql.push_str(" NOT NULL");
            }
            if column.is_unique {
                create_sql.push_str(" UNIQUE");
            }
            if let Some(default_value) = column.default_value {
                create_sql.push_str(&format!(" DEFAULT {}", default_value));
            }
            if let Some(foreign_key) = column.foreign_key {
                create_sql.push_str(&format!(
                    " REFERENCES {}({}) ON DELETE {}",
                    foreign_key.foreign_table,
                    foreign_key.foreign_column,
                    match foreign_key.on_delete {
                        ForeignKeyOnChange::NoAction => "NO ACTION",
                        ForeignKeyOnChange::Restrict => "RESTRICT",
                        ForeignKeyOnChange::SetNull => "SET NULL",
                        ForeignKeyOnChange::SetDefault => "SET DEFAULT",
                        ForeignKeyOnChange::Cascade => "CASCADE",
                    }
                ));
            }
        }
        create_sql.push_str(");");
        conn.execute(&create_sql, params![])?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({});",
                    index_name, self.name, column_name
                ),
                params![],
            )?;
        }
        Ok(())
    }

    /// Checks the live table against this declaration: column names, types,
    /// nullability and primary keys must line up, and declared indices must
    /// exist.
    fn validate(&self, conn: &Connection) -> Result<()> {
        struct LiveColumn {
            name: String,
            sql_type: String,
            non_null: bool,
            is_primary_key: bool,
        }

        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let live_columns: Vec<LiveColumn> = stmt
            .query_map(params![], |row| {
                Ok(LiveColumn {
                    name: row.get(1)?,
                    sql_type: row.get(2)?,
                    non_null: row.get::<_, i32>(3)? == 1,
                    is_primary_key: row.get::<_, i32>(5)? == 1,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;

        if live_columns.len() != self.columns.len() {
            bail!(
                "table {} has {} columns, expected {}",
                self.name,
                live_columns.len(),
                self.columns.len()
            );
        }

        for (live, expected) in live_columns.iter().zip(self.columns.iter()) {
            if live.name != expected.name {
                bail!(
                    "table {} column name mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    live.name
                );
            }
            if SqlType::from_sql(&live.sql_type) != Some(expected.sql_type) {
                bail!(
                    "table {} column {} type mismatch: expected {:?}, got {}",
                    self.name,
                    expected.name,
                    expected.sql_type,
                    live.sql_type
                );
            }
            if live.non_null != expected.non_null {
                bail!(
                    "table {} column {} non-null mismatch",
                    self.name,
                    expected.name
                );
            }
            if live.is_primary_key != expected.is_primary_key {
                bail!(
                    "table {} column {} primary key mismatch",
                    self.name,
                    expected.name
                );
            }
        }

        for (index_name, _) in self.indices {
            let index_exists: bool = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                    params![index_name, self.name],
                    |_| Ok(true),
                )
                .unwrap_or(false);
            if !index_exists {
                bail!("table {} is missing index '{}'", self.name, index_name);
            }
        }

        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate(conn)?;
        }
        Ok(())
    }

    /// Reads the schema version recorded in the database, relative to
    /// [`BASE_DB_VERSION`]. Errors on a file that was never ours.
    pub fn read_version(conn: &Connection) -> Result<usize> {
        let raw = conn
            .query_row("PRAGMA user_version;", [], |row| row.get::<_, i64>(0))
            .context("failed to read database version")?;
        let version = raw - BASE_DB_VERSION as i64;
        if version < 0 {
            bail!("database version {} was not written by this store", raw);
        }
        Ok(version as usize)
    }

    /// Applies the migrations of every schema after `from`, in order, and
    /// records the final version.
    pub fn migrate(schemas: &[VersionedSchema], conn: &Connection, from: usize) -> Result<()> {
        let mut reached = from;
        for schema in schemas.iter().skip(from + 1) {
            if let Some(migration_fn) = schema.migration {
                info!("Migrating database from V{} to V{}", reached, schema.version);
                migration_fn(conn)?;
            }
            reached = schema.version;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + reached),
            [],
        )?;
        Ok(())
    }
}
