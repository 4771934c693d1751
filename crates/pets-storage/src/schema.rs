//! SQL schema constants and version handling for the pets table.
//!
//! Two policies reconcile a stored schema with [`SCHEMA_VERSION`], both keyed
//! on SQLite's `user_version` pragma:
//!
//! - [`SchemaPolicy::Destructive`] drops and recreates the table whenever the
//!   stored version is older. **Every existing row is lost on upgrade.**
//! - [`SchemaPolicy::Additive`] applies forward-only migrations through
//!   `rusqlite_migration` and keeps existing rows.
//!
//! A stored version newer than [`SCHEMA_VERSION`] is refused by both.

use rusqlite::{Connection, Transaction};
use rusqlite_migration::{Migrations, M};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Schema version this build writes and expects.
pub const SCHEMA_VERSION: i64 = 2;

/// Creates the pets table.
pub const CREATE_PETS_TABLE: &str = "CREATE TABLE IF NOT EXISTS pets (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    breed TEXT,
    gender INTEGER,
    weight INTEGER DEFAULT 0
);";

/// Index backing name-ordered listings.
pub const CREATE_NAME_INDEX: &str = "CREATE INDEX IF NOT EXISTS pets_name_idx ON pets (name);";

/// Drops the pets table and everything in it.
pub const DROP_PETS_TABLE: &str = "DROP TABLE IF EXISTS pets;";

/// How an out-of-date stored schema is brought to [`SCHEMA_VERSION`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SchemaPolicy {
    /// Drop and recreate the table. Loses all data on upgrade.
    #[default]
    Destructive,
    /// Apply ordered migrations, preserving data.
    Additive,
}

/// Forward-only migrations used by [`SchemaPolicy::Additive`].
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        M::up(CREATE_PETS_TABLE),
        M::up(CREATE_NAME_INDEX),
        // Future migrations added here as new M::up(...) entries.
    ])
}

/// Configures pragmas and brings the schema to [`SCHEMA_VERSION`].
pub fn configure_and_migrate(conn: &mut Connection, policy: SchemaPolicy) -> Result<(), StorageError> {
    // Enable WAL mode for concurrent reads + single writer performance.
    conn.pragma_update(None, "journal_mode", "WAL")?;
    // NORMAL synchronous is safe with WAL mode and provides better performance.
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    let found = user_version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(StorageError::Downgrade {
            found,
            expected: SCHEMA_VERSION,
        });
    }

    match policy {
        SchemaPolicy::Destructive => apply_destructive(conn, found),
        SchemaPolicy::Additive => migrations()
            .to_latest(conn)
            .map_err(|e| StorageError::Migration(e.to_string())),
    }
}

/// Reads the stored schema version.
pub fn user_version(conn: &Connection) -> Result<i64, StorageError> {
    let version = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

fn apply_destructive(conn: &mut Connection, found: i64) -> Result<(), StorageError> {
    if found == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    if found == 0 {
        create(&tx)?;
    } else {
        upgrade(&tx, found, SCHEMA_VERSION)?;
    }
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    Ok(())
}

/// Creates the table and its index on a fresh database.
pub fn create(tx: &Transaction<'_>) -> Result<(), StorageError> {
    tx.execute_batch(CREATE_PETS_TABLE)?;
    tx.execute_batch(CREATE_NAME_INDEX)?;
    tracing::info!("created pets table at schema version {}", SCHEMA_VERSION);
    Ok(())
}

/// Destructive upgrade: drops the table and recreates it empty.
///
/// No data is migrated. Callers that need rows to survive a version bump
/// must open the store with [`SchemaPolicy::Additive`].
pub fn upgrade(tx: &Transaction<'_>, old_version: i64, new_version: i64) -> Result<(), StorageError> {
    tracing::warn!(
        "upgrading pets schema {} -> {}: dropping table and all rows",
        old_version,
        new_version
    );
    tx.execute_batch(DROP_PETS_TABLE)?;
    create(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pets_core::contract::columns;

    fn column_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn.prepare("PRAGMA table_info(pets)").unwrap();
        stmt.query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn migrations_are_valid() {
        assert!(migrations().validate().is_ok());
    }

    #[test]
    fn both_policies_produce_the_same_columns() {
        let expected = vec![
            columns::ID,
            columns::NAME,
            columns::BREED,
            columns::GENDER,
            columns::WEIGHT,
        ];
        for policy in [SchemaPolicy::Destructive, SchemaPolicy::Additive] {
            let mut conn = Connection::open_in_memory().unwrap();
            configure_and_migrate(&mut conn, policy).unwrap();
            assert_eq!(column_names(&conn), expected);
            assert_eq!(user_version(&conn).unwrap(), SCHEMA_VERSION);
        }
    }

    #[test]
    fn reopening_at_current_version_is_a_no_op() {
        let mut conn = Connection::open_in_memory().unwrap();
        configure_and_migrate(&mut conn, SchemaPolicy::Destructive).unwrap();
        conn.execute("INSERT INTO pets (name) VALUES ('Toto')", []).unwrap();
        configure_and_migrate(&mut conn, SchemaPolicy::Destructive).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM pets", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn newer_stored_version_is_refused() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1).unwrap();
        let err = configure_and_migrate(&mut conn, SchemaPolicy::Additive).unwrap_err();
        assert!(matches!(err, StorageError::Downgrade { found: 3, expected: 2 }));
    }
}
