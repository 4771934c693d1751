//! The storage engine owning the pets table.
//!
//! [`StorageEngine`] holds one lazily opened SQLite connection behind a
//! mutex and exposes raw query/insert/update/delete primitives. It knows
//! nothing about addresses or validation; the gateway layers those on top.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use pets_core::contract::TABLE_NAME;
use pets_core::{Gender, NormalizedFields, PetId};

use crate::error::StorageError;
use crate::query::{Column, PetRow, Selection, Sort};
use crate::schema::{self, SchemaPolicy};

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    InMemory,
}

impl fmt::Display for DbLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbLocation::File(path) => write!(f, "{}", path.display()),
            DbLocation::InMemory => write!(f, ":memory:"),
        }
    }
}

/// SQLite-backed owner of the pets table.
///
/// The connection is opened on first use and reused by every later call.
/// Each call holds the connection for its whole duration, so calls from
/// different threads run one at a time and [`close`](Self::close) never
/// races an in-flight operation.
///
/// If a caller panics while holding the connection, the connection is
/// dropped and the next call opens a fresh one. For an in-memory database
/// that discards its contents.
pub struct StorageEngine {
    location: DbLocation,
    policy: SchemaPolicy,
    conn: Mutex<Option<Connection>>,
}

impl fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageEngine")
            .field("location", &self.location)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl StorageEngine {
    /// Creates an engine for `location`. Nothing is opened yet.
    pub fn new(location: DbLocation, policy: SchemaPolicy) -> Self {
        StorageEngine {
            location,
            policy,
            conn: Mutex::new(None),
        }
    }

    /// Engine backed by an in-memory database (for testing).
    pub fn in_memory() -> Self {
        StorageEngine::new(DbLocation::InMemory, SchemaPolicy::default())
    }

    pub fn location(&self) -> &DbLocation {
        &self.location
    }

    pub fn policy(&self) -> SchemaPolicy {
        self.policy
    }

    /// Opens the connection now if it is not open yet.
    pub fn open(&self) -> Result<(), StorageError> {
        self.with_connection(|_| Ok(()))
    }

    /// Drops the shared connection. The next call reopens it.
    ///
    /// An in-memory database loses its contents when closed.
    pub fn close(&self) {
        if self.slot().take().is_some() {
            tracing::debug!("closed pets database at {}", self.location);
        }
    }

    /// Runs `f` with exclusive access to the connection, opening it first if
    /// needed.
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut slot = self.slot();
        let conn = match slot.take() {
            Some(conn) => conn,
            None => self.connect()?,
        };
        f(slot.insert(conn))
    }

    /// Locks the connection slot, discarding a connection left behind by a
    /// caller that panicked.
    fn slot(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            let mut slot = poisoned.into_inner();
            if slot.take().is_some() {
                tracing::warn!(
                    "dropped pets database connection at {} after a panic",
                    self.location
                );
            }
            self.conn.clear_poison();
            slot
        })
    }

    fn connect(&self) -> Result<Connection, StorageError> {
        let opened = match &self.location {
            DbLocation::File(path) => Connection::open(path),
            DbLocation::InMemory => Connection::open_in_memory(),
        };
        let mut conn = opened.map_err(|source| StorageError::Unavailable {
            location: self.location.to_string(),
            source,
        })?;
        schema::configure_and_migrate(&mut conn, self.policy)?;
        tracing::info!("opened pets database at {} ({:?})", self.location, self.policy);
        Ok(conn)
    }

    // -------------------------------------------------------------------
    // Raw primitives
    // -------------------------------------------------------------------

    /// Reads rows matching `selection`, projected to `projection` and ordered
    /// by `sort`.
    pub fn query(
        &self,
        projection: &[Column],
        selection: Option<&Selection>,
        sort: &[Sort],
    ) -> Result<Vec<PetRow>, StorageError> {
        let projection: &[Column] = if projection.is_empty() {
            &Column::ALL
        } else {
            projection
        };

        let column_list: Vec<&str> = projection.iter().map(|c| c.name()).collect();
        let mut sql = format!("SELECT {} FROM {}", column_list.join(", "), TABLE_NAME);
        if let Some(selection) = selection {
            sql.push_str(" WHERE ");
            sql.push_str(selection.clause());
        }
        if !sort.is_empty() {
            let keys: Vec<String> = sort.iter().map(|s| s.to_sql()).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys.join(", "));
        }
        let args: &[Value] = selection.map(Selection::args).unwrap_or_default();

        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let raw_rows = stmt.query_map(params_from_iter(args.iter()), |row| {
                let mut raw = RawRow::default();
                for (idx, column) in projection.iter().enumerate() {
                    match column {
                        Column::Id => raw.id = row.get(idx)?,
                        Column::Name => raw.name = row.get(idx)?,
                        Column::Breed => raw.breed = row.get(idx)?,
                        Column::Gender => raw.gender = row.get(idx)?,
                        Column::Weight => raw.weight = row.get(idx)?,
                    }
                }
                Ok(raw)
            })?;

            let mut out = Vec::new();
            for raw in raw_rows {
                out.push(raw?.into_row()?);
            }
            Ok(out)
        })
    }

    /// Inserts one row and returns its assigned identifier.
    pub fn insert(&self, fields: &NormalizedFields) -> Result<PetId, StorageError> {
        let assignments = assignments(fields);
        let sql = if assignments.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", TABLE_NAME)
        } else {
            let names: Vec<&str> = assignments.iter().map(|(name, _)| *name).collect();
            let placeholders = vec!["?"; assignments.len()].join(", ");
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                TABLE_NAME,
                names.join(", "),
                placeholders
            )
        };

        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            tx.execute(&sql, params_from_iter(assignments.iter().map(|(_, v)| v)))?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(PetId(id))
        })
    }

    /// Writes the present fields to every row matching `selection` and
    /// returns the number of rows changed. With no selection every row is
    /// updated.
    pub fn update(
        &self,
        fields: &NormalizedFields,
        selection: Option<&Selection>,
    ) -> Result<usize, StorageError> {
        let assignments = assignments(fields);
        if assignments.is_empty() {
            return Ok(0);
        }

        let set_list: Vec<String> = assignments
            .iter()
            .map(|(name, _)| format!("{name} = ?"))
            .collect();
        let mut sql = format!("UPDATE {} SET {}", TABLE_NAME, set_list.join(", "));
        let mut args: Vec<&Value> = assignments.iter().map(|(_, v)| v).collect();
        if let Some(selection) = selection {
            sql.push_str(" WHERE ");
            sql.push_str(selection.clause());
            args.extend(selection.args());
        }

        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(&sql, params_from_iter(args))?;
            tx.commit()?;
            Ok(changed)
        })
    }

    /// Deletes every row matching `selection` (all rows when `None`) and
    /// returns the number removed.
    pub fn delete(&self, selection: Option<&Selection>) -> Result<usize, StorageError> {
        let mut sql = format!("DELETE FROM {}", TABLE_NAME);
        if let Some(selection) = selection {
            sql.push_str(" WHERE ");
            sql.push_str(selection.clause());
        }
        let args: &[Value] = selection.map(Selection::args).unwrap_or_default();

        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute(&sql, params_from_iter(args.iter()))?;
            tx.commit()?;
            Ok(removed)
        })
    }
}

/// Column/value pairs for the fields present in `fields`.
fn assignments(fields: &NormalizedFields) -> Vec<(&'static str, Value)> {
    let mut out = Vec::with_capacity(fields.len());
    if let Some(name) = &fields.name {
        out.push((Column::Name.name(), Value::Text(name.clone())));
    }
    if let Some(breed) = &fields.breed {
        out.push((Column::Breed.name(), Value::Text(breed.clone())));
    }
    if let Some(gender) = fields.gender {
        out.push((Column::Gender.name(), Value::Integer(gender.code())));
    }
    if let Some(weight) = fields.weight {
        out.push((Column::Weight.name(), Value::Integer(weight)));
    }
    out
}

/// Row values as SQLite returned them, before gender codes are checked.
#[derive(Default)]
struct RawRow {
    id: Option<i64>,
    name: Option<String>,
    breed: Option<String>,
    gender: Option<i64>,
    weight: Option<i64>,
}

impl RawRow {
    fn into_row(self) -> Result<PetRow, StorageError> {
        let gender = match self.gender {
            Some(code) => Some(Gender::from_code(code).ok_or_else(|| {
                StorageError::IntegrityError {
                    reason: format!("stored gender code {code} is outside 0..=2"),
                }
            })?),
            None => None,
        };
        Ok(PetRow {
            id: self.id.map(PetId),
            name: self.name,
            breed: self.breed,
            gender,
            weight: self.weight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toto() -> NormalizedFields {
        NormalizedFields {
            name: Some("Toto".into()),
            breed: Some("Terrier".into()),
            gender: Some(Gender::Male),
            weight: Some(7),
        }
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let engine = StorageEngine::in_memory();
        let first = engine.insert(&toto()).unwrap();
        let second = engine.insert(&toto()).unwrap();
        assert!(second.0 > first.0);
    }

    #[test]
    fn insert_without_name_is_rejected_by_store() {
        let engine = StorageEngine::in_memory();
        let fields = NormalizedFields {
            weight: Some(3),
            ..Default::default()
        };
        assert!(matches!(engine.insert(&fields), Err(StorageError::Sqlite(_))));
    }

    #[test]
    fn projection_limits_returned_columns() {
        let engine = StorageEngine::in_memory();
        engine.insert(&toto()).unwrap();
        let rows = engine.query(&[Column::Name], None, &[]).unwrap();
        assert_eq!(
            rows,
            vec![PetRow {
                name: Some("Toto".into()),
                ..Default::default()
            }]
        );
    }

    #[test]
    fn selection_args_are_bound_not_spliced() {
        let engine = StorageEngine::in_memory();
        engine.insert(&toto()).unwrap();
        let hostile = Selection::new("name = ?", [Value::Text("x' OR '1'='1".into())]);
        assert!(engine.query(&[], Some(&hostile), &[]).unwrap().is_empty());
        assert_eq!(engine.delete(Some(&hostile)).unwrap(), 0);
    }

    #[test]
    fn update_binds_set_values_before_selection_args() {
        let engine = StorageEngine::in_memory();
        let id = engine.insert(&toto()).unwrap();
        let fields = NormalizedFields {
            weight: Some(9),
            ..Default::default()
        };
        let changed = engine
            .update(&fields, Some(&Selection::by_id(id)))
            .unwrap();
        assert_eq!(changed, 1);
        let rows = engine.query(&[Column::Weight], None, &[]).unwrap();
        assert_eq!(rows[0].weight, Some(9));
    }

    #[test]
    fn foreign_gender_code_is_an_integrity_error() {
        let engine = StorageEngine::in_memory();
        engine
            .with_connection(|conn| {
                conn.execute("INSERT INTO pets (name, gender) VALUES ('Odd', 7)", [])?;
                Ok(())
            })
            .unwrap();
        assert!(matches!(
            engine.query(&[], None, &[]),
            Err(StorageError::IntegrityError { .. })
        ));
    }

    #[test]
    fn panic_while_holding_connection_does_not_disable_engine() {
        let engine = StorageEngine::in_memory();
        engine.insert(&toto()).unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            engine.with_connection(|_| -> Result<(), StorageError> { panic!("caller bug") })
        }));
        assert!(outcome.is_err());

        let id = engine.insert(&toto()).unwrap();
        let rows = engine.query(&[Column::Id], None, &[]).unwrap();
        assert_eq!(rows, vec![PetRow {
            id: Some(id),
            ..Default::default()
        }]);
    }

    #[test]
    fn close_drops_in_memory_contents() {
        let engine = StorageEngine::in_memory();
        engine.insert(&toto()).unwrap();
        engine.close();
        assert!(engine.query(&[], None, &[]).unwrap().is_empty());
    }
}
