//! Projection, selection and ordering for reads and bulk writes.
//!
//! Column names and sort keys are closed enums, so only the selection
//! predicate is free-form text; its values are always bound through `?`
//! placeholders and never spliced into SQL.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use pets_core::contract::columns;
use pets_core::{Gender, PetId, PetRecord};

use crate::error::StorageError;

/// A column of the pets table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Id,
    Name,
    Breed,
    Gender,
    Weight,
}

impl Column {
    /// Every column in table order.
    pub const ALL: [Column; 5] = [
        Column::Id,
        Column::Name,
        Column::Breed,
        Column::Gender,
        Column::Weight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Id => columns::ID,
            Column::Name => columns::NAME,
            Column::Breed => columns::BREED,
            Column::Gender => columns::GENDER,
            Column::Weight => columns::WEIGHT,
        }
    }
}

/// A `WHERE` predicate with its bound arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    clause: String,
    args: Vec<Value>,
}

impl Selection {
    /// Creates a selection. `clause` uses plain `?` placeholders, bound in
    /// order to `args`.
    pub fn new(clause: impl Into<String>, args: impl IntoIterator<Item = Value>) -> Self {
        Selection {
            clause: clause.into(),
            args: args.into_iter().collect(),
        }
    }

    /// Selects the single row with identifier `id`.
    pub fn by_id(id: PetId) -> Self {
        Selection::new(format!("{} = ?", columns::ID), [Value::Integer(id.0)])
    }

    pub fn clause(&self) -> &str {
        &self.clause
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

/// One `ORDER BY` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub column: Column,
    pub descending: bool,
}

impl Sort {
    pub fn asc(column: Column) -> Self {
        Sort {
            column,
            descending: false,
        }
    }

    pub fn desc(column: Column) -> Self {
        Sort {
            column,
            descending: true,
        }
    }

    pub(crate) fn to_sql(self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!("{} {}", self.column.name(), direction)
    }
}

/// A row read back from the store. Columns outside the projection are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetRow {
    pub id: Option<PetId>,
    pub name: Option<String>,
    pub breed: Option<String>,
    pub gender: Option<Gender>,
    pub weight: Option<i64>,
}

impl PetRow {
    /// Converts a row that includes at least `_id` and `name` into a record.
    /// A missing gender reads as Unknown and a missing weight as 0.
    pub fn into_record(self) -> Result<PetRecord, StorageError> {
        let (Some(id), Some(name)) = (self.id, self.name) else {
            return Err(StorageError::IntegrityError {
                reason: "row projection lacks _id or name".to_string(),
            });
        };
        Ok(PetRecord {
            id,
            name,
            breed: self.breed,
            gender: self.gender.unwrap_or_default(),
            weight: self.weight.unwrap_or(0),
        })
    }
}

/// Result of a gateway query: the matching rows plus the address they were
/// read from, which observers use to decide whether to re-query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    notification_address: String,
    rows: Vec<PetRow>,
}

impl Cursor {
    pub fn new(notification_address: String, rows: Vec<PetRow>) -> Self {
        Cursor {
            notification_address,
            rows,
        }
    }

    /// Address whose change notifications invalidate this cursor.
    pub fn notification_address(&self) -> &str {
        &self.notification_address
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PetRow> {
        self.rows.iter()
    }

    /// Converts every row into a full record.
    pub fn into_records(self) -> Result<Vec<PetRecord>, StorageError> {
        self.rows.into_iter().map(PetRow::into_record).collect()
    }
}

impl IntoIterator for Cursor {
    type Item = PetRow;
    type IntoIter = std::vec::IntoIter<PetRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Cursor {
    type Item = &'a PetRow;
    type IntoIter = std::slice::Iter<'a, PetRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
