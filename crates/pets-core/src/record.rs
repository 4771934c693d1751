//! The pet record model.
//!
//! Writes carry a partial record: every field is either present with a value
//! or absent, so an update only touches the columns the caller supplied.
//! [`PetFields`] is the raw caller input, [`NormalizedFields`] is what the
//! validation policy hands to storage, and [`PetRecord`] is a complete row.

use serde::{Deserialize, Serialize};

use crate::id::PetId;

/// Closed set of gender codes stored in the `gender` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Unknown,
    Male,
    Female,
}

impl Gender {
    /// Integer code persisted for this gender.
    pub fn code(self) -> i64 {
        match self {
            Gender::Unknown => 0,
            Gender::Male => 1,
            Gender::Female => 2,
        }
    }

    /// Maps a persisted code back to a gender, or `None` outside {0, 1, 2}.
    pub fn from_code(code: i64) -> Option<Gender> {
        match code {
            0 => Some(Gender::Unknown),
            1 => Some(Gender::Male),
            2 => Some(Gender::Female),
            _ => None,
        }
    }
}

/// Raw field values supplied by a caller for an insert or update.
///
/// `gender` stays a plain integer here so out-of-range codes reach the
/// validation policy instead of being rejected at the type level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetFields {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub gender: Option<i64>,
    pub weight: Option<i64>,
}

impl PetFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn breed(mut self, breed: impl Into<String>) -> Self {
        self.breed = Some(breed.into());
        self
    }

    pub fn gender(mut self, code: i64) -> Self {
        self.gender = Some(code);
        self
    }

    pub fn weight(mut self, weight: i64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.breed.is_none() && self.gender.is_none() && self.weight.is_none()
    }
}

/// Field values that passed the validation policy and may be written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedFields {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub gender: Option<Gender>,
    pub weight: Option<i64>,
}

impl NormalizedFields {
    /// True when no field is present; such a write is a no-op.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.breed.is_none() && self.gender.is_none() && self.weight.is_none()
    }

    /// Number of present fields.
    pub fn len(&self) -> usize {
        [
            self.name.is_some(),
            self.breed.is_some(),
            self.gender.is_some(),
            self.weight.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}

impl From<NormalizedFields> for PetFields {
    fn from(fields: NormalizedFields) -> Self {
        PetFields {
            name: fields.name,
            breed: fields.breed,
            gender: fields.gender.map(Gender::code),
            weight: fields.weight,
        }
    }
}

/// A complete stored pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetRecord {
    pub id: PetId,
    pub name: String,
    pub breed: Option<String>,
    pub gender: Gender,
    pub weight: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_codes_roundtrip() {
        for gender in [Gender::Unknown, Gender::Male, Gender::Female] {
            assert_eq!(Gender::from_code(gender.code()), Some(gender));
        }
        assert_eq!(Gender::from_code(3), None);
        assert_eq!(Gender::from_code(-1), None);
    }

    #[test]
    fn builder_sets_only_named_fields() {
        let fields = PetFields::new().name("Toto").weight(7);
        assert_eq!(fields.name.as_deref(), Some("Toto"));
        assert_eq!(fields.weight, Some(7));
        assert!(fields.breed.is_none());
        assert!(fields.gender.is_none());
        assert!(!fields.is_empty());
        assert!(PetFields::new().is_empty());
    }

    #[test]
    fn normalized_len_counts_present_fields() {
        let fields = NormalizedFields {
            name: Some("Rex".into()),
            gender: Some(Gender::Male),
            ..Default::default()
        };
        assert_eq!(fields.len(), 2);
        assert!(NormalizedFields::default().is_empty());
    }

    #[test]
    fn record_serializes_to_json() {
        let record = PetRecord {
            id: PetId(3),
            name: "Rex".into(),
            breed: Some("Terrier".into()),
            gender: Gender::Male,
            weight: 7,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["gender"], "Male");
        let back: PetRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
