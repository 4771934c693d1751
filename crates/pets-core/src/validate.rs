//! Validation policy applied to every write.
//!
//! [`validate`] is a pure function from a partial record to either a
//! [`ValidationFailure`] or a normalized partial record. Fields absent from
//! the input stay absent. Only a blank name is unrecoverable; a bad gender,
//! a negative weight or a blank breed is replaced by its default.

use serde::{Deserialize, Serialize};

use crate::contract::{codes, UNKNOWN_BREED};
use crate::error::ValidationFailure;
use crate::record::{Gender, NormalizedFields, PetFields};

/// How many recoverable issues a single validation pass corrects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CorrectionMode {
    /// Correct every invalid field in one pass.
    #[default]
    AllFields,
    /// Correct only the first issue found in the order gender, weight,
    /// breed and pass the remaining fields through unchanged. Matches the
    /// legacy store; a second invalid field can reach storage as-is.
    ///
    /// Unlike the legacy store, names and breeds are still stored trimmed.
    /// The legacy insert also validated twice; the gateway repeats that pass
    /// for inserts in this mode.
    FirstMatch,
}

/// A recoverable issue that was replaced with its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Correction {
    Gender,
    Weight,
    Breed,
}

impl Correction {
    /// Legacy numeric code for this issue.
    pub fn code(self) -> i32 {
        match self {
            Correction::Gender => codes::NOT_VALID_GENDER,
            Correction::Weight => codes::NOT_VALID_WEIGHT,
            Correction::Breed => codes::NOT_VALID_BREED,
        }
    }
}

/// Output of a successful validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub fields: NormalizedFields,
    /// Issues that were corrected, in detection order.
    pub corrections: Vec<Correction>,
}

impl Validated {
    /// Legacy status code: `VALID_DATA` when nothing needed correcting.
    pub fn code(&self) -> i32 {
        self.corrections
            .first()
            .map_or(codes::VALID_DATA, |c| c.code())
    }
}

/// Validates and normalizes `fields`.
pub fn validate(fields: &PetFields, mode: CorrectionMode) -> Result<Validated, ValidationFailure> {
    let name = match &fields.name {
        Some(name) => {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(ValidationFailure::InvalidName);
            }
            Some(trimmed.to_string())
        }
        None => None,
    };

    let mut corrections = Vec::new();
    let mut may_correct = |issue: Correction| -> bool {
        if mode == CorrectionMode::FirstMatch && !corrections.is_empty() {
            return false;
        }
        corrections.push(issue);
        true
    };

    // Gender is checked first, so it is corrected in either mode.
    let gender = fields.gender.map(|code| match Gender::from_code(code) {
        Some(gender) => gender,
        None => {
            may_correct(Correction::Gender);
            Gender::Unknown
        }
    });

    let weight = fields.weight.map(|weight| {
        if weight < 0 && may_correct(Correction::Weight) {
            0
        } else {
            weight
        }
    });

    let breed = fields.breed.as_ref().map(|breed| {
        let trimmed = breed.trim();
        if trimmed.is_empty() && may_correct(Correction::Breed) {
            UNKNOWN_BREED.to_string()
        } else {
            trimmed.to_string()
        }
    });

    Ok(Validated {
        fields: NormalizedFields {
            name,
            breed,
            gender,
            weight,
        },
        corrections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rex() -> PetFields {
        PetFields::new().name("Rex").breed("").gender(5).weight(-3)
    }

    #[test]
    fn blank_name_is_terminal() {
        let fields = PetFields::new().name("   ").gender(9);
        assert_eq!(
            validate(&fields, CorrectionMode::AllFields),
            Err(ValidationFailure::InvalidName)
        );
        assert_eq!(ValidationFailure::InvalidName.code(), codes::NOT_VALID_NAME);
    }

    #[test]
    fn all_fields_mode_corrects_everything() {
        let validated = validate(&rex(), CorrectionMode::AllFields).unwrap();
        assert_eq!(
            validated.fields,
            NormalizedFields {
                name: Some("Rex".into()),
                breed: Some("Unknown".into()),
                gender: Some(Gender::Unknown),
                weight: Some(0),
            }
        );
        assert_eq!(
            validated.corrections,
            vec![Correction::Gender, Correction::Weight, Correction::Breed]
        );
        assert_eq!(validated.code(), codes::NOT_VALID_GENDER);
    }

    #[test]
    fn first_match_mode_corrects_only_gender() {
        let validated = validate(&rex(), CorrectionMode::FirstMatch).unwrap();
        assert_eq!(validated.fields.gender, Some(Gender::Unknown));
        assert_eq!(validated.fields.weight, Some(-3));
        assert_eq!(validated.fields.breed.as_deref(), Some(""));
        assert_eq!(validated.corrections, vec![Correction::Gender]);
    }

    #[test]
    fn first_match_mode_falls_through_to_weight() {
        let fields = PetFields::new().gender(1).weight(-1).breed(" ");
        let validated = validate(&fields, CorrectionMode::FirstMatch).unwrap();
        assert_eq!(validated.fields.gender, Some(Gender::Male));
        assert_eq!(validated.fields.weight, Some(0));
        assert_eq!(validated.fields.breed.as_deref(), Some(""));
        assert_eq!(validated.corrections, vec![Correction::Weight]);
    }

    #[test]
    fn absent_fields_stay_absent() {
        let validated = validate(&PetFields::new().weight(4), CorrectionMode::AllFields).unwrap();
        assert_eq!(
            validated.fields,
            NormalizedFields {
                weight: Some(4),
                ..Default::default()
            }
        );
        assert_eq!(validated.code(), codes::VALID_DATA);
    }

    #[test]
    fn name_and_breed_are_trimmed() {
        let fields = PetFields::new().name("  Toto ").breed(" Terrier");
        let validated = validate(&fields, CorrectionMode::AllFields).unwrap();
        assert_eq!(validated.fields.name.as_deref(), Some("Toto"));
        assert_eq!(validated.fields.breed.as_deref(), Some("Terrier"));
        assert!(validated.corrections.is_empty());
    }

    proptest! {
        #[test]
        fn out_of_range_gender_becomes_unknown(code in any::<i64>().prop_filter("invalid", |c| !(0..=2).contains(c))) {
            let validated = validate(&PetFields::new().gender(code), CorrectionMode::AllFields).unwrap();
            prop_assert_eq!(validated.fields.gender, Some(Gender::Unknown));
        }

        #[test]
        fn negative_weight_becomes_zero(weight in i64::MIN..0) {
            let validated = validate(&PetFields::new().weight(weight), CorrectionMode::AllFields).unwrap();
            prop_assert_eq!(validated.fields.weight, Some(0));
        }

        #[test]
        fn blank_breed_becomes_unknown(breed in "[ \t\n]*") {
            let validated = validate(&PetFields::new().breed(breed), CorrectionMode::AllFields).unwrap();
            prop_assert_eq!(validated.fields.breed.as_deref(), Some("Unknown"));
        }

        #[test]
        fn revalidation_is_idempotent(
            name in proptest::option::of("[a-zA-Z ]{1,12}"),
            breed in proptest::option::of("[a-zA-Z ]{0,12}"),
            gender in proptest::option::of(-5i64..8),
            weight in proptest::option::of(-50i64..50),
        ) {
            let fields = PetFields { name, breed, gender, weight };
            if let Ok(first) = validate(&fields, CorrectionMode::AllFields) {
                let again = validate(&first.fields.clone().into(), CorrectionMode::AllFields).unwrap();
                prop_assert_eq!(again.fields, first.fields);
                prop_assert!(again.corrections.is_empty());
            }
        }
    }
}
