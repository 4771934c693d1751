//! Stable record identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a stored pet.
///
/// Assigned by the store on insert and never changed afterwards. The inner
/// `i64` aligns with SQLite's `INTEGER PRIMARY KEY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PetId(pub i64);

impl fmt::Display for PetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PetId {
    fn from(raw: i64) -> Self {
        PetId(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prints_inner_value() {
        assert_eq!(PetId(42).to_string(), "42");
    }
}
