//! Record model, logical addresses and validation policy for the pets store.
//!
//! # Modules
//!
//! - [`contract`]: authority, table, column and code constants
//! - [`id`]: PetId newtype
//! - [`record`]: Gender, PetFields, NormalizedFields, PetRecord
//! - [`address`]: PetAddress and AddressMatcher
//! - [`validate`]: the write-time validation policy
//! - [`error`]: CoreError and ValidationFailure

pub mod address;
pub mod contract;
pub mod error;
pub mod id;
pub mod record;
pub mod validate;

// Re-export commonly used types
pub use address::{AddressMatcher, PetAddress};
pub use error::{CoreError, ValidationFailure};
pub use id::PetId;
pub use record::{Gender, NormalizedFields, PetFields, PetRecord};
pub use validate::{validate, Correction, CorrectionMode, Validated};
