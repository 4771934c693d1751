//! The record gateway: the single entry point for pet CRUD.
//!
//! Every operation takes a logical address string. The gateway resolves it
//! with its [`AddressMatcher`], runs the validation policy on writes,
//! performs the storage call and, on success, notifies observers with the
//! canonical form of the address (scheme included, no trailing slash), so
//! every spelling of one address produces the same notification.
//!
//! An item address always narrows the operation to that row: the caller's
//! selection is replaced by `_id = ?`.

use std::sync::Arc;

use pets_core::contract::UNKNOWN_BREED;
use pets_core::{
    validate, AddressMatcher, CorrectionMode, Gender, PetAddress, PetFields, Validated,
    ValidationFailure,
};
use serde::{Deserialize, Serialize};

use crate::engine::StorageEngine;
use crate::error::GatewayError;
use crate::notify::{ChangeNotifier, ChangeObserver, ObserverId};
use crate::query::{Column, Cursor, Selection, Sort};

/// Behavior switches for [`PetGateway`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// How many recoverable field issues one write corrects.
    pub correction: CorrectionMode,
    /// Whether an update on the collection address applies to every row
    /// matching the caller's selection. When false such updates fail with
    /// [`GatewayError::Unsupported`].
    pub collection_updates: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            correction: CorrectionMode::AllFields,
            collection_updates: true,
        }
    }
}

impl GatewayConfig {
    /// Settings matching the legacy store: first-match correction and no
    /// collection-wide updates.
    pub fn legacy() -> Self {
        GatewayConfig {
            correction: CorrectionMode::FirstMatch,
            collection_updates: false,
        }
    }
}

/// Result of an update that reached the validation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update ran; this many rows changed.
    Updated(usize),
    /// The fields failed validation; nothing was written.
    Rejected(ValidationFailure),
}

/// Addressable CRUD front for the pets table.
#[derive(Debug)]
pub struct PetGateway {
    engine: StorageEngine,
    matcher: AddressMatcher,
    config: GatewayConfig,
    notifier: ChangeNotifier,
}

impl PetGateway {
    pub fn new(engine: StorageEngine, matcher: AddressMatcher, config: GatewayConfig) -> Self {
        PetGateway {
            engine,
            matcher,
            config,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Gateway over an in-memory store with default settings (for testing).
    pub fn in_memory() -> Self {
        PetGateway::new(
            StorageEngine::in_memory(),
            AddressMatcher::default(),
            GatewayConfig::default(),
        )
    }

    pub fn matcher(&self) -> &AddressMatcher {
        &self.matcher
    }

    pub fn engine(&self) -> &StorageEngine {
        &self.engine
    }

    pub fn config(&self) -> GatewayConfig {
        self.config
    }

    pub fn register_observer(&self, observer: Arc<dyn ChangeObserver>) -> ObserverId {
        self.notifier.register(observer)
    }

    pub fn unregister_observer(&self, id: ObserverId) -> bool {
        self.notifier.unregister(id)
    }

    // -------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------

    /// Reads the rows at `address`.
    ///
    /// An empty `projection` selects every column. The cursor carries the
    /// canonical form of `address`.
    pub fn query(
        &self,
        address: &str,
        projection: &[Column],
        selection: Option<Selection>,
        sort: &[Sort],
    ) -> Result<Cursor, GatewayError> {
        let resolved = self.matcher.resolve(address)?;
        let selection = effective_selection(resolved, selection);
        tracing::debug!("query {} ({})", address, resolved);

        let rows = self.engine.query(projection, selection.as_ref(), sort)?;
        Ok(Cursor::new(self.matcher.format(resolved), rows))
    }

    /// Type tag for the data at `address`.
    pub fn type_of(&self, address: &str) -> Result<String, GatewayError> {
        let resolved = self.matcher.resolve(address)?;
        Ok(self.matcher.type_of(resolved))
    }

    /// Inserts a new pet and returns its address.
    ///
    /// Only the collection address accepts inserts. Absent breed, gender and
    /// weight are stored as "Unknown", Unknown and 0.
    pub fn insert(&self, address: &str, fields: &PetFields) -> Result<String, GatewayError> {
        let resolved = self.matcher.resolve(address)?;
        let canonical = self.matcher.format(resolved);
        if resolved != PetAddress::Collection {
            return Err(GatewayError::Unsupported {
                operation: "insert",
                address: canonical,
            });
        }

        let mut validated = self.validate(fields).map_err(GatewayError::Validation)?;
        if self.config.correction == CorrectionMode::FirstMatch {
            // The legacy insert validated the same values twice, so a second
            // recoverable issue was corrected as well.
            let again = self
                .validate(&PetFields::from(validated.fields))
                .map_err(GatewayError::Validation)?;
            validated.fields = again.fields;
            validated.corrections.extend(again.corrections);
        }
        let mut values = validated.fields;
        values.breed.get_or_insert_with(|| UNKNOWN_BREED.to_string());
        values.gender.get_or_insert(Gender::Unknown);
        values.weight.get_or_insert(0);

        let id = self.engine.insert(&values).map_err(|source| {
            tracing::error!("failed to insert a new row for {}: {}", canonical, source);
            GatewayError::InsertFailed {
                address: canonical.clone(),
                source,
            }
        })?;

        tracing::debug!("inserted pet {} via {}", id, canonical);
        self.notifier.notify(&canonical);
        Ok(self.matcher.item_address(id))
    }

    /// Deletes the rows at `address` and returns how many were removed.
    pub fn delete(&self, address: &str, selection: Option<Selection>) -> Result<usize, GatewayError> {
        let resolved = self.matcher.resolve(address)?;
        let canonical = self.matcher.format(resolved);
        let selection = effective_selection(resolved, selection);

        let removed = self.engine.delete(selection.as_ref())?;
        tracing::debug!("deleted {} pet(s) via {}", removed, canonical);
        self.notifier.notify(&canonical);
        Ok(removed)
    }

    /// Updates the rows at `address` with the fields present in `fields`.
    ///
    /// A blank name yields [`UpdateOutcome::Rejected`] without touching the
    /// store. A field set that is empty after validation yields
    /// `Updated(0)` without a storage call or notification. Both checks run
    /// before a disabled collection update is refused.
    pub fn update(
        &self,
        address: &str,
        fields: &PetFields,
        selection: Option<Selection>,
    ) -> Result<UpdateOutcome, GatewayError> {
        let resolved = self.matcher.resolve(address)?;
        let canonical = self.matcher.format(resolved);

        let validated = match self.validate(fields) {
            Ok(validated) => validated,
            Err(failure) => {
                tracing::debug!("rejected update via {}: {}", canonical, failure);
                return Ok(UpdateOutcome::Rejected(failure));
            }
        };
        if validated.fields.is_empty() {
            return Ok(UpdateOutcome::Updated(0));
        }

        if resolved == PetAddress::Collection && !self.config.collection_updates {
            return Err(GatewayError::Unsupported {
                operation: "update",
                address: canonical,
            });
        }

        let selection = effective_selection(resolved, selection);
        let changed = self.engine.update(&validated.fields, selection.as_ref())?;
        tracing::debug!("updated {} pet(s) via {}", changed, canonical);
        self.notifier.notify(&canonical);
        Ok(UpdateOutcome::Updated(changed))
    }

    fn validate(&self, fields: &PetFields) -> Result<Validated, ValidationFailure> {
        let validated = validate(fields, self.config.correction)?;
        for correction in &validated.corrections {
            tracing::debug!("corrected {:?} (code {})", correction, correction.code());
        }
        Ok(validated)
    }
}

/// An item address overrides the caller's selection with its identifier.
fn effective_selection(address: PetAddress, selection: Option<Selection>) -> Option<Selection> {
    match address {
        PetAddress::Collection => selection,
        PetAddress::Item(id) => Some(Selection::by_id(id)),
    }
}
