//! Logical addresses and the matcher that classifies them.
//!
//! An address names either the whole collection
//! (`content://<authority>/<collection>`) or a single record
//! (`content://<authority>/<collection>/<id>`). The [`AddressMatcher`] is a
//! plain value built once at startup and handed to the gateway; there is no
//! process-wide matcher table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contract::{CONTENT_AUTHORITY, CONTENT_SCHEME, DIR_BASE_TYPE, ITEM_BASE_TYPE, PATH_PETS};
use crate::error::CoreError;
use crate::id::PetId;

/// A resolved logical address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PetAddress {
    /// Every record in the collection.
    Collection,
    /// One record by identifier.
    Item(PetId),
}

impl PetAddress {
    /// The identifier carried by an item address.
    pub fn id(&self) -> Option<PetId> {
        match self {
            PetAddress::Collection => None,
            PetAddress::Item(id) => Some(*id),
        }
    }
}

impl fmt::Display for PetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PetAddress::Collection => write!(f, "collection"),
            PetAddress::Item(id) => write!(f, "item({id})"),
        }
    }
}

/// Classifies address strings against the collection and item patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressMatcher {
    authority: String,
    collection: String,
}

impl Default for AddressMatcher {
    fn default() -> Self {
        AddressMatcher::new(CONTENT_AUTHORITY, PATH_PETS)
    }
}

impl AddressMatcher {
    /// Creates a matcher for `<authority>/<collection>` addresses.
    pub fn new(authority: impl Into<String>, collection: impl Into<String>) -> Self {
        AddressMatcher {
            authority: authority.into(),
            collection: collection.into(),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Resolves `address` to a [`PetAddress`].
    ///
    /// The `content://` scheme is optional. Empty path segments, query
    /// strings and fragments are ignored. The identifier suffix must be
    /// decimal digits.
    pub fn resolve(&self, address: &str) -> Result<PetAddress, CoreError> {
        let unknown = || CoreError::UnknownAddress {
            address: address.to_string(),
        };

        let rest = match address.strip_prefix(CONTENT_SCHEME) {
            Some(rest) => rest,
            None if address.contains("://") => return Err(unknown()),
            None => address,
        };
        let rest = rest.split(['?', '#']).next().unwrap_or_default();

        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [authority, collection]
                if *authority == self.authority && *collection == self.collection =>
            {
                Ok(PetAddress::Collection)
            }
            [authority, collection, id]
                if *authority == self.authority
                    && *collection == self.collection
                    && !id.is_empty()
                    && id.bytes().all(|b| b.is_ascii_digit()) =>
            {
                let raw: i64 = id.parse().map_err(|_| CoreError::InvalidId {
                    segment: (*id).to_string(),
                })?;
                Ok(PetAddress::Item(PetId(raw)))
            }
            _ => Err(unknown()),
        }
    }

    /// Canonical string form of the collection address.
    pub fn collection_address(&self) -> String {
        format!("{CONTENT_SCHEME}{}/{}", self.authority, self.collection)
    }

    /// Canonical string form of the address of record `id`.
    pub fn item_address(&self, id: PetId) -> String {
        format!("{}/{}", self.collection_address(), id)
    }

    /// Canonical string form of `address`.
    pub fn format(&self, address: PetAddress) -> String {
        match address {
            PetAddress::Collection => self.collection_address(),
            PetAddress::Item(id) => self.item_address(id),
        }
    }

    /// Type tag describing what `address` resolves to.
    pub fn type_of(&self, address: PetAddress) -> String {
        let base = match address {
            PetAddress::Collection => DIR_BASE_TYPE,
            PetAddress::Item(_) => ITEM_BASE_TYPE,
        };
        format!("{base}/{}/{}", self.authority, self.collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_collection_with_and_without_scheme() {
        let matcher = AddressMatcher::default();
        assert_eq!(
            matcher.resolve("content://com.msaye7.pets/pets").unwrap(),
            PetAddress::Collection
        );
        assert_eq!(
            matcher.resolve("com.msaye7.pets/pets/").unwrap(),
            PetAddress::Collection
        );
    }

    #[test]
    fn resolves_item_suffix() {
        let matcher = AddressMatcher::default();
        assert_eq!(
            matcher.resolve("content://com.msaye7.pets/pets/17").unwrap(),
            PetAddress::Item(PetId(17))
        );
        assert_eq!(
            matcher.resolve("content://com.msaye7.pets/pets/17?x=1").unwrap(),
            PetAddress::Item(PetId(17))
        );
    }

    #[test]
    fn rejects_other_shapes() {
        let matcher = AddressMatcher::default();
        for bad in [
            "content://com.msaye7.pets",
            "content://com.msaye7.pets/dogs",
            "content://other.authority/pets",
            "content://com.msaye7.pets/pets/abc",
            "content://com.msaye7.pets/pets/-1",
            "content://com.msaye7.pets/pets/1/2",
            "http://com.msaye7.pets/pets",
            "",
        ] {
            assert!(
                matches!(matcher.resolve(bad), Err(CoreError::UnknownAddress { .. })),
                "expected UnknownAddress for {bad:?}"
            );
        }
    }

    #[test]
    fn oversized_id_is_invalid() {
        let matcher = AddressMatcher::default();
        let err = matcher
            .resolve("content://com.msaye7.pets/pets/99999999999999999999")
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidId { .. }));
    }

    #[test]
    fn format_and_resolve_agree() {
        let matcher = AddressMatcher::new("org.example.zoo", "animals");
        let item = PetAddress::Item(PetId(5));
        let text = matcher.format(item);
        assert_eq!(text, "content://org.example.zoo/animals/5");
        assert_eq!(matcher.resolve(&text).unwrap(), item);
    }

    #[test]
    fn type_tags_are_namespaced() {
        let matcher = AddressMatcher::default();
        assert_eq!(
            matcher.type_of(PetAddress::Collection),
            "vnd.android.cursor.dir/com.msaye7.pets/pets"
        );
        assert_eq!(
            matcher.type_of(PetAddress::Item(PetId(1))),
            "vnd.android.cursor.item/com.msaye7.pets/pets"
        );
    }
}
