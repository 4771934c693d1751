//! Naming contract shared by the store, the gateway and its callers.
//!
//! Everything that must agree across layers lives here: the content
//! authority, the collection path, the table and column names, the closed
//! gender code set and the legacy validation codes.

/// Content authority the default [`AddressMatcher`](crate::address::AddressMatcher) is bound to.
pub const CONTENT_AUTHORITY: &str = "com.msaye7.pets";

/// Scheme prefix accepted (and emitted) on logical addresses.
pub const CONTENT_SCHEME: &str = "content://";

/// Path segment naming the pet collection.
pub const PATH_PETS: &str = "pets";

/// Base type tag for addresses that resolve to many rows.
pub const DIR_BASE_TYPE: &str = "vnd.android.cursor.dir";

/// Base type tag for addresses that resolve to a single row.
pub const ITEM_BASE_TYPE: &str = "vnd.android.cursor.item";

/// Physical table holding the pet rows.
pub const TABLE_NAME: &str = PATH_PETS;

/// Column names of the pets table.
pub mod columns {
    /// System-assigned row identifier.
    pub const ID: &str = "_id";
    pub const NAME: &str = "name";
    pub const BREED: &str = "breed";
    pub const GENDER: &str = "gender";
    pub const WEIGHT: &str = "weight";
}

/// Breed stored when the caller supplies a blank one.
pub const UNKNOWN_BREED: &str = "Unknown";

/// Legacy numeric validation codes, kept stable for callers that surface them.
pub mod codes {
    pub const VALID_DATA: i32 = 1000;
    pub const NOT_VALID_DATA: i32 = 1010;
    pub const NOT_VALID_NAME: i32 = 1020;
    pub const NOT_VALID_BREED: i32 = 1030;
    pub const NOT_VALID_GENDER: i32 = 1040;
    pub const NOT_VALID_WEIGHT: i32 = 1050;
}
