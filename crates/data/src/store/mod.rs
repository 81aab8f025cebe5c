//! Document store seam.
//!
//! The user data source talks to its backing database only through the
//! [`DocumentStore`] trait: schemaless documents (JSON maps) in named
//! collections, equality queries, and field-level updates.
//!
//! # Write model
//!
//! - `insert` stores a whole document under a generated [`DocumentKey`].
//! - `update` applies a list of [`FieldUpdate`]s to one document atomically.
//!   Besides whole-value `Set` and exact-value `ArrayUnion`, the store offers
//!   keyed array transforms that edit a single element of an array of maps,
//!   identified by one of its fields. These run inside the store, so two
//!   clients editing different elements of the same array never overwrite
//!   each other.
//!
//! There are no document deletes, no transactions and no cross-document
//! batches.

mod error;
mod memory;
mod transform;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use basket_core::DocumentKey;

pub use error::StoreError;
pub use memory::MemoryDocumentStore;

/// A stored document: top-level field name to JSON value.
pub type Document = Map<String, Value>;

/// Shared handle to a document store.
pub type SharedStore = Arc<dyn DocumentStore>;

/// A document as read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// Storage key of the document.
    pub key: DocumentKey,
    /// Incremented by every write that changes the document.
    pub version: u64,
    /// Document contents.
    pub data: Document,
}

impl DocumentSnapshot {
    /// Deserialize the document into a typed value.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the document does not match `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.data.clone()))
    }

    /// Whether the document has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Equality filter on a top-level field.
///
/// Documents without the field never match.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    /// Match documents whose `field` equals `value`.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether `doc` satisfies this filter.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.field) == Some(&self.value)
    }
}

/// A single field-level change applied by [`DocumentStore::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Replace the whole field value.
    Set { field: String, value: Value },
    /// Append each value not already present as an exact value.
    ArrayUnion { field: String, values: Vec<Value> },
    /// Append `element` unless an identical element exists (a `null` member
    /// counts as absent when comparing). Fails with
    /// [`StoreError::KeyedElementConflict`] if a different element already
    /// has the same `key_field` value.
    KeyedArrayUnion {
        field: String,
        key_field: String,
        element: Value,
    },
    /// Replace the first element whose `key_field` equals the one in
    /// `element`. No-op if there is none.
    KeyedArrayReplace {
        field: String,
        key_field: String,
        element: Value,
    },
    /// Remove the first element whose `key_field` equals `key`. No-op if
    /// there is none.
    KeyedArrayRemove {
        field: String,
        key_field: String,
        key: Value,
    },
}

impl FieldUpdate {
    /// Name of the top-level field this update touches.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Set { field, .. }
            | Self::ArrayUnion { field, .. }
            | Self::KeyedArrayUnion { field, .. }
            | Self::KeyedArrayReplace { field, .. }
            | Self::KeyedArrayRemove { field, .. } => field,
        }
    }
}

/// What `update` requires of the target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Fail with [`StoreError::DocumentNotFound`] if the document is missing.
    MustExist,
    /// Create the document (empty, at the given key) if it is missing.
    Upsert,
}

/// Outcome of a successful `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    /// Document version after the write.
    pub version: u64,
    /// Whether the write changed the document.
    pub changed: bool,
}

/// Secondary index declaration for a collection field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub collection: String,
    pub field: String,
    /// Reject writes that would give two documents the same value.
    pub unique: bool,
}

impl IndexSpec {
    /// Non-unique index.
    #[must_use]
    pub fn new(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
            unique: false,
        }
    }

    /// Unique index.
    #[must_use]
    pub fn unique(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            unique: true,
            ..Self::new(collection, field)
        }
    }
}

/// A remote document database, reduced to the calls the user data layer
/// makes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document under a generated key.
    async fn insert(&self, collection: &str, data: Document) -> Result<DocumentKey, StoreError>;

    /// Fetch one document by key.
    async fn get(
        &self,
        collection: &str,
        key: &DocumentKey,
    ) -> Result<Option<DocumentSnapshot>, StoreError>;

    /// Fetch every document matching all `filters`, oldest first.
    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<Vec<DocumentSnapshot>, StoreError>;

    /// Apply `updates` to one document, all or nothing.
    async fn update(
        &self,
        collection: &str,
        key: &DocumentKey,
        updates: &[FieldUpdate],
        precondition: Precondition,
    ) -> Result<WriteResult, StoreError>;
}
