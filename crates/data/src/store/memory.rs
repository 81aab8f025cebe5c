//! In-process document store.
//!
//! [`MemoryDocumentStore`] behaves like the remote database as far as the
//! user data layer can observe: generated keys, equality queries served from
//! declared secondary indexes, atomic per-document updates. It can be saved
//! to and loaded from a JSON snapshot file, and switched offline to exercise
//! communication failures.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use basket_core::DocumentKey;

use super::transform::apply_all;
use super::{
    Document, DocumentSnapshot, DocumentStore, FieldUpdate, Filter, IndexSpec, Precondition,
    StoreError, WriteResult,
};

/// A document as held in memory and in snapshot files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDocument {
    /// Insertion sequence, for oldest-first query results.
    seq: u64,
    version: u64,
    data: Document,
}

#[derive(Debug, Default)]
struct Collection {
    docs: HashMap<DocumentKey, StoredDocument>,
    /// field -> canonical value -> keys
    indexes: HashMap<String, HashMap<String, BTreeSet<DocumentKey>>>,
}

#[derive(Debug, Default)]
struct State {
    collections: HashMap<String, Collection>,
    next_seq: u64,
}

/// On-disk snapshot layout.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotFile {
    next_seq: u64,
    collections: BTreeMap<String, BTreeMap<DocumentKey, StoredDocument>>,
}

/// In-memory [`DocumentStore`].
#[derive(Debug)]
pub struct MemoryDocumentStore {
    state: RwLock<State>,
    indexes: Vec<IndexSpec>,
    available: AtomicBool,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MemoryDocumentStore {
    /// Create an empty store with the given secondary indexes.
    #[must_use]
    pub fn new(indexes: Vec<IndexSpec>) -> Self {
        Self {
            state: RwLock::new(State::default()),
            indexes,
            available: AtomicBool::new(true),
        }
    }

    /// Load a store from a snapshot file. A missing file yields an empty
    /// store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` or `StoreError::Serialization` if the file
    /// cannot be read or decoded, and `StoreError::UniqueViolation` if its
    /// contents break a unique index.
    pub async fn load_snapshot(
        path: impl AsRef<Path>,
        indexes: Vec<IndexSpec>,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No snapshot found, starting empty");
                return Ok(Self::new(indexes));
            }
            Err(e) => return Err(e.into()),
        };
        let file: SnapshotFile = serde_json::from_slice(&bytes)?;

        let store = Self::new(indexes);
        {
            let mut state = store.state.write().await;
            state.next_seq = file.next_seq;
            for (name, docs) in file.collections {
                let specs = store.specs_for(&name);
                let collection = state.collections.entry(name.clone()).or_default();
                for (key, doc) in docs {
                    collection.check_unique(&name, &specs, &key, &doc.data)?;
                    collection.index_add(&specs, &key, &doc.data);
                    collection.docs.insert(key, doc);
                }
            }
        }

        tracing::debug!(path = %path.display(), "Snapshot loaded");
        Ok(store)
    }

    /// Write the whole store to a snapshot file.
    ///
    /// The file is written next to `path` and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be written.
    pub async fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let bytes = {
            let state = self.state.read().await;
            let file = SnapshotFile {
                next_seq: state.next_seq,
                collections: state
                    .collections
                    .iter()
                    .map(|(name, c)| {
                        let docs = c
                            .docs
                            .iter()
                            .map(|(k, d)| (k.clone(), d.clone()))
                            .collect();
                        (name.clone(), docs)
                    })
                    .collect(),
            };
            serde_json::to_vec_pretty(&file)?
        };

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        tracing::debug!(path = %path.display(), "Snapshot saved");
        Ok(())
    }

    /// Take the store offline (`false`) or bring it back (`true`). While
    /// offline every call fails with `StoreError::Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of documents in a collection.
    pub async fn document_count(&self, collection: &str) -> usize {
        self.state
            .read()
            .await
            .collections
            .get(collection)
            .map_or(0, |c| c.docs.len())
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("store is offline".to_owned()))
        }
    }

    fn specs_for(&self, collection: &str) -> Vec<IndexSpec> {
        self.indexes
            .iter()
            .filter(|spec| spec.collection == collection)
            .cloned()
            .collect()
    }
}

impl Collection {
    fn check_unique(
        &self,
        collection: &str,
        specs: &[IndexSpec],
        key: &DocumentKey,
        data: &Document,
    ) -> Result<(), StoreError> {
        for spec in specs.iter().filter(|s| s.unique) {
            let Some(value) = data.get(&spec.field).and_then(index_value) else {
                continue;
            };
            let taken = self
                .indexes
                .get(&spec.field)
                .and_then(|by_value| by_value.get(&value))
                .is_some_and(|keys| keys.iter().any(|k| k != key));
            if taken {
                return Err(StoreError::UniqueViolation {
                    collection: collection.to_owned(),
                    field: spec.field.clone(),
                    value,
                });
            }
        }
        Ok(())
    }

    fn index_add(&mut self, specs: &[IndexSpec], key: &DocumentKey, data: &Document) {
        for spec in specs {
            if let Some(value) = data.get(&spec.field).and_then(index_value) {
                self.indexes
                    .entry(spec.field.clone())
                    .or_default()
                    .entry(value)
                    .or_default()
                    .insert(key.clone());
            }
        }
    }

    fn index_remove(&mut self, specs: &[IndexSpec], key: &DocumentKey, data: &Document) {
        for spec in specs {
            let Some(value) = data.get(&spec.field).and_then(index_value) else {
                continue;
            };
            if let Some(by_value) = self.indexes.get_mut(&spec.field)
                && let Some(keys) = by_value.get_mut(&value)
            {
                keys.remove(key);
                if keys.is_empty() {
                    by_value.remove(&value);
                }
            }
        }
    }

    /// Keys that may match `filters`: narrowed through the first indexed
    /// filter field with a scalar value, or every key otherwise.
    fn candidates(&self, specs: &[IndexSpec], filters: &[Filter]) -> Vec<DocumentKey> {
        let indexed = filters.iter().find_map(|f| {
            if specs.iter().any(|s| s.field == f.field) {
                index_value(&f.value).map(|value| (f.field.as_str(), value))
            } else {
                None
            }
        });

        match indexed {
            Some((field, value)) => self
                .indexes
                .get(field)
                .and_then(|by_value| by_value.get(&value))
                .map(|keys| keys.iter().cloned().collect())
                .unwrap_or_default(),
            None => self.docs.keys().cloned().collect(),
        }
    }
}

/// Canonical string form of an indexable value. Null, arrays and maps are
/// not indexed.
fn index_value(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        other => Some(other.to_string()),
    }
}

fn snapshot(key: &DocumentKey, doc: &StoredDocument) -> DocumentSnapshot {
    DocumentSnapshot {
        key: key.clone(),
        version: doc.version,
        data: doc.data.clone(),
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, data: Document) -> Result<DocumentKey, StoreError> {
        self.ensure_available()?;
        let specs = self.specs_for(collection);
        let key = DocumentKey::new(Uuid::new_v4().simple().to_string());

        let mut state = self.state.write().await;
        let seq = state.next_seq;
        let coll = state.collections.entry(collection.to_owned()).or_default();
        coll.check_unique(collection, &specs, &key, &data)?;
        coll.index_add(&specs, &key, &data);
        coll.docs.insert(
            key.clone(),
            StoredDocument {
                seq,
                version: 1,
                data,
            },
        );
        state.next_seq = seq + 1;

        tracing::trace!(collection, key = %key, "Document inserted");
        Ok(key)
    }

    async fn get(
        &self,
        collection: &str,
        key: &DocumentKey,
    ) -> Result<Option<DocumentSnapshot>, StoreError> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state
            .collections
            .get(collection)
            .and_then(|c| c.docs.get(key))
            .map(|doc| snapshot(key, doc)))
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<Vec<DocumentSnapshot>, StoreError> {
        self.ensure_available()?;
        let specs = self.specs_for(collection);
        let state = self.state.read().await;
        let Some(coll) = state.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<(u64, DocumentSnapshot)> = coll
            .candidates(&specs, filters)
            .iter()
            .filter_map(|key| coll.docs.get(key).map(|doc| (key, doc)))
            .filter(|(_, doc)| filters.iter().all(|f| f.matches(&doc.data)))
            .map(|(key, doc)| (doc.seq, snapshot(key, doc)))
            .collect();
        hits.sort_by_key(|(seq, _)| *seq);

        Ok(hits.into_iter().map(|(_, snap)| snap).collect())
    }

    async fn update(
        &self,
        collection: &str,
        key: &DocumentKey,
        updates: &[FieldUpdate],
        precondition: Precondition,
    ) -> Result<WriteResult, StoreError> {
        self.ensure_available()?;
        let specs = self.specs_for(collection);

        let mut state = self.state.write().await;
        let next_seq = state.next_seq;
        let coll = state.collections.entry(collection.to_owned()).or_default();

        let (current, seq, version) = match coll.docs.get(key) {
            Some(doc) => (doc.data.clone(), doc.seq, doc.version),
            None if precondition == Precondition::Upsert => (Document::new(), next_seq, 0),
            None => {
                return Err(StoreError::DocumentNotFound {
                    collection: collection.to_owned(),
                    key: key.to_string(),
                });
            }
        };
        let created = version == 0;

        let mut next = current.clone();
        apply_all(&mut next, updates)?;

        if !created && next == current {
            return Ok(WriteResult {
                version,
                changed: false,
            });
        }

        coll.check_unique(collection, &specs, key, &next)?;
        coll.index_remove(&specs, key, &current);
        coll.index_add(&specs, key, &next);
        coll.docs.insert(
            key.clone(),
            StoredDocument {
                seq,
                version: version + 1,
                data: next,
            },
        );
        if created {
            state.next_seq = next_seq + 1;
        }

        tracing::trace!(collection, key = %key, version = version + 1, "Document updated");
        Ok(WriteResult {
            version: version + 1,
            changed: true,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    fn users_store() -> MemoryDocumentStore {
        MemoryDocumentStore::new(vec![
            IndexSpec::unique("users", "userId"),
            IndexSpec::new("users", "mobile"),
        ])
    }

    #[tokio::test]
    async fn test_insert_generates_distinct_keys() {
        let store = MemoryDocumentStore::default();
        let a = store.insert("users", doc(json!({ "n": 1 }))).await.unwrap();
        let b = store.insert("users", doc(json!({ "n": 1 }))).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.document_count("users").await, 2);
    }

    #[tokio::test]
    async fn test_query_returns_oldest_first() {
        let store = users_store();
        for id in ["u3", "u1", "u2"] {
            store
                .insert("users", doc(json!({ "userId": id, "mobile": "555" })))
                .await
                .unwrap();
        }

        let hits = store
            .query("users", &[Filter::eq("mobile", "555")])
            .await
            .unwrap();
        let ids: Vec<_> = hits.iter().map(|s| s.data["userId"].clone()).collect();
        assert_eq!(ids, vec![json!("u3"), json!("u1"), json!("u2")]);
    }

    #[tokio::test]
    async fn test_query_with_unindexed_filter_scans() {
        let store = users_store();
        store
            .insert("users", doc(json!({ "userId": "u1", "password": "a" })))
            .await
            .unwrap();
        store
            .insert("users", doc(json!({ "userId": "u2", "password": "b" })))
            .await
            .unwrap();

        let hits = store
            .query("users", &[Filter::eq("password", "b")])
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].data["userId"], "u2");
    }

    #[tokio::test]
    async fn test_query_missing_field_never_matches() {
        let store = users_store();
        store
            .insert("users", doc(json!({ "emails": [] })))
            .await
            .unwrap();
        let hits = store
            .query("users", &[Filter::eq("userId", Value::Null)])
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicate_insert() {
        let store = users_store();
        store
            .insert("users", doc(json!({ "userId": "u1" })))
            .await
            .unwrap();
        let err = store
            .insert("users", doc(json!({ "userId": "u1" })))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));
        assert_eq!(store.document_count("users").await, 1);
    }

    #[tokio::test]
    async fn test_update_reindexes_changed_field() {
        let store = users_store();
        let key = store
            .insert("users", doc(json!({ "userId": "u1", "mobile": "111" })))
            .await
            .unwrap();
        store
            .update(
                "users",
                &key,
                &[FieldUpdate::Set {
                    field: "mobile".to_owned(),
                    value: json!("222"),
                }],
                Precondition::MustExist,
            )
            .await
            .unwrap();

        let old = store
            .query("users", &[Filter::eq("mobile", "111")])
            .await
            .unwrap();
        let new = store
            .query("users", &[Filter::eq("mobile", "222")])
            .await
            .unwrap();
        assert!(old.is_empty());
        assert_eq!(new.len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = MemoryDocumentStore::default();
        let err = store
            .update(
                "users",
                &DocumentKey::new("nope"),
                &[],
                Precondition::MustExist,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DocumentNotFound { .. }));
    }

    #[tokio::test]
    async fn test_upsert_creates_document_at_key() {
        let store = MemoryDocumentStore::default();
        let key = DocumentKey::new("emailAndMobiles");
        let result = store
            .update(
                "users",
                &key,
                &[FieldUpdate::ArrayUnion {
                    field: "emails".to_owned(),
                    values: vec![json!("a@b.co")],
                }],
                Precondition::Upsert,
            )
            .await
            .unwrap();
        assert_eq!(result.version, 1);

        let snap = store.get("users", &key).await.unwrap().unwrap();
        assert_eq!(snap.data["emails"], json!(["a@b.co"]));
    }

    #[tokio::test]
    async fn test_unchanged_write_keeps_version() {
        let store = MemoryDocumentStore::default();
        let key = store
            .insert("users", doc(json!({ "tags": ["x"] })))
            .await
            .unwrap();
        let result = store
            .update(
                "users",
                &key,
                &[FieldUpdate::ArrayUnion {
                    field: "tags".to_owned(),
                    values: vec![json!("x")],
                }],
                Precondition::MustExist,
            )
            .await
            .unwrap();
        assert_eq!(
            result,
            WriteResult {
                version: 1,
                changed: false
            }
        );
    }

    #[tokio::test]
    async fn test_failed_update_leaves_document_untouched() {
        let store = MemoryDocumentStore::default();
        let key = store
            .insert("users", doc(json!({ "cart": [{ "itemId": "i1", "q": 1 }] })))
            .await
            .unwrap();
        let err = store
            .update(
                "users",
                &key,
                &[
                    FieldUpdate::Set {
                        field: "name".to_owned(),
                        value: json!("changed"),
                    },
                    FieldUpdate::KeyedArrayUnion {
                        field: "cart".to_owned(),
                        key_field: "itemId".to_owned(),
                        element: json!({ "itemId": "i1", "q": 2 }),
                    },
                ],
                Precondition::MustExist,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::KeyedElementConflict { .. }));

        let snap = store.get("users", &key).await.unwrap().unwrap();
        assert!(snap.data.get("name").is_none());
        assert_eq!(snap.version, 1);
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_call() {
        let store = MemoryDocumentStore::default();
        store.set_available(false);
        assert!(matches!(
            store.query("users", &[]).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.insert("users", Document::new()).await,
            Err(StoreError::Unavailable(_))
        ));

        store.set_available(true);
        assert!(store.query("users", &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_snapshot_round_trip_keeps_keys_and_indexes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = users_store();
        let key = store
            .insert("users", doc(json!({ "userId": "u1", "mobile": "555" })))
            .await
            .unwrap();
        store.save_snapshot(&path).await.unwrap();

        let loaded = MemoryDocumentStore::load_snapshot(&path, vec![
            IndexSpec::unique("users", "userId"),
            IndexSpec::new("users", "mobile"),
        ])
        .await
        .unwrap();
        let hits = loaded
            .query("users", &[Filter::eq("mobile", "555")])
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, key);

        let dup = loaded
            .insert("users", doc(json!({ "userId": "u1" })))
            .await
            .unwrap_err();
        assert!(matches!(dup, StoreError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_non_scalar_filter_on_indexed_field_matches_like_a_scan() {
        let indexed = users_store();
        let plain = MemoryDocumentStore::default();
        for store in [&indexed, &plain] {
            store
                .insert("users", doc(json!({ "userId": "u1", "mobile": null })))
                .await
                .unwrap();
            store
                .insert("users", doc(json!({ "userId": "u2", "mobile": ["555"] })))
                .await
                .unwrap();
            store
                .insert("users", doc(json!({ "userId": "u3", "mobile": "555" })))
                .await
                .unwrap();
        }

        for store in [&indexed, &plain] {
            let nulls = store
                .query("users", &[Filter::eq("mobile", Value::Null)])
                .await
                .unwrap();
            assert_eq!(nulls.len(), 1);
            assert_eq!(nulls[0].data["userId"], json!("u1"));

            let arrays = store
                .query("users", &[Filter::eq("mobile", json!(["555"]))])
                .await
                .unwrap();
            assert_eq!(arrays.len(), 1);
            assert_eq!(arrays[0].data["userId"], json!("u2"));
        }
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryDocumentStore::load_snapshot(dir.path().join("absent.json"), Vec::new())
            .await
            .unwrap();
        assert_eq!(store.document_count("users").await, 0);
    }
}
