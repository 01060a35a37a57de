use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock as SyncRwLock};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::store::{compare_documents, Filter, RecordStore, SortKey, StoreError, UniqueIndex};

type Collection = Arc<RwLock<Vec<Value>>>;

/// Process-local record store. Each collection has its own lock, so writers
/// to different collections never wait on each other. Unique indexes and the
/// implicit `id` key are checked and applied under the collection's write
/// lock, giving concurrent writers the constraint semantics a database would.
pub struct InMemoryStore {
    collections: SyncRwLock<HashMap<String, Collection>>,
    indexes: Vec<UniqueIndex>,
    outages: SyncRwLock<HashSet<String>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl InMemoryStore {
    pub fn new(indexes: Vec<UniqueIndex>) -> Self {
        Self {
            collections: SyncRwLock::new(HashMap::new()),
            indexes,
            outages: SyncRwLock::new(HashSet::new()),
        }
    }

    pub fn indexes(&self) -> &[UniqueIndex] {
        &self.indexes
    }

    /// Makes every operation on `collection` fail with `Unavailable` until
    /// [`InMemoryStore::restore`] is called.
    pub fn simulate_outage(&self, collection: &str) {
        if let Ok(mut outages) = self.outages.write() {
            outages.insert(collection.to_string());
        }
    }

    pub fn restore(&self, collection: &str) {
        if let Ok(mut outages) = self.outages.write() {
            outages.remove(collection);
        }
    }

    fn ensure_available(&self, collection: &str) -> Result<(), StoreError> {
        let down = self
            .outages
            .read()
            .map(|outages| outages.contains(collection))
            .unwrap_or(false);
        if down {
            return Err(StoreError::Unavailable(format!(
                "collection {} is unreachable",
                collection
            )));
        }
        Ok(())
    }

    /// Handle to a collection, created empty on first use. The map lock is
    /// only held long enough to clone the handle.
    fn collection(&self, name: &str) -> Collection {
        if let Some(existing) = self
            .collections
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
        {
            return existing.clone();
        }
        self.collections
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    fn check_constraints(
        &self,
        collection: &str,
        existing: &[Value],
        candidate: &Value,
        skip_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let candidate_id = candidate.get("id");
        let others = existing
            .iter()
            .filter(|doc| skip_id.map_or(true, |id| doc.get("id").and_then(Value::as_str) != Some(id)));

        for other in others.clone() {
            if candidate_id.is_some() && other.get("id") == candidate_id {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    index: format!("{}_pkey", collection),
                });
            }
        }

        for index in self.indexes.iter().filter(|index| index.collection == collection) {
            if !index.applies_to(candidate) {
                continue;
            }
            let Some(key) = index.key_of(candidate) else {
                continue;
            };
            let clash = others
                .clone()
                .filter(|doc| index.applies_to(doc))
                .any(|doc| index.key_of(doc).as_ref() == Some(&key));
            if clash {
                debug!("Unique index {} rejected write to {}", index.name, collection);
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    index: index.name.to_string(),
                });
            }
        }

        Ok(())
    }

    fn insert(
        &self,
        collection: &str,
        docs: &mut Vec<Value>,
        mut map: Map<String, Value>,
    ) -> Result<Value, StoreError> {
        let has_id = map.get("id").map_or(false, |id| !id.is_null());
        if !has_id {
            map.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        let document = Value::Object(map);

        self.check_constraints(collection, docs, &document, None)?;
        docs.push(document.clone());
        Ok(document)
    }
}

fn as_object(document: Value) -> Result<Map<String, Value>, StoreError> {
    match document {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Malformed(serde::de::Error::custom(format!(
            "expected a JSON object, got {}",
            other
        )))),
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn create(&self, collection: &str, document: Value) -> Result<Value, StoreError> {
        self.ensure_available(collection)?;
        let map = as_object(document)?;

        let handle = self.collection(collection);
        let mut docs = handle.write().await;
        self.insert(collection, &mut docs, map)
    }

    async fn create_with_next_order(
        &self,
        collection: &str,
        scope: &Filter,
        order_field: &str,
        document: Value,
    ) -> Result<Value, StoreError> {
        self.ensure_available(collection)?;
        let mut map = as_object(document)?;

        let handle = self.collection(collection);
        let mut docs = handle.write().await;
        let next = docs
            .iter()
            .filter(|doc| scope.matches(doc))
            .filter_map(|doc| doc.get(order_field).and_then(Value::as_u64))
            .max()
            .unwrap_or(0)
            + 1;
        map.insert(order_field.to_string(), Value::from(next));

        self.insert(collection, &mut docs, map)
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>, StoreError> {
        self.ensure_available(collection)?;
        let handle = self.collection(collection);
        let docs = handle.read().await;
        Ok(docs.iter().find(|doc| filter.matches(doc)).cloned())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        sort: &[SortKey],
    ) -> Result<Vec<Value>, StoreError> {
        self.ensure_available(collection)?;
        let handle = self.collection(collection);
        let mut found: Vec<Value> = {
            let docs = handle.read().await;
            docs.iter().filter(|doc| filter.matches(doc)).cloned().collect()
        };
        // Stable sort keeps insertion order for ties.
        found.sort_by(|a, b| compare_documents(a, b, sort));
        Ok(found)
    }

    async fn find_by_id_and_update(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
    ) -> Result<Option<Value>, StoreError> {
        self.ensure_available(collection)?;
        let patch = as_object(patch)?;

        let handle = self.collection(collection);
        let mut docs = handle.write().await;
        let Some(position) = docs
            .iter()
            .position(|doc| doc.get("id").and_then(Value::as_str) == Some(id))
        else {
            return Ok(None);
        };

        let mut updated = as_object(docs[position].clone())?;
        for (field, value) in patch {
            if field != "id" {
                updated.insert(field, value);
            }
        }
        let updated = Value::Object(updated);
        self.check_constraints(collection, &docs, &updated, Some(id))?;
        docs[position] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.ensure_available(collection)?;
        let handle = self.collection(collection);
        let mut docs = handle.write().await;
        match docs.iter().position(|doc| filter.matches(doc)) {
            Some(position) => {
                docs.remove(position);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.ensure_available(collection)?;
        let handle = self.collection(collection);
        let mut docs = handle.write().await;
        let before = docs.len();
        docs.retain(|doc| !filter.matches(doc));
        Ok((before - docs.len()) as u64)
    }

    async fn count_documents(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.ensure_available(collection)?;
        let handle = self.collection(collection);
        let docs = handle.read().await;
        Ok(docs.iter().filter(|doc| filter.matches(doc)).count() as u64)
    }
}
