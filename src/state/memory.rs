use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;

use crate::config::CollectionNames;
use crate::docs::{ConstraintsDoc, StatusDoc};
use crate::domain::constraints::Constraints;
use crate::domain::global_key;
use crate::domain::status::StatusRecord;

use super::{
    Change, ChangeNotifier, ConstraintsSource, Document, DocumentSource, FetchError,
    StatusSource, TagResolver,
};

/// Internal mutable state behind the RwLock.
#[derive(Debug, Default)]
struct InnerState {
    collections: BTreeMap<String, BTreeMap<String, Document>>,
    /// Collections whose reads fail, with the error message to report.
    failing: BTreeMap<String, String>,
}

/// In-memory document store implementing every capability in [`super`].
///
/// Inserting or removing a document notifies the channels watching its
/// collection, the way a store's change feed would. Status and constraints
/// lookups read the configured statuses and constraints collections.
#[derive(Debug)]
pub struct InMemoryState {
    names: CollectionNames,
    state: RwLock<InnerState>,
    watchers: Mutex<HashMap<String, Vec<UnboundedSender<Change>>>>,
    status_lookups: AtomicUsize,
    constraints_lookups: AtomicUsize,
}

impl InMemoryState {
    pub fn new() -> Self {
        Self::with_collections(CollectionNames::default())
    }

    pub fn with_collections(names: CollectionNames) -> Self {
        Self {
            names,
            state: RwLock::new(InnerState::default()),
            watchers: Mutex::new(HashMap::new()),
            status_lookups: AtomicUsize::new(0),
            constraints_lookups: AtomicUsize::new(0),
        }
    }

    /// Inserts or replaces a document, keyed by its `_id`, and returns the id.
    pub async fn insert(&self, collection: &str, doc: Document) -> Result<String, FetchError> {
        let id = doc
            .get("_id")
            .and_then(Document::as_str)
            .ok_or_else(|| FetchError::Backend(format!("document in {collection} has no _id")))?
            .to_string();
        self.state
            .write()
            .await
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), doc);
        self.notify(collection, &id);
        Ok(id)
    }

    /// Removes a document. Returns false if it did not exist.
    pub async fn remove(&self, collection: &str, id: &str) -> bool {
        let removed = self
            .state
            .write()
            .await
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();
        if removed {
            self.notify(collection, id);
        }
        removed
    }

    /// Inserts every document of a `{collection: [document, ...]}` seed.
    pub async fn load_seed(
        &self,
        seed: BTreeMap<String, Vec<Document>>,
    ) -> Result<usize, FetchError> {
        let mut count = 0;
        for (collection, docs) in seed {
            for doc in docs {
                self.insert(&collection, doc).await?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Makes every read of `collection` fail until [`Self::heal_collection`].
    pub async fn fail_collection(&self, collection: &str, message: impl Into<String>) {
        self.state
            .write()
            .await
            .failing
            .insert(collection.to_string(), message.into());
    }

    pub async fn heal_collection(&self, collection: &str) {
        self.state.write().await.failing.remove(collection);
    }

    pub fn status_lookups(&self) -> usize {
        self.status_lookups.load(Ordering::SeqCst)
    }

    pub fn constraints_lookups(&self) -> usize {
        self.constraints_lookups.load(Ordering::SeqCst)
    }

    pub fn watcher_count(&self, collection: &str) -> usize {
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .map_or(0, Vec::len)
    }

    fn notify(&self, collection: &str, id: &str) {
        let mut watchers = self.watchers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(txs) = watchers.get_mut(collection) {
            let change = Change::new(collection, id);
            // Receivers that have gone away are dropped.
            txs.retain(|tx| tx.send(change.clone()).is_ok());
            tracing::trace!(collection, id, watchers = txs.len(), "change delivered");
        }
    }
}

impl Default for InMemoryState {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSource for InMemoryState {
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, FetchError> {
        let state = self.state.read().await;
        if let Some(message) = state.failing.get(collection) {
            return Err(FetchError::Backend(message.clone()));
        }
        Ok(state
            .collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn find_id(&self, collection: &str, id: &str) -> Result<Document, FetchError> {
        let state = self.state.read().await;
        if let Some(message) = state.failing.get(collection) {
            return Err(FetchError::Backend(message.clone()));
        }
        state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
            .ok_or(FetchError::NotFound)
    }
}

impl ChangeNotifier for InMemoryState {
    fn watch_collection(&self, collection: &str, tx: UnboundedSender<Change>) {
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(collection.to_string())
            .or_default()
            .push(tx);
    }

    fn unwatch_collection(&self, collection: &str, tx: &UnboundedSender<Change>) {
        let mut watchers = self.watchers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(txs) = watchers.get_mut(collection) {
            txs.retain(|w| !w.same_channel(tx));
        }
    }
}

impl StatusSource for InMemoryState {
    /// A missing status document reads as `pending`.
    async fn get_status(&self, global_key: &str) -> Result<StatusRecord, FetchError> {
        self.status_lookups.fetch_add(1, Ordering::SeqCst);
        match self.find_id(&self.names.statuses, global_key).await {
            Ok(raw) => serde_json::from_value::<StatusDoc>(raw)
                .map(|doc| doc.record())
                .map_err(|e| FetchError::Backend(e.to_string())),
            Err(FetchError::NotFound) => Ok(StatusRecord::default()),
            Err(e) => Err(e),
        }
    }
}

impl ConstraintsSource for InMemoryState {
    async fn read_constraints(&self, global_key: &str) -> Result<Constraints, FetchError> {
        self.constraints_lookups.fetch_add(1, Ordering::SeqCst);
        match self.find_id(&self.names.constraints, global_key).await {
            Ok(raw) => serde_json::from_value::<ConstraintsDoc>(raw)
                .map(|doc| doc.value())
                .map_err(|e| FetchError::Backend(e.to_string())),
            Err(FetchError::NotFound) => Ok(Constraints::default()),
            Err(e) => Err(e),
        }
    }
}

impl TagResolver for InMemoryState {
    fn tag_for_global_key(&self, key: &str) -> Option<String> {
        global_key::tag_for_global_key(key)
    }
}
