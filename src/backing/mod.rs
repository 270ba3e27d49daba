//! The backing engine: keeps a [`Store`] in step with the backing collections.
//!
//! A consumer calls [`Backing::watch`] to receive [`Change`]s, fills a fresh
//! store with [`Backing::get_all`], then feeds each change to
//! [`Backing::changed`] one at a time.

pub mod handlers;
pub mod registry;

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{Instrument, Span};

use crate::config::CollectionNames;
use crate::docs::DocKind;
use crate::domain::entity::EntityKind;
use crate::state::{Backend, Change, FetchError};
use crate::store::Store;

use self::registry::CollectionRegistry;

/// Defects in configuration or program logic. Never transient.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("duplicate collection name {0:?}")]
    DuplicateCollectionName(String),
    #[error("duplicate collection document type {0}")]
    DuplicateDocKind(DocKind),
    #[error("unknown collection {0:?} in change")]
    UnknownCollection(String),
    #[error("status for unexpected {kind} entity with global key {key:?}")]
    StatusForUnexpectedEntity { key: String, kind: EntityKind },
    #[error("unknown global key {0:?}")]
    UnknownGlobalKey(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BackingError {
    #[error("cannot get all {collection}: {source}")]
    FetchAll {
        collection: String,
        source: FetchError,
    },
    #[error("cannot fetch {id:?} from {collection}: {source}")]
    Fetch {
        collection: String,
        id: String,
        source: FetchError,
    },
    #[error("cannot look up {key:?}: {source}")]
    Lookup { key: String, source: FetchError },
    #[error("cannot decode document from {collection}: {source}")]
    Decode {
        collection: String,
        source: serde_json::Error,
    },
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl BackingError {
    /// Fatal errors must not be retried: the engine or its configuration is
    /// wrong. Everything else may be recovered by discarding the store and
    /// resynchronising.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}

/// Registry-driven dispatch between the backing collections and a [`Store`].
#[derive(Debug)]
pub struct Backing<B> {
    st: Arc<B>,
    registry: CollectionRegistry,
    span: Span,
}

impl<B: Backend> Backing<B> {
    /// Builds the standard registry from `names`. All logging of the engine
    /// happens inside `span`.
    pub fn new(st: Arc<B>, names: &CollectionNames, span: Span) -> Result<Self, BackingError> {
        let registry = CollectionRegistry::standard(names)?;
        Ok(Self::with_registry(st, registry, span))
    }

    pub fn with_registry(st: Arc<B>, registry: CollectionRegistry, span: Span) -> Self {
        Self { st, registry, span }
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    /// Registers `tx` for changes on every registered collection.
    pub fn watch(&self, tx: &UnboundedSender<Change>) {
        let _enter = self.span.enter();
        for entry in self.registry.entries() {
            self.st.watch_collection(&entry.name, tx.clone());
        }
        tracing::debug!(collections = self.registry.len(), "watching");
    }

    pub fn unwatch(&self, tx: &UnboundedSender<Change>) {
        let _enter = self.span.enter();
        for entry in self.registry.entries() {
            self.st.unwatch_collection(&entry.name, tx);
        }
        tracing::debug!(collections = self.registry.len(), "unwatched");
    }

    /// Loads every primary collection into `store`.
    ///
    /// On error the store may hold some collections and not others; it should
    /// be discarded.
    pub async fn get_all(&self, store: &Store) -> Result<(), BackingError> {
        self.load_all(store).instrument(self.span.clone()).await
    }

    /// Applies one change. A document that no longer exists is a removal.
    pub async fn changed(&self, store: &Store, change: &Change) -> Result<(), BackingError> {
        self.apply(store, change)
            .instrument(self.span.clone())
            .await
    }

    async fn load_all(&self, store: &Store) -> Result<(), BackingError> {
        // Subsidiary documents are picked up by the first update of their
        // parent entity.
        for entry in self.registry.primaries() {
            let docs = self
                .st
                .find_all(&entry.name)
                .await
                .map_err(|source| BackingError::FetchAll {
                    collection: entry.name.clone(),
                    source,
                })?;
            let count = docs.len();
            for raw in docs {
                let doc = entry
                    .kind
                    .decode(raw)
                    .map_err(|source| BackingError::Decode {
                        collection: entry.name.clone(),
                        source,
                    })?;
                doc.updated(self.st.as_ref(), store, doc.store_key())
                    .await?;
            }
            tracing::debug!(collection = %entry.name, count, "collection loaded");
        }
        let entities = store.len().await;
        tracing::info!(entities, "snapshot loaded");
        Ok(())
    }

    async fn apply(&self, store: &Store, change: &Change) -> Result<(), BackingError> {
        let entry = self
            .registry
            .by_name(&change.collection)
            .ok_or_else(|| InvariantViolation::UnknownCollection(change.collection.clone()))?;
        match self.st.find_id(&entry.name, &change.id).await {
            Ok(raw) => {
                let doc = entry
                    .kind
                    .decode(raw)
                    .map_err(|source| BackingError::Decode {
                        collection: entry.name.clone(),
                        source,
                    })?;
                tracing::trace!(collection = %entry.name, id = %change.id, "updated");
                doc.updated(self.st.as_ref(), store, &change.id).await
            }
            Err(FetchError::NotFound) => {
                tracing::trace!(collection = %entry.name, id = %change.id, "removed");
                entry
                    .kind
                    .removed(self.st.as_ref(), store, &change.id)
                    .await
            }
            Err(source) => Err(BackingError::Fetch {
                collection: entry.name.clone(),
                id: change.id.clone(),
                source,
            }),
        }
    }
}
