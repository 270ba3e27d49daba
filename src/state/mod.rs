//! Capabilities the backing engine consumes from its environment: document
//! fetches, change notification, and the status, constraints and tag lookups.

pub mod memory;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::domain::constraints::Constraints;
use crate::domain::status::StatusRecord;

/// A raw document as held by the backing store.
pub type Document = serde_json::Value;

/// Notification that a document in `collection` may have changed.
///
/// Carries identity only; the document has to be fetched again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Change {
    pub collection: String,
    pub id: String,
}

impl Change {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

/// Errors from the document store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("not found")]
    NotFound,
    #[error("backend error: {0}")]
    Backend(String),
}

#[allow(async_fn_in_trait)]
pub trait DocumentSource: Send + Sync {
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, FetchError>;

    /// Fetches one document; [`FetchError::NotFound`] when it does not exist.
    async fn find_id(&self, collection: &str, id: &str) -> Result<Document, FetchError>;
}

/// Delivers [`Change`]s for a collection on registered channels.
pub trait ChangeNotifier: Send + Sync {
    fn watch_collection(&self, collection: &str, tx: UnboundedSender<Change>);

    /// Stops delivery to `tx`; other channels on the same collection are kept.
    fn unwatch_collection(&self, collection: &str, tx: &UnboundedSender<Change>);
}

#[allow(async_fn_in_trait)]
pub trait StatusSource: Send + Sync {
    async fn get_status(&self, global_key: &str) -> Result<StatusRecord, FetchError>;
}

#[allow(async_fn_in_trait)]
pub trait ConstraintsSource: Send + Sync {
    async fn read_constraints(&self, global_key: &str) -> Result<Constraints, FetchError>;
}

pub trait TagResolver: Send + Sync {
    fn tag_for_global_key(&self, key: &str) -> Option<String>;
}

/// Everything the backing engine needs from the environment.
pub trait Backend:
    DocumentSource + ChangeNotifier + StatusSource + ConstraintsSource + TagResolver
{
}

impl<T> Backend for T where
    T: DocumentSource + ChangeNotifier + StatusSource + ConstraintsSource + TagResolver
{
}
