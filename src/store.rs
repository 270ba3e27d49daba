use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::entity::{EntityId, EntityInfo, Info};

/// The current snapshot of every live entity, keyed by [`EntityId`].
///
/// Clones share the same underlying map. The backing engine is the only
/// writer; readers never see a partially applied write because every
/// operation replaces or removes a single entry under the lock.
#[derive(Debug, Clone, Default)]
pub struct Store {
    entities: Arc<RwLock<BTreeMap<EntityId, Info>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the info stored for `id`.
    pub async fn get(&self, id: &EntityId) -> Option<Info> {
        self.entities.read().await.get(id).cloned()
    }

    /// Inserts or replaces the entry keyed by the info's own entity id.
    pub async fn update(&self, info: impl Into<Info>) {
        let info = info.into();
        let id = info.entity_id();
        self.entities.write().await.insert(id, info);
    }

    /// Removes the entry for `id`. Removing an absent entry does nothing.
    pub async fn remove(&self, id: &EntityId) {
        self.entities.write().await.remove(id);
    }

    /// All entries, ordered by entity id.
    pub async fn all(&self) -> Vec<Info> {
        self.entities.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entities.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{EntityKind, MachineInfo, ServiceInfo};
    use crate::domain::status::Status;

    fn machine(id: &str, instance_id: &str) -> MachineInfo {
        MachineInfo {
            id: id.into(),
            instance_id: instance_id.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn update_inserts_then_replaces() {
        let store = Store::new();
        store.update(machine("0", "i-1")).await;
        store
            .update(MachineInfo {
                status: Status::Started,
                ..machine("0", "i-2")
            })
            .await;

        assert_eq!(store.len().await, 1);
        let Some(Info::Machine(m)) = store.get(&EntityId::new(EntityKind::Machine, "0")).await
        else {
            panic!("expected machine info");
        };
        assert_eq!(m.instance_id, "i-2");
        assert_eq!(m.status, Status::Started);
    }

    #[tokio::test]
    async fn kinds_do_not_collide() {
        let store = Store::new();
        store.update(machine("mysql", "")).await;
        store
            .update(ServiceInfo {
                name: "mysql".into(),
                ..Default::default()
            })
            .await;
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = Store::new();
        let id = EntityId::new(EntityKind::Machine, "0");
        store.update(machine("0", "i-1")).await;

        store.remove(&id).await;
        assert!(store.get(&id).await.is_none());
        store.remove(&id).await;
        assert!(store.get(&id).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = Store::new();
        let reader = store.clone();
        store.update(machine("1", "i-1")).await;
        assert_eq!(reader.all().await, vec![Info::Machine(machine("1", "i-1"))]);
    }
}
