//! Per-kind document handlers.
//!
//! Primary documents (machines, units, services, relations, annotations) own
//! a store entry each. Subsidiary documents (statuses, constraints) only patch
//! the entry of the entity named by their global key.

use crate::docs::{
    AnnotationDoc, BackingDoc, ConstraintsDoc, DocKind, MachineDoc, RelationDoc, ServiceDoc,
    StatusDoc, UnitDoc,
};
use crate::domain::constraints::Constraints;
use crate::domain::entity::{
    AnnotationInfo, EntityId, EntityInfo, EntityKind, Info, MachineInfo, RelationInfo,
    ServiceInfo, UnitInfo,
};
use crate::domain::global_key::{
    entity_id_for_global_key, machine_global_key, service_global_key, unit_global_key,
};
use crate::domain::status::StatusRecord;
use crate::state::Backend;
use crate::store::Store;

use super::{BackingError, InvariantViolation};

#[allow(async_fn_in_trait)]
pub trait Handler {
    /// Applies the document to the store. `id` is the document's store key.
    async fn updated<B: Backend>(
        &self,
        st: &B,
        store: &Store,
        id: &str,
    ) -> Result<(), BackingError>;

    /// Applies the removal of the document with store key `id`.
    async fn removed<B: Backend>(st: &B, store: &Store, id: &str) -> Result<(), BackingError>;

    fn store_key(&self) -> &str;
}

async fn lookup_status<B: Backend>(st: &B, key: &str) -> Result<StatusRecord, BackingError> {
    st.get_status(key)
        .await
        .map_err(|source| BackingError::Lookup {
            key: key.to_string(),
            source,
        })
}

async fn lookup_constraints<B: Backend>(st: &B, key: &str) -> Result<Constraints, BackingError> {
    st.read_constraints(key)
        .await
        .map_err(|source| BackingError::Lookup {
            key: key.to_string(),
            source,
        })
}

async fn remove_entity(store: &Store, kind: EntityKind, id: &str) -> Result<(), BackingError> {
    store.remove(&EntityId::new(kind, id)).await;
    Ok(())
}

impl Handler for MachineDoc {
    async fn updated<B: Backend>(
        &self,
        st: &B,
        store: &Store,
        _id: &str,
    ) -> Result<(), BackingError> {
        let mut info = MachineInfo {
            id: self.id.clone(),
            instance_id: self.instance_id.clone(),
            ..Default::default()
        };
        let status = match store.get(&info.entity_id()).await {
            // Machine documents carry no status; keep what is published.
            Some(Info::Machine(old)) => StatusRecord::new(old.status, old.status_info),
            _ => lookup_status(st, &machine_global_key(&self.id)).await?,
        };
        info.status = status.status;
        info.status_info = status.status_info;
        store.update(info).await;
        Ok(())
    }

    async fn removed<B: Backend>(_st: &B, store: &Store, id: &str) -> Result<(), BackingError> {
        remove_entity(store, EntityKind::Machine, id).await
    }

    fn store_key(&self) -> &str {
        &self.id
    }
}

impl Handler for UnitDoc {
    async fn updated<B: Backend>(
        &self,
        st: &B,
        store: &Store,
        _id: &str,
    ) -> Result<(), BackingError> {
        let mut info = UnitInfo {
            name: self.name.clone(),
            service: self.service.clone(),
            series: self.series.clone(),
            public_address: self.public_address.clone(),
            private_address: self.private_address.clone(),
            machine_id: self.machine_id.clone(),
            ports: self.ports.iter().cloned().map(Into::into).collect(),
            charm_url: self.charm_url.clone().unwrap_or_default(),
            ..Default::default()
        };
        let status = match store.get(&info.entity_id()).await {
            Some(Info::Unit(old)) => StatusRecord::new(old.status, old.status_info),
            _ => lookup_status(st, &unit_global_key(&self.name)).await?,
        };
        info.status = status.status;
        info.status_info = status.status_info;
        store.update(info).await;
        Ok(())
    }

    async fn removed<B: Backend>(_st: &B, store: &Store, id: &str) -> Result<(), BackingError> {
        remove_entity(store, EntityKind::Unit, id).await
    }

    fn store_key(&self) -> &str {
        &self.name
    }
}

impl Handler for ServiceDoc {
    async fn updated<B: Backend>(
        &self,
        st: &B,
        store: &Store,
        _id: &str,
    ) -> Result<(), BackingError> {
        let mut info = ServiceInfo {
            name: self.name.clone(),
            exposed: self.exposed,
            charm_url: self.charm_url.clone(),
            ..Default::default()
        };
        info.constraints = match store.get(&info.entity_id()).await {
            Some(Info::Service(old)) => old.constraints,
            _ => lookup_constraints(st, &service_global_key(&self.name)).await?,
        };
        store.update(info).await;
        Ok(())
    }

    async fn removed<B: Backend>(_st: &B, store: &Store, id: &str) -> Result<(), BackingError> {
        remove_entity(store, EntityKind::Service, id).await
    }

    fn store_key(&self) -> &str {
        &self.name
    }
}

impl Handler for RelationDoc {
    async fn updated<B: Backend>(
        &self,
        _st: &B,
        store: &Store,
        _id: &str,
    ) -> Result<(), BackingError> {
        store
            .update(RelationInfo {
                key: self.key.clone(),
                endpoints: self.endpoints.iter().cloned().map(Into::into).collect(),
            })
            .await;
        Ok(())
    }

    async fn removed<B: Backend>(_st: &B, store: &Store, id: &str) -> Result<(), BackingError> {
        remove_entity(store, EntityKind::Relation, id).await
    }

    fn store_key(&self) -> &str {
        &self.key
    }
}

impl Handler for AnnotationDoc {
    async fn updated<B: Backend>(
        &self,
        _st: &B,
        store: &Store,
        _id: &str,
    ) -> Result<(), BackingError> {
        store
            .update(AnnotationInfo {
                tag: self.tag.clone(),
                annotations: self.annotations.clone(),
            })
            .await;
        Ok(())
    }

    /// Annotation documents are keyed by global key but published by tag.
    async fn removed<B: Backend>(st: &B, store: &Store, id: &str) -> Result<(), BackingError> {
        let tag = st
            .tag_for_global_key(id)
            .ok_or_else(|| InvariantViolation::UnknownGlobalKey(id.to_string()))?;
        remove_entity(store, EntityKind::Annotation, &tag).await
    }

    fn store_key(&self) -> &str {
        &self.global_key
    }
}

impl Handler for StatusDoc {
    async fn updated<B: Backend>(
        &self,
        _st: &B,
        store: &Store,
        id: &str,
    ) -> Result<(), BackingError> {
        let Some(parent) = entity_id_for_global_key(id) else {
            tracing::debug!(key = id, "status for unrecognised global key ignored");
            return Ok(());
        };
        let info: Info = match store.get(&parent).await {
            None => {
                tracing::debug!(%parent, "status ahead of its entity ignored");
                return Ok(());
            }
            Some(Info::Machine(info)) => MachineInfo {
                status: self.status,
                status_info: self.status_info.clone(),
                ..info
            }
            .into(),
            Some(Info::Unit(info)) => UnitInfo {
                status: self.status,
                status_info: self.status_info.clone(),
                ..info
            }
            .into(),
            Some(_) => {
                return Err(InvariantViolation::StatusForUnexpectedEntity {
                    key: id.to_string(),
                    kind: parent.kind,
                }
                .into())
            }
        };
        store.update(info).await;
        Ok(())
    }

    /// The owning entity's own removal follows; nothing to do here.
    async fn removed<B: Backend>(_st: &B, _store: &Store, _id: &str) -> Result<(), BackingError> {
        Ok(())
    }

    fn store_key(&self) -> &str {
        &self.global_key
    }
}

impl Handler for ConstraintsDoc {
    async fn updated<B: Backend>(
        &self,
        _st: &B,
        store: &Store,
        id: &str,
    ) -> Result<(), BackingError> {
        let Some(parent) = entity_id_for_global_key(id) else {
            tracing::debug!(key = id, "constraints for unrecognised global key ignored");
            return Ok(());
        };
        match store.get(&parent).await {
            Some(Info::Service(info)) => {
                store
                    .update(ServiceInfo {
                        constraints: self.value(),
                        ..info
                    })
                    .await;
            }
            // Machine and unit constraints are not published.
            Some(_) => {}
            None => tracing::debug!(%parent, "constraints ahead of their entity ignored"),
        }
        Ok(())
    }

    async fn removed<B: Backend>(_st: &B, _store: &Store, _id: &str) -> Result<(), BackingError> {
        Ok(())
    }

    fn store_key(&self) -> &str {
        &self.global_key
    }
}

impl BackingDoc {
    pub async fn updated<B: Backend>(
        &self,
        st: &B,
        store: &Store,
        id: &str,
    ) -> Result<(), BackingError> {
        match self {
            Self::Machine(doc) => doc.updated(st, store, id).await,
            Self::Unit(doc) => doc.updated(st, store, id).await,
            Self::Service(doc) => doc.updated(st, store, id).await,
            Self::Relation(doc) => doc.updated(st, store, id).await,
            Self::Annotation(doc) => doc.updated(st, store, id).await,
            Self::Status(doc) => doc.updated(st, store, id).await,
            Self::Constraints(doc) => doc.updated(st, store, id).await,
        }
    }

    pub fn store_key(&self) -> &str {
        match self {
            Self::Machine(doc) => doc.store_key(),
            Self::Unit(doc) => doc.store_key(),
            Self::Service(doc) => doc.store_key(),
            Self::Relation(doc) => doc.store_key(),
            Self::Annotation(doc) => doc.store_key(),
            Self::Status(doc) => doc.store_key(),
            Self::Constraints(doc) => doc.store_key(),
        }
    }
}

impl DocKind {
    pub async fn removed<B: Backend>(
        self,
        st: &B,
        store: &Store,
        id: &str,
    ) -> Result<(), BackingError> {
        match self {
            Self::Machine => MachineDoc::removed(st, store, id).await,
            Self::Unit => UnitDoc::removed(st, store, id).await,
            Self::Service => ServiceDoc::removed(st, store, id).await,
            Self::Relation => RelationDoc::removed(st, store, id).await,
            Self::Annotation => AnnotationDoc::removed(st, store, id).await,
            Self::Status => StatusDoc::removed(st, store, id).await,
            Self::Constraints => ConstraintsDoc::removed(st, store, id).await,
        }
    }
}
