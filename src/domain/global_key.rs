//! Global keys: `<kind char>#<id>` strings used to key documents that belong
//! to another entity (statuses, constraints, annotations).

use super::entity::{EntityId, EntityKind};

pub fn machine_global_key(id: &str) -> String {
    format!("m#{id}")
}

pub fn unit_global_key(name: &str) -> String {
    format!("u#{name}")
}

pub fn service_global_key(name: &str) -> String {
    format!("s#{name}")
}

/// Resolves the entity that owns a global key.
///
/// Returns `None` for anything that is not a machine, unit or service key.
/// Unrelated documents share this keyspace, so `None` is a soft miss.
pub fn entity_id_for_global_key(key: &str) -> Option<EntityId> {
    let (prefix, id) = key.split_once('#')?;
    if id.is_empty() {
        return None;
    }
    let kind = match prefix {
        "m" => EntityKind::Machine,
        "u" => EntityKind::Unit,
        "s" => EntityKind::Service,
        _ => return None,
    };
    Some(EntityId::new(kind, id))
}

/// Converts a global key into the tag of the entity it names.
pub fn tag_for_global_key(key: &str) -> Option<String> {
    let (prefix, id) = key.split_once('#')?;
    if id.is_empty() {
        return None;
    }
    let tag = match prefix {
        // Nested container ids ("0/lxc/1") and unit names ("wordpress/0")
        // flatten their separators into the tag.
        "m" => format!("machine-{}", id.replace('/', "-")),
        "u" => format!("unit-{}", id.replace('/', "-")),
        "s" => format!("service-{id}"),
        "e" => format!("environment-{id}"),
        _ => return None,
    };
    Some(tag)
}
