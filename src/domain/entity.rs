use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::constraints::Constraints;
use super::status::Status;

/// The kind of cluster entity an [`Info`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Machine,
    Unit,
    Service,
    Relation,
    Annotation,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Machine => write!(f, "machine"),
            Self::Unit => write!(f, "unit"),
            Self::Service => write!(f, "service"),
            Self::Relation => write!(f, "relation"),
            Self::Annotation => write!(f, "annotation"),
        }
    }
}

/// Snapshot key: `(kind, id)`. Unique across the whole store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntityId {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityId {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}", self.kind, self.id)
    }
}

/// Capability shared by every entity description.
pub trait EntityInfo {
    fn entity_id(&self) -> EntityId;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MachineInfo {
    pub id: String,
    pub instance_id: String,
    pub status: Status,
    pub status_info: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Port {
    pub protocol: String,
    pub number: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UnitInfo {
    pub name: String,
    pub service: String,
    pub series: String,
    pub public_address: String,
    pub private_address: String,
    pub machine_id: String,
    pub ports: Vec<Port>,
    #[serde(rename = "CharmURL")]
    pub charm_url: String,
    pub status: Status,
    pub status_info: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceInfo {
    pub name: String,
    pub exposed: bool,
    #[serde(rename = "CharmURL")]
    pub charm_url: String,
    pub constraints: Constraints,
}

/// A relation as declared by a charm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CharmRelation {
    pub name: String,
    pub role: String,
    pub interface: String,
    pub optional: bool,
    pub limit: u32,
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Endpoint {
    pub service_name: String,
    pub relation: CharmRelation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RelationInfo {
    pub key: String,
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnnotationInfo {
    pub tag: String,
    pub annotations: BTreeMap<String, String>,
}

impl EntityInfo for MachineInfo {
    fn entity_id(&self) -> EntityId {
        EntityId::new(EntityKind::Machine, &self.id)
    }
}

impl EntityInfo for UnitInfo {
    fn entity_id(&self) -> EntityId {
        EntityId::new(EntityKind::Unit, &self.name)
    }
}

impl EntityInfo for ServiceInfo {
    fn entity_id(&self) -> EntityId {
        EntityId::new(EntityKind::Service, &self.name)
    }
}

impl EntityInfo for RelationInfo {
    fn entity_id(&self) -> EntityId {
        EntityId::new(EntityKind::Relation, &self.key)
    }
}

impl EntityInfo for AnnotationInfo {
    fn entity_id(&self) -> EntityId {
        EntityId::new(EntityKind::Annotation, &self.tag)
    }
}

/// The current description of one entity, as held by the snapshot store.
///
/// Serializes as the bare variant object so the attribute names of each kind
/// are exactly those of the wrapped struct.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Info {
    Machine(MachineInfo),
    Unit(UnitInfo),
    Service(ServiceInfo),
    Relation(RelationInfo),
    Annotation(AnnotationInfo),
}

impl EntityInfo for Info {
    fn entity_id(&self) -> EntityId {
        match self {
            Self::Machine(info) => info.entity_id(),
            Self::Unit(info) => info.entity_id(),
            Self::Service(info) => info.entity_id(),
            Self::Relation(info) => info.entity_id(),
            Self::Annotation(info) => info.entity_id(),
        }
    }
}

impl From<MachineInfo> for Info {
    fn from(info: MachineInfo) -> Self {
        Self::Machine(info)
    }
}

impl From<UnitInfo> for Info {
    fn from(info: UnitInfo) -> Self {
        Self::Unit(info)
    }
}

impl From<ServiceInfo> for Info {
    fn from(info: ServiceInfo) -> Self {
        Self::Service(info)
    }
}

impl From<RelationInfo> for Info {
    fn from(info: RelationInfo) -> Self {
        Self::Relation(info)
    }
}

impl From<AnnotationInfo> for Info {
    fn from(info: AnnotationInfo) -> Self {
        Self::Annotation(info)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn entity_ids_follow_kind_key_fields() {
        let machine = MachineInfo {
            id: "0".into(),
            ..Default::default()
        };
        let unit = UnitInfo {
            name: "wordpress/0".into(),
            ..Default::default()
        };
        let relation = RelationInfo {
            key: "wordpress:db mysql:server".into(),
            endpoints: vec![],
        };
        let annotation = AnnotationInfo {
            tag: "machine-0".into(),
            annotations: BTreeMap::new(),
        };

        assert_eq!(machine.entity_id(), EntityId::new(EntityKind::Machine, "0"));
        assert_eq!(unit.entity_id(), EntityId::new(EntityKind::Unit, "wordpress/0"));
        assert_eq!(
            relation.entity_id(),
            EntityId::new(EntityKind::Relation, "wordpress:db mysql:server")
        );
        assert_eq!(
            Info::from(annotation).entity_id(),
            EntityId::new(EntityKind::Annotation, "machine-0")
        );
    }

    #[test]
    fn machine_info_wire_names() {
        let info = Info::from(MachineInfo {
            id: "0".into(),
            instance_id: "i-123".into(),
            status: Status::Started,
            status_info: String::new(),
        });
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            json!({
                "Id": "0",
                "InstanceId": "i-123",
                "Status": "started",
                "StatusInfo": "",
            })
        );
    }

    #[test]
    fn unit_info_wire_names() {
        let info = UnitInfo {
            name: "wordpress/0".into(),
            service: "wordpress".into(),
            series: "precise".into(),
            public_address: "10.0.0.1".into(),
            private_address: "192.168.0.1".into(),
            machine_id: "1".into(),
            ports: vec![Port {
                protocol: "tcp".into(),
                number: 80,
            }],
            charm_url: "cs:precise/wordpress-3".into(),
            status: Status::Error,
            status_info: "hook failed".into(),
        };
        let value = serde_json::to_value(&info).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            vec![
                "CharmURL",
                "MachineId",
                "Name",
                "Ports",
                "PrivateAddress",
                "PublicAddress",
                "Series",
                "Service",
                "Status",
                "StatusInfo",
            ]
        );
        assert_eq!(value["Ports"], json!([{"Protocol": "tcp", "Number": 80}]));
    }

    #[test]
    fn relation_and_service_wire_names() {
        let relation = RelationInfo {
            key: "wordpress:db mysql:server".into(),
            endpoints: vec![Endpoint {
                service_name: "mysql".into(),
                relation: CharmRelation {
                    name: "server".into(),
                    role: "provider".into(),
                    interface: "mysql".into(),
                    optional: false,
                    limit: 0,
                    scope: "global".into(),
                },
            }],
        };
        let value = serde_json::to_value(&relation).unwrap();
        assert_eq!(value["Key"], "wordpress:db mysql:server");
        assert_eq!(value["Endpoints"][0]["ServiceName"], "mysql");
        assert_eq!(value["Endpoints"][0]["Relation"]["Interface"], "mysql");

        let service = ServiceInfo {
            name: "mysql".into(),
            exposed: true,
            charm_url: "cs:precise/mysql-1".into(),
            constraints: Constraints::default(),
        };
        assert_eq!(
            serde_json::to_value(&service).unwrap(),
            json!({
                "Name": "mysql",
                "Exposed": true,
                "CharmURL": "cs:precise/mysql-1",
                "Constraints": {},
            })
        );
    }

    #[test]
    fn entity_id_wire_names() {
        let id = EntityId::new(EntityKind::Service, "mysql");
        assert_eq!(
            serde_json::to_value(&id).unwrap(),
            json!({"Kind": "service", "Id": "mysql"})
        );
    }
}
