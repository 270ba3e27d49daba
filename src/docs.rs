//! Handler input documents.
//!
//! Each backing collection stores raw [`Document`]s; these structs are what the
//! handlers work on. [`DocKind::decode`] is the only place a raw document is
//! turned into one of them.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

use crate::domain::constraints::Constraints;
use crate::domain::entity::{CharmRelation, Endpoint, Port};
use crate::domain::status::{Status, StatusRecord};
use crate::state::Document;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MachineDoc {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "instanceid", default)]
    pub instance_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PortDoc {
    pub protocol: String,
    pub number: u16,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnitDoc {
    #[serde(rename = "_id")]
    pub name: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub series: String,
    #[serde(rename = "publicaddress", default)]
    pub public_address: String,
    #[serde(rename = "privateaddress", default)]
    pub private_address: String,
    #[serde(rename = "machineid", default)]
    pub machine_id: String,
    #[serde(default)]
    pub ports: Vec<PortDoc>,
    #[serde(rename = "charmurl", default)]
    pub charm_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceDoc {
    #[serde(rename = "_id")]
    pub name: String,
    #[serde(rename = "charmurl", default)]
    pub charm_url: String,
    #[serde(default)]
    pub exposed: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CharmRelationDoc {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub interface: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EndpointDoc {
    #[serde(rename = "servicename")]
    pub service_name: String,
    pub relation: CharmRelationDoc,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RelationDoc {
    #[serde(rename = "_id")]
    pub key: String,
    #[serde(default)]
    pub endpoints: Vec<EndpointDoc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnnotationDoc {
    #[serde(rename = "_id")]
    pub global_key: String,
    pub tag: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusDoc {
    #[serde(rename = "_id", default)]
    pub global_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: Status,
    #[serde(rename = "statusinfo", default, deserialize_with = "null_as_default")]
    pub status_info: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConstraintsDoc {
    #[serde(rename = "_id", default)]
    pub global_key: String,
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(rename = "cpucores", default)]
    pub cpu_cores: Option<u64>,
    #[serde(rename = "cpupower", default)]
    pub cpu_power: Option<u64>,
    #[serde(default)]
    pub mem: Option<u64>,
    #[serde(rename = "rootdisk", default)]
    pub root_disk: Option<u64>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Reads an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<PortDoc> for Port {
    fn from(doc: PortDoc) -> Self {
        Port {
            protocol: doc.protocol,
            number: doc.number,
        }
    }
}

impl From<EndpointDoc> for Endpoint {
    fn from(doc: EndpointDoc) -> Self {
        let rel = doc.relation;
        Endpoint {
            service_name: doc.service_name,
            relation: CharmRelation {
                name: rel.name,
                role: rel.role,
                interface: rel.interface,
                optional: rel.optional,
                limit: rel.limit,
                scope: rel.scope,
            },
        }
    }
}

impl StatusDoc {
    pub fn record(&self) -> StatusRecord {
        StatusRecord::new(self.status, self.status_info.clone())
    }
}

impl ConstraintsDoc {
    pub fn value(&self) -> Constraints {
        Constraints {
            arch: self.arch.clone(),
            container: self.container.clone(),
            cpu_cores: self.cpu_cores,
            cpu_power: self.cpu_power,
            mem: self.mem,
            root_disk: self.root_disk,
            tags: self.tags.clone(),
        }
    }
}

/// The document type held by a backing collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocKind {
    Machine,
    Unit,
    Service,
    Relation,
    Annotation,
    Status,
    Constraints,
}

impl std::fmt::Display for DocKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Machine => write!(f, "machine"),
            Self::Unit => write!(f, "unit"),
            Self::Service => write!(f, "service"),
            Self::Relation => write!(f, "relation"),
            Self::Annotation => write!(f, "annotation"),
            Self::Status => write!(f, "status"),
            Self::Constraints => write!(f, "constraints"),
        }
    }
}

/// A decoded document of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum BackingDoc {
    Machine(MachineDoc),
    Unit(UnitDoc),
    Service(ServiceDoc),
    Relation(RelationDoc),
    Annotation(AnnotationDoc),
    Status(StatusDoc),
    Constraints(ConstraintsDoc),
}

impl DocKind {
    pub fn decode(self, raw: Document) -> Result<BackingDoc, serde_json::Error> {
        Ok(match self {
            Self::Machine => BackingDoc::Machine(serde_json::from_value(raw)?),
            Self::Unit => BackingDoc::Unit(serde_json::from_value(raw)?),
            Self::Service => BackingDoc::Service(serde_json::from_value(raw)?),
            Self::Relation => BackingDoc::Relation(serde_json::from_value(raw)?),
            Self::Annotation => BackingDoc::Annotation(serde_json::from_value(raw)?),
            Self::Status => BackingDoc::Status(serde_json::from_value(raw)?),
            Self::Constraints => BackingDoc::Constraints(serde_json::from_value(raw)?),
        })
    }
}

impl BackingDoc {
    pub fn kind(&self) -> DocKind {
        match self {
            Self::Machine(_) => DocKind::Machine,
            Self::Unit(_) => DocKind::Unit,
            Self::Service(_) => DocKind::Service,
            Self::Relation(_) => DocKind::Relation,
            Self::Annotation(_) => DocKind::Annotation,
            Self::Status(_) => DocKind::Status,
            Self::Constraints(_) => DocKind::Constraints,
        }
    }
}
