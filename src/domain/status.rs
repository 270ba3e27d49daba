use serde::{Deserialize, Serialize};

/// Agent status of a machine or unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Started,
    Stopped,
    Error,
    Down,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Started => write!(f, "started"),
            Self::Stopped => write!(f, "stopped"),
            Self::Error => write!(f, "error"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// The status sub-record owned by the status collection.
///
/// Machine and unit infos embed one of these; only status documents and the
/// first-observation lookup may change it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusRecord {
    pub status: Status,
    pub status_info: String,
}

impl StatusRecord {
    pub fn new(status: Status, status_info: impl Into<String>) -> Self {
        Self {
            status,
            status_info: status_info.into(),
        }
    }
}
