use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::state::Document;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Names of the backing collections the engine watches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionNames {
    pub machines: String,
    pub units: String,
    pub services: String,
    pub relations: String,
    pub annotations: String,
    pub statuses: String,
    pub constraints: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            machines: "machines".into(),
            units: "units".into(),
            services: "services".into(),
            relations: "relations".into(),
            annotations: "annotations".into(),
            statuses: "statuses".into(),
            constraints: "constraints".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// JSON file of `{collection: [document, ...]}` loaded into the document store.
    pub seed: Option<PathBuf>,
    pub collections: CollectionNames,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            seed: None,
            collections: CollectionNames::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = read(path)?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Reads the seed file, if one is configured.
    pub fn read_seed(&self) -> Result<Option<BTreeMap<String, Vec<Document>>>, ConfigError> {
        let Some(path) = &self.seed else {
            return Ok(None);
        };
        let text = read(path)?;
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.log_filter, "info");
        assert!(config.seed.is_none());
        assert_eq!(config.collections, CollectionNames::default());
    }

    #[test]
    fn partial_collection_names_keep_other_defaults() {
        let config =
            Config::from_json(r#"{"collections": {"statuses": "agentstatus"}}"#).unwrap();
        assert_eq!(config.collections.statuses, "agentstatus");
        assert_eq!(config.collections.machines, "machines");
    }

    #[test]
    fn no_seed_reads_as_none() {
        assert!(Config::default().read_seed().unwrap().is_none());
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = Config::load(Path::new("/nonexistent/allwatch.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
