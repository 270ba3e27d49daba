use std::collections::HashMap;

use crate::config::CollectionNames;
use crate::docs::DocKind;

use super::InvariantViolation;

/// A watched collection and the document type stored in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionEntry {
    pub name: String,
    pub kind: DocKind,
    /// Subsidiary collections only modify an existing primary entity and
    /// never produce a store entry of their own.
    pub subsidiary: bool,
}

impl CollectionEntry {
    pub fn primary(name: impl Into<String>, kind: DocKind) -> Self {
        Self {
            name: name.into(),
            kind,
            subsidiary: false,
        }
    }

    pub fn subsidiary(name: impl Into<String>, kind: DocKind) -> Self {
        Self {
            name: name.into(),
            kind,
            subsidiary: true,
        }
    }
}

/// Immutable lookup of watched collections by name and by document type.
#[derive(Debug, Clone)]
pub struct CollectionRegistry {
    entries: Vec<CollectionEntry>,
    by_name: HashMap<String, usize>,
    by_kind: HashMap<DocKind, usize>,
}

impl CollectionRegistry {
    /// Builds the registry. Two entries sharing a name or a document type is a
    /// programming error and fails construction.
    pub fn new(entries: Vec<CollectionEntry>) -> Result<Self, InvariantViolation> {
        let mut by_name = HashMap::with_capacity(entries.len());
        let mut by_kind = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if by_kind.insert(entry.kind, index).is_some() {
                return Err(InvariantViolation::DuplicateDocKind(entry.kind));
            }
            if by_name.insert(entry.name.clone(), index).is_some() {
                return Err(InvariantViolation::DuplicateCollectionName(
                    entry.name.clone(),
                ));
            }
        }
        Ok(Self {
            entries,
            by_name,
            by_kind,
        })
    }

    /// The five primary entity collections plus the statuses and constraints
    /// subsidiaries.
    pub fn standard(names: &CollectionNames) -> Result<Self, InvariantViolation> {
        Self::new(vec![
            CollectionEntry::primary(&names.machines, DocKind::Machine),
            CollectionEntry::primary(&names.units, DocKind::Unit),
            CollectionEntry::primary(&names.services, DocKind::Service),
            CollectionEntry::primary(&names.relations, DocKind::Relation),
            CollectionEntry::primary(&names.annotations, DocKind::Annotation),
            CollectionEntry::subsidiary(&names.statuses, DocKind::Status),
            CollectionEntry::subsidiary(&names.constraints, DocKind::Constraints),
        ])
    }

    pub fn by_name(&self, name: &str) -> Option<&CollectionEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// The collection holding documents of `kind`. Decoded documents dispatch
    /// on their own [`DocKind`], so the engine only needs this index to keep
    /// one collection per document type.
    pub fn by_kind(&self, kind: DocKind) -> Option<&CollectionEntry> {
        self.by_kind.get(&kind).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[CollectionEntry] {
        &self.entries
    }

    pub fn primaries(&self) -> impl Iterator<Item = &CollectionEntry> {
        self.entries.iter().filter(|entry| !entry.subsidiary)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
