//! File records and the ordered member sets built from them.
//!
//! A [`FileRecord`] maps a logical name to the physical file supplying its
//! bytes. A [`MemberSet`] keeps records keyed by logical name, so iteration
//! always yields the deterministic framing order.

use super::logical_path::LogicalPath;
use crate::error::{Result, SealError};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// A logical name paired with its content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    logical: LogicalPath,
    source: Utf8PathBuf,
}

impl FileRecord {
    /// Create a record whose content comes from `source`.
    pub fn new(logical: LogicalPath, source: impl Into<Utf8PathBuf>) -> Self {
        Self {
            logical,
            source: source.into(),
        }
    }

    /// Create a record whose logical name equals its (relative) source path.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidLayout`] if `path` is not a usable
    /// logical name.
    pub fn identity(path: &str) -> Result<Self> {
        Ok(Self::new(LogicalPath::new(path)?, path))
    }

    /// Logical name framed into the signed stream.
    #[must_use]
    pub fn logical(&self) -> &LogicalPath {
        &self.logical
    }

    /// Physical path supplying the content.
    #[must_use]
    pub fn source(&self) -> &Utf8Path {
        &self.source
    }

    /// Resolve the source against the package root.
    #[must_use]
    pub fn resolved(&self, root: &Utf8Path) -> Self {
        Self::new(self.logical.clone(), root.join(&self.source))
    }
}

/// Records ordered by normalized logical name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberSet {
    records: BTreeMap<LogicalPath, FileRecord>,
}

impl MemberSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidLayout`] if another record already uses
    /// the same logical name; two sources must never share an identity.
    pub fn insert(&mut self, record: FileRecord) -> Result<()> {
        match self.records.entry(record.logical.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
            Entry::Occupied(existing) => Err(SealError::InvalidLayout {
                reason: format!(
                    "logical name {} is claimed by both {} and {}",
                    record.logical,
                    existing.get().source,
                    record.source
                ),
            }),
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in framing order.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }

    /// Iterate logical names in framing order.
    pub fn logical_names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(LogicalPath::as_str)
    }

    /// Look up a record by logical name.
    #[must_use]
    pub fn get(&self, logical: &str) -> Option<&FileRecord> {
        self.records.get(logical)
    }
}
