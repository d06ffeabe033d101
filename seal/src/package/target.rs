//! Signature targets and member enumeration.
//!
//! A target names the artifact it produces and how its members are found:
//! either by walking the whole tree or from a fixed list of records.

use super::abi::AbiVariant;
use super::digest::sidecar_path;
use super::logical_path::LogicalPath;
use super::members::{FileRecord, MemberSet};
use super::tree::{regular_files, relative_to};
use crate::error::{Result, SealError};
use camino::Utf8Path;
use std::fmt;

/// How the members of a target are discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetScope {
    /// Every regular file in the tree except the target's own artifact.
    WholeTree,
    /// A fixed list of records for one architecture.
    RuntimeSubset {
        /// The architecture this subset belongs to.
        abi: AbiVariant,
        /// Records with sources relative to the package root.
        records: Vec<FileRecord>,
    },
}

/// An artifact to produce and the members it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTarget {
    artifact: String,
    scope: TargetScope,
}

impl SignatureTarget {
    /// A target covering the whole tree.
    pub fn whole_tree(artifact: impl Into<String>) -> Self {
        Self {
            artifact: artifact.into(),
            scope: TargetScope::WholeTree,
        }
    }

    /// A target covering a fixed list of records for `abi`.
    #[must_use]
    pub fn runtime_subset(abi: AbiVariant, records: Vec<FileRecord>) -> Self {
        Self {
            artifact: abi.artifact.clone(),
            scope: TargetScope::RuntimeSubset { abi, records },
        }
    }

    /// File name of the artifact written at the package root.
    #[must_use]
    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    /// How members are discovered.
    #[must_use]
    pub const fn scope(&self) -> &TargetScope {
        &self.scope
    }

    /// Resolve this target's members against the tree at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::MissingMember`] when a runtime record's source
    /// is not a regular file, [`SealError::InvalidLayout`] when two files
    /// map to one logical name, or [`SealError::Io`] on traversal failure.
    pub fn enumerate(&self, root: &Utf8Path) -> Result<MemberSet> {
        match &self.scope {
            TargetScope::WholeTree => self.enumerate_tree(root),
            TargetScope::RuntimeSubset { records, .. } => enumerate_records(root, records),
        }
    }

    /// Walk the tree, skipping the artifact and its sidecar wherever they
    /// appear.
    fn enumerate_tree(&self, root: &Utf8Path) -> Result<MemberSet> {
        let own_sidecar = sidecar_path(Utf8Path::new(&self.artifact));
        let excluded = [self.artifact.as_str(), own_sidecar.as_str()];

        let mut members = MemberSet::new();
        for path in regular_files(root)? {
            if path.file_name().is_some_and(|name| excluded.contains(&name)) {
                continue;
            }
            let logical = LogicalPath::from_relative(relative_to(root, &path)?)?;
            members.insert(FileRecord::new(logical, path))?;
        }
        Ok(members)
    }
}

impl fmt::Display for SignatureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            TargetScope::WholeTree => write!(f, "{} (whole tree)", self.artifact),
            TargetScope::RuntimeSubset { abi, .. } => write!(f, "{} ({abi})", self.artifact),
        }
    }
}

/// Resolve fixed records, failing on the first absent source.
fn enumerate_records(root: &Utf8Path, records: &[FileRecord]) -> Result<MemberSet> {
    let mut members = MemberSet::new();
    for record in records {
        let resolved = record.resolved(root);
        if !resolved.source().is_file() {
            return Err(SealError::MissingMember {
                logical: record.logical().to_string(),
                path: resolved.source().to_owned(),
            });
        }
        members.insert(resolved)?;
    }
    Ok(members)
}
