//! Package layout configuration.
//!
//! The layout names the whole-tree artifact, the members shared by every
//! runtime subset, the architecture-specific member templates, and the ABI
//! variants. [`PackageLayout::default`] describes a release package; a TOML
//! file may override any part of it:
//!
//! ```toml
//! whole_tree_artifact = "misaki.sig"
//! common_members = ["module.prop", "sepolicy.rule", "post-fs-data.sh", "service.sh"]
//!
//! [[abi_members]]
//! logical = "lib/{abi}/libzygisk.so"
//! source = "{libdir}/libzygisk.so"
//!
//! [[abi]]
//! name = "arm64-v8a"
//! artifact = "machikado.arm64"
//! bits = 64
//! ```

use crate::error::{Result, SealError};
use crate::package::abi::AbiVariant;
use crate::package::digest::SIDECAR_SUFFIX;
use crate::package::logical_path::LogicalPath;
use crate::package::members::FileRecord;
use crate::package::target::SignatureTarget;
use camino::{Utf8Component, Utf8Path};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;

/// Default file name of the whole-tree artifact.
pub const WHOLE_TREE_ARTIFACT: &str = "misaki.sig";

/// Members shared by every runtime subset, named identically on disk.
const COMMON_MEMBERS: &[&str] = &["module.prop", "sepolicy.rule", "post-fs-data.sh", "service.sh"];

/// Placeholders understood by member templates.
const PLACEHOLDERS: &[&str] = &["{abi}", "{bits}", "{libdir}"];

/// A runtime member whose names depend on the ABI variant.
///
/// `{abi}`, `{bits}` and `{libdir}` are expanded per variant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberTemplate {
    /// Logical name template, e.g. `lib/{abi}/libzygisk.so`.
    pub logical: String,
    /// Content source template, e.g. `{libdir}/libzygisk.so`.
    pub source: String,
}

impl MemberTemplate {
    /// Create a template.
    pub fn new(logical: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            logical: logical.into(),
            source: source.into(),
        }
    }

    /// Expand the template for `abi` into a record.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidLayout`] if the expanded logical name is
    /// unusable.
    pub fn expand(&self, abi: &AbiVariant) -> Result<FileRecord> {
        let logical = LogicalPath::new(&abi.expand(&self.logical))?;
        Ok(FileRecord::new(logical, abi.expand(&self.source)))
    }
}

/// Structure of a release package as seen by the signer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageLayout {
    /// File name of the whole-tree artifact.
    pub whole_tree_artifact: String,
    /// Runtime members shared by all variants (logical name = source).
    pub common_members: Vec<String>,
    /// Architecture-specific runtime members.
    pub abi_members: Vec<MemberTemplate>,
    /// Architectures receiving a runtime-subset artifact.
    #[serde(rename = "abi")]
    pub abis: Vec<AbiVariant>,
}

impl Default for PackageLayout {
    fn default() -> Self {
        Self {
            whole_tree_artifact: WHOLE_TREE_ARTIFACT.to_owned(),
            common_members: COMMON_MEMBERS.iter().map(|&m| m.to_owned()).collect(),
            abi_members: vec![
                MemberTemplate::new("lib/{abi}/libzygisk.so", "{libdir}/libzygisk.so"),
                MemberTemplate::new("lib/{abi}/libzygisk_ptrace.so", "bin/zygisk-ptrace{bits}"),
                MemberTemplate::new("bin/{abi}/zygiskd", "bin/zygiskd{bits}"),
            ],
            abis: AbiVariant::defaults(),
        }
    }
}

impl PackageLayout {
    /// Parse and validate a layout from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::Config`] for malformed TOML and
    /// [`SealError::InvalidLayout`] for structurally invalid layouts.
    pub fn from_toml_str(contents: &str, origin: &Utf8Path) -> Result<Self> {
        let layout: Self = toml::from_str(contents).map_err(|source| SealError::Config {
            path: origin.to_owned(),
            source,
        })?;
        layout.validate()?;
        Ok(layout)
    }

    /// Load and validate a layout file.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::Io`] if the file cannot be read, otherwise as
    /// [`PackageLayout::from_toml_str`].
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(SealError::io("read", path))?;
        Self::from_toml_str(&contents, path)
    }

    /// Check the structural rules every layout must satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidLayout`] naming the first violated rule.
    pub fn validate(&self) -> Result<()> {
        validate_artifact_name(&self.whole_tree_artifact)?;
        if self.abis.is_empty() {
            return Err(invalid("no ABI variants declared"));
        }

        let mut artifacts = BTreeSet::new();
        artifacts.insert(self.whole_tree_artifact.as_str());
        let mut names = BTreeSet::new();
        for abi in &self.abis {
            validate_artifact_name(&abi.artifact)?;
            if abi.name.is_empty() || abi.name.contains(['/', '\\']) {
                return Err(invalid(format!("ABI name \"{}\" is not a single path segment", abi.name)));
            }
            if !names.insert(abi.name.as_str()) {
                return Err(invalid(format!("ABI {} is declared twice", abi.name)));
            }
            if !artifacts.insert(abi.artifact.as_str()) {
                return Err(invalid(format!("artifact name {} is used twice", abi.artifact)));
            }
        }

        for template in &self.abi_members {
            for field in [&template.logical, &template.source] {
                check_placeholders(field)?;
            }
        }

        if self.common_members.is_empty() && self.abi_members.is_empty() {
            return Err(invalid("runtime subsets must contain at least one member"));
        }
        self.runtime_targets().map(drop)
    }

    /// Runtime-subset targets in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidLayout`] if a member name is unusable,
    /// a member is read from an artifact's path, or two members of one
    /// variant share a logical name.
    pub fn runtime_targets(&self) -> Result<Vec<SignatureTarget>> {
        let artifacts = self.artifact_names();
        self.abis
            .iter()
            .map(|abi| {
                let mut records = Vec::with_capacity(self.common_members.len() + self.abi_members.len());
                for member in &self.common_members {
                    records.push(FileRecord::identity(member)?);
                }
                for template in &self.abi_members {
                    records.push(template.expand(abi)?);
                }
                let mut seen = BTreeSet::new();
                for record in &records {
                    if !is_contained(record.source()) {
                        return Err(invalid(format!(
                            "member source {} must stay inside the package",
                            record.source()
                        )));
                    }
                    if shadows_artifact(record.source(), &artifacts) {
                        return Err(invalid(format!(
                            "member source {} is overwritten by an artifact of the same name",
                            record.source()
                        )));
                    }
                    if !seen.insert(record.logical().clone()) {
                        return Err(invalid(format!(
                            "{} declares logical name {} twice",
                            abi.name,
                            record.logical()
                        )));
                    }
                }
                Ok(SignatureTarget::runtime_subset(abi.clone(), records))
            })
            .collect()
    }

    /// The whole-tree target.
    #[must_use]
    pub fn whole_tree_target(&self) -> SignatureTarget {
        SignatureTarget::whole_tree(self.whole_tree_artifact.clone())
    }

    /// Every artifact file name, runtime subsets first, whole tree last.
    #[must_use]
    pub fn artifact_names(&self) -> Vec<&str> {
        self.abis
            .iter()
            .map(|abi| abi.artifact.as_str())
            .chain(std::iter::once(self.whole_tree_artifact.as_str()))
            .collect()
    }
}

fn invalid(reason: impl Into<String>) -> SealError {
    SealError::InvalidLayout {
        reason: reason.into(),
    }
}

fn is_contained(source: &Utf8Path) -> bool {
    source
        .components()
        .all(|component| matches!(component, Utf8Component::Normal(_) | Utf8Component::CurDir))
}

/// Artifacts are written at the root, replacing any member read from there.
fn shadows_artifact(source: &Utf8Path, artifacts: &[&str]) -> bool {
    let mut parts = source
        .components()
        .filter(|component| !matches!(component, Utf8Component::CurDir));
    match (parts.next(), parts.next()) {
        (Some(Utf8Component::Normal(name)), None) => artifacts.contains(&name),
        _ => false,
    }
}

/// Artifacts live at the package root and must not look like sidecars.
fn validate_artifact_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\', '\0']) {
        return Err(invalid(format!("artifact name \"{name}\" must be a plain file name")));
    }
    if name.ends_with(SIDECAR_SUFFIX) {
        return Err(invalid(format!("artifact name {name} collides with digest sidecars")));
    }
    Ok(())
}

/// Reject `{...}` placeholders other than the supported ones.
fn check_placeholders(template: &str) -> Result<()> {
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let tail = rest.get(start..).unwrap_or_default();
        let Some(end) = tail.find('}') else {
            return Err(invalid(format!("unterminated placeholder in \"{template}\"")));
        };
        let placeholder = tail.get(..=end).unwrap_or_default();
        if !PLACEHOLDERS.contains(&placeholder) {
            return Err(invalid(format!(
                "unknown placeholder {placeholder} in \"{template}\"; expected one of: {}",
                PLACEHOLDERS.join(", ")
            )));
        }
        rest = tail.get(end + 1..).unwrap_or_default();
    }
    Ok(())
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
