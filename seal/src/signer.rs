//! Sealing orchestrator.
//!
//! Produces every signature artifact and digest sidecar for a finished
//! package tree. Runtime-subset artifacts are written first, then the digest
//! pass runs over the tree, and the whole-tree artifact is signed last so its
//! traversal observes the final tree. When key material is unavailable the
//! same files are written as zero-length placeholders and the caller receives
//! [`SealOutcome::Unsigned`] instead of an error.

use crate::error::Result;
use crate::keys::{KeyMaterialError, KeySource, SigningKeyPair};
use crate::layout::PackageLayout;
use crate::package::artifact::ArtifactContent;
use crate::package::digest::{write_sidecar, write_sidecars};
use crate::package::members::MemberSet;
use crate::package::target::SignatureTarget;
use camino::{Utf8Path, Utf8PathBuf};
use ed25519_dalek::PUBLIC_KEY_LENGTH;
use log::{info, warn};

/// Whether a run produced real signatures.
///
/// Not an error: an unsigned package is a valid build result.
#[derive(Debug)]
pub enum SealOutcome {
    /// All artifacts hold signatures made with this public key.
    Signed {
        /// Public key embedded in every artifact.
        public_key: [u8; PUBLIC_KEY_LENGTH],
    },
    /// All artifacts are zero-length placeholders.
    Unsigned {
        /// Why key material could not be used.
        reason: KeyMaterialError,
    },
}

/// Summary of a sealing run.
#[derive(Debug)]
pub struct SealReport {
    /// Signed or unsigned.
    pub outcome: SealOutcome,
    /// Artifact paths in the order they were written.
    pub artifacts: Vec<Utf8PathBuf>,
    /// Number of digest sidecars written.
    pub sidecars: usize,
}

impl SealReport {
    /// Whether the artifacts carry signatures.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        matches!(self.outcome, SealOutcome::Signed { .. })
    }
}

/// Seal the package at `root`, loading key material from `keys`.
///
/// # Errors
///
/// Returns [`SealError`](crate::error::SealError) when the layout is
/// invalid, a runtime member is missing, or any file operation fails.
/// Unusable key material is not an error.
pub fn seal_package(root: &Utf8Path, layout: &PackageLayout, keys: &KeySource) -> Result<SealReport> {
    seal_package_with(root, layout, keys.load())
}

/// Seal the package at `root` with already-resolved key material.
///
/// # Errors
///
/// As [`seal_package`].
pub fn seal_package_with(
    root: &Utf8Path,
    layout: &PackageLayout,
    key: std::result::Result<SigningKeyPair, KeyMaterialError>,
) -> Result<SealReport> {
    layout.validate()?;
    match key {
        Ok(pair) => {
            let (artifacts, sidecars) = run(root, layout, Some(&pair))?;
            Ok(SealReport {
                outcome: SealOutcome::Signed {
                    public_key: pair.public_key_bytes(),
                },
                artifacts,
                sidecars,
            })
        }
        Err(reason) => {
            warn!("signing key unavailable, writing unsigned placeholders: {reason}");
            let (artifacts, sidecars) = run(root, layout, None)?;
            Ok(SealReport {
                outcome: SealOutcome::Unsigned { reason },
                artifacts,
                sidecars,
            })
        }
    }
}

fn run(
    root: &Utf8Path,
    layout: &PackageLayout,
    key: Option<&SigningKeyPair>,
) -> Result<(Vec<Utf8PathBuf>, usize)> {
    let runtime = layout.runtime_targets()?;
    let mut artifacts = Vec::with_capacity(runtime.len() + 1);

    if let Some(pair) = key {
        // Every member must exist before any artifact is touched.
        let subsets = runtime
            .iter()
            .map(|target| target.enumerate(root).map(|members| (target, members)))
            .collect::<Result<Vec<_>>>()?;
        for (target, members) in &subsets {
            artifacts.push(write_signed(root, pair, target, members)?);
        }
    } else {
        for target in &runtime {
            artifacts.push(write_placeholder(root, target)?);
        }
    }

    let mut sidecars = write_sidecars(root, &[layout.whole_tree_artifact.as_str()])?;

    let whole_tree = layout.whole_tree_target();
    let path = match key {
        Some(pair) => {
            let members = whole_tree.enumerate(root)?;
            write_signed(root, pair, &whole_tree, &members)?
        }
        None => write_placeholder(root, &whole_tree)?,
    };
    write_sidecar(&path)?;
    sidecars += 1;
    artifacts.push(path);

    Ok((artifacts, sidecars))
}

fn write_signed(
    root: &Utf8Path,
    pair: &SigningKeyPair,
    target: &SignatureTarget,
    members: &MemberSet,
) -> Result<Utf8PathBuf> {
    let signature = pair.sign_members(target.artifact(), members)?;
    let path = root.join(target.artifact());
    ArtifactContent::Signed(signature).write(&path)?;
    info!("signed {target} over {} members", members.len());
    Ok(path)
}

fn write_placeholder(root: &Utf8Path, target: &SignatureTarget) -> Result<Utf8PathBuf> {
    let path = root.join(target.artifact());
    ArtifactContent::Unsigned.write(&path)?;
    info!("wrote unsigned placeholder for {target}");
    Ok(path)
}

#[cfg(test)]
#[path = "signer_tests.rs"]
mod tests;
