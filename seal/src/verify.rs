//! Build-side verification of a sealed package.
//!
//! Replays enumeration and framing for every target exactly as the runtime
//! verifier does, checks each artifact's signature against the public key
//! embedded in it, and recomputes every digest sidecar. Mismatches are
//! reported, never repaired.

use crate::error::{Result, SealError};
use crate::layout::PackageLayout;
use crate::package::artifact::ArtifactContent;
use crate::package::digest::{compute_sha256, digest_candidates, read_sidecar, sidecar_path};
use crate::package::framing::frame_members;
use crate::package::members::MemberSet;
use crate::package::target::SignatureTarget;
use camino::{Utf8Path, Utf8PathBuf};
use ed25519_dalek::{PUBLIC_KEY_LENGTH, VerifyingKey};
use log::debug;
use thiserror::Error;

/// Reasons a sealed package fails verification.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The artifact's signature does not cover the current members.
    #[error("signature in {artifact} does not match the package contents")]
    SignatureMismatch {
        /// Artifact that failed.
        artifact: String,
    },

    /// The embedded public key is not a valid Ed25519 point.
    #[error("{artifact} embeds a malformed public key")]
    MalformedPublicKey {
        /// Artifact that failed.
        artifact: String,
    },

    /// The embedded public key differs from the expected one.
    #[error("{artifact} was signed by {found}, expected {expected}")]
    UnexpectedSigner {
        /// Artifact that failed.
        artifact: String,
        /// Hex of the expected public key.
        expected: String,
        /// Hex of the embedded public key.
        found: String,
    },

    /// A placeholder where a signature is required: a key is pinned, or
    /// other artifacts of the package are signed.
    #[error("{artifact} is unsigned")]
    UnsignedArtifact {
        /// Artifact that failed.
        artifact: String,
    },

    /// A file's content no longer matches its sidecar.
    #[error("digest mismatch for {path}: sidecar has {recorded}, content hashes to {actual}")]
    DigestMismatch {
        /// File whose sidecar is stale.
        path: Utf8PathBuf,
        /// Digest stored in the sidecar.
        recorded: String,
        /// Digest of the current content.
        actual: String,
    },

    /// A file has no sidecar.
    #[error("missing digest sidecar {path}")]
    MissingSidecar {
        /// Expected sidecar path.
        path: Utf8PathBuf,
    },

    /// Enumeration or file access failed.
    #[error(transparent)]
    Seal(#[from] SealError),
}

/// Verification state of one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    /// The signature verifies with the embedded public key.
    Verified {
        /// Embedded public key.
        public_key: [u8; PUBLIC_KEY_LENGTH],
    },
    /// The artifact is a zero-length placeholder.
    Unsigned,
}

/// Result of verifying a package.
#[derive(Debug, Default)]
pub struct VerifyReport {
    /// Artifact names with their status, whole tree last.
    pub targets: Vec<(String, TargetStatus)>,
    /// Number of sidecars checked.
    pub sidecars: usize,
}

impl VerifyReport {
    /// Whether every artifact carries a verified signature.
    #[must_use]
    pub fn is_fully_signed(&self) -> bool {
        self.targets
            .iter()
            .all(|(_, status)| matches!(status, TargetStatus::Verified { .. }))
    }
}

/// Verify every artifact and sidecar of the package at `root`.
///
/// When `expected_key` is given, every artifact must be signed and embed
/// it. Without a pinned key a package is either fully signed or fully
/// unsigned; a mix is rejected.
///
/// # Errors
///
/// Returns the first [`VerifyError`] encountered.
pub fn verify_package(
    root: &Utf8Path,
    layout: &PackageLayout,
    expected_key: Option<&[u8; PUBLIC_KEY_LENGTH]>,
) -> std::result::Result<VerifyReport, VerifyError> {
    layout.validate()?;
    let mut report = VerifyReport::default();

    let targets = layout
        .runtime_targets()?
        .into_iter()
        .chain(std::iter::once(layout.whole_tree_target()));
    for target in targets {
        let status = verify_target(root, &target, expected_key)?;
        debug!("{target}: {status:?}");
        report.targets.push((target.artifact().to_owned(), status));
    }

    let signed = report
        .targets
        .iter()
        .any(|(_, status)| matches!(status, TargetStatus::Verified { .. }));
    let unsigned = report
        .targets
        .iter()
        .find(|(_, status)| *status == TargetStatus::Unsigned);
    if let (true, Some((artifact, _))) = (signed, unsigned) {
        return Err(VerifyError::UnsignedArtifact {
            artifact: artifact.clone(),
        });
    }

    report.sidecars = verify_sidecars(root)?;
    Ok(report)
}

/// Verify one artifact against the current tree.
///
/// # Errors
///
/// Returns [`VerifyError::SignatureMismatch`] when any member's content,
/// mapping or order differs from what was signed, and
/// [`VerifyError::UnsignedArtifact`] for a placeholder while
/// `expected_key` is pinned.
pub fn verify_target(
    root: &Utf8Path,
    target: &SignatureTarget,
    expected_key: Option<&[u8; PUBLIC_KEY_LENGTH]>,
) -> std::result::Result<TargetStatus, VerifyError> {
    let artifact = match ArtifactContent::read(&root.join(target.artifact()))? {
        ArtifactContent::Unsigned if expected_key.is_some() => {
            return Err(VerifyError::UnsignedArtifact {
                artifact: target.artifact().to_owned(),
            });
        }
        ArtifactContent::Unsigned => return Ok(TargetStatus::Unsigned),
        ArtifactContent::Signed(artifact) => artifact,
    };

    if let Some(expected) = expected_key {
        if artifact.public_key() != expected {
            return Err(VerifyError::UnexpectedSigner {
                artifact: target.artifact().to_owned(),
                expected: hex::encode(expected),
                found: hex::encode(artifact.public_key()),
            });
        }
    }

    let key = VerifyingKey::from_bytes(artifact.public_key()).map_err(|_| {
        VerifyError::MalformedPublicKey {
            artifact: target.artifact().to_owned(),
        }
    })?;
    let members = target.enumerate(root)?;
    let message = framed_message(&members)?;
    key.verify_strict(&message, artifact.signature())
        .map_err(|_| VerifyError::SignatureMismatch {
            artifact: target.artifact().to_owned(),
        })?;
    Ok(TargetStatus::Verified {
        public_key: *artifact.public_key(),
    })
}

/// Check that every file under `root` has a sidecar matching its content.
///
/// Returns the number of sidecars checked.
///
/// # Errors
///
/// Returns [`VerifyError::MissingSidecar`] or [`VerifyError::DigestMismatch`]
/// for the first failing file.
pub fn verify_sidecars(root: &Utf8Path) -> std::result::Result<usize, VerifyError> {
    let candidates = digest_candidates(root, &[])?;
    for path in &candidates {
        let sidecar = sidecar_path(path);
        if !sidecar.is_file() {
            return Err(VerifyError::MissingSidecar { path: sidecar });
        }
        let recorded = read_sidecar(path)?;
        let actual = compute_sha256(path)?;
        if recorded != actual {
            return Err(VerifyError::DigestMismatch {
                path: path.clone(),
                recorded: recorded.to_string(),
                actual: actual.to_string(),
            });
        }
    }
    Ok(candidates.len())
}

// Strict verification needs the whole message.
fn framed_message(members: &MemberSet) -> Result<Vec<u8>> {
    let mut message = Vec::new();
    frame_members(members, &mut message)?;
    Ok(message)
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
