//! On-disk format of signature artifacts.
//!
//! A signed artifact is exactly 96 bytes: the 64-byte Ed25519 signature
//! followed by the 32-byte raw public key that produced it. No length
//! prefixes are stored because both parts have fixed sizes. An unsigned
//! build writes the same file with zero bytes.

use crate::error::{Result, SealError};
use camino::Utf8Path;
use ed25519_dalek::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH, Signature};
use std::fs;
use thiserror::Error;

/// Total length of a signed artifact.
pub const ARTIFACT_LENGTH: usize = SIGNATURE_LENGTH + PUBLIC_KEY_LENGTH;

/// Errors raised when decoding an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    /// The artifact is neither empty nor exactly [`ARTIFACT_LENGTH`] bytes.
    #[error("signature artifact must be 0 or {ARTIFACT_LENGTH} bytes, found {actual}")]
    InvalidLength {
        /// Observed length in bytes.
        actual: usize,
    },
}

/// A decoded signature plus the public key embedded after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureArtifact {
    signature: Signature,
    public_key: [u8; PUBLIC_KEY_LENGTH],
}

impl SignatureArtifact {
    /// Pair a signature with the public key that verifies it.
    #[must_use]
    pub const fn new(signature: Signature, public_key: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self {
            signature,
            public_key,
        }
    }

    /// The Ed25519 signature.
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The raw public key stored after the signature.
    #[must_use]
    pub const fn public_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.public_key
    }

    /// Encode as `signature ++ public_key`.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; ARTIFACT_LENGTH] {
        let mut bytes = [0u8; ARTIFACT_LENGTH];
        let (signature, public_key) = bytes.split_at_mut(SIGNATURE_LENGTH);
        signature.copy_from_slice(&self.signature.to_bytes());
        public_key.copy_from_slice(&self.public_key);
        bytes
    }
}

/// Content of an artifact file: either a placeholder or a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactContent {
    /// Zero-length placeholder from an unsigned build.
    Unsigned,
    /// A signature with its embedded public key.
    Signed(SignatureArtifact),
}

impl ArtifactContent {
    /// Decode raw artifact bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::InvalidLength`] for any length other than
    /// zero or [`ARTIFACT_LENGTH`].
    pub fn parse(bytes: &[u8]) -> std::result::Result<Self, ArtifactError> {
        if bytes.is_empty() {
            return Ok(Self::Unsigned);
        }
        let raw: &[u8; ARTIFACT_LENGTH] = bytes
            .try_into()
            .map_err(|_| ArtifactError::InvalidLength {
                actual: bytes.len(),
            })?;
        let (signature, public_key) = raw.split_at(SIGNATURE_LENGTH);
        let signature = Signature::from_slice(signature).map_err(|_| {
            ArtifactError::InvalidLength {
                actual: bytes.len(),
            }
        })?;
        let public_key: [u8; PUBLIC_KEY_LENGTH] =
            public_key
                .try_into()
                .map_err(|_| ArtifactError::InvalidLength {
                    actual: bytes.len(),
                })?;
        Ok(Self::Signed(SignatureArtifact::new(signature, public_key)))
    }

    /// Encode for writing to disk.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Unsigned => Vec::new(),
            Self::Signed(artifact) => artifact.to_bytes().to_vec(),
        }
    }

    /// Write the artifact to `path`, truncating any previous content.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::Io`] if the file cannot be written.
    pub fn write(&self, path: &Utf8Path) -> Result<()> {
        fs::write(path, self.to_bytes()).map_err(SealError::io("write", path))
    }

    /// Read and decode the artifact at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::Io`] if the file cannot be read and
    /// [`SealError::InvalidLayout`] if its length is wrong.
    pub fn read(path: &Utf8Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(SealError::io("read", path))?;
        Self::parse(&bytes).map_err(|e| SealError::InvalidLayout {
            reason: format!("{path}: {e}"),
        })
    }
}
