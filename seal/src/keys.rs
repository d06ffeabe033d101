//! Loading Ed25519 key material and streaming signatures.
//!
//! Key material lives outside the package: a `private_key` file holding the
//! raw 32-byte secret seed and an optional `public_key` file holding the raw
//! 32-byte public key. Any problem with it is a [`KeyMaterialError`], which
//! never aborts a build; the signer switches to unsigned placeholders.

use crate::error::{Result, SealError};
use crate::package::artifact::SignatureArtifact;
use crate::package::framing::frame_members;
use crate::package::members::MemberSet;
use camino::{Utf8Path, Utf8PathBuf};
use ed25519_dalek::hazmat::{ExpandedSecretKey, raw_sign_byupdate};
use ed25519_dalek::{PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH, SignatureError, SigningKey};
use log::warn;
use sha2::{Digest, Sha512};
use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use thiserror::Error;

/// File name of the secret seed inside a key directory.
pub const PRIVATE_KEY_FILE: &str = "private_key";

/// File name of the public key inside a key directory.
pub const PUBLIC_KEY_FILE: &str = "public_key";

/// Environment variable naming the private key file.
pub const PRIVATE_KEY_ENV: &str = "MODSEAL_PRIVATE_KEY";

/// Reasons key material could not be used. Never fatal.
#[derive(Debug, Error)]
pub enum KeyMaterialError {
    /// No private key file exists at the expected location.
    #[error("no private key found at {path}")]
    Missing {
        /// Where the private key was looked for.
        path: Utf8PathBuf,
    },

    /// A key file exists but cannot be read.
    #[error("cannot read key file {path}: {source}")]
    Unreadable {
        /// Path of the unreadable file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A key file does not hold exactly 32 raw bytes.
    #[error("key file {path} must hold {expected} raw bytes, found {actual}")]
    InvalidLength {
        /// Path of the malformed file.
        path: Utf8PathBuf,
        /// Required length.
        expected: usize,
        /// Observed length.
        actual: usize,
    },

    /// The stored public key does not belong to the private key.
    #[error("public key {path} does not match the private key")]
    PublicKeyMismatch {
        /// Path of the mismatching public key file.
        path: Utf8PathBuf,
    },
}

/// Where to look for key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// A directory containing `private_key` and optionally `public_key`.
    Directory(Utf8PathBuf),
    /// Explicit key file paths.
    Files {
        /// Path of the raw secret seed.
        private_key: Utf8PathBuf,
        /// Optional path of the raw public key, checked against the seed.
        public_key: Option<Utf8PathBuf>,
    },
}

impl KeySource {
    /// Path of the private key this source points at.
    #[must_use]
    pub fn private_key_path(&self) -> Utf8PathBuf {
        match self {
            Self::Directory(dir) => dir.join(PRIVATE_KEY_FILE),
            Self::Files { private_key, .. } => private_key.clone(),
        }
    }

    /// Path of the public key this source points at, if any.
    #[must_use]
    pub fn public_key_path(&self) -> Option<Utf8PathBuf> {
        match self {
            Self::Directory(dir) => Some(dir.join(PUBLIC_KEY_FILE)),
            Self::Files { public_key, .. } => public_key.clone(),
        }
    }

    /// Load the keypair.
    ///
    /// A public key file that does not exist is ignored; one that exists
    /// must match the key derived from the seed. With explicit files and no
    /// public key, a `public_key` beside the seed is not consulted and a
    /// warning is logged.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyMaterialError`] describing why signing is unavailable.
    pub fn load(&self) -> std::result::Result<SigningKeyPair, KeyMaterialError> {
        let private_path = self.private_key_path();
        let seed = read_key_file(&private_path, SECRET_KEY_LENGTH)?;
        let mut secret = [0u8; SECRET_KEY_LENGTH];
        secret.copy_from_slice(&seed);
        let pair = SigningKeyPair::from_seed(secret);

        match self.public_key_path() {
            Some(public_path) if public_path.exists() => {
                let stored = read_key_file(&public_path, PUBLIC_KEY_LENGTH)?;
                if stored != pair.public_key_bytes() {
                    return Err(KeyMaterialError::PublicKeyMismatch { path: public_path });
                }
            }
            Some(_) => {}
            None => warn_unchecked_sibling(&private_path),
        }
        Ok(pair)
    }
}

fn warn_unchecked_sibling(private_path: &Utf8Path) {
    let sibling = private_path.with_file_name(PUBLIC_KEY_FILE);
    if sibling != private_path && sibling.is_file() {
        warn!("ignoring {sibling}: only a public key passed explicitly is checked against {private_path}");
    }
}

/// Read a raw key file of exactly `expected` bytes.
fn read_key_file(
    path: &Utf8Path,
    expected: usize,
) -> std::result::Result<Vec<u8>, KeyMaterialError> {
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            KeyMaterialError::Missing {
                path: path.to_owned(),
            }
        } else {
            KeyMaterialError::Unreadable {
                path: path.to_owned(),
                source,
            }
        }
    })?;
    if bytes.len() == expected {
        Ok(bytes)
    } else {
        Err(KeyMaterialError::InvalidLength {
            path: path.to_owned(),
            expected,
            actual: bytes.len(),
        })
    }
}

/// An Ed25519 keypair held only for the duration of a build.
pub struct SigningKeyPair {
    signing: SigningKey,
}

impl SigningKeyPair {
    /// Derive the keypair from a raw 32-byte seed.
    #[must_use]
    pub fn from_seed(seed: [u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing: SigningKey::from_bytes(&seed),
        }
    }

    /// The raw public key embedded in every artifact.
    #[must_use]
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.signing.verifying_key().to_bytes()
    }

    /// Sign the framed stream of `members`.
    ///
    /// Ed25519 hashes the message twice, so the members are framed twice,
    /// straight from disk, and never held in memory as a whole.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::Io`] if a member cannot be read, or
    /// [`SealError::Signing`] if the backend rejects the stream.
    pub fn sign_members(&self, artifact: &str, members: &MemberSet) -> Result<SignatureArtifact> {
        let expanded = ExpandedSecretKey::from(self.signing.as_bytes());
        let verifying = self.signing.verifying_key();
        let failure: RefCell<Option<SealError>> = RefCell::new(None);

        let signed = raw_sign_byupdate::<Sha512, _>(
            &expanded,
            |context: &mut Sha512| {
                frame_members(members, &mut DigestWriter(context)).map_err(|err| {
                    failure.replace(Some(err));
                    SignatureError::new()
                })
            },
            &verifying,
        );

        match signed {
            Ok(signature) => Ok(SignatureArtifact::new(signature, verifying.to_bytes())),
            Err(err) => Err(failure.into_inner().unwrap_or_else(|| SealError::Signing {
                artifact: artifact.to_owned(),
                reason: err.to_string(),
            })),
        }
    }
}

impl std::fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("public_key", &hex::encode(self.public_key_bytes()))
            .finish_non_exhaustive()
    }
}

/// Adapts a running hash so framed bytes can be written into it.
struct DigestWriter<'a, D: Digest>(&'a mut D);

impl<D: Digest> Write for DigestWriter<'_, D> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "keys_tests.rs"]
mod tests;
