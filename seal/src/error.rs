//! Error types for package sealing.
//!
//! [`SealError`] covers the fatal failures that abort a sealing run. Missing
//! or unusable key material is not fatal and is modelled separately by
//! [`KeyMaterialError`](crate::keys::KeyMaterialError).

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that abort a sealing run.
#[derive(Debug, Error)]
pub enum SealError {
    /// A declared runtime member is absent from the package tree.
    #[error("runtime member {logical} is missing: expected a regular file at {path}")]
    MissingMember {
        /// Logical name of the member inside the signed stream.
        logical: String,
        /// Physical path that should have supplied its content.
        path: Utf8PathBuf,
    },

    /// Reading a member or writing an artifact failed.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        /// Short description of the failed operation ("read", "write", ...).
        operation: &'static str,
        /// Path the operation targeted.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The package layout violates a structural rule.
    #[error("invalid package layout: {reason}")]
    InvalidLayout {
        /// Description of the violated rule.
        reason: String,
    },

    /// The layout configuration file could not be parsed.
    #[error("invalid layout file {path}: {source}")]
    Config {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// The signing backend rejected the framed stream.
    #[error("signing {artifact} failed: {reason}")]
    Signing {
        /// Artifact that was being produced.
        artifact: String,
        /// Description reported by the signing backend.
        reason: String,
    },
}

impl SealError {
    /// Build a closure that wraps an I/O error with its operation and path.
    ///
    /// Intended for `map_err`, keeping call sites to a single line.
    pub fn io(
        operation: &'static str,
        path: impl Into<Utf8PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io {
            operation,
            path,
            source,
        }
    }
}

/// Result type alias using [`SealError`].
pub type Result<T> = std::result::Result<T, SealError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_member_names_logical_and_physical_path() {
        let err = SealError::MissingMember {
            logical: "lib/x86/libzygisk.so".to_owned(),
            path: Utf8PathBuf::from("/out/lib/libzygisk.so"),
        };
        let msg = err.to_string();
        assert!(msg.contains("lib/x86/libzygisk.so"));
        assert!(msg.contains("/out/lib/libzygisk.so"));
    }

    #[test]
    fn io_helper_preserves_source() {
        let err = SealError::io("write", "/out/misaki.sig")(std::io::Error::other("disk full"));
        let msg = err.to_string();
        assert!(msg.contains("write"));
        assert!(msg.contains("/out/misaki.sig"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn invalid_layout_includes_reason() {
        let err = SealError::InvalidLayout {
            reason: "no ABI variants declared".to_owned(),
        };
        assert!(err.to_string().contains("no ABI variants declared"));
    }
}
