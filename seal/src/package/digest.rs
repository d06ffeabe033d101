//! SHA-256 digest sidecars for every file in a package tree.
//!
//! Each regular file `<path>` gets a companion `<path>.sha256` holding the
//! lowercase hex digest of its content and nothing else. Sidecars are
//! independent of the signature scheme and allow quick corruption checks.

use super::tree::regular_files;
use crate::error::{Result, SealError};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::Read;

/// File name suffix of a digest sidecar.
pub const SIDECAR_SUFFIX: &str = ".sha256";

/// Block size used when streaming file content into the hasher.
const DIGEST_BLOCK_SIZE: usize = 4096;

/// Expected length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// A validated lowercase hex-encoded SHA-256 digest.
///
/// # Examples
///
/// ```
/// use modseal::package::digest::Sha256Digest;
///
/// let hex = "a".repeat(64);
/// let digest: Sha256Digest = hex.as_str().try_into().unwrap();
/// assert_eq!(digest.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a finished hasher output; always valid by construction.
    fn from_hasher(hasher: Sha256) -> Self {
        Self(hex::encode(hasher.finalize()))
    }
}

impl TryFrom<&str> for Sha256Digest {
    type Error = DigestFormatError;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        validate_sha256(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A string that is not a well-formed lowercase SHA-256 hex digest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid SHA-256 digest: {reason}")]
pub struct DigestFormatError {
    /// Description of the validation failure.
    pub reason: String,
}

/// Validate that `value` is a well-formed hex-encoded SHA-256 digest.
fn validate_sha256(value: &str) -> std::result::Result<(), DigestFormatError> {
    if value.len() != DIGEST_HEX_LEN {
        return Err(DigestFormatError {
            reason: format!(
                "expected {DIGEST_HEX_LEN} hex characters, got {}",
                value.len()
            ),
        });
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(DigestFormatError {
            reason: format!("non-hex character '{bad}'"),
        });
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(DigestFormatError {
            reason: "digest must be lowercase".to_owned(),
        });
    }
    Ok(())
}

/// Compute the SHA-256 digest of a file, reading it in fixed-size blocks.
///
/// # Errors
///
/// Returns [`SealError::Io`] if the file cannot be read.
pub fn compute_sha256(path: &Utf8Path) -> Result<Sha256Digest> {
    let mut file = fs::File::open(path).map_err(SealError::io("open", path))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; DIGEST_BLOCK_SIZE];
    loop {
        let bytes_read = file.read(&mut buffer).map_err(SealError::io("read", path))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(Sha256Digest::from_hasher(hasher))
}

/// Whether `path` names a digest sidecar.
#[must_use]
pub fn is_sidecar(path: &Utf8Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.ends_with(SIDECAR_SUFFIX))
}

/// Return the sidecar path for `path` (`<path>.sha256`).
#[must_use]
pub fn sidecar_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut sidecar = path.as_str().to_owned();
    sidecar.push_str(SIDECAR_SUFFIX);
    Utf8PathBuf::from(sidecar)
}

/// Hash `path` and write its sidecar, returning the sidecar path.
///
/// # Errors
///
/// Returns [`SealError::Io`] if the file cannot be read or the sidecar
/// cannot be written.
pub fn write_sidecar(path: &Utf8Path) -> Result<Utf8PathBuf> {
    let digest = compute_sha256(path)?;
    let sidecar = sidecar_path(path);
    fs::write(&sidecar, digest.as_str()).map_err(SealError::io("write", &sidecar))?;
    debug!("{sidecar}: {digest}");
    Ok(sidecar)
}

/// Read and validate an existing sidecar.
///
/// # Errors
///
/// Returns [`SealError::Io`] if the sidecar cannot be read, or
/// [`SealError::InvalidLayout`] if it does not hold a well-formed digest.
pub fn read_sidecar(path: &Utf8Path) -> Result<Sha256Digest> {
    let sidecar = sidecar_path(path);
    let contents = fs::read_to_string(&sidecar).map_err(SealError::io("read", &sidecar))?;
    Sha256Digest::try_from(contents.as_str()).map_err(|e| SealError::InvalidLayout {
        reason: format!("{sidecar}: {e}"),
    })
}

/// Write a sidecar for every regular file under `root`.
///
/// Existing sidecars and the files at the root-relative paths in
/// `excluded` are not hashed. Existing sidecars for hashed files are overwritten, so repeated
/// runs over unchanged content are idempotent. Returns the number of
/// sidecars written.
///
/// # Errors
///
/// Returns [`SealError::Io`] on any traversal, read, or write failure.
pub fn write_sidecars(root: &Utf8Path, excluded: &[&str]) -> Result<usize> {
    let mut written = 0;
    for path in digest_candidates(root, excluded)? {
        write_sidecar(&path)?;
        written += 1;
    }
    Ok(written)
}

/// Files under `root` that carry a sidecar.
///
/// `excluded` holds paths relative to `root`; a file with the same name
/// elsewhere in the tree is still a candidate.
///
/// # Errors
///
/// Returns [`SealError::Io`] if the tree cannot be traversed.
pub fn digest_candidates(root: &Utf8Path, excluded: &[&str]) -> Result<Vec<Utf8PathBuf>> {
    let files = regular_files(root)?;
    Ok(files
        .into_iter()
        .filter(|path| !is_sidecar(path))
        .filter(|path| {
            !path
                .strip_prefix(root)
                .is_ok_and(|relative| excluded.contains(&relative.as_str()))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    const EMPTY_SHA256: &str = concat!(
        "e3b0c44298fc1c149afbf4c8996fb924",
        "27ae41e4649b934ca495991b7852b855"
    );

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("temp dir creation succeeds")
    }

    fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf8 temp dir")
    }

    #[test]
    fn accepts_valid_sixty_four_char_hex() {
        assert!(Sha256Digest::try_from("a".repeat(64).as_str()).is_ok());
    }

    #[rstest]
    #[case::too_short("abcdef".to_owned())]
    #[case::too_long("a".repeat(65))]
    #[case::non_hex(format!("{}g", "a".repeat(63)))]
    #[case::uppercase("A".repeat(64))]
    fn rejects_malformed_digests(#[case] value: String) {
        assert!(Sha256Digest::try_from(value.as_str()).is_err());
    }

    #[rstest]
    fn compute_sha256_of_known_content(temp_dir: TempDir) {
        let path = utf8_root(&temp_dir).join("empty.bin");
        fs::write(&path, b"").expect("write");
        let digest = compute_sha256(&path).expect("sha256 succeeds");
        assert_eq!(digest.as_str(), EMPTY_SHA256);
    }

    #[rstest]
    fn compute_sha256_spans_multiple_blocks(temp_dir: TempDir) {
        let path = utf8_root(&temp_dir).join("large.bin");
        let content = vec![0x5a_u8; DIGEST_BLOCK_SIZE * 2 + 1];
        fs::write(&path, &content).expect("write");
        let expected = hex::encode(Sha256::digest(&content));
        assert_eq!(compute_sha256(&path).expect("sha256").as_str(), expected);
    }

    #[test]
    fn sidecar_path_appends_suffix() {
        assert_eq!(
            sidecar_path(Utf8Path::new("/pkg/lib/x86/libzygisk.so")),
            Utf8PathBuf::from("/pkg/lib/x86/libzygisk.so.sha256")
        );
    }

    #[rstest]
    fn sidecar_contains_only_lowercase_hex(temp_dir: TempDir) {
        let path = utf8_root(&temp_dir).join("module.prop");
        fs::write(&path, b"").expect("write");
        let sidecar = write_sidecar(&path).expect("sidecar");
        assert_eq!(fs::read_to_string(sidecar).expect("read"), EMPTY_SHA256);
    }

    #[rstest]
    fn write_sidecars_skips_sidecars_and_excluded_names(temp_dir: TempDir) {
        let root = utf8_root(&temp_dir);
        fs::create_dir_all(root.join("bin")).expect("mkdir");
        fs::write(root.join("module.prop"), b"A").expect("write");
        fs::write(root.join("bin/zygiskd64"), b"G").expect("write");
        fs::write(root.join("misaki.sig"), b"").expect("write");
        fs::write(root.join("stale.sha256"), b"junk").expect("write");

        let written = write_sidecars(&root, &["misaki.sig"]).expect("sidecars");
        assert_eq!(written, 2);
        assert!(root.join("module.prop.sha256").is_file());
        assert!(root.join("bin/zygiskd64.sha256").is_file());
        assert!(!root.join("misaki.sig.sha256").exists());
        assert!(!root.join("stale.sha256.sha256").exists());
    }

    #[rstest]
    fn exclusion_applies_only_at_the_given_path(temp_dir: TempDir) {
        let root = utf8_root(&temp_dir);
        fs::create_dir_all(root.join("webroot")).expect("mkdir");
        fs::write(root.join("misaki.sig"), b"").expect("write");
        fs::write(root.join("webroot/misaki.sig"), b"asset").expect("write");

        let candidates = digest_candidates(&root, &["misaki.sig"]).expect("walk");
        assert_eq!(candidates, vec![root.join("webroot/misaki.sig")]);
    }

    #[rstest]
    fn write_sidecars_is_idempotent(temp_dir: TempDir) {
        let root = utf8_root(&temp_dir);
        fs::write(root.join("service.sh"), b"D").expect("write");

        write_sidecars(&root, &[]).expect("first run");
        let first = fs::read(root.join("service.sh.sha256")).expect("read");
        write_sidecars(&root, &[]).expect("second run");
        let second = fs::read(root.join("service.sh.sha256")).expect("read");
        assert_eq!(first, second);
    }

    #[rstest]
    fn read_sidecar_round_trips_written_digest(temp_dir: TempDir) {
        let path = utf8_root(&temp_dir).join("sepolicy.rule");
        fs::write(&path, b"B").expect("write");
        write_sidecar(&path).expect("sidecar");
        let stored = read_sidecar(&path).expect("read sidecar");
        assert_eq!(stored, compute_sha256(&path).expect("sha256"));
    }
}
