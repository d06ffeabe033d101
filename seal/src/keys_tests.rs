//! Unit tests for key loading and streamed signing.

use super::*;
use crate::package::framing::frame_bytes;
use crate::package::logical_path::LogicalPath;
use crate::package::members::FileRecord;
use ed25519_dalek::{Signer, Verifier};
use rstest::{fixture, rstest};
use tempfile::TempDir;

const SEED: [u8; 32] = [7u8; 32];

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("temp dir creation succeeds")
}

fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf8 temp dir")
}

fn write_keys(dir: &Utf8Path, seed: [u8; 32]) {
    let key = SigningKey::from_bytes(&seed);
    fs::write(dir.join(PRIVATE_KEY_FILE), seed).expect("write private key");
    fs::write(dir.join(PUBLIC_KEY_FILE), key.verifying_key().to_bytes()).expect("write public");
}

#[rstest]
fn loads_pair_from_key_directory(temp_dir: TempDir) {
    let root = utf8_root(&temp_dir);
    write_keys(&root, SEED);

    let pair = KeySource::Directory(root).load().expect("key material");
    let expected = SigningKey::from_bytes(&SEED).verifying_key().to_bytes();
    assert_eq!(pair.public_key_bytes(), expected);
}

#[rstest]
fn public_key_file_is_optional(temp_dir: TempDir) {
    let root = utf8_root(&temp_dir);
    fs::write(root.join(PRIVATE_KEY_FILE), SEED).expect("write");
    assert!(KeySource::Directory(root).load().is_ok());
}

#[rstest]
fn absent_private_key_is_reported_as_missing(temp_dir: TempDir) {
    let root = utf8_root(&temp_dir);
    let err = KeySource::Directory(root.clone())
        .load()
        .expect_err("no key material");
    assert!(
        matches!(err, KeyMaterialError::Missing { ref path } if *path == root.join(PRIVATE_KEY_FILE))
    );
}

#[rstest]
fn truncated_private_key_is_rejected(temp_dir: TempDir) {
    let root = utf8_root(&temp_dir);
    fs::write(root.join(PRIVATE_KEY_FILE), [1u8; 31]).expect("write");
    let err = KeySource::Directory(root).load().expect_err("short key");
    assert!(matches!(
        err,
        KeyMaterialError::InvalidLength {
            expected: 32,
            actual: 31,
            ..
        }
    ));
}

#[rstest]
fn mismatching_public_key_is_rejected(temp_dir: TempDir) {
    let root = utf8_root(&temp_dir);
    write_keys(&root, SEED);
    let other = SigningKey::from_bytes(&[9u8; 32]).verifying_key().to_bytes();
    fs::write(root.join(PUBLIC_KEY_FILE), other).expect("overwrite public key");

    let err = KeySource::Directory(root).load().expect_err("mismatch");
    assert!(matches!(err, KeyMaterialError::PublicKeyMismatch { .. }));
}

#[rstest]
fn explicit_files_source_uses_given_paths(temp_dir: TempDir) {
    let root = utf8_root(&temp_dir);
    let private_key = root.join("release.key");
    fs::write(&private_key, SEED).expect("write");
    let source = KeySource::Files {
        private_key: private_key.clone(),
        public_key: None,
    };
    assert_eq!(source.private_key_path(), private_key);
    assert!(source.public_key_path().is_none());
    assert!(source.load().is_ok());
}

#[rstest]
fn streamed_signature_equals_plain_ed25519(temp_dir: TempDir) {
    let root = utf8_root(&temp_dir);
    fs::write(root.join("module.prop"), b"A").expect("write");
    fs::write(root.join("service.sh"), b"D").expect("write");

    let mut members = MemberSet::new();
    for name in ["service.sh", "module.prop"] {
        members
            .insert(FileRecord::identity(name).expect("record").resolved(&root))
            .expect("insert");
    }

    let pair = SigningKeyPair::from_seed(SEED);
    let artifact = pair.sign_members("test.sig", &members).expect("sign");

    let message = [
        frame_bytes(&LogicalPath::new("module.prop").expect("valid"), b"A"),
        frame_bytes(&LogicalPath::new("service.sh").expect("valid"), b"D"),
    ]
    .concat();
    let key = SigningKey::from_bytes(&SEED);
    assert_eq!(artifact.signature(), &key.sign(&message));
    key.verifying_key()
        .verify(&message, artifact.signature())
        .expect("signature verifies over the framed stream");
}

#[rstest]
fn unreadable_member_surfaces_io_error(temp_dir: TempDir) {
    let root = utf8_root(&temp_dir);
    let mut members = MemberSet::new();
    members
        .insert(FileRecord::identity("module.prop").expect("record").resolved(&root))
        .expect("insert");

    let err = SigningKeyPair::from_seed(SEED)
        .sign_members("test.sig", &members)
        .expect_err("member is absent");
    assert!(matches!(err, SealError::Io { .. }));
}

#[test]
fn debug_output_hides_secret() {
    let rendered = format!("{:?}", SigningKeyPair::from_seed(SEED));
    assert!(rendered.contains("public_key"));
    assert!(!rendered.contains(&hex::encode(SEED)));
}
