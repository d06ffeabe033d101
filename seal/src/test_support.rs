//! Shared helpers for unit and behaviour tests.
//!
//! Builds the sample package tree used throughout the test suites: the four
//! common members hold `A` to `D`, the 64-bit installed binaries hold `E` to
//! `G`, and the 32-bit installed binaries hold `e` to `g`.

use crate::keys::{PRIVATE_KEY_FILE, PUBLIC_KEY_FILE};
use camino::Utf8Path;
use ed25519_dalek::SigningKey;
use std::fs;
use std::io;

/// Seed of the deterministic test key.
pub const TEST_SEED: [u8; 32] = [7u8; 32];

/// Files of the sample package and their contents.
pub const SAMPLE_FILES: &[(&str, &[u8])] = &[
    ("module.prop", b"A"),
    ("sepolicy.rule", b"B"),
    ("post-fs-data.sh", b"C"),
    ("service.sh", b"D"),
    ("lib64/libzygisk.so", b"E"),
    ("bin/zygisk-ptrace64", b"F"),
    ("bin/zygiskd64", b"G"),
    ("lib/libzygisk.so", b"e"),
    ("bin/zygisk-ptrace32", b"f"),
    ("bin/zygiskd32", b"g"),
    ("webroot/index.html", b"<html></html>"),
];

/// Write `content` to `root/relative`, creating parent directories.
///
/// # Errors
///
/// Returns any I/O error from creating directories or writing the file.
pub fn write_file(root: &Utf8Path, relative: &str, content: &[u8]) -> io::Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

/// Populate `root` with [`SAMPLE_FILES`].
///
/// # Errors
///
/// Returns the first I/O error encountered.
pub fn write_sample_package(root: &Utf8Path) -> io::Result<()> {
    SAMPLE_FILES
        .iter()
        .try_for_each(|(relative, content)| write_file(root, relative, content))
}

/// Write a key directory holding `seed` and its derived public key.
///
/// # Errors
///
/// Returns the first I/O error encountered.
pub fn write_key_dir(dir: &Utf8Path, seed: [u8; 32]) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let key = SigningKey::from_bytes(&seed);
    fs::write(dir.join(PRIVATE_KEY_FILE), seed)?;
    fs::write(dir.join(PUBLIC_KEY_FILE), key.verifying_key().to_bytes())
}
