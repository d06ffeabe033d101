//! Signing and integrity sealing for privileged module packages.
//!
//! A sealed package carries one Ed25519 signature per CPU architecture over
//! the files the runtime loads (`machikado.*`), a SHA-256 sidecar next to
//! every file, and a final signature over the whole tree (`misaki.sig`).
//! All signatures cover a canonical framed stream of members ordered by
//! logical name, so a verifier can replay it without the build environment.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`error`] - Fatal sealing errors
//! - [`keys`] - Key material loading and streamed signing
//! - [`layout`] - Package layout configuration
//! - [`output`] - Summary formatting for the CLI
//! - [`package`] - Member naming, enumeration, framing, and digests
//! - [`signer`] - Sealing orchestration with unsigned fallback
//! - `test_support` - Sample packages for tests (feature `test-support`)
//! - [`verify`] - Build-side verification of sealed packages

pub mod cli;
pub mod error;
pub mod keys;
pub mod layout;
pub mod output;
pub mod package;
pub mod signer;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod verify;
