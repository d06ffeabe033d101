//! Package contents: naming, enumeration, framing, and digests.
//!
//! # Sub-modules
//!
//! - [`abi`] - Architecture variants and name templates (`AbiVariant`).
//! - [`artifact`] - Signature artifact encoding (`ArtifactContent`).
//! - [`digest`] - SHA-256 sidecars (`Sha256Digest`).
//! - [`framing`] - Canonical framing of members into a signed stream.
//! - [`logical_path`] - Normalized member names (`LogicalPath`).
//! - [`members`] - File records and ordered member sets (`MemberSet`).
//! - [`target`] - Signature targets and member enumeration.
//! - [`tree`] - Deterministic traversal of the package tree.

pub mod abi;
pub mod artifact;
pub mod digest;
pub mod framing;
pub mod logical_path;
pub mod members;
pub mod target;
pub mod tree;
