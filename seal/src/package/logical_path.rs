//! Normalized logical names used inside the signed byte stream.
//!
//! A logical path always uses `/` as its separator, whatever the host
//! convention, and never contains a NUL byte (which would collide with the
//! frame terminator). Ordering is byte-wise on the normalized string, so
//! sorting a set of logical paths gives the same sequence on every machine.

use crate::error::{Result, SealError};
use camino::{Utf8Component, Utf8Path};
use std::borrow::Borrow;
use std::fmt;

/// A normalized, forward-slash logical file name.
///
/// # Examples
///
/// ```
/// use modseal::package::logical_path::LogicalPath;
///
/// let path = LogicalPath::new(r"lib\arm64-v8a\libzygisk.so").expect("valid");
/// assert_eq!(path.as_str(), "lib/arm64-v8a/libzygisk.so");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalPath(String);

impl LogicalPath {
    /// Normalize `raw` into a logical path.
    ///
    /// Backslashes become forward slashes, and leading `./` or `/` segments
    /// are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidLayout`] when the name is empty after
    /// normalization or contains a NUL byte.
    pub fn new(raw: &str) -> Result<Self> {
        let unified = raw.replace('\\', "/");
        let mut trimmed = unified.as_str();
        loop {
            if let Some(rest) = trimmed.strip_prefix("./") {
                trimmed = rest;
            } else if let Some(rest) = trimmed.strip_prefix('/') {
                trimmed = rest;
            } else {
                break;
            }
        }

        if trimmed.is_empty() {
            return Err(SealError::InvalidLayout {
                reason: format!("logical name \"{raw}\" is empty after normalization"),
            });
        }
        if trimmed.contains('\0') {
            return Err(SealError::InvalidLayout {
                reason: format!("logical name {raw:?} contains a NUL byte"),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Build a logical path from a path relative to the package root.
    ///
    /// Only normal components are kept, joined with `/`.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidLayout`] when no normal component remains.
    pub fn from_relative(relative: &Utf8Path) -> Result<Self> {
        let joined = relative
            .components()
            .filter_map(|component| match component {
                Utf8Component::Normal(part) => Some(part),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
        Self::new(&joined)
    }

    /// Return the logical path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the UTF-8 bytes that are written into a frame.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl AsRef<str> for LogicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LogicalPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("module.prop", "module.prop")]
    #[case::windows(r"bin\x86\zygiskd", "bin/x86/zygiskd")]
    #[case::dot_prefix("./service.sh", "service.sh")]
    #[case::absolute("/lib/x86/libzygisk.so", "lib/x86/libzygisk.so")]
    #[case::mixed(r".\lib/x86\libzygisk.so", "lib/x86/libzygisk.so")]
    fn normalizes_separators_and_prefixes(#[case] raw: &str, #[case] expected: &str) {
        let path = LogicalPath::new(raw).expect("valid logical path");
        assert_eq!(path.as_str(), expected);
    }

    #[rstest]
    #[case::empty("")]
    #[case::only_dots("./")]
    #[case::only_slash("/")]
    #[case::nul("module\0.prop")]
    fn rejects_degenerate_names(#[case] raw: &str) {
        assert!(LogicalPath::new(raw).is_err());
    }

    #[test]
    fn from_relative_joins_with_forward_slash() {
        let relative = Utf8Path::new("webroot").join("js").join("main.js");
        let path = LogicalPath::from_relative(&relative).expect("valid");
        assert_eq!(path.as_str(), "webroot/js/main.js");
    }

    #[test]
    fn ordering_is_bytewise_on_normalized_form() {
        let mut names = vec![
            LogicalPath::new("service.sh").expect("valid"),
            LogicalPath::new(r"lib\arm64-v8a\libzygisk.so").expect("valid"),
            LogicalPath::new("bin/arm64-v8a/zygiskd").expect("valid"),
            LogicalPath::new("module.prop").expect("valid"),
        ];
        names.sort();
        let ordered: Vec<&str> = names.iter().map(LogicalPath::as_str).collect();
        assert_eq!(
            ordered,
            [
                "bin/arm64-v8a/zygiskd",
                "lib/arm64-v8a/libzygisk.so",
                "module.prop",
                "service.sh",
            ]
        );
    }
}
