//! CPU architecture variants covered by runtime-subset signatures.
//!
//! Each variant names the Android ABI directory used in logical names, the
//! artifact it produces, and its word size. The word size decides which
//! installed binaries (`lib64/`, `zygiskd64`, ...) supply the content.

use serde::Deserialize;
use std::fmt;

/// Word size of an ABI variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u8")]
pub enum Bitness {
    /// 32-bit userspace.
    Bits32,
    /// 64-bit userspace.
    Bits64,
}

impl Bitness {
    /// Suffix appended to installed binary names (`"32"` or `"64"`).
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Bits32 => "32",
            Self::Bits64 => "64",
        }
    }

    /// Installed library directory for this word size.
    #[must_use]
    pub const fn library_dir(self) -> &'static str {
        match self {
            Self::Bits32 => "lib",
            Self::Bits64 => "lib64",
        }
    }
}

impl TryFrom<u8> for Bitness {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            32 => Ok(Self::Bits32),
            64 => Ok(Self::Bits64),
            other => Err(format!("unsupported word size {other}; expected 32 or 64")),
        }
    }
}

impl fmt::Display for Bitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.suffix())
    }
}

/// One architecture that receives its own runtime-subset signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AbiVariant {
    /// ABI directory name, e.g. `arm64-v8a`.
    pub name: String,
    /// File name of the signature artifact, e.g. `machikado.arm64`.
    pub artifact: String,
    /// Word size selecting the installed binaries.
    pub bits: Bitness,
}

impl AbiVariant {
    /// Create a variant.
    pub fn new(name: impl Into<String>, artifact: impl Into<String>, bits: Bitness) -> Self {
        Self {
            name: name.into(),
            artifact: artifact.into(),
            bits,
        }
    }

    /// The four variants shipped in a release package.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("arm64-v8a", "machikado.arm64", Bitness::Bits64),
            Self::new("armeabi-v7a", "machikado.arm", Bitness::Bits32),
            Self::new("x86_64", "machikado.x86_64", Bitness::Bits64),
            Self::new("x86", "machikado.x86", Bitness::Bits32),
        ]
    }

    /// Expand `{abi}`, `{bits}` and `{libdir}` placeholders in `template`.
    #[must_use]
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("{abi}", &self.name)
            .replace("{bits}", self.bits.suffix())
            .replace("{libdir}", self.bits.library_dir())
    }
}

impl fmt::Display for AbiVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.bits)
    }
}
