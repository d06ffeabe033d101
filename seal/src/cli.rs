//! CLI argument definitions for `modseal`.

use crate::keys::{KeySource, PRIVATE_KEY_ENV};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Sign and seal a finished module package.
#[derive(Parser, Debug)]
#[command(name = "modseal")]
#[command(version, about)]
#[command(long_about = concat!(
    "Sign and seal a finished module package.\n\n",
    "`seal` writes one Ed25519 signature per architecture over the files the ",
    "runtime loads, a SHA-256 sidecar next to every file, and a final signature ",
    "over the whole tree. Without a usable private key the same artifacts are ",
    "written empty and the package is reported as unsigned.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Seal a package with keys from a directory:\n",
    "    $ modseal seal build/module --key-dir ~/.config/modseal\n\n",
    "  Check a sealed package against a pinned key:\n",
    "    $ modseal verify build/module --public-key ~/.config/modseal/public_key",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write signature artifacts and digest sidecars.
    Seal(SealArgs),

    /// Check artifacts and sidecars of a sealed package.
    Verify(VerifyArgs),
}

/// Arguments for the seal command.
#[derive(Args, Debug, Clone, Default)]
pub struct SealArgs {
    /// Finished package directory.
    #[arg(value_name = "DIR")]
    pub package_dir: Utf8PathBuf,

    /// Directory holding `private_key` and optionally `public_key`.
    #[arg(long, value_name = "DIR")]
    pub key_dir: Option<Utf8PathBuf>,

    /// Raw 32-byte Ed25519 seed file; takes precedence over `--key-dir`.
    #[arg(long, value_name = "FILE", env = PRIVATE_KEY_ENV)]
    pub private_key: Option<Utf8PathBuf>,

    /// Package layout file [default: built-in release layout].
    #[arg(long, value_name = "FILE")]
    pub layout: Option<Utf8PathBuf>,

    /// Suppress progress output (errors still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the verify command.
#[derive(Args, Debug, Clone, Default)]
pub struct VerifyArgs {
    /// Sealed package directory.
    #[arg(value_name = "DIR")]
    pub package_dir: Utf8PathBuf,

    /// Package layout file [default: built-in release layout].
    #[arg(long, value_name = "FILE")]
    pub layout: Option<Utf8PathBuf>,

    /// Raw 32-byte public key every artifact must embed.
    #[arg(long, value_name = "FILE")]
    pub public_key: Option<Utf8PathBuf>,

    /// Suppress progress output (errors still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

impl SealArgs {
    /// Where to look for key material.
    ///
    /// An explicit private key wins over the key directory; with neither,
    /// the current directory is used as the key directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use modseal::cli::SealArgs;
    /// use modseal::keys::KeySource;
    ///
    /// let args = SealArgs {
    ///     key_dir: Some(Utf8PathBuf::from("keys")),
    ///     ..SealArgs::default()
    /// };
    /// assert_eq!(args.key_source(), KeySource::Directory(Utf8PathBuf::from("keys")));
    /// ```
    #[must_use]
    pub fn key_source(&self) -> KeySource {
        match (&self.private_key, &self.key_dir) {
            (Some(private_key), _) => KeySource::Files {
                private_key: private_key.clone(),
                public_key: None,
            },
            (None, Some(dir)) => KeySource::Directory(dir.clone()),
            (None, None) => KeySource::Directory(Utf8PathBuf::from(".")),
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
