//! `modseal` CLI entrypoint.
//!
//! Thin orchestration over the library: resolve the layout and key source,
//! seal or verify the package, and print a summary on stderr.

use camino::Utf8Path;
use clap::Parser;
use ed25519_dalek::PUBLIC_KEY_LENGTH;
use modseal::cli::{Cli, Command, SealArgs, VerifyArgs};
use modseal::error::SealError;
use modseal::layout::PackageLayout;
use modseal::output::{seal_summary, verify_summary, write_stderr_line};
use modseal::signer::{SealOutcome, seal_package};
use modseal::verify::{VerifyError, verify_package};
use std::fs;
use std::io::Write;
use thiserror::Error;

/// Errors returned by the CLI.
#[derive(Debug, Error)]
enum CliError {
    /// Sealing failed.
    #[error("{0}")]
    Seal(#[from] SealError),

    /// The package did not verify.
    #[error("{0}")]
    Verify(#[from] VerifyError),

    /// The package directory does not exist.
    #[error("package directory not found: {0}")]
    NotADirectory(String),

    /// The pinned public key file is unusable.
    #[error("public key {path} must hold {PUBLIC_KEY_LENGTH} raw bytes")]
    InvalidPublicKey {
        /// Path of the key file.
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let exit_code = exit_code_for_run_result(run(&cli, &mut stderr), &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<(), CliError> {
    match &cli.command {
        Command::Seal(args) => run_seal(args, stderr),
        Command::Verify(args) => run_verify(args, stderr),
    }
}

fn run_seal(args: &SealArgs, stderr: &mut dyn Write) -> Result<(), CliError> {
    ensure_directory(&args.package_dir)?;
    let layout = load_layout(args.layout.as_deref())?;
    let report = seal_package(&args.package_dir, &layout, &args.key_source())?;

    // The unsigned notice is shown even in quiet mode.
    if let SealOutcome::Unsigned { reason } = &report.outcome {
        if args.quiet {
            write_stderr_line(stderr, format!("warning: package left unsigned: {reason}"));
        }
    }
    if !args.quiet {
        for line in seal_summary(&report) {
            write_stderr_line(stderr, line);
        }
    }
    Ok(())
}

fn run_verify(args: &VerifyArgs, stderr: &mut dyn Write) -> Result<(), CliError> {
    ensure_directory(&args.package_dir)?;
    let layout = load_layout(args.layout.as_deref())?;
    let pinned = args
        .public_key
        .as_deref()
        .map(read_public_key)
        .transpose()?;
    let report = verify_package(&args.package_dir, &layout, pinned.as_ref())?;
    if !args.quiet {
        for line in verify_summary(&args.package_dir, &report) {
            write_stderr_line(stderr, line);
        }
    }
    Ok(())
}

fn ensure_directory(path: &Utf8Path) -> Result<(), CliError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(CliError::NotADirectory(path.to_string()))
    }
}

fn load_layout(path: Option<&Utf8Path>) -> Result<PackageLayout, CliError> {
    match path {
        Some(path) => Ok(PackageLayout::load(path)?),
        None => Ok(PackageLayout::default()),
    }
}

fn read_public_key(path: &Utf8Path) -> Result<[u8; PUBLIC_KEY_LENGTH], CliError> {
    let bytes = fs::read(path).map_err(SealError::io("read", path))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| CliError::InvalidPublicKey {
            path: path.to_string(),
        })
}

fn exit_code_for_run_result(result: Result<(), CliError>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}
