//! Output formatting for the `modseal` CLI.
//!
//! Formatting is kept in pure functions so summaries can be unit tested
//! without capturing process output.

use crate::signer::{SealOutcome, SealReport};
use crate::verify::{TargetStatus, VerifyReport};
use camino::Utf8Path;
use std::fmt::Display;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Describe a finished sealing run.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use modseal::keys::KeyMaterialError;
/// use modseal::output::seal_summary;
/// use modseal::signer::{SealOutcome, SealReport};
///
/// let report = SealReport {
///     outcome: SealOutcome::Unsigned {
///         reason: KeyMaterialError::Missing {
///             path: Utf8PathBuf::from("keys/private_key"),
///         },
///     },
///     artifacts: vec![Utf8PathBuf::from("out/misaki.sig")],
///     sidecars: 3,
/// };
/// let lines = seal_summary(&report);
/// assert!(lines[0].starts_with("UNSIGNED"));
/// ```
#[must_use]
pub fn seal_summary(report: &SealReport) -> Vec<String> {
    let mut lines = Vec::with_capacity(report.artifacts.len() + 2);
    lines.push(match &report.outcome {
        SealOutcome::Signed { public_key } => {
            format!("Signed with public key {}", hex::encode(public_key))
        }
        SealOutcome::Unsigned { reason } => {
            format!("UNSIGNED package: {reason}")
        }
    });
    lines.extend(report.artifacts.iter().map(|path| format!("  {path}")));
    let plural = if report.sidecars == 1 { "sidecar" } else { "sidecars" };
    lines.push(format!("Wrote {} digest {plural}", report.sidecars));
    lines
}

/// Describe a successful verification.
#[must_use]
pub fn verify_summary(root: &Utf8Path, report: &VerifyReport) -> Vec<String> {
    let mut lines = Vec::with_capacity(report.targets.len() + 1);
    for (artifact, status) in &report.targets {
        lines.push(match status {
            TargetStatus::Verified { public_key } => {
                format!("  {artifact}: verified ({})", hex::encode(public_key))
            }
            TargetStatus::Unsigned => format!("  {artifact}: unsigned placeholder"),
        });
    }
    lines.push(format!(
        "{root}: {} artifacts, {} digests intact",
        report.targets.len(),
        report.sidecars
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyMaterialError;
    use camino::Utf8PathBuf;
    use rstest::rstest;

    #[test]
    fn write_stderr_line_appends_newline() {
        let mut buffer = Vec::new();
        write_stderr_line(&mut buffer, "sealed");
        assert_eq!(buffer, b"sealed\n");
    }

    #[test]
    fn signed_summary_lists_key_and_artifacts() {
        let report = SealReport {
            outcome: SealOutcome::Signed {
                public_key: [0xab; 32],
            },
            artifacts: vec![
                Utf8PathBuf::from("out/machikado.arm64"),
                Utf8PathBuf::from("out/misaki.sig"),
            ],
            sidecars: 12,
        };
        let lines = seal_summary(&report);
        assert_eq!(
            lines,
            [
                format!("Signed with public key {}", "ab".repeat(32)),
                "  out/machikado.arm64".to_owned(),
                "  out/misaki.sig".to_owned(),
                "Wrote 12 digest sidecars".to_owned(),
            ]
        );
    }

    #[rstest]
    #[case(1, "Wrote 1 digest sidecar")]
    #[case(0, "Wrote 0 digest sidecars")]
    fn sidecar_count_is_pluralised(#[case] sidecars: usize, #[case] expected: &str) {
        let report = SealReport {
            outcome: SealOutcome::Unsigned {
                reason: KeyMaterialError::Missing {
                    path: Utf8PathBuf::from("private_key"),
                },
            },
            artifacts: Vec::new(),
            sidecars,
        };
        assert_eq!(seal_summary(&report).last().map(String::as_str), Some(expected));
    }

    #[test]
    fn verify_summary_marks_placeholders() {
        let report = VerifyReport {
            targets: vec![
                ("machikado.arm".to_owned(), TargetStatus::Unsigned),
                (
                    "misaki.sig".to_owned(),
                    TargetStatus::Verified {
                        public_key: [1; 32],
                    },
                ),
            ],
            sidecars: 4,
        };
        let lines = verify_summary(Utf8Path::new("out"), &report);
        assert_eq!(lines.first().map(String::as_str), Some("  machikado.arm: unsigned placeholder"));
        assert!(lines.get(1).is_some_and(|line| line.contains(&"01".repeat(32))));
        assert_eq!(lines.last().map(String::as_str), Some("out: 2 artifacts, 4 digests intact"));
    }
}
