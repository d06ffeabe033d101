//! Behaviour-driven tests for build-side verification.
//!
//! Packages are sealed with the deterministic test key and then checked with
//! `verify::verify_package`, replaying the runtime verifier's rules.

use camino::Utf8PathBuf;
use ed25519_dalek::PUBLIC_KEY_LENGTH;
use modseal::keys::{KeyMaterialError, SigningKeyPair};
use modseal::layout::PackageLayout;
use modseal::signer::seal_package_with;
use modseal::test_support::{TEST_SEED, write_file, write_sample_package};
use modseal::verify::{TargetStatus, VerifyError, VerifyReport, verify_package, verify_sidecars};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

struct VerificationWorld {
    _temp_dir: TempDir,
    root: Utf8PathBuf,
    pinned: Option<[u8; PUBLIC_KEY_LENGTH]>,
    report: Option<VerifyReport>,
    error: Option<VerifyError>,
}

#[fixture]
fn world() -> VerificationWorld {
    let temp_dir = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("utf8 temp dir");
    write_sample_package(&root).expect("sample package");
    VerificationWorld {
        _temp_dir: temp_dir,
        root,
        pinned: None,
        report: None,
        error: None,
    }
}

#[given("a package sealed with the test key")]
fn given_signed_package(world: &mut VerificationWorld) {
    seal_package_with(
        &world.root,
        &PackageLayout::default(),
        Ok(SigningKeyPair::from_seed(TEST_SEED)),
    )
    .expect("sealing succeeds");
    world.pinned = Some(SigningKeyPair::from_seed(TEST_SEED).public_key_bytes());
}

#[given("a package sealed without key material")]
fn given_unsigned_package(world: &mut VerificationWorld) {
    let reason = KeyMaterialError::Missing {
        path: world.root.join("private_key"),
    };
    seal_package_with(&world.root, &PackageLayout::default(), Err(reason))
        .expect("unsigned sealing succeeds");
}

#[given("the content of \"{path}\" is changed")]
fn given_content_changed(world: &mut VerificationWorld, path: String) {
    write_file(&world.root, &path, b"tampered").expect("tamper");
}

#[given("every artifact is emptied")]
fn given_artifacts_emptied(world: &mut VerificationWorld) {
    let layout = PackageLayout::default();
    for artifact in layout.artifact_names() {
        write_file(&world.root, artifact, b"").expect("empty artifact");
    }
}

#[when("the package is verified")]
fn when_verified(world: &mut VerificationWorld) {
    match verify_package(&world.root, &PackageLayout::default(), world.pinned.as_ref()) {
        Ok(report) => world.report = Some(report),
        Err(e) => world.error = Some(e),
    }
}

#[when("the sidecars are checked")]
fn when_sidecars_checked(world: &mut VerificationWorld) {
    if let Err(e) = verify_sidecars(&world.root) {
        world.error = Some(e);
    }
}

#[then("verification succeeds with {count} signed artifacts")]
fn then_succeeds(world: &mut VerificationWorld, count: usize) {
    let report = world.report.as_ref().expect("verification succeeded");
    let signed = report
        .targets
        .iter()
        .filter(|(_, status)| matches!(status, TargetStatus::Verified { .. }))
        .count();
    assert_eq!(signed, count);
    assert_eq!(report.targets.len(), 5);
}

#[then("verification fails with a signature mismatch in \"{artifact}\"")]
fn then_signature_mismatch(world: &mut VerificationWorld, artifact: String) {
    match world.error.as_ref().expect("verification failed") {
        VerifyError::SignatureMismatch { artifact: found } => assert_eq!(found, &artifact),
        other => panic!("expected SignatureMismatch, got {other}"),
    }
}

#[then("verification fails because \"{artifact}\" is unsigned")]
fn then_unsigned_artifact(world: &mut VerificationWorld, artifact: String) {
    match world.error.as_ref().expect("verification failed") {
        VerifyError::UnsignedArtifact { artifact: found } => assert_eq!(found, &artifact),
        other => panic!("expected UnsignedArtifact, got {other}"),
    }
}

#[then("verification fails with a digest mismatch")]
fn then_digest_mismatch(world: &mut VerificationWorld) {
    assert!(matches!(
        world.error.as_ref().expect("verification failed"),
        VerifyError::DigestMismatch { .. }
    ));
}

#[scenario(
    path = "tests/features/verification.feature",
    name = "A freshly sealed package verifies"
)]
fn scenario_fresh_package(world: VerificationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/verification.feature",
    name = "A tampered runtime member is rejected"
)]
fn scenario_tampered_member(world: VerificationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/verification.feature",
    name = "A rewritten file without a fresh sidecar is rejected"
)]
fn scenario_stale_sidecar(world: VerificationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/verification.feature",
    name = "An unsigned package reports placeholders"
)]
fn scenario_unsigned_package(world: VerificationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/verification.feature",
    name = "Emptied artifacts do not satisfy a pinned key"
)]
fn scenario_emptied_artifacts(world: VerificationWorld) {
    let _ = world;
}
