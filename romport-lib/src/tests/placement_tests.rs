use super::*;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn setup() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("archive").join("Zelda.nes");
    fs::create_dir_all(source.parent().unwrap()).unwrap();
    fs::write(&source, b"NES\x1a rom data").unwrap();
    (dir, source)
}

#[cfg(unix)]
#[test]
fn test_symlink_created_and_verified() {
    let (dir, source) = setup();
    let dest = dir.path().join("dest").join("roms").join("nes").join("Zelda.nes");

    let outcome = place(&source, &dest, PlacementMode::Symlink, false, false);
    let PlacementOutcome::Created(decision) = outcome else {
        panic!("expected Created, got {outcome:?}");
    };
    assert_eq!(decision.action, PlacementAction::Create);
    assert!(fs::symlink_metadata(&dest).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_link(&dest).unwrap(), source);
    assert_eq!(fs::read(&dest).unwrap(), b"NES\x1a rom data");
}

#[test]
fn test_copy_preserves_mtime() {
    let (dir, source) = setup();
    let past = FileTime::from_system_time(SystemTime::now() - Duration::from_secs(86_400 * 30));
    filetime::set_file_mtime(&source, past).unwrap();
    let dest = dir.path().join("dest").join("Zelda.nes");

    let outcome = place(&source, &dest, PlacementMode::Copy, false, false);
    assert!(matches!(outcome, PlacementOutcome::Created(_)));
    let meta = fs::metadata(&dest).unwrap();
    assert!(!meta.file_type().is_symlink());
    assert_eq!(FileTime::from_last_modification_time(&meta).unix_seconds(), past.unix_seconds());
}

#[test]
fn test_existing_destination_is_skipped() {
    let (dir, source) = setup();
    let dest = dir.path().join("Zelda.nes");
    fs::write(&dest, b"user data").unwrap();

    let outcome = place(&source, &dest, PlacementMode::Copy, false, false);
    let PlacementOutcome::Skipped(decision) = outcome else {
        panic!("expected Skipped, got {outcome:?}");
    };
    assert_eq!(decision.action, PlacementAction::SkipExisting);
    assert_eq!(fs::read(&dest).unwrap(), b"user data");
}

#[test]
fn test_force_overwrites() {
    let (dir, source) = setup();
    let dest = dir.path().join("Zelda.nes");
    fs::write(&dest, b"stale").unwrap();

    let outcome = place(&source, &dest, PlacementMode::Copy, true, false);
    let PlacementOutcome::Created(decision) = outcome else {
        panic!("expected Created, got {outcome:?}");
    };
    assert_eq!(decision.action, PlacementAction::Overwrite);
    assert_eq!(fs::read(&dest).unwrap(), b"NES\x1a rom data");
}

#[test]
fn test_force_never_removes_directory() {
    let (dir, source) = setup();
    let dest = dir.path().join("Zelda.nes");
    fs::create_dir_all(dest.join("keep")).unwrap();

    let outcome = place(&source, &dest, PlacementMode::Copy, true, false);
    assert!(matches!(
        outcome,
        PlacementOutcome::Failed {
            error: PlacementError::DestinationIsDirectory,
            ..
        }
    ));
    assert!(dest.join("keep").is_dir());
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_counts_as_existing() {
    let (dir, source) = setup();
    let dest = dir.path().join("Zelda.nes");
    std::os::unix::fs::symlink(dir.path().join("gone.nes"), &dest).unwrap();

    let outcome = place(&source, &dest, PlacementMode::Symlink, false, false);
    assert!(matches!(outcome, PlacementOutcome::Skipped(_)));

    let outcome = place(&source, &dest, PlacementMode::Symlink, true, false);
    assert!(matches!(outcome, PlacementOutcome::Created(_)));
    assert_eq!(fs::read_link(&dest).unwrap(), source);
}

#[test]
fn test_dry_run_touches_nothing() {
    let (dir, source) = setup();
    let dest = dir.path().join("dest").join("nes").join("Zelda.nes");

    let outcome = place(&source, &dest, PlacementMode::Symlink, false, true);
    let PlacementOutcome::Simulated(decision) = outcome else {
        panic!("expected Simulated, got {outcome:?}");
    };
    assert_eq!(decision.action, PlacementAction::Create);
    assert!(!dir.path().join("dest").exists());
}

#[test]
fn test_dry_run_matches_real_decision() {
    let (dir, source) = setup();
    let dest = dir.path().join("Zelda.nes");
    fs::write(&dest, b"existing").unwrap();

    let simulated = place(&source, &dest, PlacementMode::Copy, false, true);
    let real = place(&source, &dest, PlacementMode::Copy, false, false);
    assert_eq!(simulated.decision(), real.decision());
    assert!(simulated.decision().is_some());
}

#[test]
fn test_missing_source() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = place(
        &dir.path().join("nope.nes"),
        &dir.path().join("out.nes"),
        PlacementMode::Copy,
        false,
        false,
    );
    assert!(matches!(
        outcome,
        PlacementOutcome::Failed {
            error: PlacementError::SourceMissing,
            ..
        }
    ));
}

#[test]
fn test_source_directory_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = place(dir.path(), &dir.path().join("out"), PlacementMode::Copy, false, false);
    assert!(matches!(
        outcome,
        PlacementOutcome::Failed {
            error: PlacementError::SourceNotFile,
            ..
        }
    ));
}

#[cfg(unix)]
#[test]
fn test_parent_creation_failure_is_reported() {
    let (dir, source) = setup();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"file, not dir").unwrap();
    let dest = blocker.join("nes").join("Zelda.nes");

    let outcome = place(&source, &dest, PlacementMode::Copy, false, false);
    let PlacementOutcome::Failed { error, destination, .. } = outcome else {
        panic!("expected Failed");
    };
    assert!(matches!(error, PlacementError::CreateParent { .. }));
    assert_eq!(destination, dest);
}

#[cfg(unix)]
#[test]
fn test_privilege_error_mapping() {
    let eperm = io::Error::from_raw_os_error(1);
    assert!(PlacementError::from_symlink(eperm).is_privilege());
    let eacces = io::Error::from_raw_os_error(13);
    assert!(matches!(
        PlacementError::from_symlink(eacces),
        PlacementError::PermissionDenied(_)
    ));
}
