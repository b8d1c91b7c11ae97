use dupescan::catalog::{CatalogBackend, CatalogError, StoreKind};
use dupescan::duplicates::{DuplicateFinder, FinderConfig, FinderError, ScanPhase, ScanWarning};
use dupescan::scanner::{FileEntry, HashError, ScanError};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_missing_candidates_become_warnings() {
    let finder = DuplicateFinder::with_defaults();
    let file1 = FileEntry::new(PathBuf::from("nonexistent_1.txt"), 100);
    let file2 = FileEntry::new(PathBuf::from("nonexistent_2.txt"), 100);

    let (groups, summary) = finder
        .find_duplicates_from_files(vec![file1, file2])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.failed_files, 2);
    assert_eq!(summary.warnings.len(), 2);
    for warning in &summary.warnings {
        assert!(
            matches!(warning, ScanWarning::Hash(HashError::NotFound(_))),
            "unexpected warning: {warning:?}"
        );
    }
}

#[test]
fn test_walker_errors_do_not_stop_traversal() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"same").unwrap();
    fs::write(&b, b"same").unwrap();

    let entries = vec![
        Ok(FileEntry::new(a.clone(), 4)),
        Err(ScanError::PermissionDenied(dir.path().join("locked"))),
        Ok(FileEntry::new(b.clone(), 4)),
    ];

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates_from_entries(entries).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].paths(), vec![a, b]);
    assert_eq!(summary.total_files, 2);
    assert_eq!(summary.warnings.len(), 1);
    assert_eq!(summary.warnings[0].phase(), ScanPhase::Traverse);
    assert_eq!(
        summary.warnings[0].path(),
        Some(dir.path().join("locked").as_path())
    );
}

#[test]
fn test_repeated_location_is_skipped() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    fs::write(&a, b"x").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder
        .find_duplicates_from_files(vec![FileEntry::new(a.clone(), 1), FileEntry::new(a, 1)])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
    assert_eq!(summary.hashed_files, 0);
    assert!(matches!(
        summary.warnings[0],
        ScanWarning::Catalog(CatalogError::DuplicateKey(_))
    ));
}

#[cfg(unix)]
#[test]
fn test_non_utf8_path_skipped_by_sqlite() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let bad = PathBuf::from("/d").join(OsStr::from_bytes(b"bad\xff"));
    let finder = DuplicateFinder::new(FinderConfig::default().with_backend(CatalogBackend {
        kind: StoreKind::Sqlite,
        db_path: None,
    }));

    let (_, summary) = finder
        .find_duplicates_from_files(vec![
            FileEntry::new(bad, 1),
            FileEntry::new(PathBuf::from("/d/good"), 2),
        ])
        .unwrap();

    assert_eq!(summary.total_files, 1);
    assert!(matches!(
        summary.warnings[0],
        ScanWarning::Catalog(CatalogError::UnrepresentablePath(_))
    ));
}

#[test]
fn test_shutdown_discards_scan() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();

    let flag = Arc::new(AtomicBool::new(true));
    let finder = DuplicateFinder::new(FinderConfig::default().with_shutdown_flag(flag));

    let result = finder.find_duplicates(dir.path());

    assert!(matches!(result, Err(FinderError::Interrupted)));
}

#[test]
fn test_sqlite_database_removed_after_interrupt() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    let db_dir = tempdir().unwrap();
    let db_path = db_dir.path().join("files.db");

    let flag = Arc::new(AtomicBool::new(true));
    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_shutdown_flag(flag)
            .with_backend(CatalogBackend {
                kind: StoreKind::Sqlite,
                db_path: Some(db_path.clone()),
            }),
    );

    assert!(finder.find_duplicates(dir.path()).is_err());
    assert!(!db_path.exists());
}
