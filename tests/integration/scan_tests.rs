use dupescan::catalog::{CatalogBackend, StoreKind};
use dupescan::duplicates::{DuplicateFinder, FinderConfig, FinderError, ScanPhase, ScanWarning};
use dupescan::progress::ProgressCallback;
use dupescan::scanner::{FileEntry, HashError, Walker, WalkerConfig};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.hashed_files, 0);
}

#[test]
fn test_identical_pair_and_unique_file() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"hello");
    write(&dir.path().join("b.txt"), b"hello");
    write(&dir.path().join("c.txt"), b"unique content");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups[0].paths(),
        vec![dir.path().join("a.txt"), dir.path().join("b.txt")]
    );
    assert_eq!(groups[0].size, 5);
    assert_eq!(groups[0].hash, *blake3::hash(b"hello").as_bytes());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.size_candidates, 2);
    assert_eq!(summary.eliminated_by_size, 1);
    assert_eq!(summary.hashed_files, 2);
    assert_eq!(summary.reclaimable_space, 5);
    assert!(!summary.has_warnings());
}

#[test]
fn test_all_distinct_sizes_hash_nothing() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"1");
    write(&dir.path().join("b"), b"22");
    write(&dir.path().join("c"), b"333");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.size_candidates, 0);
    assert_eq!(summary.hashed_files, 0);
}

#[test]
fn test_same_size_different_content() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"xxxxxxxxxx");
    write(&dir.path().join("b"), b"zzzzzzzzzz");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.size_candidates, 2);
    assert_eq!(summary.hashed_files, 2);
}

#[test]
fn test_file_removed_after_traversal() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"same");
    write(&dir.path().join("b"), b"same");
    write(&dir.path().join("gone"), b"same");

    let entries: Vec<_> = Walker::new(dir.path(), WalkerConfig::default())
        .walk()
        .collect();
    fs::remove_file(dir.path().join("gone")).unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates_from_entries(entries).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups[0].paths(),
        vec![dir.path().join("a"), dir.path().join("b")]
    );
    assert_eq!(summary.failed_files, 1);
    assert_eq!(summary.warnings.len(), 1);
    assert!(matches!(
        summary.warnings[0],
        ScanWarning::Hash(HashError::NotFound(_))
    ));
    assert_eq!(summary.warnings[0].phase(), ScanPhase::Hash);
}

#[test]
fn test_nested_directories_and_empty_files() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    write(&dir.path().join("a.txt"), b"dup");
    write(&sub.join("b.txt"), b"dup");
    write(&dir.path().join("empty1"), b"");
    write(&sub.join("empty2"), b"");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(summary.total_files, 4);
    assert_eq!(groups.len(), 2);
    let sizes: Vec<u64> = groups.iter().map(|g| g.size).collect();
    assert!(sizes.contains(&0));
    assert!(sizes.contains(&3));
}

#[test]
fn test_gitignore_in_tree_does_not_hide_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join(".gitignore"), b"*.bin\n");
    write(&dir.path().join("a.bin"), b"same");
    write(&dir.path().join("b.bin"), b"same");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(summary.total_files, 3);
    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups[0].paths(),
        vec![dir.path().join("a.bin"), dir.path().join("b.bin")]
    );
    assert!(!summary.has_warnings());
}

#[test]
fn test_dot_files_cataloged_by_default() {
    let dir = tempdir().unwrap();
    let hidden_dir = dir.path().join(".cache");
    fs::create_dir(&hidden_dir).unwrap();
    write(&dir.path().join(".hidden"), b"dot");
    write(&hidden_dir.join("copy"), b"dot");
    write(&dir.path().join("visible"), b"other!");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(summary.total_files, 3);
    assert_eq!(groups.len(), 1);
    let paths = groups[0].paths();
    assert_eq!(paths.len(), 2);
    assert!(paths.contains(&dir.path().join(".hidden")));
    assert!(paths.contains(&hidden_dir.join("copy")));
}

#[test]
fn test_repeat_scan_is_identical() {
    let dir = tempdir().unwrap();
    for i in 0..6 {
        write(&dir.path().join(format!("f{i}")), format!("{}", i % 2).as_bytes());
    }

    let finder = DuplicateFinder::with_defaults();
    let (first, _) = finder.find_duplicates(dir.path()).unwrap();
    let (second, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[test]
fn test_sqlite_backend_matches_memory() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"one");
    write(&dir.path().join("b"), b"one");
    write(&dir.path().join("c"), b"two");
    write(&dir.path().join("d"), b"two");
    write(&dir.path().join("e"), b"six");

    let memory = DuplicateFinder::with_defaults();
    let db_dir = tempdir().unwrap();
    let db_path = db_dir.path().join("files.db");
    let sqlite = DuplicateFinder::new(FinderConfig::default().with_backend(CatalogBackend {
        kind: StoreKind::Sqlite,
        db_path: Some(db_path.clone()),
    }));

    let (expected, _) = memory.find_duplicates(dir.path()).unwrap();
    let (actual, _) = sqlite.find_duplicates(dir.path()).unwrap();

    assert_eq!(expected, actual);
    assert_eq!(actual.len(), 2);
    assert!(!db_path.exists());
}

#[test]
fn test_single_io_thread() {
    let dir = tempdir().unwrap();
    for i in 0..10 {
        write(&dir.path().join(format!("f{i}")), b"same bytes");
    }

    let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(1));
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 10);
    assert_eq!(summary.duplicate_files, 9);
}

#[test]
fn test_missing_root() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let result = finder.find_duplicates(&dir.path().join("nope"));

    assert!(matches!(result, Err(FinderError::PathNotFound(_))));
}

#[test]
fn test_root_is_a_file() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file");
    write(&file, b"x");

    let result = DuplicateFinder::with_defaults().find_duplicates(&file);

    assert!(matches!(result, Err(FinderError::NotADirectory(_))));
}

#[test]
fn test_find_duplicates_from_files() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    write(&a, b"abc");
    write(&b, b"abc");

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder
        .find_duplicates_from_files(vec![FileEntry::new(a.clone(), 3), FileEntry::new(b.clone(), 3)])
        .unwrap();

    assert_eq!(groups[0].paths(), vec![a, b]);
}

#[derive(Default)]
struct RecordingProgress {
    phases: Mutex<Vec<ScanPhase>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_phase_start(&self, phase: ScanPhase, _total: usize) {
        self.phases.lock().unwrap().push(phase);
    }
    fn on_progress(&self, _current: usize, _path: &str) {}
    fn on_phase_end(&self, _phase: ScanPhase) {}
}

#[test]
fn test_phases_run_in_order() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"1");
    write(&dir.path().join("b"), b"1");

    let progress = Arc::new(RecordingProgress::default());
    let finder =
        DuplicateFinder::new(FinderConfig::default().with_progress_callback(progress.clone()));
    finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(*progress.phases.lock().unwrap(), ScanPhase::ALL.to_vec());
}

#[test]
fn test_walker_entries_are_absolute_children() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("x"), b"1");

    let entries: Vec<PathBuf> = Walker::new(dir.path(), WalkerConfig::default())
        .walk()
        .map(|e| e.unwrap().path)
        .collect();

    assert_eq!(entries, vec![dir.path().join("x")]);
}
