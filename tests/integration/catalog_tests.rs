//! Behaviour shared by every catalog backend.

use dupescan::catalog::{Catalog, CatalogError, MemoryCatalog, SqliteCatalog};
use std::path::{Path, PathBuf};

fn backends() -> Vec<(&'static str, Box<dyn Catalog>)> {
    vec![
        ("memory", Box::new(MemoryCatalog::new())),
        ("sqlite", Box::new(SqliteCatalog::open_in_memory().unwrap())),
    ]
}

fn digest(byte: u8) -> [u8; 32] {
    [byte; 32]
}

#[test]
fn test_insert_then_get() {
    for (name, mut catalog) in backends() {
        assert!(catalog.is_empty().unwrap(), "{name}");

        catalog.insert(Path::new("/a/one.txt"), 42).unwrap();
        let record = catalog.get(Path::new("/a/one.txt")).unwrap().unwrap();

        assert_eq!(record.path, PathBuf::from("/a/one.txt"), "{name}");
        assert_eq!(record.size, 42, "{name}");
        assert_eq!(record.hash, None, "{name}");
        assert_eq!(catalog.len().unwrap(), 1, "{name}");
        assert!(catalog.get(Path::new("/a/two.txt")).unwrap().is_none(), "{name}");
    }
}

#[test]
fn test_duplicate_key_leaves_original() {
    for (name, mut catalog) in backends() {
        catalog.insert(Path::new("/a/x"), 1).unwrap();

        let err = catalog.insert(Path::new("/a/x"), 2).unwrap_err();

        assert!(matches!(err, CatalogError::DuplicateKey(_)), "{name}");
        assert_eq!(catalog.get(Path::new("/a/x")).unwrap().unwrap().size, 1, "{name}");
        assert_eq!(catalog.len().unwrap(), 1, "{name}");
    }
}

#[test]
fn test_set_hash_rules() {
    for (name, mut catalog) in backends() {
        assert!(
            matches!(
                catalog.set_hash(Path::new("/nope"), digest(1)),
                Err(CatalogError::NotFound(_))
            ),
            "{name}"
        );

        catalog.insert(Path::new("/a/x"), 1).unwrap();
        catalog.set_hash(Path::new("/a/x"), digest(1)).unwrap();
        catalog.set_hash(Path::new("/a/x"), digest(1)).unwrap();

        assert!(
            matches!(
                catalog.set_hash(Path::new("/a/x"), digest(2)),
                Err(CatalogError::HashConflict { .. })
            ),
            "{name}"
        );
        assert_eq!(
            catalog.get(Path::new("/a/x")).unwrap().unwrap().hash,
            Some(digest(1)),
            "{name}"
        );
    }
}

#[test]
fn test_groupings_agree_across_backends() {
    let inserts = [
        ("/d/c", 30),
        ("/d/a", 10),
        ("/e/b", 10),
        ("/d/u", 99),
        ("/e/c", 30),
        ("/f/a", 10),
    ];
    let hashes = [
        ("/d/a", 5),
        ("/e/b", 9),
        ("/f/a", 5),
        ("/d/c", 1),
        ("/e/c", 1),
    ];

    let mut results = Vec::new();
    for (name, mut catalog) in backends() {
        for (path, size) in inserts {
            catalog.insert(Path::new(path), size).unwrap();
        }

        let sizes = catalog.group_by_size().unwrap();
        assert_eq!(sizes.len(), 2, "{name}");
        assert_eq!(sizes[0].size, 10, "{name}");
        assert_eq!(
            sizes[0].files.iter().map(|f| f.path.clone()).collect::<Vec<_>>(),
            vec![PathBuf::from("/d/a"), PathBuf::from("/e/b"), PathBuf::from("/f/a")],
            "{name}"
        );
        assert_eq!(sizes[1].size, 30, "{name}");

        for (path, byte) in hashes {
            catalog.set_hash(Path::new(path), digest(byte)).unwrap();
        }

        let groups = catalog.group_by_hash().unwrap();
        let flat: Vec<(String, Vec<PathBuf>)> = groups
            .iter()
            .map(|g| (g.hash_hex(), g.paths()))
            .collect();
        results.push(flat);
    }

    assert_eq!(results[0], results[1]);
    assert_eq!(results[0].len(), 2);
    assert_eq!(results[0][0].0, "01".repeat(32));
    assert_eq!(
        results[0][0].1,
        vec![PathBuf::from("/d/c"), PathBuf::from("/e/c")]
    );
    assert_eq!(
        results[0][1].1,
        vec![PathBuf::from("/d/a"), PathBuf::from("/f/a")]
    );
}

#[test]
fn test_queries_do_not_mutate() {
    for (name, mut catalog) in backends() {
        catalog.insert(Path::new("/a"), 1).unwrap();
        catalog.insert(Path::new("/b"), 1).unwrap();

        let first = catalog.group_by_size().unwrap();
        let second = catalog.group_by_size().unwrap();

        assert_eq!(first, second, "{name}");
        assert!(catalog.group_by_hash().unwrap().is_empty(), "{name}");
        assert_eq!(catalog.len().unwrap(), 2, "{name}");
    }
}
