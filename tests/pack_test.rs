//! Pack request validation and archive creation

use sha2::{Digest, Sha256};
use std::fs;
use tempfile::tempdir;
use zstdwcx::archive::single_item;
use zstdwcx::{
    codes, pack_file, ArchiveError, ArchiveHandle, CompressionLevel, PackOptions, ProgressGate,
    Settings,
};

#[test]
fn test_item_count_validation_at_every_level() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("never.zst");

    for level in 1..=19 {
        let options = PackOptions::with_level(CompressionLevel::clamped(level));
        let none: [&str; 0] = [];

        let err = pack_file(&archive, dir.path(), &none, &options, &mut ProgressGate::always_continue())
            .unwrap_err();
        assert_eq!(err.host_code(), codes::E_NO_FILES);

        let err = pack_file(&archive, dir.path(), &["a", "b"], &options, &mut ProgressGate::always_continue())
            .unwrap_err();
        assert_eq!(err.host_code(), codes::E_TOO_MANY_FILES);
    }
    assert!(!archive.exists());
}

#[test]
fn test_empty_item_name_counts_as_no_items() {
    assert!(matches!(single_item(&[String::new()]), Err(ArchiveError::NoItems)));
}

#[test]
fn test_existing_archive_is_left_byte_identical() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("input.txt"), b"fresh content").unwrap();

    let archive = dir.path().join("input.txt.zst");
    let original = b"previous archive bytes".to_vec();
    fs::write(&archive, &original).unwrap();
    let before = hex::encode(Sha256::digest(&original));

    let err = pack_file(
        &archive,
        dir.path(),
        &["input.txt"],
        &PackOptions::default(),
        &mut ProgressGate::always_continue(),
    )
    .unwrap_err();
    assert!(matches!(err, ArchiveError::CreateError(_)));
    assert_eq!(err.host_code(), codes::E_ECREATE);

    let after = hex::encode(Sha256::digest(fs::read(&archive).unwrap()));
    assert_eq!(before, after);
}

#[test]
fn test_missing_source_creates_no_archive() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("ghost.zst");
    let err = pack_file(
        &archive,
        dir.path(),
        &["ghost.txt"],
        &PackOptions::default(),
        &mut ProgressGate::always_continue(),
    )
    .unwrap_err();
    assert_eq!(err.host_code(), codes::E_EREAD);
    assert!(!archive.exists());
}

#[test]
fn test_item_may_name_a_subdirectory_path() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested").join("deep.txt"), b"deep").unwrap();

    let archive = dir.path().join("deep.txt.zst");
    pack_file(
        &archive,
        dir.path(),
        &["nested/deep.txt"],
        &PackOptions::default(),
        &mut ProgressGate::always_continue(),
    )
    .unwrap();

    let handle = ArchiveHandle::open(&archive).unwrap();
    assert_eq!(handle.metadata().entry_name, "deep.txt");
}

#[test]
fn test_higher_levels_do_not_grow_output() {
    let dir = tempdir().unwrap();
    let text: Vec<u8> = (0..200_000u32)
        .flat_map(|i| format!("record {} value {}\n", i % 977, i % 13).into_bytes())
        .collect();
    fs::write(dir.path().join("table.csv"), &text).unwrap();

    let mut sizes = Vec::new();
    for level in [1, 19] {
        let archive = dir.path().join(format!("table.{}.zst", level));
        pack_file(
            &archive,
            dir.path(),
            &["table.csv"],
            &PackOptions::with_level(CompressionLevel::clamped(level)),
            &mut ProgressGate::always_continue(),
        )
        .unwrap();
        sizes.push(fs::metadata(&archive).unwrap().len());
    }
    assert!(sizes[1] <= sizes[0], "{:?}", sizes);
}

#[test]
fn test_stored_level_is_clamped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("zstdwcx.toml");

    for (stored, effective) in [(0, 1), (-3, 1), (20, 19), (7, 7)] {
        Settings { compression_level: stored }.save(&path).unwrap();
        assert_eq!(Settings::load(&path).level().get(), effective);
    }
}
