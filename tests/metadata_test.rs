//! Entry metadata and single-pass enumeration

use std::fs;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;
use zstdwcx::{
    can_handle, pack_file, ArchiveError, ArchiveHandle, PackOptions, PackedDateTime,
    ProgressGate, UNKNOWN_SIZE,
};

#[test]
fn test_metadata_once_then_end_of_archive() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("report.txt.zst");
    fs::write(&archive, zstd::bulk::compress(b"quarterly numbers", 3).unwrap()).unwrap();

    let mut handle = ArchiveHandle::open(&archive).unwrap();
    let meta = handle.read_metadata().unwrap();
    assert_eq!(meta.archive_name, "report.txt.zst");
    assert_eq!(meta.entry_name, "report.txt");
    assert_eq!(meta.packed_size, fs::metadata(&archive).unwrap().len());
    assert_eq!(meta.unpacked_size, Some(17));

    assert!(matches!(handle.read_metadata(), Err(ArchiveError::EndOfArchive)));
    assert!(matches!(handle.read_metadata(), Err(ArchiveError::EndOfArchive)));

    // Cached metadata stays readable
    assert_eq!(handle.metadata(), &meta);
}

#[test]
fn test_streamed_archive_reports_unknown_not_zero() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("stream.log"), b"line\n".repeat(10_000)).unwrap();
    let archive = dir.path().join("stream.log.zst");
    pack_file(
        &archive,
        dir.path(),
        &["stream.log"],
        &PackOptions::default(),
        &mut ProgressGate::always_continue(),
    )
    .unwrap();

    let meta = ArchiveHandle::open(&archive).unwrap().read_metadata().unwrap();
    assert!(meta.unpacked_size.is_none());
    assert_eq!(meta.unpacked_size_raw(), UNKNOWN_SIZE);
    assert_eq!(meta.unpacked_size_split(), (u32::MAX, u32::MAX));
}

#[test]
fn test_leading_skippable_frame_reports_unknown_size() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("tagged.txt.zst");

    let mut bytes = 0x184D_2A50u32.to_le_bytes().to_vec();
    bytes.extend_from_slice(&4u32.to_le_bytes());
    bytes.extend_from_slice(b"tag!");
    bytes.extend(zstd::encode_all(&b"hello world, not empty"[..], 3).unwrap());
    fs::write(&archive, bytes).unwrap();

    let mut handle = ArchiveHandle::open(&archive).unwrap();
    let meta = handle.read_metadata().unwrap();
    assert_eq!(meta.unpacked_size, None);
    assert_eq!(meta.unpacked_size_raw(), UNKNOWN_SIZE);

    handle.set_progress_gate(ProgressGate::always_continue());
    assert_eq!(handle.process(zstdwcx::ProcessOp::Test, None).unwrap(), 22);
}

#[test]
fn test_declared_zero_size_is_exact() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("empty.zst");
    fs::write(&archive, zstd::bulk::compress(b"", 3).unwrap()).unwrap();

    let meta = ArchiveHandle::open(&archive).unwrap().read_metadata().unwrap();
    assert_eq!(meta.unpacked_size, Some(0));
    assert_eq!(meta.unpacked_size_raw(), 0);
}

#[test]
fn test_entry_name_edge_cases() {
    let dir = tempdir().unwrap();
    let payload = zstd::bulk::compress(b"x", 3).unwrap();

    for (file, entry) in [("noext", "noext"), (".hidden", ".hidden"), ("a.b.zst", "a.b")] {
        let archive = dir.path().join(file);
        fs::write(&archive, &payload).unwrap();
        let meta = ArchiveHandle::open(&archive).unwrap().read_metadata().unwrap();
        assert_eq!(meta.archive_name, file);
        assert_eq!(meta.entry_name, entry);
    }
}

#[test]
fn test_file_time_comes_from_archive_mtime() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("dated.zst");
    fs::write(&archive, zstd::bulk::compress(b"dated", 3).unwrap()).unwrap();

    let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    fs::File::options()
        .write(true)
        .open(&archive)
        .unwrap()
        .set_modified(mtime)
        .unwrap();

    let meta = ArchiveHandle::open(&archive).unwrap().read_metadata().unwrap();
    assert_eq!(meta.file_time, PackedDateTime::from_system_time(mtime));
    let (year, ..) = meta.file_time.unpack();
    assert!((2023..=2024).contains(&year));
}

#[test]
fn test_open_rejects_non_archives() {
    let dir = tempdir().unwrap();
    let empty = dir.path().join("empty.zst");
    fs::write(&empty, b"").unwrap();
    let text = dir.path().join("text.zst");
    fs::write(&text, b"plain text pretending to be compressed").unwrap();

    assert!(matches!(ArchiveHandle::open(&empty), Err(ArchiveError::OpenFailed(_))));
    assert!(matches!(ArchiveHandle::open(&text), Err(ArchiveError::OpenFailed(_))));
    assert!(matches!(
        ArchiveHandle::open(dir.path().join("missing.zst")),
        Err(ArchiveError::OpenFailed(_))
    ));

    assert!(!can_handle(&empty));
    assert!(!can_handle(&text));
}
