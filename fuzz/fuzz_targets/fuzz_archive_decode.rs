#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Write;
use tempfile::NamedTempFile;
use zstdwcx::host::adapter;
use zstdwcx::{codes, ArchiveHandle, ProcessOp, ProgressGate};

fuzz_target!(|data: &[u8]| {
    let mut temp_file = match NamedTempFile::new() {
        Ok(f) => f,
        Err(_) => return,
    };
    if temp_file.write_all(data).is_err() || temp_file.flush().is_err() {
        return;
    }
    let path = temp_file.path();

    // Direct session: open, enumerate, test - should never panic
    if let Ok(mut handle) = ArchiveHandle::open(path) {
        let _ = handle.read_metadata();
        let _ = handle.read_metadata();
        handle.set_progress_gate(ProgressGate::always_continue());
        let _ = handle.process(ProcessOp::Test, None);
        let _ = handle.process(ProcessOp::Skip, None);
        handle.close();
    }

    // Host flow: repeated close must stay an error, never a crash
    let name = path.to_string_lossy();
    if let Ok(token) = adapter::open_archive(&name) {
        let _ = adapter::read_header(token);
        let _ = adapter::process_file(token, 0, None);
        assert_eq!(adapter::close_archive(token), codes::SUCCESS);
        assert_eq!(adapter::close_archive(token), codes::E_ECLOSE);
    }
});
