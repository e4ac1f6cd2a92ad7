//! zstdwcx: single-entry Zstandard archiver as a packer plug-in
//!
//! A `.zst` file is presented to the host as an archive holding exactly one
//! entry, named after the archive minus its extension. The crate provides:
//! - Streaming decode of one or more concatenated frames (skip/test/extract)
//! - Streaming encode of exactly one source file at a configurable level
//! - A progress/cancellation gate consulted once per buffer of work
//! - Narrow and wide `extern "system"` entry points for the host
//!
//! # Example
//!
//! ```no_run
//! use zstdwcx::{pack_file, ArchiveHandle, PackOptions, ProcessOp, ProgressGate};
//! use std::path::Path;
//!
//! // Pack one file
//! let mut gate = ProgressGate::always_continue();
//! pack_file(Path::new("notes.txt.zst"), Path::new("."), &["notes.txt"], &PackOptions::default(), &mut gate)?;
//!
//! // Extract it again
//! let mut archive = ArchiveHandle::open("notes.txt.zst")?;
//! let entry = archive.read_metadata()?;
//! archive.set_progress_gate(ProgressGate::always_continue());
//! archive.process(ProcessOp::Extract, Some(Path::new(&entry.entry_name)))?;
//! archive.close();
//! # Ok::<(), zstdwcx::error::ArchiveError>(())
//! ```

pub mod archive;
pub mod error;
pub mod host;
pub mod progress;
pub mod settings;

pub use archive::{
    can_handle, pack_file, ArchiveHandle, EntryMetadata, PackOptions, PackedDateTime, ProcessOp,
    UNKNOWN_SIZE,
};
pub use error::{codes, ArchiveError, Result};
pub use progress::ProgressGate;
pub use settings::{CompressionLevel, Settings};
