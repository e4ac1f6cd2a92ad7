use crate::archive::decoder::{frame_content_size, StreamDecoder};
use crate::archive::format::{entry_name_of, file_name_of, EntryMetadata, PackedDateTime};
use crate::archive::source::{create_for_write, open_shared_read, ChunkSink, ChunkSource};
use crate::error::{ArchiveError, Result};
use crate::progress::ProgressGate;
use std::fs;
use std::path::Path;

/// What the host wants done with the current entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ProcessOp {
    Skip = 0,
    Test = 1,
    Extract = 2,
}

impl ProcessOp {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Skip),
            1 => Some(Self::Test),
            2 => Some(Self::Extract),
            _ => None,
        }
    }
}

/// One open archive session.
///
/// Owns the compressed source, the decoder with its buffers and the progress
/// gate. Every resource is released when the handle is dropped, so an open
/// that fails halfway leaks nothing.
pub struct ArchiveHandle {
    source: ChunkSource,
    decoder: StreamDecoder,
    metadata: EntryMetadata,
    gate: ProgressGate,
    delivered: bool,
}

impl ArchiveHandle {
    /// Open an archive and introspect its first frame
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let display = path.to_string_lossy();

        let stat = fs::metadata(path).map_err(|e| ArchiveError::OpenFailed(format!("{}: {}", display, e)))?;
        let file_time = stat
            .modified()
            .map(PackedDateTime::from_system_time)
            .unwrap_or_default();

        let file = open_shared_read(path).map_err(|e| ArchiveError::OpenFailed(format!("{}: {}", display, e)))?;
        let mut source = ChunkSource::new(file);
        let packed_size = source.len()?;

        let mut decoder = StreamDecoder::new()?;

        // Read a whole chunk so the frame header is certainly in view
        let read = source
            .read_chunk(decoder.input_mut())
            .map_err(|e| ArchiveError::OpenFailed(format!("{}: {}", display, e)))?;
        if read == 0 {
            return Err(ArchiveError::OpenFailed(format!("{}: empty archive", display)));
        }

        let unpacked_size = frame_content_size(&decoder.input_mut()[..read])?;

        // Keep only what the decoder asked for; the rest is read again later
        let first = decoder.needed().min(read);
        decoder.set_filled(first);
        source.seek_to(first as u64)?;

        let metadata = EntryMetadata {
            archive_name: file_name_of(&display).to_string(),
            entry_name: entry_name_of(&display).to_string(),
            packed_size,
            unpacked_size,
            file_time,
        };

        tracing::debug!(
            archive = %metadata.archive_name,
            packed_size,
            unpacked_size = ?unpacked_size,
            "opened archive"
        );

        Ok(Self {
            source,
            decoder,
            metadata,
            gate: ProgressGate::unavailable(),
            delivered: false,
        })
    }

    /// Entry metadata without consuming the single-pass enumeration
    pub fn metadata(&self) -> &EntryMetadata {
        &self.metadata
    }

    /// Enumerate the entry: metadata on the first call, `EndOfArchive` forever after
    pub fn read_metadata(&mut self) -> Result<EntryMetadata> {
        if self.delivered {
            return Err(ArchiveError::EndOfArchive);
        }
        self.delivered = true;
        Ok(self.metadata.clone())
    }

    pub fn set_progress_gate(&mut self, gate: ProgressGate) {
        self.gate = gate;
    }

    pub fn gate_mut(&mut self) -> &mut ProgressGate {
        &mut self.gate
    }

    /// Skip, test or extract the entry. Returns the number of bytes decoded.
    ///
    /// `destination` is required for [`ProcessOp::Extract`]. A partially
    /// written destination is left in place on failure or cancellation.
    pub fn process(&mut self, op: ProcessOp, destination: Option<&Path>) -> Result<u64> {
        if op == ProcessOp::Skip {
            return Ok(0);
        }

        self.gate.check(&self.metadata.entry_name, 0)?;

        let mut sink = match op {
            ProcessOp::Extract => {
                let dest = destination
                    .ok_or_else(|| ArchiveError::WriteError("no destination given".to_string()))?;
                let file = create_for_write(dest)
                    .map_err(|e| ArchiveError::WriteError(format!("{}: {}", dest.display(), e)))?;
                Some(ChunkSink::new(file))
            }
            _ => None,
        };

        let mut decoded: u64 = 0;
        while self.decoder.filled() > 0 {
            let consumed = self.decoder.drain(|span| {
                if let Some(sink) = sink.as_mut() {
                    sink.write_chunk(span)
                        .map_err(|e| ArchiveError::WriteError(e.to_string()))?;
                }
                decoded += span.len() as u64;
                Ok(())
            })?;

            self.gate.check(&self.metadata.entry_name, consumed as i64)?;

            let want = self.decoder.next_read_size();
            let read = self
                .source
                .read_chunk(&mut self.decoder.input_mut()[..want])
                .map_err(|e| ArchiveError::ReadError(e.to_string()))?;
            self.decoder.set_filled(read);
        }

        if self.decoder.needed() > 0 {
            return Err(ArchiveError::CorruptArchive("compressed stream ends mid-frame".to_string()));
        }

        if let Some(sink) = sink.as_mut() {
            sink.flush().map_err(|e| ArchiveError::WriteError(e.to_string()))?;
        }

        tracing::debug!(entry = %self.metadata.entry_name, ?op, decoded, "processed entry");
        Ok(decoded)
    }

    /// Release the decoder, its buffers and the archive file
    pub fn close(self) {
        tracing::debug!(archive = %self.metadata.archive_name, "closed archive");
    }
}

/// True when `path` opens as an archive this crate understands
pub fn can_handle<P: AsRef<Path>>(path: P) -> bool {
    ArchiveHandle::open(path).is_ok()
}
