use crate::archive::encoder::StreamEncoder;
use crate::archive::source::{create_new, open_shared_read, ChunkSink, ChunkSource};
use crate::error::{ArchiveError, Result};
use crate::progress::ProgressGate;
use crate::settings::CompressionLevel;
use std::path::Path;

/// Options for a single pack call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackOptions {
    pub level: CompressionLevel,
}

impl PackOptions {
    pub fn with_level(level: CompressionLevel) -> Self {
        Self { level }
    }
}

/// Check the single-entry constraint and return the one item
pub fn single_item<S: AsRef<str>>(items: &[S]) -> Result<&str> {
    match items {
        [] => Err(ArchiveError::NoItems),
        [item] if item.as_ref().is_empty() => Err(ArchiveError::NoItems),
        [item] => Ok(item.as_ref()),
        _ => Err(ArchiveError::TooManyItems(items.len())),
    }
}

/// Compress exactly one file from `source_dir` into a new archive.
///
/// The archive must not exist yet; an existing file is left untouched.
/// `gate` is consulted before the first read and after every source chunk.
/// Returns the number of raw bytes compressed.
pub fn pack_file<S: AsRef<str>>(
    archive: &Path,
    source_dir: &Path,
    items: &[S],
    options: &PackOptions,
    gate: &mut ProgressGate,
) -> Result<u64> {
    let item = single_item(items)?;
    let source_path = source_dir.join(item);
    let name = archive.to_string_lossy().into_owned();

    let file = open_shared_read(&source_path)
        .map_err(|e| ArchiveError::ReadError(format!("{}: {}", source_path.display(), e)))?;
    let mut source = ChunkSource::new(file);

    if archive.exists() {
        tracing::warn!(archive = %name, "refusing to overwrite existing archive");
        return Err(ArchiveError::CreateError(format!("{}: already exists", name)));
    }
    let file = create_new(archive).map_err(|e| ArchiveError::CreateError(format!("{}: {}", name, e)))?;
    let mut sink = ChunkSink::new(file);

    let mut encoder = StreamEncoder::new(options.level)?;

    gate.check(&name, 0)?;

    let mut total: u64 = 0;
    loop {
        let want = encoder.next_read_size();
        let read = source
            .read_chunk(&mut encoder.input_mut()[..want])
            .map_err(|e| ArchiveError::ReadError(e.to_string()))?;
        if read == 0 {
            break;
        }

        encoder.compress(read, |span| write_span(&mut sink, span))?;
        total += read as u64;

        gate.check(&name, read as i64)?;
    }

    encoder.finish(|span| write_span(&mut sink, span))?;
    sink.flush().map_err(|e| ArchiveError::WriteError(e.to_string()))?;

    tracing::debug!(
        archive = %name,
        level = options.level.get(),
        raw = total,
        compressed = sink.written(),
        "packed file"
    );
    Ok(total)
}

fn write_span(sink: &mut ChunkSink, span: &[u8]) -> Result<()> {
    sink.write_chunk(span)
        .map_err(|e| ArchiveError::WriteError(e.to_string()))
}
