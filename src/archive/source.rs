use crate::error::{ArchiveError, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Other processes may read but not write while we hold the file
#[cfg(windows)]
const FILE_SHARE_READ: u32 = 0x0000_0001;

fn deny_write(options: &mut OpenOptions) -> &mut OpenOptions {
    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        options.share_mode(FILE_SHARE_READ);
    }
    options
}

/// Open a file for reading with deny-write sharing
pub fn open_shared_read(path: &Path) -> io::Result<File> {
    deny_write(OpenOptions::new().read(true)).open(path)
}

/// Create (or replace) an extraction target with deny-write sharing
pub fn create_for_write(path: &Path) -> io::Result<File> {
    deny_write(OpenOptions::new().write(true).create(true).truncate(true)).open(path)
}

/// Create a file that must not exist yet
pub fn create_new(path: &Path) -> io::Result<File> {
    deny_write(OpenOptions::new().write(true).create_new(true)).open(path)
}

/// Allocate a zeroed codec buffer, reporting allocation failure instead of aborting
pub fn alloc_buffer(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| ArchiveError::OutOfMemory)?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Sequential byte-range reader over a backing file
#[derive(Debug)]
pub struct ChunkSource {
    file: File,
}

impl ChunkSource {
    pub fn new(file: File) -> Self {
        Self { file }
    }

    /// Byte length of the backing file
    pub fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Fill `buf` as far as the file allows. Returns 0 only at end of file.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(filled)
    }

    /// Move the read cursor to an absolute offset
    pub fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }
}

/// Sequential writer that treats a short write as fatal
#[derive(Debug)]
pub struct ChunkSink {
    file: File,
    written: u64,
}

impl ChunkSink {
    pub fn new(file: File) -> Self {
        Self { file, written: 0 }
    }

    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Total bytes written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
