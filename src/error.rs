use std::io;
use thiserror::Error;

/// Result type for plug-in operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Numeric result codes understood by the host
pub mod codes {
    pub const SUCCESS: i32 = 0;
    pub const E_END_ARCHIVE: i32 = 10;
    pub const E_NO_MEMORY: i32 = 11;
    pub const E_BAD_DATA: i32 = 12;
    pub const E_BAD_ARCHIVE: i32 = 13;
    pub const E_UNKNOWN_FORMAT: i32 = 14;
    pub const E_EOPEN: i32 = 15;
    pub const E_ECREATE: i32 = 16;
    pub const E_ECLOSE: i32 = 17;
    pub const E_EREAD: i32 = 18;
    pub const E_EWRITE: i32 = 19;
    pub const E_SMALL_BUF: i32 = 20;
    pub const E_EABORTED: i32 = 21;
    pub const E_NO_FILES: i32 = 22;
    pub const E_TOO_MANY_FILES: i32 = 23;
    pub const E_NOT_SUPPORTED: i32 = 24;
}

/// Unified error type for archive sessions and pack calls
#[derive(Debug, Error)]
pub enum ArchiveError {
    // Open errors
    #[error("Cannot open archive: {0}")]
    OpenFailed(String),

    #[error("Out of memory")]
    OutOfMemory,

    // Session errors
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("Invalid or closed archive handle")]
    BadHandle,

    #[error("No more entries in archive")]
    EndOfArchive,

    #[error("Cannot close archive: invalid handle")]
    CloseError,

    // File errors
    #[error("Cannot write output file: {0}")]
    WriteError(String),

    #[error("Cannot create archive: {0}")]
    CreateError(String),

    #[error("Cannot read source file: {0}")]
    ReadError(String),

    // Pack request errors
    #[error("No files to pack")]
    NoItems,

    #[error("Too many files: {0} given, exactly one supported")]
    TooManyItems(usize),

    #[error("Compression failed: {0}")]
    Compression(String),

    // Gate errors
    #[error("Operation cancelled by host")]
    Cancelled,

    #[error("No progress callback registered")]
    GateUnavailable,

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ArchiveError {
    /// Map the error onto the stable code the host renders
    pub fn host_code(&self) -> i32 {
        use codes::*;
        match self {
            ArchiveError::OpenFailed(_) => E_EOPEN,
            ArchiveError::OutOfMemory => E_NO_MEMORY,
            ArchiveError::CorruptArchive(_) => E_BAD_ARCHIVE,
            ArchiveError::BadHandle => E_BAD_ARCHIVE,
            ArchiveError::EndOfArchive => E_END_ARCHIVE,
            ArchiveError::CloseError => E_ECLOSE,
            ArchiveError::WriteError(_) => E_EWRITE,
            ArchiveError::CreateError(_) => E_ECREATE,
            ArchiveError::ReadError(_) => E_EREAD,
            ArchiveError::NoItems => E_NO_FILES,
            ArchiveError::TooManyItems(_) => E_TOO_MANY_FILES,
            ArchiveError::Compression(_) => E_EABORTED,
            ArchiveError::Cancelled => E_EABORTED,
            ArchiveError::GateUnavailable => E_EABORTED,
            ArchiveError::NotSupported(_) => E_NOT_SUPPORTED,
            ArchiveError::Io(err) if err.kind() == io::ErrorKind::OutOfMemory => E_NO_MEMORY,
            ArchiveError::Io(_) => E_EREAD,
        }
    }

    /// True when the host asked for the stop, as opposed to something breaking
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ArchiveError::Cancelled | ArchiveError::GateUnavailable)
    }
}
