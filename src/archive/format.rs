use chrono::{DateTime, Datelike, Local, Timelike};
use std::time::SystemTime;

/// Sentinel the host receives when the frame does not declare its content size.
///
/// Zero is a valid declared size, so "unknown" is all bits set instead.
pub const UNKNOWN_SIZE: u64 = u64::MAX;

/// Earliest year a packed date can carry
pub const DOS_EPOCH_YEAR: i32 = 1980;

/// Latest year a packed date can carry (7 bits of year offset)
pub const DOS_MAX_YEAR: i32 = DOS_EPOCH_YEAR + 127;

/// DOS-style packed date/time word
///
/// Layout:
/// - low word: `hour << 11 | minute << 5 | second / 2`
/// - high word: `(year - 1980) << 9 | month << 5 | day`
/// - value: `high * 65536 + low`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackedDateTime(pub u32);

impl PackedDateTime {
    /// Pack calendar fields. Years outside the representable range are clamped.
    pub fn from_parts(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        let year = year.clamp(DOS_EPOCH_YEAR, DOS_MAX_YEAR);
        let time = (hour & 0x1F) << 11 | (minute & 0x3F) << 5 | (second / 2) & 0x1F;
        let date = ((year - DOS_EPOCH_YEAR) as u32) << 9 | (month & 0x0F) << 5 | (day & 0x1F);
        Self(date * 0x10000 + time)
    }

    /// Pack a local-time timestamp
    pub fn from_local(time: DateTime<Local>) -> Self {
        Self::from_parts(
            time.year(),
            time.month(),
            time.day(),
            time.hour(),
            time.minute(),
            time.second(),
        )
    }

    /// Pack a filesystem modification time, interpreted in the local timezone
    pub fn from_system_time(time: SystemTime) -> Self {
        Self::from_local(DateTime::<Local>::from(time))
    }

    pub fn date(self) -> u16 {
        (self.0 >> 16) as u16
    }

    pub fn time(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// (year, month, day, hour, minute, second) with the two-second granularity applied
    pub fn unpack(self) -> (i32, u32, u32, u32, u32, u32) {
        let date = self.date() as u32;
        let time = self.time() as u32;
        (
            DOS_EPOCH_YEAR + (date >> 9) as i32,
            (date >> 5) & 0x0F,
            date & 0x1F,
            time >> 11,
            (time >> 5) & 0x3F,
            (time & 0x1F) * 2,
        )
    }
}

/// Metadata of the single entry an archive exposes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Archive file name without its directory
    pub archive_name: String,
    /// Archive file name without directory and extension
    pub entry_name: String,
    /// Compressed size: the archive's byte length at open time
    pub packed_size: u64,
    /// Declared uncompressed size, `None` when the frame does not carry one
    pub unpacked_size: Option<u64>,
    pub file_time: PackedDateTime,
}

impl EntryMetadata {
    /// Uncompressed size with [`UNKNOWN_SIZE`] standing in for "unknown"
    pub fn unpacked_size_raw(&self) -> u64 {
        self.unpacked_size.unwrap_or(UNKNOWN_SIZE)
    }

    pub fn packed_size_split(&self) -> (u32, u32) {
        split_u64(self.packed_size)
    }

    pub fn unpacked_size_split(&self) -> (u32, u32) {
        split_u64(self.unpacked_size_raw())
    }
}

/// Split a 64-bit size into (low, high) 32-bit halves
pub fn split_u64(value: u64) -> (u32, u32) {
    (value as u32, (value >> 32) as u32)
}

/// Strip everything up to the last path separator (either flavour)
pub fn file_name_of(path: &str) -> &str {
    match path.rfind(|c: char| c == '/' || c == '\\') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Strip directory and extension; a leading dot is part of the name, not an extension
pub fn entry_name_of(path: &str) -> &str {
    let name = file_name_of(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}
