mod decoder;
mod encoder;
mod format;
mod reader;
mod source;
mod writer;

pub use decoder::{frame_content_size, StreamDecoder};
pub use encoder::StreamEncoder;
pub use format::{
    entry_name_of, file_name_of, split_u64, EntryMetadata, PackedDateTime, DOS_EPOCH_YEAR,
    DOS_MAX_YEAR, UNKNOWN_SIZE,
};
pub use reader::{can_handle, ArchiveHandle, ProcessOp};
pub use source::{ChunkSink, ChunkSource};
pub use writer::{pack_file, single_item, PackOptions};
