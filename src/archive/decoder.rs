use crate::archive::source::alloc_buffer;
use crate::error::{ArchiveError, Result};
use zstd::zstd_safe::{self, DCtx, InBuffer, OutBuffer};

/// Incremental decompressor with fixed-size input and output buffers
///
/// Both buffers are sized to the codec's natural block sizes and keep that
/// capacity for the decoder's lifetime. `filled` counts the valid bytes in the
/// input buffer; `needed` is the decoder's hint for how many compressed bytes
/// it wants next (0 once a frame has been fully decoded and flushed).
pub struct StreamDecoder {
    ctx: DCtx<'static>,
    input: Vec<u8>,
    output: Vec<u8>,
    filled: usize,
    needed: usize,
}

impl StreamDecoder {
    pub fn new() -> Result<Self> {
        let input = alloc_buffer(DCtx::in_size())?;
        let output = alloc_buffer(DCtx::out_size())?;
        let mut ctx = DCtx::try_create().ok_or(ArchiveError::OutOfMemory)?;
        let needed = ctx
            .init()
            .map_err(|code| ArchiveError::OpenFailed(format!("decoder init: {}", zstd_safe::get_error_name(code))))?;

        Ok(Self {
            ctx,
            input,
            output,
            filled: 0,
            needed,
        })
    }

    pub fn input_capacity(&self) -> usize {
        self.input.len()
    }

    pub fn output_capacity(&self) -> usize {
        self.output.len()
    }

    /// Compressed bytes currently waiting in the input buffer
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Compressed bytes the decoder asked for on its last call
    pub fn needed(&self) -> usize {
        self.needed
    }

    /// Size of the next read: the decoder's hint, or a full buffer between frames
    pub fn next_read_size(&self) -> usize {
        if self.needed == 0 {
            self.input.len()
        } else {
            self.needed.min(self.input.len())
        }
    }

    /// The input buffer, for the caller to read compressed bytes into
    pub fn input_mut(&mut self) -> &mut [u8] {
        &mut self.input
    }

    pub fn input(&self) -> &[u8] {
        &self.input[..self.filled]
    }

    /// Mark the first `len` bytes of the input buffer as pending
    pub fn set_filled(&mut self, len: usize) {
        self.filled = len.min(self.input.len());
    }

    /// Decode every pending input byte, handing each produced span to `emit`.
    ///
    /// Returns the number of compressed bytes consumed. Any decoder error is
    /// reported as a corrupt archive.
    pub fn drain<F>(&mut self, mut emit: F) -> Result<usize>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let Self {
            ctx,
            input,
            output,
            filled,
            needed,
        } = self;

        let mut src = InBuffer::around(&input[..*filled]);
        loop {
            let produced = {
                let mut dst = OutBuffer::around(&mut output[..]);
                *needed = ctx.decompress_stream(&mut dst, &mut src).map_err(|code| {
                    let reason = zstd_safe::get_error_name(code);
                    tracing::warn!(reason, "decoder rejected input");
                    ArchiveError::CorruptArchive(reason.to_string())
                })?;
                dst.pos()
            };

            if produced > 0 {
                emit(&output[..produced])?;
            }

            // A full output buffer may hide more flushable data even with no input left
            if src.pos() == *filled && produced < output.len() {
                break;
            }
        }

        let consumed = *filled;
        *filled = 0;
        Ok(consumed)
    }
}

/// Skippable frames use magic numbers 0x184D2A50..=0x184D2A5F
const SKIPPABLE_MAGIC_BASE: u32 = 0x184D_2A50;
const SKIPPABLE_MAGIC_MASK: u32 = 0xFFFF_FFF0;

fn is_skippable_frame(header: &[u8]) -> bool {
    match header.get(..4) {
        Some(magic) => {
            let magic = u32::from_le_bytes([magic[0], magic[1], magic[2], magic[3]]);
            magic & SKIPPABLE_MAGIC_MASK == SKIPPABLE_MAGIC_BASE
        }
        None => false,
    }
}

/// Declared content size of the frame starting at `header`.
///
/// `Ok(None)` when the frame does not record its size or is a skippable
/// frame (whose zero says nothing about the data after it), `Err` when
/// `header` is not the start of a frame.
pub fn frame_content_size(header: &[u8]) -> Result<Option<u64>> {
    if is_skippable_frame(header) {
        return Ok(None);
    }
    zstd_safe::get_frame_content_size(header)
        .map_err(|_| ArchiveError::OpenFailed("not a Zstandard frame".to_string()))
}
