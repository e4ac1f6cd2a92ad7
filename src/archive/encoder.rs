use crate::archive::source::alloc_buffer;
use crate::error::{ArchiveError, Result};
use crate::settings::CompressionLevel;
use zstd::stream::raw::{Encoder, InBuffer, Operation, OutBuffer};
use zstd::zstd_safe::CCtx;

/// Incremental compressor with fixed-size raw and compressed buffers
pub struct StreamEncoder {
    encoder: Encoder<'static>,
    input: Vec<u8>,
    output: Vec<u8>,
    hint: usize,
}

impl StreamEncoder {
    pub fn new(level: CompressionLevel) -> Result<Self> {
        let input = alloc_buffer(CCtx::in_size())?;
        let output = alloc_buffer(CCtx::out_size())?;
        let encoder = Encoder::new(level.get()).map_err(|e| {
            ArchiveError::NotSupported(format!("compression level {}: {}", level.get(), e))
        })?;

        let hint = input.len();
        Ok(Self {
            encoder,
            input,
            output,
            hint,
        })
    }

    pub fn input_capacity(&self) -> usize {
        self.input.len()
    }

    pub fn output_capacity(&self) -> usize {
        self.output.len()
    }

    /// Raw bytes the encoder would like next, never more than the input buffer holds
    pub fn next_read_size(&self) -> usize {
        match self.hint {
            0 => self.input.len(),
            hint => hint.min(self.input.len()),
        }
    }

    /// The raw input buffer, for the caller to read source bytes into
    pub fn input_mut(&mut self) -> &mut [u8] {
        &mut self.input
    }

    /// Compress the first `len` bytes of the input buffer.
    ///
    /// Calls the encoder until the whole span is consumed and hands every
    /// produced compressed span to `emit`.
    pub fn compress<F>(&mut self, len: usize, mut emit: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let len = len.min(self.input.len());
        let mut src = InBuffer::around(&self.input[..len]);

        while src.pos() < len {
            let produced = {
                let mut dst = OutBuffer::around(&mut self.output[..]);
                self.hint = self.encoder.run(&mut src, &mut dst).map_err(|e| {
                    tracing::warn!(error = %e, "encoder rejected input");
                    ArchiveError::Compression(e.to_string())
                })?;
                dst.pos()
            };

            if produced > 0 {
                emit(&self.output[..produced])?;
            }
        }
        Ok(())
    }

    /// Close the frame. The epilogue must fit in one output buffer.
    pub fn finish<F>(&mut self, mut emit: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let (remaining, produced) = {
            let mut dst = OutBuffer::around(&mut self.output[..]);
            let remaining = self
                .encoder
                .finish(&mut dst, true)
                .map_err(|e| ArchiveError::Compression(e.to_string()))?;
            (remaining, dst.pos())
        };

        if remaining != 0 {
            return Err(ArchiveError::Compression(format!(
                "{} bytes still pending after end of frame",
                remaining
            )));
        }

        emit(&self.output[..produced])
    }
}
