use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crate::models::error::{Result, WaveFileError};
use crate::models::format::WaveFormat;
use crate::processing::buffer::SampleBuffer;
use crate::processing::{sample_codec, wav_format};
use crate::traits::io_handle::{ByteSink, FileSink, IoHandle};

/// Streaming wave file writer.
///
/// A provisional header sized for zero frames is written on open, so the
/// output is structurally valid (though empty) at every point. Sizes are
/// patched in place when the writer is closed.
///
/// ## File Format
///
/// ```text
/// [canonical header: RIFF + fmt (+ fact for float) + data chunk header]
/// [interleaved little-endian samples...]
/// [one zero pad byte if the sample data length is odd]
/// ```
///
/// A writer created from a path owns its file and closes it. A writer
/// created over a caller's handle only borrows it; closing finalizes the
/// header and leaves the handle open, positioned after the written data.
pub struct WaveWriter<'a, W: ByteSink> {
    io: Option<IoHandle<'a, W>>,
    format: WaveFormat,
    header_offset: u64,
    total_sample_frames: u32,
}

impl WaveWriter<'static, FileSink> {
    /// Create (or truncate) the file at `path` and write the initial header.
    pub fn create(path: impl AsRef<Path>, format: WaveFormat) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| WaveFileError::Io(format!("failed to create {}: {}", path.display(), e)))?;
        Self::open(IoHandle::OwnedPath(BufWriter::new(file)), format)
    }

    /// Write a file inside `f`, closing it however `f` returns.
    ///
    /// An error from `f` takes precedence over an error from closing.
    pub fn with_file<T, F>(path: impl AsRef<Path>, format: WaveFormat, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let mut writer = Self::create(path, format)?;
        let result = f(&mut writer);
        let closed = if writer.is_closed() { Ok(()) } else { writer.close() };
        let value = result?;
        closed?;
        Ok(value)
    }
}

impl<'a, W: ByteSink> WaveWriter<'a, W> {
    /// Start writing at the current position of a caller-owned handle.
    pub fn new(handle: &'a mut W, format: WaveFormat) -> Result<Self> {
        Self::open(IoHandle::BorrowedHandle(handle), format)
    }

    fn open(mut io: IoHandle<'a, W>, format: WaveFormat) -> Result<Self> {
        let header_offset = io.stream_position()?;
        let header = wav_format::generate_wav_header(&format, 0);
        io.write_all(&header)?;

        log::debug!(
            "opened wave writer: {} ch, {}, {} Hz, header at offset {}",
            format.channels(),
            format.encoding(),
            format.sample_rate(),
            header_offset
        );

        Ok(Self {
            io: Some(io),
            format,
            header_offset,
            total_sample_frames: 0,
        })
    }

    /// Append every frame of `buffer`, converting it to the writer's format
    /// first if it is tagged with a different one.
    ///
    /// Returns the number of frames written so far.
    pub fn write(&mut self, buffer: &SampleBuffer) -> Result<u32> {
        let io = self.io.as_mut().ok_or(WaveFileError::StreamClosed("writer"))?;

        let buffer = if buffer.format() == &self.format {
            Cow::Borrowed(buffer)
        } else {
            Cow::Owned(buffer.convert(&self.format)?)
        };

        let total_frames = self.total_sample_frames as u64 + buffer.frame_count() as u64;
        check_data_size(&self.format, total_frames)?;

        let mut bytes = Vec::new();
        sample_codec::encode(buffer.samples(), self.format.encoding(), &mut bytes)?;
        io.write_all(&bytes)?;

        self.total_sample_frames = total_frames as u32;
        Ok(self.total_sample_frames)
    }

    /// Pad the data chunk to an even length and rewrite the header with the
    /// final sizes. An owned file is closed; a borrowed handle is not.
    ///
    /// The header is rewritten at the offset the writer started at, which is
    /// 0 for a writer made by `create`. The handle is left positioned after
    /// the written data.
    ///
    /// The writer is closed afterwards even if finalizing fails.
    pub fn close(&mut self) -> Result<()> {
        let mut io = self.io.take().ok_or(WaveFileError::StreamClosed("writer"))?;
        finalize(&mut io, &self.format, self.header_offset, self.total_sample_frames)
    }

    pub fn is_closed(&self) -> bool {
        self.io.is_none()
    }

    pub fn format(&self) -> &WaveFormat {
        &self.format
    }

    /// Frames (samples per channel) written so far.
    pub fn total_sample_frames(&self) -> u32 {
        self.total_sample_frames
    }
}

impl<W: ByteSink> Drop for WaveWriter<'_, W> {
    fn drop(&mut self) {
        if let Some(mut io) = self.io.take() {
            log::warn!("wave writer dropped without close, finalizing");
            if let Err(e) = finalize(&mut io, &self.format, self.header_offset, self.total_sample_frames) {
                log::error!("failed to finalize wave file on drop: {}", e);
            }
        }
    }
}

/// Fail if `total_frames` would no longer fit the 32-bit RIFF and data
/// chunk size fields, pad byte included.
fn check_data_size(format: &WaveFormat, total_frames: u64) -> Result<()> {
    let data_size = total_frames * format.block_align() as u64;
    let max_data_size = u32::MAX as u64 - (wav_format::header_size(format) as u64 - 8) - 1;
    if data_size > max_data_size {
        return Err(WaveFileError::Malformed(format!(
            "{} frames would overflow the 32-bit data chunk size",
            total_frames
        )));
    }
    Ok(())
}

fn finalize<W: ByteSink>(io: &mut IoHandle<'_, W>, format: &WaveFormat, header_offset: u64, frames: u32) -> Result<()> {
    let data_size = frames as u64 * format.block_align() as u64;
    if data_size % 2 == 1 {
        io.write_all(&[wav_format::PAD_BYTE])?;
    }
    let end = io.stream_position()?;

    io.seek(SeekFrom::Start(header_offset))?;
    io.write_all(&wav_format::generate_wav_header(format, frames))?;
    io.seek(SeekFrom::Start(end))?;
    io.flush()?;

    log::debug!("finalized wave header: {} frames, {} data bytes", frames, data_size);
    Ok(())
}
