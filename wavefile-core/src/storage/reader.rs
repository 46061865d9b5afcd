use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::models::error::{Result, WaveFileError};
use crate::models::format::WaveFormat;
use crate::models::sampler::SamplerInfo;
use crate::processing::buffer::SampleBuffer;
use crate::processing::sample_codec;
use crate::processing::wav_format::{
    CHUNK_HEADER_SIZE, DATA_CHUNK_ID, FACT_CHUNK_ID, FORMAT_CHUNK_ID, RIFF_CHUNK_ID, SAMPLER_CHUNK_ID, WAVE_FORMAT_ID,
};
use crate::storage::chunks::{parse_sampler_chunk, FormatChunk};
use crate::traits::io_handle::{ByteSource, FileSource, IoHandle};

/// Everything learned from one pass over the chunk list.
struct ChunkIndex {
    format_chunk: FormatChunk,
    native_format: WaveFormat,
    fact_sample_frames: Option<u32>,
    sampler_info: Option<SamplerInfo>,
    data_start: u64,
    data_size: u32,
}

/// Sequential wave file reader.
///
/// Opening parses the chunk list once: `fmt `, `fact`, `smpl`, and `data`
/// are interpreted, anything else is skipped. Samples are then pulled in
/// caller-sized pieces and converted to whatever format the caller asks for.
///
/// End of stream is not an error: `read` returns fewer frames than
/// requested, down to zero.
pub struct WaveReader<'a, R: ByteSource> {
    io: Option<IoHandle<'a, R>>,
    format_chunk: FormatChunk,
    native_format: WaveFormat,
    fact_sample_frames: Option<u32>,
    sampler_info: Option<SamplerInfo>,
    data_start: u64,
    total_sample_frames: u32,
    current_sample_frame: u32,
    /// Bytes of an incomplete frame at the end of the data chunk.
    trailing_bytes: u32,
}

impl WaveReader<'static, FileSource> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| WaveFileError::Io(format!("failed to open {}: {}", path.display(), e)))?;
        Self::from_handle(IoHandle::OwnedPath(BufReader::new(file)))
    }

    /// Read a file inside `f`; the file is released however `f` returns.
    pub fn with_file<T, F>(path: impl AsRef<Path>, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let mut reader = Self::open(path)?;
        f(&mut reader)
    }
}

impl<'a, R: ByteSource> WaveReader<'a, R> {
    /// Parse a wave file starting at the current position of a
    /// caller-owned handle. The handle is never closed by the reader.
    pub fn new(handle: &'a mut R) -> Result<Self> {
        Self::from_handle(IoHandle::BorrowedHandle(handle))
    }

    fn from_handle(mut io: IoHandle<'a, R>) -> Result<Self> {
        let index = read_chunk_index(&mut io)?;
        io.seek(SeekFrom::Start(index.data_start))?;

        let block_align = index.native_format.block_align() as u32;
        let whole_frames = index.data_size / block_align;
        let (total_sample_frames, trailing_bytes) = match index.fact_sample_frames {
            Some(fact) if fact < whole_frames => (fact, 0),
            Some(fact) => {
                if fact > whole_frames {
                    log::warn!(
                        "fact chunk claims {} frames but data chunk holds {}",
                        fact,
                        whole_frames
                    );
                }
                (whole_frames, index.data_size % block_align)
            }
            None => (whole_frames, index.data_size % block_align),
        };

        log::debug!(
            "opened wave reader: {} ch, {}, {} Hz, {} frames",
            index.native_format.channels(),
            index.native_format.encoding(),
            index.native_format.sample_rate(),
            total_sample_frames
        );

        Ok(Self {
            io: Some(io),
            format_chunk: index.format_chunk,
            native_format: index.native_format,
            fact_sample_frames: index.fact_sample_frames,
            sampler_info: index.sampler_info,
            data_start: index.data_start,
            total_sample_frames,
            current_sample_frame: 0,
            trailing_bytes,
        })
    }

    /// Read up to `frame_count` frames and convert them to `target`.
    ///
    /// Fewer frames are returned at the end of the data chunk, and zero once
    /// it is exhausted. A read that reaches a partial trailing frame fails.
    pub fn read(&mut self, frame_count: usize, target: &WaveFormat) -> Result<SampleBuffer> {
        let io = self.io.as_mut().ok_or(WaveFileError::StreamClosed("reader"))?;

        let remaining = (self.total_sample_frames - self.current_sample_frame) as usize;
        let frames = frame_count.min(remaining);
        if frames == 0 {
            if frame_count > 0 && self.trailing_bytes > 0 {
                return Err(WaveFileError::Malformed(format!(
                    "incomplete sample frame: {} trailing bytes after frame {}",
                    self.trailing_bytes, self.total_sample_frames
                )));
            }
            return Ok(SampleBuffer::empty(*target));
        }

        let mut bytes = vec![0u8; frames * self.native_format.block_align() as usize];
        io.read_exact(&mut bytes).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => WaveFileError::Malformed(format!(
                "incomplete sample frame: data ended before frame {}",
                self.current_sample_frame as usize + frames
            )),
            _ => WaveFileError::from(e),
        })?;
        self.current_sample_frame += frames as u32;

        let samples = sample_codec::decode(&bytes, self.native_format.encoding());
        SampleBuffer::new(samples, self.native_format)?.convert(target)
    }

    /// Read up to `frame_count` frames in the file's own format.
    pub fn read_native(&mut self, frame_count: usize) -> Result<SampleBuffer> {
        let native = self.native_format;
        self.read(frame_count, &native)
    }

    /// Iterate over successive buffers of `frames_per_buffer` frames until
    /// the end of the data chunk.
    pub fn buffers(&mut self, frames_per_buffer: usize, target: WaveFormat) -> Buffers<'_, 'a, R> {
        Buffers {
            reader: self,
            frames_per_buffer,
            target,
            done: false,
        }
    }

    /// Release the source. An owned file is closed; a borrowed handle is
    /// left open.
    pub fn close(&mut self) -> Result<()> {
        self.io.take().map(drop).ok_or(WaveFileError::StreamClosed("reader"))
    }

    pub fn is_closed(&self) -> bool {
        self.io.is_none()
    }

    /// Format of the samples as stored in the file.
    pub fn native_format(&self) -> &WaveFormat {
        &self.native_format
    }

    /// The `fmt ` chunk as stored, including extensible fields.
    pub fn format_chunk(&self) -> &FormatChunk {
        &self.format_chunk
    }

    pub fn sampler_info(&self) -> Option<&SamplerInfo> {
        self.sampler_info.as_ref()
    }

    /// Frame count from the `fact` chunk, if the file has one.
    pub fn fact_sample_frames(&self) -> Option<u32> {
        self.fact_sample_frames
    }

    pub fn total_sample_frames(&self) -> u32 {
        self.total_sample_frames
    }

    /// Index of the next frame `read` will return.
    pub fn current_sample_frame(&self) -> u32 {
        self.current_sample_frame
    }

    /// Byte offset of the first sample within the source.
    pub fn data_start(&self) -> u64 {
        self.data_start
    }
}

/// Iterator returned by [`WaveReader::buffers`].
pub struct Buffers<'r, 'a, R: ByteSource> {
    reader: &'r mut WaveReader<'a, R>,
    frames_per_buffer: usize,
    target: WaveFormat,
    done: bool,
}

impl<R: ByteSource> Iterator for Buffers<'_, '_, R> {
    type Item = Result<SampleBuffer>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read(self.frames_per_buffer, &self.target) {
            Ok(buffer) if buffer.is_empty() => {
                self.done = true;
                None
            }
            Ok(buffer) => Some(Ok(buffer)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn read_exact_or_malformed<R: Read>(io: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    io.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => WaveFileError::Malformed(format!("unexpected end of file in {}", what)),
        _ => WaveFileError::from(e),
    })
}

fn read_chunk_body<R: Read>(io: &mut R, size: u32, what: &str) -> Result<Vec<u8>> {
    let mut body = vec![0u8; size as usize];
    read_exact_or_malformed(io, &mut body, what)?;
    Ok(body)
}

/// Walk the chunk list from the RIFF header onward.
///
/// Chunks before `data` must fit inside the source. Past `data`, only a
/// trailing `smpl` chunk is of interest, and damage there is logged rather
/// than reported.
fn read_chunk_index<R: Read + Seek>(io: &mut R) -> Result<ChunkIndex> {
    let start = io.stream_position()?;
    let source_end = io.seek(SeekFrom::End(0))?;
    io.seek(SeekFrom::Start(start))?;

    let mut riff_header = [0u8; 12];
    read_exact_or_malformed(io, &mut riff_header, "RIFF header")?;
    if riff_header[0..4] != RIFF_CHUNK_ID {
        return Err(WaveFileError::Malformed("missing RIFF chunk id".into()));
    }
    if riff_header[8..12] != WAVE_FORMAT_ID {
        return Err(WaveFileError::Malformed("RIFF form type is not WAVE".into()));
    }

    let mut format: Option<(FormatChunk, WaveFormat)> = None;
    let mut fact_sample_frames = None;
    let mut sampler_info = None;
    let mut data: Option<(u64, u32)> = None;

    let mut position = start + 12;
    loop {
        if position + CHUNK_HEADER_SIZE as u64 > source_end {
            if data.is_some() && position < source_end {
                log::warn!("ignoring truncated chunk header at offset {}", position);
            }
            break;
        }

        let mut header = [0u8; CHUNK_HEADER_SIZE];
        io.seek(SeekFrom::Start(position))?;
        read_exact_or_malformed(io, &mut header, "chunk header")?;
        let id = [header[0], header[1], header[2], header[3]];
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let body_start = position + CHUNK_HEADER_SIZE as u64;
        let body_end = body_start + size as u64;

        log::debug!(
            "chunk '{}' at offset {}, {} bytes",
            String::from_utf8_lossy(&id),
            position,
            size
        );

        if body_end > source_end {
            if data.is_some() {
                log::warn!(
                    "ignoring chunk '{}' past the data chunk: declares {} bytes, {} available",
                    String::from_utf8_lossy(&id),
                    size,
                    source_end - body_start
                );
                break;
            }
            return Err(WaveFileError::Malformed(format!(
                "chunk '{}' declares {} bytes but only {} remain",
                String::from_utf8_lossy(&id),
                size,
                source_end - body_start
            )));
        }

        match id {
            FORMAT_CHUNK_ID if data.is_none() => {
                let chunk = FormatChunk::parse(&read_chunk_body(io, size, "format chunk")?)?;
                format = Some((chunk, chunk.to_wave_format()?));
            }
            FACT_CHUNK_ID if data.is_none() => {
                let body = read_chunk_body(io, size, "fact chunk")?;
                if body.len() < 4 {
                    return Err(WaveFileError::Malformed(format!("fact chunk too small: {} bytes", body.len())));
                }
                fact_sample_frames = Some(u32::from_le_bytes([body[0], body[1], body[2], body[3]]));
            }
            SAMPLER_CHUNK_ID if data.is_none() => {
                sampler_info = Some(parse_sampler_chunk(&read_chunk_body(io, size, "sampler chunk")?)?);
            }
            SAMPLER_CHUNK_ID => match parse_sampler_chunk(&read_chunk_body(io, size, "sampler chunk")?) {
                Ok(info) => sampler_info = Some(info),
                Err(e) => log::warn!("ignoring sampler chunk after the data chunk: {}", e),
            },
            DATA_CHUNK_ID if data.is_none() => {
                if format.is_none() {
                    return Err(WaveFileError::Malformed("data chunk found before format chunk".into()));
                }
                data = Some((body_start, size));
            }
            _ => {
                log::debug!("skipping chunk '{}'", String::from_utf8_lossy(&id));
            }
        }

        // chunks are aligned to even offsets
        position = body_end + (size as u64 % 2);
    }

    let (format_chunk, native_format) =
        format.ok_or_else(|| WaveFileError::Malformed("missing format chunk".into()))?;
    let (data_start, data_size) = data.ok_or_else(|| WaveFileError::Malformed("missing data chunk".into()))?;

    Ok(ChunkIndex {
        format_chunk,
        native_format,
        fact_sample_frames,
        sampler_info,
        data_start,
        data_size,
    })
}
