/// WAVE container layout constants and canonical header generation.
///
/// Every file written by `WaveWriter` uses the same canonical layout:
/// ```text
/// RIFF chunk header   12 bytes   "RIFF" <size> "WAVE"
/// fmt  chunk          24 bytes   PCM (16-byte body)
///                     26 bytes   float (18-byte body, zero extension size)
/// fact chunk          12 bytes   float only, holds the sample frame count
/// data chunk header    8 bytes   "data" <payload size>
/// ```
use crate::models::format::{SampleFormat, WaveFormat};

pub const RIFF_CHUNK_ID: [u8; 4] = *b"RIFF";
pub const WAVE_FORMAT_ID: [u8; 4] = *b"WAVE";
pub const FORMAT_CHUNK_ID: [u8; 4] = *b"fmt ";
pub const FACT_CHUNK_ID: [u8; 4] = *b"fact";
pub const SAMPLER_CHUNK_ID: [u8; 4] = *b"smpl";
pub const DATA_CHUNK_ID: [u8; 4] = *b"data";

/// FourCC + little-endian u32 size.
pub const CHUNK_HEADER_SIZE: usize = 8;

pub const FORMAT_CODE_PCM: u16 = 0x0001;
pub const FORMAT_CODE_FLOAT: u16 = 0x0003;
pub const FORMAT_CODE_EXTENSIBLE: u16 = 0xFFFE;

/// Subformat GUID tail shared by all `KSDATAFORMAT_SUBTYPE_*` identifiers.
/// The first two bytes of the GUID hold the plain format code.
pub const SUBFORMAT_GUID_TAIL: [u8; 14] = [
    0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xaa, 0x00, 0x38, 0x9b, 0x71,
];

/// Padding written after an odd-length chunk payload.
pub const PAD_BYTE: u8 = 0;

/// Body size of the canonical format chunk.
pub fn format_chunk_size(format: &WaveFormat) -> u32 {
    match format.sample_format() {
        SampleFormat::Pcm => 16,
        SampleFormat::Float => 18,
    }
}

/// Byte length of the canonical header, i.e. the offset of the first sample.
pub fn header_size(format: &WaveFormat) -> usize {
    let fact = match format.sample_format() {
        SampleFormat::Pcm => 0,
        SampleFormat::Float => CHUNK_HEADER_SIZE + 4,
    };
    12 + CHUNK_HEADER_SIZE + format_chunk_size(format) as usize + fact + CHUNK_HEADER_SIZE
}

fn format_code(format: &WaveFormat) -> u16 {
    match format.sample_format() {
        SampleFormat::Pcm => FORMAT_CODE_PCM,
        SampleFormat::Float => FORMAT_CODE_FLOAT,
    }
}

/// Generate the canonical header for `sample_frame_count` frames.
///
/// The RIFF size covers the pad byte of an odd-length data chunk, so it
/// always equals the finished file length minus 8. The data chunk size
/// counts sample bytes only.
pub fn generate_wav_header(format: &WaveFormat, sample_frame_count: u32) -> Vec<u8> {
    let data_size = sample_frame_count.wrapping_mul(format.block_align() as u32);
    let padded_data_size = data_size.wrapping_add(data_size % 2);
    let riff_size = (header_size(format) as u32 - 8).wrapping_add(padded_data_size);

    let mut header = Vec::with_capacity(header_size(format));

    // RIFF chunk descriptor
    header.extend_from_slice(&RIFF_CHUNK_ID);
    header.extend_from_slice(&riff_size.to_le_bytes());
    header.extend_from_slice(&WAVE_FORMAT_ID);

    // fmt sub-chunk
    header.extend_from_slice(&FORMAT_CHUNK_ID);
    header.extend_from_slice(&format_chunk_size(format).to_le_bytes());
    header.extend_from_slice(&format_code(format).to_le_bytes());
    header.extend_from_slice(&format.channels().to_le_bytes());
    header.extend_from_slice(&format.sample_rate().to_le_bytes());
    header.extend_from_slice(&format.byte_rate().to_le_bytes());
    header.extend_from_slice(&format.block_align().to_le_bytes());
    header.extend_from_slice(&format.bits_per_sample().to_le_bytes());

    if format.sample_format() == SampleFormat::Float {
        header.extend_from_slice(&0u16.to_le_bytes()); // extension size

        // fact sub-chunk
        header.extend_from_slice(&FACT_CHUNK_ID);
        header.extend_from_slice(&4u32.to_le_bytes());
        header.extend_from_slice(&sample_frame_count.to_le_bytes());
    }

    // data sub-chunk
    header.extend_from_slice(&DATA_CHUNK_ID);
    header.extend_from_slice(&data_size.to_le_bytes());

    header
}
