//! Builders for raw WAVE byte streams used in tests.
//!
//! Chunks are assembled from literal field values so tests can produce
//! containers `WaveWriter` never would: wrong sizes, unknown chunks, odd
//! orderings, and files cut off part way (truncate the returned bytes).

use crate::models::format::SampleEncoding;
use crate::processing::buffer::Samples;
use crate::processing::wav_format::{
    DATA_CHUNK_ID, FACT_CHUNK_ID, FORMAT_CHUNK_ID, FORMAT_CODE_EXTENSIBLE, RIFF_CHUNK_ID, SAMPLER_CHUNK_ID,
    SUBFORMAT_GUID_TAIL, WAVE_FORMAT_ID,
};

/// Frames per square wave cycle: 4 low frames then 4 high frames.
pub const SQUARE_WAVE_CYCLE_FRAMES: usize = 8;

/// Chunk with its size computed from `body`, padded to an even length.
pub fn chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut bytes = chunk_with_size(id, body.len() as u32, body);
    if body.len() % 2 == 1 {
        bytes.push(0);
    }
    bytes
}

/// Chunk with a literal declared size and no padding.
pub fn chunk_with_size(id: &[u8; 4], declared_size: u32, body: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8 + body.len());
    bytes.extend_from_slice(id);
    bytes.extend_from_slice(&declared_size.to_le_bytes());
    bytes.extend_from_slice(body);
    bytes
}

/// RIFF container around `chunks` with the correct size.
pub fn riff(chunks: &[Vec<u8>]) -> Vec<u8> {
    let size = 4 + chunks.iter().map(Vec::len).sum::<usize>();
    riff_with(&RIFF_CHUNK_ID, size as u32, &WAVE_FORMAT_ID, chunks)
}

/// RIFF container with literal magic values and size.
pub fn riff_with(riff_id: &[u8; 4], size: u32, form_id: &[u8; 4], chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(riff_id);
    bytes.extend_from_slice(&size.to_le_bytes());
    bytes.extend_from_slice(form_id);
    for chunk in chunks {
        bytes.extend_from_slice(chunk);
    }
    bytes
}

/// 16-byte format chunk body with derived byte rate and block align.
pub fn format_body(format_code: u16, channels: u16, sample_rate: u32, bits_per_sample: u16) -> Vec<u8> {
    let block_align = channels as u32 * (bits_per_sample as u32).div_ceil(8);
    let mut body = Vec::with_capacity(16);
    body.extend_from_slice(&format_code.to_le_bytes());
    body.extend_from_slice(&channels.to_le_bytes());
    body.extend_from_slice(&sample_rate.to_le_bytes());
    body.extend_from_slice(&(sample_rate * block_align).to_le_bytes());
    body.extend_from_slice(&(block_align as u16).to_le_bytes());
    body.extend_from_slice(&bits_per_sample.to_le_bytes());
    body
}

/// 40-byte extensible format chunk body; `sub_format_code` goes in the GUID.
pub fn extensible_format_body(channels: u16, sample_rate: u32, bits_per_sample: u16, sub_format_code: u16) -> Vec<u8> {
    let mut body = format_body(FORMAT_CODE_EXTENSIBLE, channels, sample_rate, bits_per_sample);
    body.extend_from_slice(&22u16.to_le_bytes());
    body.extend_from_slice(&bits_per_sample.to_le_bytes());
    body.extend_from_slice(&((1u32 << channels) - 1).to_le_bytes());
    body.extend_from_slice(&sub_format_code.to_le_bytes());
    body.extend_from_slice(&SUBFORMAT_GUID_TAIL);
    body
}

pub fn format_chunk(format_code: u16, channels: u16, sample_rate: u32, bits_per_sample: u16) -> Vec<u8> {
    chunk(&FORMAT_CHUNK_ID, &format_body(format_code, channels, sample_rate, bits_per_sample))
}

pub fn fact_chunk(sample_frames: u32) -> Vec<u8> {
    chunk(&FACT_CHUNK_ID, &sample_frames.to_le_bytes())
}

pub fn data_chunk(payload: &[u8]) -> Vec<u8> {
    chunk(&DATA_CHUNK_ID, payload)
}

/// Raw loop record fields as stored in a `smpl` chunk.
pub struct LoopRecord {
    pub id: u32,
    pub loop_type: u32,
    pub start: u32,
    pub end: u32,
    pub fraction: u32,
    pub play_count: u32,
}

/// `smpl` body with fixed instrument fields, the given loops, vendor data,
/// and undeclared trailing bytes.
pub fn sampler_body(loops: &[LoopRecord], sampler_data: &[u8], extra_bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for field in [0x0100_0041u32, 7, 22675, 60, 0x4000_0000, 25] {
        body.extend_from_slice(&field.to_le_bytes());
    }
    body.extend_from_slice(&[4, 0, 0, 1]); // SMPTE offset: 01:00:00, frame 4
    body.extend_from_slice(&(loops.len() as u32).to_le_bytes());
    body.extend_from_slice(&(sampler_data.len() as u32).to_le_bytes());
    for record in loops {
        for field in [record.id, record.loop_type, record.start, record.end, record.fraction, record.play_count] {
            body.extend_from_slice(&field.to_le_bytes());
        }
    }
    body.extend_from_slice(sampler_data);
    body.extend_from_slice(extra_bytes);
    body
}

pub fn sampler_chunk(loops: &[LoopRecord], sampler_data: &[u8]) -> Vec<u8> {
    chunk(&SAMPLER_CHUNK_ID, &sampler_body(loops, sampler_data, &[]))
}

/// Square wave sample data: per cycle, 4 frames at the low value then 4 at
/// the high value on every channel. Returns the on-disk bytes and the
/// decoded samples they represent.
pub fn square_wave(encoding: SampleEncoding, channels: usize, cycles: usize) -> (Vec<u8>, Samples) {
    let sample_count = cycles * SQUARE_WAVE_CYCLE_FRAMES * channels;
    let half = |i: usize| (i / channels) % SQUARE_WAVE_CYCLE_FRAMES < SQUARE_WAVE_CYCLE_FRAMES / 2;

    let mut bytes = Vec::new();
    let samples = match encoding {
        SampleEncoding::Float32 | SampleEncoding::Float64 => {
            let values: Vec<f64> = (0..sample_count).map(|i| if half(i) { -0.5 } else { 0.5 }).collect();
            for &v in &values {
                if encoding == SampleEncoding::Float32 {
                    bytes.extend_from_slice(&(v as f32).to_le_bytes());
                } else {
                    bytes.extend_from_slice(&v.to_le_bytes());
                }
            }
            Samples::Float(values)
        }
        _ => {
            let (low, high) = match encoding {
                SampleEncoding::Pcm8 => (-40, 39),
                SampleEncoding::Pcm16 => (-10_000, 10_000),
                SampleEncoding::Pcm24 => (-1_000_000, 1_000_000),
                _ => (-1_000_000_000, 1_000_000_000),
            };
            let values: Vec<i32> = (0..sample_count).map(|i| if half(i) { low } else { high }).collect();
            for &v in &values {
                match encoding {
                    SampleEncoding::Pcm8 => bytes.push((v + 128) as u8),
                    SampleEncoding::Pcm16 => bytes.extend_from_slice(&(v as i16).to_le_bytes()),
                    SampleEncoding::Pcm24 => bytes.extend_from_slice(&v.to_le_bytes()[..3]),
                    _ => bytes.extend_from_slice(&v.to_le_bytes()),
                }
            }
            Samples::Int(values)
        }
    };
    (bytes, samples)
}
